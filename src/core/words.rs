//! Word-based password generation and fuzzy text matching.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::constants;

const WORDS: &[&str] = &[
    "acorn", "anchor", "apple", "arrow", "aspen", "atlas", "badge", "bakery", "bamboo", "banjo",
    "barley", "basil", "beacon", "bison", "blossom", "bolt", "bramble", "breeze", "brick", "bridge",
    "bucket", "cactus", "camel", "canoe", "canyon", "carbon", "castle", "cedar", "cherry", "cider",
    "clover", "cobalt", "comet", "copper", "coral", "cotton", "crane", "crater", "cricket", "crystal",
    "daisy", "delta", "desert", "dolphin", "dragon", "drift", "eagle", "ember", "falcon", "feather",
    "fern", "fiddle", "fjord", "flint", "forest", "fossil", "galaxy", "garden", "garnet", "geyser",
    "ginger", "glacier", "granite", "gravel", "harbor", "hazel", "hedge", "heron", "hollow", "honey",
    "horizon", "iris", "island", "ivory", "jasper", "jungle", "kettle", "kiwi", "lagoon", "lantern",
    "lemon", "lilac", "linen", "lotus", "magnet", "maple", "marble", "meadow", "melon", "meteor",
    "mint", "mirror", "mosaic", "moss", "nectar", "nickel", "nutmeg", "oasis", "ocean", "olive",
    "onyx", "orbit", "orchid", "otter", "paddle", "panda", "pebble", "pepper", "pickle", "pine",
    "planet", "plum", "pocket", "pollen", "poppy", "prairie", "puzzle", "quartz", "quill", "rabbit",
    "radish", "raven", "reef", "ribbon", "river", "rocket", "saddle", "saffron", "salmon", "sapphire",
    "shadow", "shell", "silver", "sketch", "sparrow", "spruce", "summit", "sunset", "tablet", "thistle",
    "thunder", "timber", "tulip", "tundra", "turnip", "velvet", "violet", "volcano", "walnut", "willow",
    "window", "winter", "yonder", "zephyr", "zigzag",
];

const INITIAL_WORDS: usize = 8;

/// Generate a password of random words joined by `-` with a two-digit suffix.
///
/// Drops words until the result fits the password backend's length limit.
pub fn generate_password<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut count = INITIAL_WORDS;
    loop {
        let words: Vec<&str> = WORDS.choose_multiple(rng, count).copied().collect();
        let password = format!("{}{}", words.join("-"), rng.gen_range(10..100));
        if password.len() <= constants::MAX_PASSWORD_LEN || count == 1 {
            return password;
        }
        count -= 1;
    }
}

/// Generate a password with the thread-local generator.
pub fn word_password() -> String {
    generate_password(&mut rand::thread_rng())
}

/// Similarity of two strings in `0..=100`, from their longest common subsequence.
pub fn ratio(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    let lcs = lcs_len(&a, &b);
    ((200 * lcs) as f64 / total as f64).round() as u32
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Best [`ratio`] of the shorter string against any equally long window of
/// the longer one, ignoring case.
pub fn partial_ratio(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let short_str: String = short.iter().collect();

    long.windows(short.len())
        .map(|w| ratio(&short_str, &w.iter().collect::<String>()))
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_password_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let password = generate_password(&mut rng);
            assert!(password.len() <= constants::MAX_PASSWORD_LEN);
            let digits: String = password.chars().rev().take(2).collect();
            assert!(digits.chars().all(|c| c.is_ascii_digit()));
            assert!(password.contains('-'));
        }
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio("jane", "jane"), 100);
        assert_eq!(ratio("abcd", "wxyz"), 0);
        assert_eq!(ratio("", ""), 100);
    }

    #[test]
    fn test_partial_ratio_finds_substrings() {
        let haystack = "jdoe Jane Doe jane@example.com Acme";
        assert_eq!(partial_ratio("jane", haystack), 100);
        assert_eq!(partial_ratio("ACME", haystack), 100);
        assert!(partial_ratio("jnae", haystack) < 85);
        assert!(partial_ratio("exampel.com", haystack) >= 85);
        assert_eq!(partial_ratio("", haystack), 0);
    }
}
