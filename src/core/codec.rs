//! Canonical secret-file codec.
//!
//! A [`SecretBundle`] is rendered to a deterministic text form: keys sorted and
//! grouped by their first `_`-delimited segment, values shell-quoted, and the
//! whole file prefixed with a one-line environment banner. The SHA-256 of that
//! text is the bundle's [`VersionId`], so equal bundles always hash equal no
//! matter how the keys were inserted.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use sha2::{Digest, Sha256};

use crate::core::types::{SecretKey, VersionId};
use crate::core::validation::is_valid_key;
use crate::error::ParseError;

/// A set of secrets for one environment.
///
/// Keys are unique and case-sensitive. Iteration is always in key order, so
/// equality does not depend on insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretBundle {
    entries: BTreeMap<SecretKey, String>,
}

impl SecretBundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<SecretKey>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Key names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrow as the flat string map stored remotely.
    pub fn as_map(&self) -> &BTreeMap<SecretKey, String> {
        &self.entries
    }
}

impl From<BTreeMap<SecretKey, String>> for SecretBundle {
    fn from(entries: BTreeMap<SecretKey, String>) -> Self {
        Self { entries }
    }
}

impl<K: Into<SecretKey>, V: Into<String>> FromIterator<(K, V)> for SecretBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Render a bundle to its canonical text.
///
/// Keys sharing the text before their first `_` are grouped under a
/// `# <PREFIX> settings:` header once the group has two or more members, so
/// `DB_HOST` and `DB_PORT` land under `# DB settings:`.
pub fn encode(bundle: &SecretBundle, env: &str) -> String {
    let mut groups: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
    for (key, value) in bundle.iter() {
        groups.entry(group_prefix(key)).or_default().push((key, value));
    }

    let mut out = banner(env);
    let mut after_group = false;

    for (prefix, entries) in groups {
        if entries.len() > 1 {
            out.push('\n');
            let _ = writeln!(out, "# {} settings:", prefix);
            for (key, value) in entries {
                let _ = writeln!(out, "{}={}", key, shell_quote(value));
            }
            after_group = true;
        } else {
            if after_group {
                out.push('\n');
                after_group = false;
            }
            for (key, value) in entries {
                let _ = writeln!(out, "{}={}", key, shell_quote(value));
            }
        }
    }

    out
}

/// Parse canonical (or hand-edited) text back into a bundle.
///
/// Blank lines and `#` comments carry no entries and are skipped. Every other
/// line must be `KEY=value` where the value is a single shell word; quoted
/// values may span lines.
///
/// # Errors
///
/// Returns `ParseError` with the offending line for anything else.
pub fn decode(text: &str) -> Result<SecretBundle, ParseError> {
    let mut bundle = SecretBundle::new();
    let mut lines = text.split('\n').enumerate();

    while let Some((index, line)) = lines.next() {
        let line_number = index + 1;
        let trimmed = line.trim_start();
        if trimmed.trim().is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (key, raw) = trimmed
            .split_once('=')
            .ok_or_else(|| ParseError::new(line_number, line, "expected KEY=value"))?;

        if !is_valid_key(key) {
            return Err(ParseError::new(line_number, line, "invalid key name"));
        }

        let mut buffer = raw.to_string();
        let value = loop {
            match parse_word(&buffer) {
                Ok(value) => break value,
                Err(WordError::Unterminated) => match lines.next() {
                    Some((_, next)) => {
                        buffer.push('\n');
                        buffer.push_str(next);
                    }
                    None => {
                        return Err(ParseError::new(line_number, line, "unterminated quote"));
                    }
                },
                Err(WordError::Unexpected(reason)) => {
                    return Err(ParseError::new(line_number, line, reason));
                }
            }
        };

        if bundle.insert(key, value).is_some() {
            return Err(ParseError::new(line_number, line, "duplicate key"));
        }
    }

    Ok(bundle)
}

/// Content hash of canonical text.
pub fn version_id(canonical: &str) -> VersionId {
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

/// Decode arbitrary text and re-encode it canonically.
///
/// Returns the bundle, its canonical text, and that text's version id.
pub fn normalize(text: &str, env: &str) -> Result<(SecretBundle, String, VersionId), ParseError> {
    let bundle = decode(text)?;
    let canonical = encode(&bundle, env);
    let id = version_id(&canonical);
    Ok((bundle, canonical, id))
}

fn banner(env: &str) -> String {
    format!("# Environment: {}\n", env)
}

/// Group a key under its first `_`-delimited segment.
fn group_prefix(key: &str) -> &str {
    match key.split_once('_') {
        Some((prefix, _)) if !prefix.is_empty() => prefix,
        _ => key,
    }
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c)
}

/// Quote a value so a POSIX shell reads it back as one word.
pub fn shell_quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    if value.chars().all(is_shell_safe) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r#"'"'"'"#))
}

enum WordError {
    Unterminated,
    Unexpected(&'static str),
}

/// Parse one shell word: bare characters, '...' and "..." segments, and
/// backslash escapes. Trailing whitespace is allowed.
fn parse_word(input: &str) -> Result<String, WordError> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => loop {
                match chars.next() {
                    Some('\'') => break,
                    Some(c) => out.push(c),
                    None => return Err(WordError::Unterminated),
                }
            },
            '"' => loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.peek().copied() {
                        Some(next @ ('\\' | '"' | '$' | '`')) => {
                            chars.next();
                            out.push(next);
                        }
                        Some('\n') => {
                            chars.next();
                        }
                        Some(_) => out.push('\\'),
                        None => return Err(WordError::Unterminated),
                    },
                    Some(c) => out.push(c),
                    None => return Err(WordError::Unterminated),
                }
            },
            '\\' => match chars.next() {
                Some('\n') => {}
                Some(c) => out.push(c),
                None => return Err(WordError::Unterminated),
            },
            c if c.is_whitespace() => {
                if chars.all(char::is_whitespace) {
                    break;
                }
                return Err(WordError::Unexpected("unquoted whitespace in value"));
            }
            c => out.push(c),
        }
    }

    Ok(out)
}
