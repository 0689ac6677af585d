//! Dev-store command.
//!
//! Creates a file-backed local store so a project can be used without a
//! remote secret store.

use std::path::Path;

use tracing::info;

use crate::cli::output;
use crate::core::vault::{Connector, LocalStore};
use crate::error::Result;

/// Create or reopen the store under `dir` and print how to use it.
pub fn execute(dir: &Path) -> Result<()> {
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(dir)
    };
    let (store, root) = LocalStore::bootstrap(&dir)?;
    let url = store.url().to_string();
    info!(url = %url, "local store ready");

    output::success("local store ready");
    output::blank();
    output::kv("url", &url);
    output::kv("root token", &root);
    output::blank();
    output::hint(&format!("set url = \"{}\" under [vault] in .bullpen.toml", url));
    output::hint("then run: bullpen credentials run init --token <root token>");
    Ok(())
}
