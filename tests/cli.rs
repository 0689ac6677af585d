//! CLI integration tests.

mod support;

#[path = "cli/actions.rs"]
mod actions;
#[path = "cli/credentials.rs"]
mod credentials;
#[path = "cli/dev_store.rs"]
mod dev_store;
#[path = "cli/errors.rs"]
mod errors;
#[path = "cli/init.rs"]
mod init;
