//! Token store — single in-memory record for the OAuth tokens of this process.
//!
//! Nothing is persisted; a restart requires a new consent flow.

pub mod memory;
pub mod refresh;

pub use memory::{TokenRecord, TokenStore};
pub use refresh::{refresh_daemon, refresh_stored_token};
