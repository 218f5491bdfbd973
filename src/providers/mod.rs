mod google;
mod traits;

pub use google::{GoogleProvider, SPREADSHEETS_READONLY_SCOPE};
pub use traits::{AccessType, OAuthProvider, TokenSet};
