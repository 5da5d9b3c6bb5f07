// Authentication module
// Manages token storage, refresh and the return-to-login path

mod manager;
mod refresh;
pub mod navigation;
pub mod store;
pub mod types;

pub use manager::AuthManager;
pub use navigation::{LoginHint, NavigationSink, RecordingNavigation};
pub use store::{MemoryTokenStore, SqliteTokenStore, TokenStore};
pub use types::{Credentials, ACCESS_TOKEN_KEY, REFRESH_PATH, REFRESH_TOKEN_KEY};
