mod error;
mod schema;
mod store;

pub use error::SessionStoreError;
pub use schema::{SavedSession, SessionFile, StoredCookie, SESSION_FILE_VERSION};
pub use store::SessionStore;
