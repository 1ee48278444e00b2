mod error;
mod paths;
mod schema;
mod store;
mod watch;

pub use error::SessionStoreError;
pub use paths::{state_file, state_root};
pub use schema::{ChatMessage, Sender, SessionState, StoredDocument, STORE_VERSION};
pub use store::SessionStore;
pub use watch::StoreChange;
