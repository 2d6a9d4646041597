pub mod dbs;
pub mod error;
pub mod memory;
pub mod models;
pub mod trait_client;

pub use error::{PersistError, Result};
pub use memory::InMemoryStore;
pub use models::{NewUser, StoredMessage, Subscription, Thread, User};
pub use trait_client::{ConversationStore, UserStore};

#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoStore;
