mod message;
mod thread;
mod user;

// Export database-agnostic models
pub use message::StoredMessage;
pub use thread::Thread;
pub use user::{NewUser, Subscription, User};
