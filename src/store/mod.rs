//! In-memory storage: users, messages, and the manager that owns them.

pub mod manager;
pub mod model;

pub use manager::StorageManager;
pub use model::{Bucket, Message, MessageId, MessageListing, ReadState, User, UserId};
