pub mod actions;
pub mod error;
pub mod knowledge;
pub mod schema;
pub mod storage;
pub mod user;

// Re-export common error type
pub use error::WeaverError;
pub use storage::{MemoryStorage, SessionStorage};
pub use user::{SessionState, UserProfile};
