//! Session persistence, token decoding and session lifecycle.

pub mod device;
pub mod error;
pub mod session;
pub mod store;
pub mod token;

pub use device::DeviceFingerprint;
pub use error::AuthError;
pub use session::{SessionManager, SessionState};
pub use store::{FileStore, KeyValueStore, MemoryStore, SessionStore};
pub use token::UserProfile;
