//! Sandtab Session Management
//!
//! - Every managed context owns exactly one live session
//! - A session owns an append-only credential store in the shared key-value
//!   namespace
//! - Session ids are derived from the context and creation time and are never
//!   reused
//! - Sessions are ephemeral: nothing is restored after a restart

mod context;
mod error;
mod registry;
mod session;
mod store;
pub mod wire;

pub use context::{ContextId, SessionId};
pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::{Session, SessionState};
pub use store::CredentialStore;
pub use wire::CredentialEntry;

pub type Result<T> = std::result::Result<T, SessionError>;
