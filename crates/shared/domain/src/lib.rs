//! # Domain Models
//!
//! Plain data shared by every vault layer: namespaces and the key tags derived from them,
//! the cipher strategy selector, the authenticated context handed out by the session, and
//! configuration. No I/O and no cryptography lives here.

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod namespace;

pub use context::AuthContext;
pub use error::DomainError;
pub use namespace::{CipherStrategy, KeyPolicy, KeyTag, Namespace};
