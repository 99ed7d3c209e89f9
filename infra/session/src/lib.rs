//! Authentication session for the vault.
//!
//! ```text
//!                 authenticate (prompt ok)
//!  Unauthenticated ───────────────────────▶ Authenticated { since }
//!        ▲                                        │
//!        └─────── invalidate (force | stale) ─────┘
//! ```
//!
//! * Access staleness: `now > since + invalidate_after`; `since` slides on every successful use.
//! * Background staleness: `now > last_backgrounded + invalidate_after`.
//! * A zero window disables caching.
//!
//! Host lifecycle arrives as explicit events ([`AuthSession::on_foreground`],
//! [`AuthSession::on_background`]); the session knows nothing about UI.

mod builder;
mod error;
mod lane;
mod prompt;
mod session;
mod state;

pub use builder::{NoPrompt, SessionBuilder, WithPrompt};
pub use error::{CredentialFailure, SessionError, SessionErrorExt};
pub use prompt::{AuthenticationPrompt, PromptError, PromptErrorExt};
pub use session::{AuthSession, SessionInner};
pub use state::SessionState;
