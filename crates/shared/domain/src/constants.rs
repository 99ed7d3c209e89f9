/// Text handed to the prompt provider when no other reason was set.
pub const DEFAULT_AUTH_REASON: &str = "Please authenticate to continue to use the app.";

/// Default staleness window, in seconds.
pub const DEFAULT_INVALIDATE_AFTER_SECS: u64 = 10;

/// How long the emulated secure element honours one authenticated context, in seconds.
pub const DEFAULT_AUTH_VALIDITY_SECS: u64 = 30;

/// Upper bound on namespace name length; names become directory names.
pub const MAX_NAMESPACE_LEN: usize = 64;

/// Salt length per namespace, in bytes.
pub const SALT_LEN: usize = 32;
