use std::borrow::Cow;
use svault::VaultError;

#[svault_derive::svault_error]
pub enum BridgeError {
    #[error("{source}")]
    Vault { source: VaultError, context: Option<Cow<'static, str>> },

    #[error("Malformed request{}: {source}", format_context(.context))]
    Protocol { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// A command named a namespace that was never passed to `initialize`.
    #[error("Namespace not initialized{}: {message}", format_context(.context))]
    NotInitialized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Bridge I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Internal bridge error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl BridgeError {
    /// Kind reported to the caller. Vault failures surface with the vault's own kind.
    #[must_use]
    pub const fn reply_kind(&self) -> &'static str {
        match self {
            Self::Vault { source, .. } => source.kind(),
            other => other.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_errors_keep_their_kind() {
        let err = BridgeError::from(VaultError::EntryNotFound {
            message: "no entry under this identifier".into(),
            context: None,
        });
        assert_eq!(err.kind(), "Vault");
        assert_eq!(err.reply_kind(), "EntryNotFound");
        assert_eq!(err.to_string(), "Entry not found: no entry under this identifier");
    }

    #[test]
    fn own_errors_report_their_variant() {
        let err = BridgeError::NotInitialized { message: "wallet".into(), context: None };
        assert_eq!(err.reply_kind(), "NotInitialized");
    }
}
