use crate::constants::MAX_NAMESPACE_LEN;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// An isolated vault. The `paranoia` flag selects the stricter key policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    name: Arc<str>,
    paranoia: bool,
}

impl Namespace {
    /// Validates `name` and builds a namespace.
    ///
    /// Names are used verbatim as directory names and key labels, so only ASCII
    /// alphanumerics plus `-`, `_` and `.` are accepted, and never `.` or `..` alone.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidNamespace`] for empty, oversized or non-portable names.
    pub fn new(name: impl AsRef<str>, paranoia: bool) -> Result<Self, DomainError> {
        let name = name.as_ref();

        if name.is_empty() {
            return Err(invalid("namespace name is empty"));
        }
        if name.len() > MAX_NAMESPACE_LEN {
            return Err(invalid(format!("namespace name exceeds {MAX_NAMESPACE_LEN} bytes")));
        }
        if name == "." || name == ".." {
            return Err(invalid(format!("'{name}' is reserved")));
        }
        if let Some(bad) =
            name.chars().find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(invalid(format!("character {bad:?} is not allowed")));
        }

        Ok(Self { name: Arc::from(name), paranoia })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn paranoia(&self) -> bool {
        self.paranoia
    }

    #[must_use]
    pub const fn policy(&self) -> KeyPolicy {
        if self.paranoia { KeyPolicy::Paranoid } else { KeyPolicy::Standard }
    }

    /// Tag of the hardware key guarding this namespace.
    #[must_use]
    pub fn key_tag(&self) -> KeyTag {
        KeyTag::new(self.name.clone(), self.policy())
    }
}

fn invalid(message: impl Into<Cow<'static, str>>) -> DomainError {
    DomainError::InvalidNamespace { message: message.into(), context: None }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Access-control policy attached to a hardware key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPolicy {
    /// Requires an authenticated context.
    Standard,
    /// Requires an authenticated context plus the application password.
    Paranoid,
}

impl KeyPolicy {
    pub const ALL: [Self; 2] = [Self::Standard, Self::Paranoid];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Paranoid => "paranoid",
        }
    }
}

/// Identity of one hardware key: `(namespace, policy)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyTag {
    namespace: Arc<str>,
    policy: KeyPolicy,
}

impl KeyTag {
    #[must_use]
    pub fn new(namespace: impl Into<Arc<str>>, policy: KeyPolicy) -> Self {
        Self { namespace: namespace.into(), policy }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub const fn policy(&self) -> KeyPolicy {
        self.policy
    }
}

impl fmt::Display for KeyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "svault.{}.{}", self.namespace, self.policy.as_str())
    }
}

/// Envelope strategy, chosen once per platform capability.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherStrategy {
    /// Symmetric hardware key wrapped around a secret-derived inner layer.
    #[default]
    Symmetric,
    /// Elliptic-curve hardware key pair with an integrated encryption scheme.
    Asymmetric,
}
