use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Verdict of a device integrity assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityVerdict {
    Pass,
    /// Anything but a pass, with the oracle's reason (`"rooted"`, `"debugger attached"`).
    Fail(String),
}

/// Environment-supplied device integrity check, consulted before every vault operation.
///
/// The vault only consumes the verdict; deciding what counts as compromised is up to the
/// implementation.
#[async_trait]
pub trait IntegrityOracle: Send + Sync + fmt::Debug {
    async fn assess(&self) -> IntegrityVerdict;

    /// Whether the device has a passcode or biometry enrolled at all.
    async fn is_device_secure(&self) -> bool {
        true
    }
}

/// Oracle for environments without an integrity service.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysPass;

#[async_trait]
impl IntegrityOracle for AlwaysPass {
    async fn assess(&self) -> IntegrityVerdict {
        IntegrityVerdict::Pass
    }
}

#[async_trait]
impl<T> IntegrityOracle for Arc<T>
where
    T: IntegrityOracle + ?Sized,
{
    async fn assess(&self) -> IntegrityVerdict {
        (**self).assess().await
    }

    async fn is_device_secure(&self) -> bool {
        (**self).is_device_secure().await
    }
}
