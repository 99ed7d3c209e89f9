//! Wire format: one JSON object per line in each direction.
//!
//! ```text
//! -> {"id":1,"command":"initialize","namespace":"wallet","paranoia":false}
//! <- {"id":1,"ok":true,"value":null}
//! -> {"id":2,"command":"getItem","namespace":"wallet","key":"pin"}
//! <- {"id":2,"ok":false,"error":{"kind":"EntryNotFound","message":"..."}}
//! ```

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Request {
    pub id: u64,
    #[serde(flatten)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    Initialize {
        namespace: String,
        #[serde(default)]
        paranoia: bool,
    },
    SetItem {
        namespace: String,
        key: String,
        value: String,
        #[serde(default)]
        secret: String,
    },
    GetItem {
        namespace: String,
        key: String,
        #[serde(default)]
        secret: String,
    },
    RemoveItem {
        namespace: String,
        key: String,
    },
    RemoveAll {
        namespace: String,
    },
    IsDeviceSecure,
    Authenticate {
        #[serde(default)]
        reason: Option<String>,
    },
    SetInvalidationTimeout {
        seconds: u64,
    },
    Invalidate,
    ToggleAutomaticAuthentication {
        enabled: bool,
    },
    SetAuthenticationReason {
        reason: String,
    },
    Foreground,
    Background,
}

impl Command {
    /// Name used in logs; never includes keys or values.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::SetItem { .. } => "setItem",
            Self::GetItem { .. } => "getItem",
            Self::RemoveItem { .. } => "removeItem",
            Self::RemoveAll { .. } => "removeAll",
            Self::IsDeviceSecure => "isDeviceSecure",
            Self::Authenticate { .. } => "authenticate",
            Self::SetInvalidationTimeout { .. } => "setInvalidationTimeout",
            Self::Invalidate => "invalidate",
            Self::ToggleAutomaticAuthentication { .. } => "toggleAutomaticAuthentication",
            Self::SetAuthenticationReason { .. } => "setAuthenticationReason",
            Self::Foreground => "foreground",
            Self::Background => "background",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

/// `id` is `None` only when the request line could not be parsed far enough to find one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub id: Option<u64>,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Reply {
    #[must_use]
    pub fn success(id: u64, value: Value) -> Self {
        Self { id: Some(id), ok: true, value: Some(value), error: None }
    }

    #[must_use]
    pub fn failure(id: Option<u64>, err: &BridgeError) -> Self {
        Self {
            id,
            ok: false,
            value: None,
            error: Some(ErrorBody { kind: err.reply_kind(), message: err.to_string() }),
        }
    }
}

/// Parses one request line. On failure the `id` is recovered when the line is at least a
/// JSON object carrying one, so the caller can still be answered.
///
/// # Errors
/// [`BridgeError::Protocol`] paired with the recovered id.
pub fn parse_request(line: &str) -> Result<Request, (Option<u64>, BridgeError)> {
    serde_json::from_str(line).map_err(|err| {
        let id = serde_json::from_str::<Value>(line)
            .ok()
            .and_then(|v| v.get("id").and_then(Value::as_u64));
        (id, BridgeError::from(err))
    })
}
