//! Port identity, trust domains and remote addressing.

use crate::error::{MessagePortError, MessagePortResult};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PortId
// ---------------------------------------------------------------------------

/// Identity of a local port.
///
/// Ids are minted by the transport and are unique across both trust domains.
/// Only positive values name a port; zero and negative values are rejected
/// at every entry point with `InvalidParameter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(pub i32);

impl PortId {
    /// Wrap a raw id as handed out by a transport or a caller.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Whether this id can name a port at all (strictly positive).
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl std::fmt::Display for PortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for PortId {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

// ---------------------------------------------------------------------------
// TrustDomain
// ---------------------------------------------------------------------------

/// Which namespace a port lives in.
///
/// Trusted ports only accept messages from applications signed with the same
/// certificate. The check itself is the transport's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustDomain {
    /// Any application on the device may send here.
    Open,
    /// Only same-certificate applications may send here.
    Trusted,
}

impl TrustDomain {
    /// Map the boolean `trusted` flag of the public API.
    pub const fn from_trusted(trusted: bool) -> Self {
        if trusted {
            Self::Trusted
        } else {
            Self::Open
        }
    }

    /// Whether this is the trusted namespace.
    pub const fn is_trusted(self) -> bool {
        matches!(self, Self::Trusted)
    }

    /// The other namespace.
    pub const fn other(self) -> Self {
        match self {
            Self::Open => Self::Trusted,
            Self::Trusted => Self::Open,
        }
    }
}

impl std::fmt::Display for TrustDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrustDomain::Open => write!(f, "open"),
            TrustDomain::Trusted => write!(f, "trusted"),
        }
    }
}

// ---------------------------------------------------------------------------
// RemoteAddress
// ---------------------------------------------------------------------------

/// The `(application id, port name)` pair a send is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteAddress {
    /// Target application identity.
    pub app_id: String,
    /// Port name registered by the target application.
    pub port_name: String,
}

impl RemoteAddress {
    /// Build an address. No validation happens here; see [`RemoteAddress::validate`].
    pub fn new(app_id: impl Into<String>, port_name: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            port_name: port_name.into(),
        }
    }

    /// Reject addresses with a missing application id or port name.
    pub fn validate(&self) -> MessagePortResult<()> {
        if self.app_id.is_empty() {
            return Err(MessagePortError::InvalidParameter(
                "remote application id is empty".to_string(),
            ));
        }
        if self.port_name.is_empty() {
            return Err(MessagePortError::InvalidParameter(
                "remote port name is empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.app_id, self.port_name)
    }
}
