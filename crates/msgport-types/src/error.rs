//! Error types shared by the registry, the gateway and transports.

use thiserror::Error;

/// Public error taxonomy for message port operations.
///
/// Success is `Ok(..)`; there is no `None` variant. Every variant has a
/// stable numeric [`code`](MessagePortError::code) for callers that forward
/// results as integers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessagePortError {
    /// Internal or transport I/O failure.
    #[error("IO error")]
    IoError,

    /// Allocation failed somewhere below the registry.
    #[error("Out of memory")]
    OutOfMemory,

    /// A precondition on the arguments was violated.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The local or remote port does not exist (in the targeted domain).
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// The remote application is not signed with the same certificate.
    #[error("Certificate does not match")]
    CertificateNotMatch,

    /// The message exceeded the transport's size limit.
    #[error("Message size exceeded the maximum limit")]
    MaxExceeded,

    /// The transport is temporarily unable to serve the request.
    #[error("Resource temporarily unavailable")]
    ResourceUnavailable,

    /// A transport code without a translation, surfaced as-is.
    ///
    /// Only produced when pass-through of unmapped codes is enabled.
    #[error("Unrecognized transport code: {0}")]
    Unrecognized(i32),
}

impl MessagePortError {
    /// Stable integer code (0 is reserved for success).
    pub fn code(&self) -> i32 {
        match self {
            MessagePortError::IoError => TransportCode::IO_ERROR,
            MessagePortError::OutOfMemory => TransportCode::OUT_OF_MEMORY,
            MessagePortError::InvalidParameter(_) => TransportCode::INVALID_PARAMETER,
            MessagePortError::PortNotFound(_) => TransportCode::PORT_NOT_FOUND,
            MessagePortError::CertificateNotMatch => TransportCode::CERTIFICATE_NOT_MATCH,
            MessagePortError::MaxExceeded => TransportCode::MAX_EXCEEDED,
            MessagePortError::ResourceUnavailable => TransportCode::RESOURCE_UNAVAILABLE,
            MessagePortError::Unrecognized(raw) => *raw,
        }
    }
}

/// Alias for Result with MessagePortError.
pub type MessagePortResult<T> = Result<T, MessagePortError>;

/// Result codes reported by a `Transport`.
///
/// This is the transport-side enumeration; it reaches callers only through
/// the error translator.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportCode {
    #[error("transport I/O error")]
    IoError,
    #[error("transport out of memory")]
    OutOfMemory,
    #[error("transport rejected a parameter")]
    InvalidParameter,
    #[error("port not found")]
    PortNotFound,
    #[error("certificate mismatch")]
    CertificateNotMatch,
    #[error("message too large")]
    MaxExceeded,
    #[error("resource unavailable")]
    ResourceUnavailable,
    /// A code this crate does not know about.
    #[error("transport code {0}")]
    Other(i32),
}

impl TransportCode {
    pub const IO_ERROR: i32 = -5;
    pub const OUT_OF_MEMORY: i32 = -12;
    pub const INVALID_PARAMETER: i32 = -22;
    pub const PORT_NOT_FOUND: i32 = -2;
    pub const CERTIFICATE_NOT_MATCH: i32 = -13;
    pub const MAX_EXCEEDED: i32 = -7;
    pub const RESOURCE_UNAVAILABLE: i32 = -11;

    /// Decode a raw integer result. Returns `None` for success (0) and for
    /// positive values, which transports use to carry port ids.
    pub fn from_raw(raw: i32) -> Option<Self> {
        let code = match raw {
            r if r >= 0 => return None,
            Self::IO_ERROR => Self::IoError,
            Self::OUT_OF_MEMORY => Self::OutOfMemory,
            Self::INVALID_PARAMETER => Self::InvalidParameter,
            Self::PORT_NOT_FOUND => Self::PortNotFound,
            Self::CERTIFICATE_NOT_MATCH => Self::CertificateNotMatch,
            Self::MAX_EXCEEDED => Self::MaxExceeded,
            Self::RESOURCE_UNAVAILABLE => Self::ResourceUnavailable,
            other => Self::Other(other),
        };
        Some(code)
    }

    /// The raw integer value of this code.
    pub fn raw(self) -> i32 {
        match self {
            Self::IoError => Self::IO_ERROR,
            Self::OutOfMemory => Self::OUT_OF_MEMORY,
            Self::InvalidParameter => Self::INVALID_PARAMETER,
            Self::PortNotFound => Self::PORT_NOT_FOUND,
            Self::CertificateNotMatch => Self::CERTIFICATE_NOT_MATCH,
            Self::MaxExceeded => Self::MAX_EXCEEDED,
            Self::ResourceUnavailable => Self::RESOURCE_UNAVAILABLE,
            Self::Other(raw) => raw,
        }
    }
}
