//! Transport code to public error translation.

use msgport_types::{MessagePortError, MessagePortResult, TransportCode};
use tracing::warn;

/// Maps [`TransportCode`] to [`MessagePortError`].
///
/// Known codes map one to one. Unknown codes fail closed to `IoError`
/// unless pass-through is enabled, in which case the raw value is kept as
/// `Unrecognized`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorTranslator {
    passthrough_unmapped: bool,
}

impl ErrorTranslator {
    /// A translator that fails closed on unknown codes.
    pub fn new() -> Self {
        Self::default()
    }

    /// A translator that surfaces unknown codes as `Unrecognized`.
    pub fn passthrough() -> Self {
        Self {
            passthrough_unmapped: true,
        }
    }

    pub fn with_passthrough(passthrough_unmapped: bool) -> Self {
        Self {
            passthrough_unmapped,
        }
    }

    /// Translate a single transport code.
    pub fn translate(&self, code: TransportCode) -> MessagePortError {
        match code {
            TransportCode::IoError => MessagePortError::IoError,
            TransportCode::OutOfMemory => MessagePortError::OutOfMemory,
            TransportCode::InvalidParameter => {
                MessagePortError::InvalidParameter("rejected by transport".to_string())
            }
            TransportCode::PortNotFound => {
                MessagePortError::PortNotFound("reported by transport".to_string())
            }
            TransportCode::CertificateNotMatch => MessagePortError::CertificateNotMatch,
            TransportCode::MaxExceeded => MessagePortError::MaxExceeded,
            TransportCode::ResourceUnavailable => MessagePortError::ResourceUnavailable,
            TransportCode::Other(raw) if self.passthrough_unmapped => {
                MessagePortError::Unrecognized(raw)
            }
            TransportCode::Other(raw) => {
                warn!(code = raw, "Unmapped transport code, reporting IO error");
                MessagePortError::IoError
            }
        }
    }

    /// Translate a transport result.
    pub fn result<T>(&self, result: Result<T, TransportCode>) -> MessagePortResult<T> {
        result.map_err(|code| self.translate(code))
    }

    /// Translate a raw integer result where zero means success.
    pub fn translate_raw(&self, raw: i32) -> MessagePortResult<()> {
        match TransportCode::from_raw(raw) {
            None => Ok(()),
            Some(code) => Err(self.translate(code)),
        }
    }
}
