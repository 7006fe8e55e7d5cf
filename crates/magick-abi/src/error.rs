//! Error type for calls into a loaded module

use crate::AbiStatus;

/// Status returned by a successful call.
pub const STATUS_OK: AbiStatus = 0;
/// The call raised an error; details are available from `last_error`.
pub const STATUS_ERROR: AbiStatus = 1;
/// A static method with the requested name does not exist.
pub const STATUS_UNKNOWN_METHOD: AbiStatus = 2;
/// Argument count or kinds do not match any signature.
pub const STATUS_BAD_ARGUMENTS: AbiStatus = 3;
/// The module was built against a different ABI version.
pub const STATUS_ABI_MISMATCH: AbiStatus = 4;

/// Failure reported by (or about) a call into a loaded module.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (status {status})")]
pub struct ModuleError {
    /// Status code of the failed call
    pub status: AbiStatus,
    /// Message reported by the module, or a description of the failure
    pub message: String,
}

impl ModuleError {
    /// Create an error with the given status and message.
    pub fn new(status: AbiStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Argument count or kinds were rejected.
    pub fn bad_arguments(message: impl Into<String>) -> Self {
        Self::new(STATUS_BAD_ARGUMENTS, message)
    }
}
