//! Validator capability
//!
//! The signing workflow never talks to a concrete validator. It depends on
//! two traits:
//! - [`ValidatorLoader`] resolves and releases a validator instance
//! - [`Validator`] wraps bytes in a blob, validates it and hands back an
//!   [`OperationResult`] with status, result buffer and error buffer
//!
//! The native DXC backend lives in [`crate::dxc`]; [`crate::mock`] provides
//! the scripted double used by tests.

mod session;

pub use session::ValidatorSession;

use std::fmt;

use thiserror::Error;

/// Errors raised while engaging or driving a validator.
///
/// These describe the validator itself failing, never the content being
/// rejected; content rejection travels through [`OperationStatus::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidatorError {
    #[error("failed to load library {path}: {message}")]
    LibraryLoad { path: String, message: String },

    #[error("failed to create {object} instance: {message}")]
    InstanceCreation {
        object: &'static str,
        message: String,
    },

    #[error("{operation} failed: {message}")]
    CallFailed {
        operation: &'static str,
        message: String,
    },

    #[error("{0} is not supported by this validator")]
    Unsupported(&'static str),

    #[error("validator has no UTF-8 conversion for diagnostics")]
    ConversionUnavailable,

    #[error("container of {len} bytes exceeds the validator blob limit")]
    BlobTooLarge { len: usize },

    #[error("injected failure in {operation}: {message}")]
    Injected { operation: String, message: String },
}

/// Flags passed to the validate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidatorFlags(u32);

impl ValidatorFlags {
    /// No flags.
    pub const DEFAULT: ValidatorFlags = ValidatorFlags(0);

    /// Ask the validator to write the digest straight into the given buffer.
    /// A hint only; implementations may still return a new buffer.
    pub const IN_PLACE_EDIT: ValidatorFlags = ValidatorFlags(1);

    /// Whether every bit of `other` is set.
    pub fn contains(self, other: ValidatorFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Status reported by an operation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Succeeded,
    /// Content was rejected. Carries the raw status code for logging.
    Failed(i32),
}

impl OperationStatus {
    /// Map an HRESULT-style status code.
    pub fn from_hresult(hresult: i32) -> Self {
        if hresult < 0 {
            OperationStatus::Failed(hresult)
        } else {
            OperationStatus::Succeeded
        }
    }
}

/// Validator version as `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorVersion {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for ValidatorVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Handle returned by [`Validator::validate`].
pub trait OperationResult {
    /// Opaque error buffer, convertible through [`Validator::error_to_utf8`].
    type ErrorBuffer;

    /// Whether the content passed validation.
    fn status(&self) -> Result<OperationStatus, ValidatorError>;

    /// Output buffer produced by the validator, if it produced one.
    ///
    /// `None` means the result lives in the buffer that was handed in.
    fn result_buffer(&self) -> Result<Option<Vec<u8>>, ValidatorError>;

    /// Diagnostic buffer attached to a failed operation.
    fn error_buffer(&self) -> Result<Option<Self::ErrorBuffer>, ValidatorError>;
}

/// Validate-and-sign capability.
pub trait Validator {
    /// Blob wrapping a borrowed byte region.
    type Blob<'a>
    where
        Self: 'a;

    /// Result handle for one validate call.
    type Outcome: OperationResult;

    /// Wrap `bytes` as a binary blob. No encoding is applied and the bytes
    /// are not copied; an in-place edit writes back into `bytes`.
    fn create_blob<'a>(&'a self, bytes: &'a mut [u8]) -> Result<Self::Blob<'a>, ValidatorError>;

    /// Validate the blob, signing it on success. The blob is consumed.
    fn validate(
        &self,
        blob: Self::Blob<'_>,
        flags: ValidatorFlags,
    ) -> Result<Self::Outcome, ValidatorError>;

    /// Convert a diagnostic buffer to UTF-8 text using the validator's own
    /// library routine.
    fn error_to_utf8(
        &self,
        buffer: &<Self::Outcome as OperationResult>::ErrorBuffer,
    ) -> Result<String, ValidatorError>;

    /// Validator version, when the implementation reports one.
    fn version(&self) -> Result<ValidatorVersion, ValidatorError> {
        Err(ValidatorError::Unsupported("version query"))
    }
}

/// Resolves and releases a [`Validator`].
///
/// `engage` and `disengage` must be symmetric; `disengage` must tolerate
/// being called when nothing is engaged.
pub trait ValidatorLoader {
    type Validator: Validator;

    /// Load the backing library and create a validator instance.
    fn engage(&mut self) -> Result<Self::Validator, ValidatorError>;

    /// Release an instance obtained from [`ValidatorLoader::engage`].
    fn disengage(&mut self, validator: Self::Validator);
}
