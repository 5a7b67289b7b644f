//! Failure taxonomy and stable exit codes
//!
//! Exit code 2 is reserved for content rejected by the validator; every
//! other failure, including command-line usage errors, exits with 1.

use std::io;
use std::path::PathBuf;

use dxil_container::{ContainerError, Digest};
use thiserror::Error;

use crate::config::ConfigError;
use crate::state::WorkflowStateError;
use crate::validator::ValidatorError;

/// Stable process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    /// Container signed and written
    #[default]
    Success = 0,
    /// Infrastructure or precondition failure
    Failure = 1,
    /// Container rejected by the validator
    ValidationFailed = 2,
}

impl ExitCode {
    /// Get the integer value of the exit code
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }
}

/// Every way a signing invocation can end without output.
#[derive(Debug, Error)]
pub enum SigningFailure {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed container: {0}")]
    MalformedContainer(#[from] ContainerError),

    #[error("container is already signed (digest {digest})")]
    AlreadySigned { digest: Digest },

    #[error("validator unavailable: {0}")]
    ValidatorUnavailable(#[from] ValidatorError),

    #[error("validation failed: {diagnostic}")]
    ValidationFailed { diagnostic: String },

    #[error("validator reported success but the container is still unsigned")]
    SigningDidNotTakeEffect,

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("workflow error: {0}")]
    State(#[from] WorkflowStateError),
}

impl SigningFailure {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SigningFailure::Io {
            path: path.into(),
            source,
        }
    }

    /// Get the exit code for this failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            SigningFailure::ValidationFailed { .. } => ExitCode::ValidationFailed,
            SigningFailure::Io { .. }
            | SigningFailure::MalformedContainer(_)
            | SigningFailure::AlreadySigned { .. }
            | SigningFailure::ValidatorUnavailable(_)
            | SigningFailure::SigningDidNotTakeEffect
            | SigningFailure::Config(_)
            | SigningFailure::State(_) => ExitCode::Failure,
        }
    }

    /// Short machine-readable name, used for logs and workflow history
    pub fn kind(&self) -> FailureKind {
        match self {
            SigningFailure::Io { .. } => FailureKind::Io,
            SigningFailure::MalformedContainer(_) => FailureKind::MalformedContainer,
            SigningFailure::AlreadySigned { .. } => FailureKind::AlreadySigned,
            SigningFailure::ValidatorUnavailable(_) => FailureKind::ValidatorUnavailable,
            SigningFailure::ValidationFailed { .. } => FailureKind::ValidationFailed,
            SigningFailure::SigningDidNotTakeEffect => FailureKind::SigningDidNotTakeEffect,
            SigningFailure::Config(_) => FailureKind::Config,
            SigningFailure::State(_) => FailureKind::State,
        }
    }
}

/// Failure category without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Io,
    MalformedContainer,
    AlreadySigned,
    ValidatorUnavailable,
    ValidationFailed,
    SigningDidNotTakeEffect,
    Config,
    State,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Io => "IO_ERROR",
            FailureKind::MalformedContainer => "MALFORMED_CONTAINER",
            FailureKind::AlreadySigned => "ALREADY_SIGNED",
            FailureKind::ValidatorUnavailable => "VALIDATOR_UNAVAILABLE",
            FailureKind::ValidationFailed => "VALIDATION_FAILED",
            FailureKind::SigningDidNotTakeEffect => "SIGNING_DID_NOT_TAKE_EFFECT",
            FailureKind::Config => "CONFIG_ERROR",
            FailureKind::State => "STATE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::Failure.as_i32(), 1);
        assert_eq!(ExitCode::ValidationFailed.as_i32(), 2);
        assert_eq!(ExitCode::default(), ExitCode::Success);
    }

    #[test]
    fn test_only_validation_failure_exits_two() {
        let failures = vec![
            SigningFailure::io("in.dxil", io::Error::from(io::ErrorKind::NotFound)),
            SigningFailure::MalformedContainer(ContainerError::Truncated { len: 3 }),
            SigningFailure::AlreadySigned {
                digest: Digest::from_words([1, 0, 0, 0]),
            },
            SigningFailure::ValidatorUnavailable(ValidatorError::ConversionUnavailable),
            SigningFailure::SigningDidNotTakeEffect,
        ];
        for failure in failures {
            assert_eq!(failure.exit_code(), ExitCode::Failure, "{failure}");
        }

        let rejected = SigningFailure::ValidationFailed {
            diagnostic: "bad bitcode".to_string(),
        };
        assert_eq!(rejected.exit_code(), ExitCode::ValidationFailed);
    }

    #[test]
    fn test_validation_failed_message_is_verbatim() {
        let failure = SigningFailure::ValidationFailed {
            diagnostic: "bad bitcode".to_string(),
        };
        assert_eq!(failure.to_string(), "validation failed: bad bitcode");
        assert_eq!(failure.kind().as_str(), "VALIDATION_FAILED");
    }

    #[test]
    fn test_io_message_names_path() {
        let failure = SigningFailure::io(
            "/missing/in.dxil",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        assert_eq!(failure.to_string(), "I/O error on /missing/in.dxil: not found");
        assert_eq!(failure.kind(), FailureKind::Io);
    }
}
