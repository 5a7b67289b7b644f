//! DXIL container signing
//!
//! Signs compiled shader containers by running them through an external
//! validator, which embeds a digest in the container header on success.
//! The workflow refuses already-signed input, never trusts a success status
//! without checking the digest, and only writes output once the digest is
//! confirmed.

pub mod config;
pub mod dxc;
pub mod error;
pub mod mock;
pub mod pipeline;
pub mod report;
pub mod signing;
pub mod state;
pub mod validator;
pub mod verify;

pub use dxil_container::{ContainerError, Digest, MinimalHeader, HEADER_SIZE};
pub use error::{ExitCode, FailureKind, SigningFailure};
pub use pipeline::{SigningPipeline, SigningReport, SigningRequest};
pub use report::run_and_report;
pub use signing::{sign, ResultChannel, SignedBuffer};
pub use validator::{Validator, ValidatorError, ValidatorLoader, ValidatorSession};
pub use verify::verify_signed;
