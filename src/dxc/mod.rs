//! Native DXC validator backend
//!
//! Thin adapter over `hassle-rs`: `dxcompiler` provides the `IDxcLibrary`
//! used for blob handling and text conversion, `dxil` the `IDxcValidator`
//! that validates and signs. `hassle-rs` always validates with the in-place
//! edit flag and hands the validated blob back on success.

mod loader;

pub use loader::DxcLoader;

use std::marker::PhantomData;

use hassle_rs::{Dxc, DxcLibrary, Dxil, HassleError};

use crate::validator::{
    OperationResult, OperationStatus, Validator, ValidatorError, ValidatorFlags, ValidatorVersion,
};

fn call_failed(operation: &'static str) -> impl FnOnce(HassleError) -> ValidatorError {
    move |e| ValidatorError::CallFailed {
        operation,
        message: e.to_string(),
    }
}

fn instance_failed(object: &'static str) -> impl FnOnce(HassleError) -> ValidatorError {
    move |e| ValidatorError::InstanceCreation {
        object,
        message: e.to_string(),
    }
}

/// Engaged native validator.
pub struct DxcValidator {
    // Field order is drop order: interfaces before the libraries behind them.
    library: DxcLibrary,
    validator: hassle_rs::DxcValidator,
    _dxil: Dxil,
    _dxc: Dxc,
}

impl DxcValidator {
    fn create(dxc: Dxc, dxil: Dxil) -> Result<Self, ValidatorError> {
        let library = dxc.create_library().map_err(instance_failed("IDxcLibrary"))?;
        let validator = dxil
            .create_validator()
            .map_err(instance_failed("IDxcValidator"))?;
        Ok(Self {
            library,
            validator,
            _dxil: dxil,
            _dxc: dxc,
        })
    }
}

/// Binary blob pinned over the caller's buffer.
pub struct DxcBlob<'a> {
    blob: hassle_rs::DxcBlob,
    _buffer: PhantomData<&'a mut [u8]>,
}

/// Error text blob from a rejected validation.
pub struct DxcErrorBuffer {
    blob: hassle_rs::DxcBlob,
}

/// Result of one validate call.
pub enum DxcOperationResult {
    /// Validation passed; holds the bytes of the validated blob.
    Accepted { signed: Vec<u8> },
    /// Validation failed or the call itself did.
    Rejected {
        result: hassle_rs::DxcOperationResult,
        error: String,
    },
}

impl OperationResult for DxcOperationResult {
    type ErrorBuffer = DxcErrorBuffer;

    fn status(&self) -> Result<OperationStatus, ValidatorError> {
        let (result, error) = match self {
            DxcOperationResult::Accepted { .. } => return Ok(OperationStatus::Succeeded),
            DxcOperationResult::Rejected { result, error } => (result, error),
        };

        let status = result
            .get_status()
            .map_err(call_failed("IDxcOperationResult::GetStatus"))?;
        match OperationStatus::from_hresult(status as i32) {
            OperationStatus::Failed(code) => Ok(OperationStatus::Failed(code)),
            // Content passed but the validate call failed
            OperationStatus::Succeeded => Err(ValidatorError::CallFailed {
                operation: "IDxcValidator::Validate",
                message: error.clone(),
            }),
        }
    }

    fn result_buffer(&self) -> Result<Option<Vec<u8>>, ValidatorError> {
        match self {
            DxcOperationResult::Accepted { signed } => Ok(Some(signed.clone())),
            DxcOperationResult::Rejected { .. } => Ok(None),
        }
    }

    fn error_buffer(&self) -> Result<Option<DxcErrorBuffer>, ValidatorError> {
        match self {
            DxcOperationResult::Accepted { .. } => Ok(None),
            DxcOperationResult::Rejected { result, .. } => {
                let encoded = result
                    .get_error_buffer()
                    .map_err(call_failed("IDxcOperationResult::GetErrorBuffer"))?;
                Ok(Some(DxcErrorBuffer {
                    blob: encoded.into(),
                }))
            }
        }
    }
}

impl Validator for DxcValidator {
    type Blob<'a> = DxcBlob<'a>;
    type Outcome = DxcOperationResult;

    fn create_blob<'a>(&'a self, bytes: &'a mut [u8]) -> Result<DxcBlob<'a>, ValidatorError> {
        if u32::try_from(bytes.len()).is_err() {
            return Err(ValidatorError::BlobTooLarge { len: bytes.len() });
        }

        let encoded = self
            .library
            .create_blob_with_encoding(bytes)
            .map_err(call_failed("IDxcLibrary::CreateBlobWithEncodingFromPinned"))?;
        Ok(DxcBlob {
            blob: encoded.into(),
            _buffer: PhantomData,
        })
    }

    fn validate(
        &self,
        blob: DxcBlob<'_>,
        flags: ValidatorFlags,
    ) -> Result<DxcOperationResult, ValidatorError> {
        if !flags.contains(ValidatorFlags::IN_PLACE_EDIT) {
            return Err(ValidatorError::Unsupported("validation without in-place edit"));
        }

        match self.validator.validate(blob.blob) {
            Ok(validated) => Ok(DxcOperationResult::Accepted {
                signed: validated.to_vec::<u8>(),
            }),
            Err((result, error)) => Ok(DxcOperationResult::Rejected {
                result,
                error: error.to_string(),
            }),
        }
    }

    fn error_to_utf8(&self, buffer: &DxcErrorBuffer) -> Result<String, ValidatorError> {
        self.library
            .get_blob_as_string(&buffer.blob)
            .map_err(|_| ValidatorError::ConversionUnavailable)
    }

    fn version(&self) -> Result<ValidatorVersion, ValidatorError> {
        let (major, minor) = self
            .validator
            .version()
            .map_err(call_failed("IDxcVersionInfo::GetVersion"))?;
        Ok(ValidatorVersion { major, minor })
    }
}
