//! Scripted validator and loader
//!
//! The mock never inspects shader content. Its behavior is fixed up front
//! and it signs by writing [`MOCK_DIGEST`] into the header.

use std::sync::{Arc, Mutex, MutexGuard};

use dxil_container::{write_digest, Digest};

use crate::validator::{
    OperationResult, OperationStatus, Validator, ValidatorError, ValidatorFlags, ValidatorLoader,
    ValidatorVersion,
};

use super::failure::{FailureInjector, MockOperation};
use super::state::MockCalls;

/// Digest the mock writes when it signs.
pub const MOCK_DIGEST: Digest =
    Digest::from_words([0x1234_5678, 0x9ABC_DEF0, 0x0F1E_2D3C, 0x4B5A_6978]);

/// Status code reported for rejected content (E_FAIL).
pub const MOCK_REJECT_HRESULT: i32 = 0x8000_4005_u32 as i32;

/// What the mock does when asked to validate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBehavior {
    /// Write the digest into the caller's buffer when the in-place hint is
    /// set; return a signed copy otherwise.
    SignInPlace,
    /// Always return a signed copy and leave the caller's buffer alone.
    SignIntoNewBuffer,
    /// Report success without touching anything.
    SucceedWithoutSigning,
    /// Report success and return an unsigned copy.
    ReturnUnsignedCopy,
    /// Reject the content with a diagnostic.
    Reject { diagnostic: String },
    /// Reject the content without attaching an error buffer.
    RejectSilently,
}

impl MockBehavior {
    pub fn reject(diagnostic: impl Into<String>) -> Self {
        MockBehavior::Reject {
            diagnostic: diagnostic.into(),
        }
    }
}

type SharedInjector = Arc<Mutex<FailureInjector>>;

fn check(injector: &SharedInjector, op: MockOperation) -> Result<(), ValidatorError> {
    let guard: MutexGuard<'_, FailureInjector> =
        injector.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match guard.check(op) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Loader handing out [`MockValidator`]s.
#[derive(Debug, Clone)]
pub struct MockLoader {
    behavior: MockBehavior,
    failures: SharedInjector,
    calls: MockCalls,
    utf8_conversion: bool,
    version: Option<ValidatorVersion>,
}

impl MockLoader {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            failures: Arc::new(Mutex::new(FailureInjector::new())),
            calls: MockCalls::new(),
            utf8_conversion: true,
            version: Some(ValidatorVersion { major: 1, minor: 8 }),
        }
    }

    /// Drop the library UTF-8 conversion, as older validators lack it.
    pub fn without_utf8_conversion(mut self) -> Self {
        self.utf8_conversion = false;
        self
    }

    /// Report no version, as validators without version info do.
    pub fn without_version(mut self) -> Self {
        self.version = None;
        self
    }

    /// Handle onto the call counters; stays valid after the loader moves.
    pub fn calls(&self) -> MockCalls {
        self.calls.clone()
    }

    /// Make every call to `op` fail with `message`.
    pub fn inject_error(&self, op: MockOperation, message: impl Into<String>) {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .inject(op, message);
    }
}

impl ValidatorLoader for MockLoader {
    type Validator = MockValidator;

    fn engage(&mut self) -> Result<MockValidator, ValidatorError> {
        check(&self.failures, MockOperation::Engage)?;
        self.calls.record(|c| c.engaged += 1);

        Ok(MockValidator {
            behavior: self.behavior.clone(),
            failures: Arc::clone(&self.failures),
            calls: self.calls.clone(),
            utf8_conversion: self.utf8_conversion,
            version: self.version,
        })
    }

    fn disengage(&mut self, validator: MockValidator) {
        drop(validator);
        self.calls.record(|c| c.disengaged += 1);
    }
}

/// Validator double driven by a [`MockBehavior`].
#[derive(Debug)]
pub struct MockValidator {
    behavior: MockBehavior,
    failures: SharedInjector,
    calls: MockCalls,
    utf8_conversion: bool,
    version: Option<ValidatorVersion>,
}

/// Blob over the caller's bytes.
#[derive(Debug)]
pub struct MockBlob<'a> {
    bytes: &'a mut [u8],
}

/// Diagnostic buffer as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockErrorBuffer(pub Vec<u8>);

/// Outcome of a mock validate call.
#[derive(Debug)]
pub struct MockOutcome {
    status: Result<OperationStatus, ValidatorError>,
    result: Result<Option<Vec<u8>>, ValidatorError>,
    errors: Result<Option<MockErrorBuffer>, ValidatorError>,
}

impl OperationResult for MockOutcome {
    type ErrorBuffer = MockErrorBuffer;

    fn status(&self) -> Result<OperationStatus, ValidatorError> {
        self.status.clone()
    }

    fn result_buffer(&self) -> Result<Option<Vec<u8>>, ValidatorError> {
        self.result.clone()
    }

    fn error_buffer(&self) -> Result<Option<MockErrorBuffer>, ValidatorError> {
        self.errors.clone()
    }
}

fn signed_copy(bytes: &[u8]) -> Result<Vec<u8>, ValidatorError> {
    let mut copy = bytes.to_vec();
    write_digest(&mut copy, MOCK_DIGEST).map_err(|e| ValidatorError::Injected {
        operation: "sign".to_string(),
        message: e.to_string(),
    })?;
    Ok(copy)
}

impl Validator for MockValidator {
    type Blob<'a> = MockBlob<'a>;
    type Outcome = MockOutcome;

    fn create_blob<'a>(&'a self, bytes: &'a mut [u8]) -> Result<MockBlob<'a>, ValidatorError> {
        check(&self.failures, MockOperation::CreateBlob)?;
        self.calls.record(|c| c.blobs_created += 1);
        Ok(MockBlob { bytes })
    }

    fn validate(
        &self,
        blob: MockBlob<'_>,
        flags: ValidatorFlags,
    ) -> Result<MockOutcome, ValidatorError> {
        self.calls.record(|c| {
            c.validations += 1;
            c.last_flags = Some(flags);
        });
        check(&self.failures, MockOperation::Validate)?;

        let (status, result, errors) = match &self.behavior {
            MockBehavior::SignInPlace if flags.contains(ValidatorFlags::IN_PLACE_EDIT) => {
                let written = write_digest(&mut *blob.bytes, MOCK_DIGEST);
                if written.is_err() {
                    (OperationStatus::Failed(MOCK_REJECT_HRESULT), None, None)
                } else {
                    (OperationStatus::Succeeded, None, None)
                }
            }
            MockBehavior::SignInPlace | MockBehavior::SignIntoNewBuffer => (
                OperationStatus::Succeeded,
                Some(signed_copy(&*blob.bytes)?),
                None,
            ),
            MockBehavior::SucceedWithoutSigning => (OperationStatus::Succeeded, None, None),
            MockBehavior::ReturnUnsignedCopy => {
                (OperationStatus::Succeeded, Some(blob.bytes.to_vec()), None)
            }
            MockBehavior::Reject { diagnostic } => (
                OperationStatus::Failed(MOCK_REJECT_HRESULT),
                None,
                Some(MockErrorBuffer(diagnostic.as_bytes().to_vec())),
            ),
            MockBehavior::RejectSilently => {
                (OperationStatus::Failed(MOCK_REJECT_HRESULT), None, None)
            }
        };

        Ok(MockOutcome {
            status: check(&self.failures, MockOperation::Status).map(|()| status),
            result: check(&self.failures, MockOperation::ResultBuffer).map(|()| result),
            errors: check(&self.failures, MockOperation::ErrorBuffer).map(|()| errors),
        })
    }

    fn error_to_utf8(&self, buffer: &MockErrorBuffer) -> Result<String, ValidatorError> {
        if !self.utf8_conversion {
            return Err(ValidatorError::ConversionUnavailable);
        }
        check(&self.failures, MockOperation::Utf8Conversion)?;
        self.calls.record(|c| c.conversions += 1);
        Ok(String::from_utf8_lossy(&buffer.0).into_owned())
    }

    fn version(&self) -> Result<ValidatorVersion, ValidatorError> {
        check(&self.failures, MockOperation::Version)?;
        self.version
            .ok_or(ValidatorError::Unsupported("version query"))
    }
}
