//! Signing orchestration
//!
//! Drives a [`Validator`] through one validate-in-place call and turns its
//! outcome into a single owned [`SignedBuffer`]:
//! 1. Refuse truncated or already signed containers
//! 2. Wrap the buffer in a binary blob and validate with the in-place hint
//! 3. On a failed status, extract the diagnostic text
//! 4. On success, take the returned buffer if there is one, otherwise the
//!    caller's buffer as the validator left it
//!
//! Whether the digest actually landed is checked separately by
//! [`crate::verify`].

use dxil_container::MinimalHeader;

use crate::error::SigningFailure;
use crate::validator::{OperationResult, OperationStatus, Validator, ValidatorFlags};

/// Which channel the validator used to hand back the signed bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultChannel {
    /// The caller's buffer was edited in place
    InPlace,
    /// The validator produced a separate output buffer
    Returned,
}

impl ResultChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultChannel::InPlace => "in_place",
            ResultChannel::Returned => "returned",
        }
    }
}

/// Owned result of a successful validate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBuffer {
    bytes: Vec<u8>,
    channel: ResultChannel,
}

impl SignedBuffer {
    pub fn new(bytes: Vec<u8>, channel: ResultChannel) -> Self {
        Self { bytes, channel }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn channel(&self) -> ResultChannel {
        self.channel
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Validate and sign `buffer`.
///
/// Takes ownership of the buffer because the validator may edit it in
/// place; the caller gets back whichever bytes the validator produced.
pub fn sign<V: Validator>(validator: &V, mut buffer: Vec<u8>) -> Result<SignedBuffer, SigningFailure> {
    let header = MinimalHeader::parse(&buffer)?;
    if header.is_signed() {
        return Err(SigningFailure::AlreadySigned {
            digest: header.digest(),
        });
    }

    let outcome = {
        let blob = validator.create_blob(&mut buffer)?;
        validator.validate(blob, ValidatorFlags::IN_PLACE_EDIT)?
    };

    match outcome.status()? {
        OperationStatus::Succeeded => {}
        OperationStatus::Failed(code) => {
            let diagnostic = extract_diagnostic(validator, &outcome);
            tracing::debug!(status = code, "validator rejected container");
            return Err(SigningFailure::ValidationFailed { diagnostic });
        }
    }

    match outcome.result_buffer()? {
        Some(returned) => Ok(SignedBuffer::new(returned, ResultChannel::Returned)),
        None => Ok(SignedBuffer::new(buffer, ResultChannel::InPlace)),
    }
}

/// Pull the diagnostic text out of a failed outcome.
///
/// Any trouble reading or converting the error buffer yields empty text;
/// the rejection itself is still reported.
fn extract_diagnostic<V: Validator>(validator: &V, outcome: &V::Outcome) -> String {
    let errors = match outcome.error_buffer() {
        Ok(Some(errors)) => errors,
        Ok(None) => return String::new(),
        Err(e) => {
            tracing::warn!(error = %e, "could not read validator error buffer");
            return String::new();
        }
    };

    match validator.error_to_utf8(&errors) {
        Ok(text) => text.trim_end_matches('\0').to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "validator diagnostic not convertible to UTF-8");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBehavior, MockLoader, MockOperation, MOCK_DIGEST};
    use crate::validator::{ValidatorError, ValidatorLoader};
    use dxil_container::{digest, is_signed, ContainerError, Digest};

    fn unsigned_container() -> Vec<u8> {
        let mut bytes = b"DXBC".to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(b"shader payload");
        bytes
    }

    fn sign_with(loader: &mut MockLoader, buffer: Vec<u8>) -> Result<SignedBuffer, SigningFailure> {
        let validator = loader.engage().unwrap();
        let result = sign(&validator, buffer);
        loader.disengage(validator);
        result
    }

    #[test]
    fn test_sign_in_place() {
        let mut loader = MockLoader::new(MockBehavior::SignInPlace);
        let signed = sign_with(&mut loader, unsigned_container()).unwrap();

        assert_eq!(signed.channel(), ResultChannel::InPlace);
        assert_eq!(digest(signed.as_bytes()).unwrap(), MOCK_DIGEST);
        assert_eq!(
            loader.calls().snapshot().last_flags,
            Some(ValidatorFlags::IN_PLACE_EDIT)
        );
    }

    #[test]
    fn test_sign_into_new_buffer() {
        let mut loader = MockLoader::new(MockBehavior::SignIntoNewBuffer);
        let signed = sign_with(&mut loader, unsigned_container()).unwrap();

        assert_eq!(signed.channel(), ResultChannel::Returned);
        assert!(is_signed(signed.as_bytes()).unwrap());
        assert_eq!(&signed.as_bytes()[20..], b"shader payload");
    }

    #[test]
    fn test_success_without_digest_is_passed_through() {
        let mut loader = MockLoader::new(MockBehavior::SucceedWithoutSigning);
        let signed = sign_with(&mut loader, unsigned_container()).unwrap();

        assert_eq!(signed.channel(), ResultChannel::InPlace);
        assert!(!is_signed(signed.as_bytes()).unwrap());
    }

    #[test]
    fn test_already_signed_never_reaches_validator() {
        let mut loader = MockLoader::new(MockBehavior::SignInPlace);
        let mut buffer = unsigned_container();
        dxil_container::write_digest(&mut buffer, Digest::from_words([0, 0, 5, 0])).unwrap();

        let err = sign_with(&mut loader, buffer).unwrap_err();
        match err {
            SigningFailure::AlreadySigned { digest } => {
                assert_eq!(digest.words(), [0, 0, 5, 0]);
            }
            other => panic!("expected AlreadySigned, got {other:?}"),
        }
        assert_eq!(loader.calls().snapshot().validations, 0);
        assert_eq!(loader.calls().snapshot().blobs_created, 0);
    }

    #[test]
    fn test_truncated_is_malformed() {
        let mut loader = MockLoader::new(MockBehavior::SignInPlace);
        let err = sign_with(&mut loader, vec![0u8; 19]).unwrap_err();
        assert!(matches!(
            err,
            SigningFailure::MalformedContainer(ContainerError::Truncated { len: 19 })
        ));
        assert_eq!(loader.calls().snapshot().validations, 0);
    }

    #[test]
    fn test_rejection_surfaces_diagnostic() {
        let mut loader = MockLoader::new(MockBehavior::reject("bad bitcode"));
        let err = sign_with(&mut loader, unsigned_container()).unwrap_err();

        match err {
            SigningFailure::ValidationFailed { diagnostic } => {
                assert_eq!(diagnostic, "bad bitcode");
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_rejection_strips_trailing_nul() {
        let mut loader = MockLoader::new(MockBehavior::reject("error: bad\0"));
        let err = sign_with(&mut loader, unsigned_container()).unwrap_err();
        assert!(matches!(
            err,
            SigningFailure::ValidationFailed { ref diagnostic } if diagnostic == "error: bad"
        ));
    }

    #[test]
    fn test_rejection_without_conversion_has_empty_diagnostic() {
        let mut loader =
            MockLoader::new(MockBehavior::reject("bad bitcode")).without_utf8_conversion();
        let err = sign_with(&mut loader, unsigned_container()).unwrap_err();

        assert!(matches!(
            err,
            SigningFailure::ValidationFailed { ref diagnostic } if diagnostic.is_empty()
        ));
    }

    #[test]
    fn test_rejection_without_error_buffer() {
        let mut loader = MockLoader::new(MockBehavior::RejectSilently);
        let err = sign_with(&mut loader, unsigned_container()).unwrap_err();
        assert!(matches!(
            err,
            SigningFailure::ValidationFailed { ref diagnostic } if diagnostic.is_empty()
        ));
    }

    #[test]
    fn test_unreadable_error_buffer_still_rejects() {
        let mut loader = MockLoader::new(MockBehavior::reject("bad bitcode"));
        loader.inject_error(MockOperation::ErrorBuffer, "no buffer");
        let err = sign_with(&mut loader, unsigned_container()).unwrap_err();
        assert!(matches!(
            err,
            SigningFailure::ValidationFailed { ref diagnostic } if diagnostic.is_empty()
        ));
    }

    #[test]
    fn test_abi_failures_are_validator_unavailable() {
        for op in [
            MockOperation::CreateBlob,
            MockOperation::Validate,
            MockOperation::Status,
            MockOperation::ResultBuffer,
        ] {
            let mut loader = MockLoader::new(MockBehavior::SignInPlace);
            loader.inject_error(op, "abi");
            let err = sign_with(&mut loader, unsigned_container()).unwrap_err();
            assert!(
                matches!(
                    err,
                    SigningFailure::ValidatorUnavailable(ValidatorError::Injected { .. })
                ),
                "{op:?}: {err:?}"
            );
        }
    }
}
