//! Scoped validator engagement
//!
//! A session engages the validator on creation and disengages it when
//! dropped, so every exit path of the signing stage releases the library,
//! early `?` returns included.

use std::mem::ManuallyDrop;
use std::ops::Deref;

use super::{ValidatorError, ValidatorLoader};

/// Engaged validator tied to the loader that produced it.
///
/// The validator is released when this struct is dropped.
pub struct ValidatorSession<'l, L: ValidatorLoader> {
    loader: &'l mut L,
    // Taken exactly once, in Drop.
    validator: ManuallyDrop<L::Validator>,
}

impl<'l, L: ValidatorLoader> ValidatorSession<'l, L> {
    /// Engage a validator through `loader`.
    pub fn engage(loader: &'l mut L) -> Result<Self, ValidatorError> {
        let validator = loader.engage()?;
        tracing::debug!("validator engaged");
        Ok(Self {
            loader,
            validator: ManuallyDrop::new(validator),
        })
    }

    /// Release the validator now instead of at end of scope.
    pub fn close(self) {
        drop(self);
    }
}

impl<L: ValidatorLoader> Deref for ValidatorSession<'_, L> {
    type Target = L::Validator;

    fn deref(&self) -> &Self::Target {
        &self.validator
    }
}

impl<L: ValidatorLoader> Drop for ValidatorSession<'_, L> {
    fn drop(&mut self) {
        // SAFETY: `validator` is initialized from construction until here and
        // is never touched again once taken.
        let validator = unsafe { ManuallyDrop::take(&mut self.validator) };
        self.loader.disengage(validator);
        tracing::debug!("validator disengaged");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBehavior, MockLoader, MockOperation};
    use crate::validator::Validator;

    #[test]
    fn test_session_disengages_on_drop() {
        let mut loader = MockLoader::new(MockBehavior::SignInPlace);
        let calls = loader.calls();

        {
            let _session = ValidatorSession::engage(&mut loader).unwrap();
            assert_eq!(calls.snapshot().engaged, 1);
            assert_eq!(calls.snapshot().disengaged, 0);
        }

        assert_eq!(calls.snapshot().engaged, 1);
        assert_eq!(calls.snapshot().disengaged, 1);
    }

    #[test]
    fn test_close_releases_once() {
        let mut loader = MockLoader::new(MockBehavior::SignInPlace);
        let calls = loader.calls();

        let session = ValidatorSession::engage(&mut loader).unwrap();
        session.close();

        assert_eq!(calls.snapshot().disengaged, 1);
        assert!(calls.snapshot().is_balanced());
    }

    #[test]
    fn test_session_derefs_to_engaged_validator() {
        let mut loader = MockLoader::new(MockBehavior::SignInPlace);
        let calls = loader.calls();

        let session = ValidatorSession::engage(&mut loader).unwrap();
        let version = session.version().unwrap();
        assert_eq!(version.to_string(), "1.8");
        assert_eq!(calls.snapshot().disengaged, 0);

        drop(session);
        assert_eq!(calls.snapshot().disengaged, 1);
    }

    #[test]
    fn test_failed_engage_does_not_disengage() {
        let mut loader = MockLoader::new(MockBehavior::SignInPlace);
        loader.inject_error(MockOperation::Engage, "library missing");
        let calls = loader.calls();

        let result = ValidatorSession::engage(&mut loader);
        assert!(matches!(result, Err(ValidatorError::Injected { .. })));
        assert_eq!(calls.snapshot().engaged, 0);
        assert_eq!(calls.snapshot().disengaged, 0);
    }

    #[test]
    fn test_release_on_early_return() {
        fn bail_out(loader: &mut MockLoader) -> Result<(), ValidatorError> {
            let _session = ValidatorSession::engage(loader)?;
            Err(ValidatorError::Unsupported("early return"))
        }

        let mut loader = MockLoader::new(MockBehavior::SignInPlace);
        let calls = loader.calls();

        assert!(bail_out(&mut loader).is_err());
        assert_eq!(calls.snapshot().engaged, 1);
        assert_eq!(calls.snapshot().disengaged, 1);
    }
}
