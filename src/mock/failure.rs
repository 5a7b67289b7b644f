//! Failure injection for the mock validator
//!
//! Lets tests break any single capability call to exercise the
//! engagement/ABI failure paths.

use std::collections::HashMap;

use crate::validator::ValidatorError;

/// Capability calls that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Engage,
    CreateBlob,
    Validate,
    Status,
    ResultBuffer,
    ErrorBuffer,
    Utf8Conversion,
    Version,
}

impl MockOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            MockOperation::Engage => "engage",
            MockOperation::CreateBlob => "create_blob",
            MockOperation::Validate => "validate",
            MockOperation::Status => "status",
            MockOperation::ResultBuffer => "result_buffer",
            MockOperation::ErrorBuffer => "error_buffer",
            MockOperation::Utf8Conversion => "utf8_conversion",
            MockOperation::Version => "version",
        }
    }
}

/// Per-operation failure table
#[derive(Debug, Default)]
pub struct FailureInjector {
    messages: HashMap<MockOperation, String>,
}

impl FailureInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `op` fail with `message`
    pub fn inject(&mut self, op: MockOperation, message: impl Into<String>) {
        self.messages.insert(op, message.into());
    }

    /// The error a call to `op` should fail with, if any
    pub fn check(&self, op: MockOperation) -> Option<ValidatorError> {
        self.messages.get(&op).map(|message| ValidatorError::Injected {
            operation: op.as_str().to_string(),
            message: message.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_injection() {
        let injector = FailureInjector::new();
        assert!(injector.check(MockOperation::Validate).is_none());
    }

    #[test]
    fn test_injected_error() {
        let mut injector = FailureInjector::new();
        injector.inject(MockOperation::Validate, "abi mismatch");

        let err = injector.check(MockOperation::Validate).unwrap();
        assert_eq!(
            err.to_string(),
            "injected failure in validate: abi mismatch"
        );
        assert!(injector.check(MockOperation::Engage).is_none());
    }

    #[test]
    fn test_injection_is_persistent() {
        let mut injector = FailureInjector::new();
        injector.inject(MockOperation::Engage, "busy");

        for _ in 0..3 {
            assert!(injector.check(MockOperation::Engage).is_some());
        }
    }
}
