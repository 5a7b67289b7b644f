//! Mock Validator Implementation
//!
//! Scripted stand-in for the DXC validator, used by tests to drive every
//! signing path without loading a native library.
//!
//! # Behaviors
//!
//! - `SignInPlace`: honor the in-place hint and write the digest into the
//!   caller's buffer
//! - `SignIntoNewBuffer`: return a signed copy
//! - `SucceedWithoutSigning` / `ReturnUnsignedCopy`: report success but
//!   leave the digest zero
//! - `Reject`: fail with a diagnostic; `RejectSilently`: fail without one
//!
//! Any capability call can additionally be broken through failure injection.

mod failure;
mod state;
mod validator;

pub use failure::{FailureInjector, MockOperation};
pub use state::{CallCounts, MockCalls};
pub use validator::{
    MockBehavior, MockBlob, MockErrorBuffer, MockLoader, MockOutcome, MockValidator,
    MOCK_DIGEST, MOCK_REJECT_HRESULT,
};
