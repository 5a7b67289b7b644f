//! Post-condition verification
//!
//! The validator can report success without having written a digest, most
//! easily when it silently ignores the in-place hint. The signed result is
//! therefore always inspected again before anything is written.

use dxil_container::{Digest, MinimalHeader};

use crate::error::SigningFailure;
use crate::signing::SignedBuffer;

/// Confirm the signing result carries a digest, returning it.
pub fn verify_signed(signed: &SignedBuffer) -> Result<Digest, SigningFailure> {
    let header = MinimalHeader::parse(signed.as_bytes())?;
    if !header.is_signed() {
        return Err(SigningFailure::SigningDidNotTakeEffect);
    }
    Ok(header.digest())
}
