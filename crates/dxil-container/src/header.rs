//! Borrowed view over the container's minimal header.

use thiserror::Error;

use crate::{Digest, DIGEST_OFFSET, DIGEST_WORDS, DXBC_FOUR_CC, FOUR_CC_SIZE, HEADER_SIZE};

/// Errors from header inspection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    #[error(
        "container is {len} bytes, shorter than the {}-byte minimal header",
        HEADER_SIZE
    )]
    Truncated { len: usize },
}

/// Fixed-layout view over the first [`HEADER_SIZE`] bytes of a container.
///
/// The view reads straight from the caller's buffer; nothing is copied until
/// a field is requested.
#[derive(Debug, Clone, Copy)]
pub struct MinimalHeader<'a> {
    bytes: &'a [u8; HEADER_SIZE],
}

impl<'a> MinimalHeader<'a> {
    /// Interpret the start of `buffer` as a minimal header.
    pub fn parse(buffer: &'a [u8]) -> Result<Self, ContainerError> {
        let bytes = buffer
            .get(..HEADER_SIZE)
            .and_then(|prefix| <&[u8; HEADER_SIZE]>::try_from(prefix).ok())
            .ok_or(ContainerError::Truncated { len: buffer.len() })?;

        Ok(Self { bytes })
    }

    /// The 4-byte format tag.
    pub fn four_cc(&self) -> [u8; FOUR_CC_SIZE] {
        let mut tag = [0u8; FOUR_CC_SIZE];
        tag.copy_from_slice(&self.bytes[..FOUR_CC_SIZE]);
        tag
    }

    /// Whether the tag is the one the shader compiler writes.
    pub fn has_known_four_cc(&self) -> bool {
        self.four_cc() == DXBC_FOUR_CC
    }

    /// Read the digest word at `index` (0..4).
    fn word(&self, index: usize) -> u32 {
        let start = DIGEST_OFFSET + index * 4;
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[start..start + 4]);
        u32::from_le_bytes(raw)
    }

    /// The digest words.
    pub fn digest(&self) -> Digest {
        let mut words = [0u32; DIGEST_WORDS];
        for (index, word) in words.iter_mut().enumerate() {
            *word = self.word(index);
        }
        Digest::from_words(words)
    }

    /// True iff any digest word is non-zero.
    pub fn is_signed(&self) -> bool {
        (0..DIGEST_WORDS).any(|index| self.word(index) != 0)
    }
}
