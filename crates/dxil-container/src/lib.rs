//! Minimal header inspection for DXIL shader containers.
//!
//! A container starts with a 4-byte format tag followed by a 128-bit digest
//! stored as four little-endian 32-bit words. An all-zero digest means the
//! container has not been signed by the validator. Everything after the
//! first [`HEADER_SIZE`] bytes is payload this crate never looks at.

mod digest;
mod header;

pub use digest::Digest;
pub use header::{ContainerError, MinimalHeader};

/// Size of the format tag in bytes.
pub const FOUR_CC_SIZE: usize = 4;

/// Number of 32-bit words in the digest.
pub const DIGEST_WORDS: usize = 4;

/// Byte offset of the digest within the container.
pub const DIGEST_OFFSET: usize = FOUR_CC_SIZE;

/// Size of the minimal header: format tag plus digest.
pub const HEADER_SIZE: usize = FOUR_CC_SIZE + DIGEST_WORDS * 4;

/// Format tag written by the shader compiler.
pub const DXBC_FOUR_CC: [u8; FOUR_CC_SIZE] = *b"DXBC";

/// Report whether the container carries a non-zero digest.
///
/// Fails with [`ContainerError::Truncated`] when the buffer cannot hold the
/// minimal header.
pub fn is_signed(buffer: &[u8]) -> Result<bool, ContainerError> {
    Ok(MinimalHeader::parse(buffer)?.is_signed())
}

/// Read the digest out of the container header.
pub fn digest(buffer: &[u8]) -> Result<Digest, ContainerError> {
    Ok(MinimalHeader::parse(buffer)?.digest())
}

/// Overwrite the digest words of the container header in place.
pub fn write_digest(buffer: &mut [u8], digest: Digest) -> Result<(), ContainerError> {
    if buffer.len() < HEADER_SIZE {
        return Err(ContainerError::Truncated { len: buffer.len() });
    }

    for (index, word) in digest.words().iter().enumerate() {
        let start = DIGEST_OFFSET + index * 4;
        buffer[start..start + 4].copy_from_slice(&word.to_le_bytes());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container_with_words(words: [u32; DIGEST_WORDS]) -> Vec<u8> {
        let mut buffer = DXBC_FOUR_CC.to_vec();
        for word in words {
            buffer.extend_from_slice(&word.to_le_bytes());
        }
        buffer.extend_from_slice(&[0xAB; 64]);
        buffer
    }

    #[test]
    fn test_header_size() {
        assert_eq!(HEADER_SIZE, 20);
        assert_eq!(DIGEST_OFFSET, 4);
    }

    #[test]
    fn test_truncated_buffers_rejected() {
        let bytes = [0xFFu8; HEADER_SIZE];
        for len in 0..HEADER_SIZE {
            let err = is_signed(&bytes[..len]).unwrap_err();
            assert_eq!(err, ContainerError::Truncated { len });
        }
    }

    #[test]
    fn test_exact_header_size_accepted() {
        let bytes = [0u8; HEADER_SIZE];
        assert_eq!(is_signed(&bytes), Ok(false));
    }

    #[test]
    fn test_all_word_combinations() {
        for mask in 0u32..16 {
            let mut words = [0u32; DIGEST_WORDS];
            for (bit, word) in words.iter_mut().enumerate() {
                if mask & (1 << bit) != 0 {
                    *word = 0x1000_0001 << bit;
                }
            }

            let buffer = container_with_words(words);
            assert_eq!(
                is_signed(&buffer).unwrap(),
                mask != 0,
                "digest words {:08x?} (mask {:04b})",
                words,
                mask
            );
        }
    }

    #[test]
    fn test_single_bit_in_last_word_counts() {
        let buffer = container_with_words([0, 0, 0, 1]);
        assert!(is_signed(&buffer).unwrap());
    }

    #[test]
    fn test_inspection_is_idempotent() {
        let unsigned = container_with_words([0; 4]);
        let signed = container_with_words([7, 0, 0, 9]);

        assert_eq!(is_signed(&unsigned), is_signed(&unsigned));
        assert_eq!(is_signed(&signed), is_signed(&signed));
        assert_eq!(unsigned, container_with_words([0; 4]));
    }

    #[test]
    fn test_payload_is_ignored() {
        let mut buffer = container_with_words([0; 4]);
        buffer.truncate(HEADER_SIZE);
        assert!(!is_signed(&buffer).unwrap());

        buffer.extend_from_slice(&[0xFF; 128]);
        assert!(!is_signed(&buffer).unwrap());
    }

    #[test]
    fn test_write_digest_roundtrip() {
        let mut buffer = container_with_words([0; 4]);
        let payload = buffer[HEADER_SIZE..].to_vec();

        let written = Digest::from_words([0xDEAD_BEEF, 1, 2, 3]);
        write_digest(&mut buffer, written).unwrap();

        assert_eq!(digest(&buffer).unwrap(), written);
        assert!(is_signed(&buffer).unwrap());
        assert_eq!(&buffer[..4], b"DXBC");
        assert_eq!(&buffer[HEADER_SIZE..], payload.as_slice());
    }

    #[test]
    fn test_write_digest_truncated() {
        let mut buffer = vec![0u8; 10];
        let err = write_digest(&mut buffer, Digest::from_words([1, 1, 1, 1])).unwrap_err();
        assert_eq!(err, ContainerError::Truncated { len: 10 });
        assert_eq!(buffer, vec![0u8; 10]);
    }
}
