//! Container digest value.

use std::fmt;

use crate::DIGEST_WORDS;

/// The 128-bit digest embedded in a container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Digest([u32; DIGEST_WORDS]);

impl Digest {
    /// The digest of an unsigned container.
    pub const ZERO: Digest = Digest([0; DIGEST_WORDS]);

    /// Build a digest from its four words.
    pub const fn from_words(words: [u32; DIGEST_WORDS]) -> Self {
        Self(words)
    }

    /// The four digest words in header order.
    pub fn words(&self) -> [u32; DIGEST_WORDS] {
        self.0
    }

    /// True when no word is set.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|word| *word == 0)
    }

    /// Lower-case hex of the digest bytes as they appear on disk.
    pub fn to_hex(&self) -> String {
        let mut bytes = Vec::with_capacity(DIGEST_WORDS * 4);
        for word in self.0 {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        hex::encode(bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        assert!(Digest::ZERO.is_zero());
        assert!(Digest::default().is_zero());
        assert!(!Digest::from_words([0, 0, 1, 0]).is_zero());
    }

    #[test]
    fn test_hex_uses_disk_byte_order() {
        let digest = Digest::from_words([0x0403_0201, 0, 0, 0xFF00_0000]);
        assert_eq!(digest.to_hex(), "010203040000000000000000000000ff");
        assert_eq!(digest.to_string(), digest.to_hex());
    }
}
