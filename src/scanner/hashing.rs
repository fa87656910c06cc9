//! Content hashing for the identical-content check.

use sha1::{Digest, Sha1};

/// Hash primitive over file contents. Equal contents must give equal hashes.
pub trait ContentHasher {
    fn hash(&self, content: &[u8]) -> String;
}

/// SHA-1, lower-case hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha1Hasher;

impl ContentHasher for Sha1Hasher {
    fn hash(&self, content: &[u8]) -> String {
        let mut hasher = Sha1::new();
        hasher.update(content);
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha1_hex() {
        assert_eq!(
            Sha1Hasher.hash(b"abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(Sha1Hasher.hash(b"x"), Sha1Hasher.hash(b"x"));
        assert_ne!(Sha1Hasher.hash(b"x"), Sha1Hasher.hash(b"y"));
    }
}
