//! Content hashing for generated sprites

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// A SHA-256 fingerprint of a file or buffer.
///
/// Recorded for every sprite written so that reruns can be compared
/// against earlier output.
#[derive(Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Compute a hash from bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Compute a hash from a file's contents
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes(&data))
    }

    /// Get the hash as a hex string
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_bytes_same_hash() {
        assert_eq!(ContentHash::from_bytes(b"pmm"), ContentHash::from_bytes(b"pmm"));
        assert_ne!(ContentHash::from_bytes(b"pmm"), ContentHash::from_bytes(b"svd"));
    }

    #[test]
    fn test_hex_forms() {
        let h = ContentHash::from_bytes(b"sprite");
        assert_eq!(h.to_hex().len(), 64);
        assert_eq!(h.to_string().len(), 16);
        assert!(h.to_hex().starts_with(&h.to_string()));
    }

    #[test]
    fn test_from_file_matches_bytes() {
        let path = std::env::temp_dir().join(format!(
            "vityaz_hash_test_{}.bin",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, b"\x89PNG").unwrap();
        let from_file = ContentHash::from_file(&path).unwrap();
        assert_eq!(from_file, ContentHash::from_bytes(b"\x89PNG"));
        std::fs::remove_file(&path).ok();
    }
}
