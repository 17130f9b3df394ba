//! Content digests used as cache keys for the hash lookup.
//!
//! MD5 is the default because it is the cheapest digest the service accepts.
//! The value is only a lookup key, never an integrity guarantee, so SHA-1 and
//! SHA-256 are drop-in alternatives with no change in workflow behavior.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Digest algorithms accepted by the hash lookup endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// MD5 (16 bytes).
    #[default]
    Md5,
    /// SHA-1 (20 bytes).
    Sha1,
    /// SHA-256 (32 bytes).
    Sha256,
}

impl DigestAlgorithm {
    /// Returns the digest length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => write!(f, "md5"),
            Self::Sha1 => write!(f, "sha1"),
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(format!("unsupported digest algorithm '{other}'")),
        }
    }
}

/// A fixed-size digest of a file's content.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest {
    algorithm: DigestAlgorithm,
    bytes: Vec<u8>,
}

impl ContentDigest {
    /// Computes the digest of `data` with the given algorithm.
    pub fn compute(algorithm: DigestAlgorithm, data: &[u8]) -> Self {
        use sha2::Digest;

        let bytes = match algorithm {
            DigestAlgorithm::Md5 => md5::Md5::digest(data).to_vec(),
            DigestAlgorithm::Sha1 => sha1::Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => sha2::Sha256::digest(data).to_vec(),
        };

        Self { algorithm, bytes }
    }

    /// Returns the algorithm that produced this digest.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the digest as lowercase hex, the form used in lookup URLs.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_md5() {
        let digest = ContentDigest::compute(DigestAlgorithm::Md5, b"hello world");
        assert_eq!(digest.to_hex(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
        assert_eq!(digest.as_bytes().len(), 16);
    }

    #[test]
    fn test_known_sha256() {
        let digest = ContentDigest::compute(DigestAlgorithm::Sha256, b"hello world");
        assert_eq!(
            digest.to_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_output_len_matches() {
        for algorithm in [DigestAlgorithm::Md5, DigestAlgorithm::Sha1, DigestAlgorithm::Sha256] {
            let digest = ContentDigest::compute(algorithm, b"payload");
            assert_eq!(digest.as_bytes().len(), algorithm.output_len());
            assert_eq!(digest.to_hex().len(), algorithm.output_len() * 2);
        }
    }

    #[test]
    fn test_digest_deterministic() {
        let data = b"test data for hashing";
        let first = ContentDigest::compute(DigestAlgorithm::Md5, data);
        let second = ContentDigest::compute(DigestAlgorithm::Md5, data);
        assert_eq!(first, second);
    }

    #[test]
    fn test_distinct_fixtures_do_not_collide() {
        let fixtures: [&[u8]; 5] = [b"", b"a", b"b", b"ab", b"ba"];
        let mut seen = std::collections::HashSet::new();
        for fixture in fixtures {
            assert!(seen.insert(ContentDigest::compute(DigestAlgorithm::Md5, fixture).to_hex()));
        }
    }

    #[test]
    fn test_algorithm_from_str() {
        assert_eq!("MD5".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Md5));
        assert_eq!("sha256".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Sha256));
        assert!("crc32".parse::<DigestAlgorithm>().is_err());
    }

    #[test]
    fn test_display() {
        let digest = ContentDigest::compute(DigestAlgorithm::Md5, b"hello world");
        assert_eq!(digest.to_string(), "md5:5eb63bbbe01eeed093cb22bb8f5acdc3");
    }
}
