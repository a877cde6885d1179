//! BagIt checksum algorithms and multi-digest hashing
//!
//! A bag may carry manifests for several algorithms at once, so every digest
//! computation here works over a set of algorithms in a single pass. The
//! [`DigestWriter`] tees written bytes into all hashers, which lets callers
//! write a file and learn its digests without reading it back.

use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

/// Digest algorithms that may appear in `manifest-<alg>.txt` file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl ChecksumAlgorithm {
    pub const ALL: [ChecksumAlgorithm; 3] =
        [ChecksumAlgorithm::Md5, ChecksumAlgorithm::Sha1, ChecksumAlgorithm::Sha256];

    /// Name used in BagIt manifest file names
    pub fn bagit_name(self) -> &'static str {
        match self {
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Sha256 => "sha256",
        }
    }
}

impl std::str::FromStr for ChecksumAlgorithm {
    type Err = VaultError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(ChecksumAlgorithm::Md5),
            "sha1" | "sha-1" => Ok(ChecksumAlgorithm::Sha1),
            "sha256" | "sha-256" => Ok(ChecksumAlgorithm::Sha256),
            _ => Err(VaultError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.bagit_name())
    }
}

enum Hasher {
    Md5(md5::Context),
    Sha1(Sha1),
    Sha256(Sha256),
}

impl Hasher {
    fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Md5 => Hasher::Md5(md5::Context::new()),
            ChecksumAlgorithm::Sha1 => Hasher::Sha1(Sha1::new()),
            ChecksumAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Md5(ctx) => ctx.consume(data),
            Hasher::Sha1(hasher) => hasher.update(data),
            Hasher::Sha256(hasher) => hasher.update(data),
        }
    }

    fn finalize(self) -> String {
        match self {
            Hasher::Md5(ctx) => format!("{:x}", ctx.compute()),
            Hasher::Sha1(hasher) => hex::encode(hasher.finalize()),
            Hasher::Sha256(hasher) => hex::encode(hasher.finalize()),
        }
    }
}

/// Hashes one byte stream with several algorithms at once
pub struct MultiDigest {
    hashers: Vec<(ChecksumAlgorithm, Hasher)>,
}

impl MultiDigest {
    pub fn new(algorithms: impl IntoIterator<Item = ChecksumAlgorithm>) -> Self {
        let mut hashers: Vec<(ChecksumAlgorithm, Hasher)> = Vec::new();
        for algorithm in algorithms {
            if !hashers.iter().any(|(a, _)| *a == algorithm) {
                hashers.push((algorithm, Hasher::new(algorithm)));
            }
        }
        Self { hashers }
    }

    pub fn update(&mut self, data: &[u8]) {
        for (_, hasher) in &mut self.hashers {
            hasher.update(data);
        }
    }

    /// Lowercase hex digest per algorithm
    pub fn finalize(self) -> BTreeMap<ChecksumAlgorithm, String> {
        self.hashers
            .into_iter()
            .map(|(algorithm, hasher)| (algorithm, hasher.finalize()))
            .collect()
    }
}

/// Writer adapter that digests every byte accepted by the inner writer
pub struct DigestWriter<W: Write> {
    inner: W,
    digest: MultiDigest,
}

impl<W: Write> DigestWriter<W> {
    pub fn new(inner: W, algorithms: impl IntoIterator<Item = ChecksumAlgorithm>) -> Self {
        Self {
            inner,
            digest: MultiDigest::new(algorithms),
        }
    }

    /// Flush the inner writer and return it together with the digests
    pub fn finish(mut self) -> Result<(W, BTreeMap<ChecksumAlgorithm, String>)> {
        self.inner.flush()?;
        Ok((self.inner, self.digest.finalize()))
    }
}

impl<W: Write> Write for DigestWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.digest.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Compute digests for any readable source
pub fn compute_digests<R: Read>(
    reader: &mut R,
    algorithms: impl IntoIterator<Item = ChecksumAlgorithm>,
) -> Result<BTreeMap<ChecksumAlgorithm, String>> {
    let mut digest = MultiDigest::new(algorithms);
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        digest.update(&buffer[..bytes_read]);
    }

    Ok(digest.finalize())
}

/// Compute digests for a file
pub fn compute_file_digests(
    path: impl AsRef<Path>,
    algorithms: impl IntoIterator<Item = ChecksumAlgorithm>,
) -> Result<BTreeMap<ChecksumAlgorithm, String>> {
    let mut file = std::fs::File::open(path)?;
    compute_digests(&mut file, algorithms)
}

/// Compute a single digest for a file
pub fn compute_file_checksum(path: impl AsRef<Path>, algorithm: ChecksumAlgorithm) -> Result<String> {
    let mut digests = compute_file_digests(path, [algorithm])?;
    digests
        .remove(&algorithm)
        .ok_or_else(|| VaultError::UnsupportedAlgorithm(algorithm.to_string()))
}

/// Verify a file against an expected digest
pub fn verify_file_checksum(
    path: impl AsRef<Path>,
    expected: &str,
    algorithm: ChecksumAlgorithm,
) -> Result<()> {
    let path = path.as_ref();
    let actual = compute_file_checksum(path, algorithm)?;
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(VaultError::ChecksumMismatch {
            path: path.display().to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HELLO_MD5: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3";
    const HELLO_SHA1: &str = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";
    const HELLO_SHA256: &str = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";

    #[test]
    fn test_compute_digests_all_algorithms() {
        let mut cursor = Cursor::new(b"hello world");
        let digests = compute_digests(&mut cursor, ChecksumAlgorithm::ALL).unwrap();

        assert_eq!(digests[&ChecksumAlgorithm::Md5], HELLO_MD5);
        assert_eq!(digests[&ChecksumAlgorithm::Sha1], HELLO_SHA1);
        assert_eq!(digests[&ChecksumAlgorithm::Sha256], HELLO_SHA256);
    }

    #[test]
    fn test_digest_writer_tees_bytes() {
        let mut writer = DigestWriter::new(Vec::new(), [ChecksumAlgorithm::Md5, ChecksumAlgorithm::Sha1]);
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();

        let (bytes, digests) = writer.finish().unwrap();
        assert_eq!(bytes, b"hello world");
        assert_eq!(digests.len(), 2);
        assert_eq!(digests[&ChecksumAlgorithm::Md5], HELLO_MD5);
        assert_eq!(digests[&ChecksumAlgorithm::Sha1], HELLO_SHA1);
    }

    #[test]
    fn test_duplicate_algorithms_are_collapsed() {
        let digest = MultiDigest::new([ChecksumAlgorithm::Sha256, ChecksumAlgorithm::Sha256]);
        assert_eq!(digest.finalize().len(), 1);
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!("SHA-256".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha256);
        assert_eq!("sha1".parse::<ChecksumAlgorithm>().unwrap(), ChecksumAlgorithm::Sha1);
        assert!("sha512".parse::<ChecksumAlgorithm>().is_err());
        assert_eq!(ChecksumAlgorithm::Md5.to_string(), "md5");
    }

    #[test]
    fn test_verify_file_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, "hello world").unwrap();

        verify_file_checksum(&path, HELLO_SHA256, ChecksumAlgorithm::Sha256).unwrap();
        let err = verify_file_checksum(&path, HELLO_MD5, ChecksumAlgorithm::Sha256).unwrap_err();
        assert!(matches!(err, VaultError::ChecksumMismatch { .. }));
    }
}
