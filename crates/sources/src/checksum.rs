use crate::{Result, SourceError};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

pub const SHA256_PREFIX: &str = "sha256:";

/// Hex SHA-256 of a file, read in 1MB chunks.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 1024 * 1024];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compare a file against a `sha256:<hex>` checksum. Other schemes are not
/// checked and return `Ok(false)`.
pub fn verify_checksum(path: &Path, expected: &str) -> Result<bool> {
    let Some(want) = expected.trim().strip_prefix(SHA256_PREFIX) else {
        debug!(path=%path.display(), "checksum scheme not sha256, skipping");
        return Ok(false);
    };
    let actual = sha256_file(path)?;
    if !actual.eq_ignore_ascii_case(want) {
        warn!(path=%path.display(), expected=%want, actual=%actual, "checksum mismatch");
        return Err(SourceError::ChecksumMismatch {
            path: path.display().to_string(),
            expected: want.to_string(),
            actual,
        });
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_verify_checksum() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"test content").unwrap();
        f.flush().unwrap();

        let expected = format!("{:x}", Sha256::digest(b"test content"));
        assert_eq!(sha256_file(f.path()).unwrap(), expected);
        assert!(verify_checksum(f.path(), &format!("sha256:{expected}")).unwrap());
        assert!(!verify_checksum(f.path(), "md5:abc").unwrap());
        assert!(matches!(
            verify_checksum(f.path(), "sha256:00"),
            Err(SourceError::ChecksumMismatch { .. })
        ));
    }
}
