//! Content codec for file transfer.
//!
//! Files travel inside a single JSON request body, so the codec:
//! - caps the file size at 1 MiB
//! - sends text verbatim and binary as `base64:`-prefixed standard base64
//! - fingerprints the raw bytes with MD5 (change detection only)

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Largest file that can be transferred in one request.
pub const MAX_FILE_SIZE: u64 = 1_048_576;

/// Number of leading bytes inspected by the binary heuristic.
pub const BINARY_SNIFF_LEN: usize = 8192;

/// Sentinel prefix for base64-framed content.
pub const BASE64_PREFIX: &str = "base64:";

/// A file encoded for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    /// Wire content (verbatim text or `base64:` framed)
    pub content: String,
    /// Lower-case hex MD5 of the raw bytes
    pub hash: String,
    /// Size of the raw bytes
    pub size: u64,
}

impl EncodedFile {
    /// Whether the content was framed as base64.
    pub fn is_base64(&self) -> bool {
        self.content.starts_with(BASE64_PREFIX)
    }
}

/// MD5 fingerprint of raw bytes, hex encoded.
pub fn content_hash(bytes: &[u8]) -> String {
    format!("{:x}", md5::compute(bytes))
}

/// Classify bytes as binary if a NUL byte appears in the first 8 KiB.
///
/// Binary files without a NUL in that window are classified as text.
pub fn is_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0)
}

/// Encode an in-memory buffer. No size limit is applied here.
pub fn encode_bytes(bytes: &[u8]) -> EncodedFile {
    let hash = content_hash(bytes);
    let size = bytes.len() as u64;

    // Text must be valid UTF-8 and must not look like framed content
    let content = match (is_binary(bytes), std::str::from_utf8(bytes)) {
        (false, Ok(text)) if !text.starts_with(BASE64_PREFIX) => text.to_string(),
        _ => format!("{}{}", BASE64_PREFIX, STANDARD.encode(bytes)),
    };

    EncodedFile { content, hash, size }
}

/// Read and encode a file from disk.
pub fn encode_file(path: &Path) -> Result<EncodedFile> {
    let metadata = match fs::metadata(path) {
        Ok(m) if m.is_file() => m,
        Ok(_) => return Err(Error::FileNotFound(path.display().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    if metadata.len() > MAX_FILE_SIZE {
        return Err(Error::size_limit(path, metadata.len(), MAX_FILE_SIZE));
    }

    let bytes = fs::read(path)?;
    // The file may have grown between stat and read
    if bytes.len() as u64 > MAX_FILE_SIZE {
        return Err(Error::size_limit(path, bytes.len() as u64, MAX_FILE_SIZE));
    }

    let encoded = encode_bytes(&bytes);
    debug!(
        "Encoded {:?}: {} bytes, base64={}, hash={}",
        path,
        encoded.size,
        encoded.is_base64(),
        encoded.hash
    );
    Ok(encoded)
}

/// Hash a file's current bytes, or `None` if it does not exist.
pub fn hash_file(path: &Path) -> Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(content_hash(&bytes))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Decode wire content back into raw bytes.
pub fn decode_bytes(content: &str) -> Result<Vec<u8>> {
    match content.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => STANDARD
            .decode(encoded)
            .map_err(|e| Error::InvalidContent(format!("bad base64 payload: {}", e))),
        None => Ok(content.as_bytes().to_vec()),
    }
}

/// Decode wire content and write it to `path`, creating parent directories.
///
/// Returns the number of bytes written.
pub fn decode_to_file(path: &Path, content: &str) -> Result<u64> {
    let bytes = decode_bytes(content)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, &bytes)?;

    debug!("Wrote {} bytes to {:?}", bytes.len(), path);
    Ok(bytes.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;
    use tempfile::tempdir;

    fn roundtrip(bytes: &[u8]) -> Vec<u8> {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let dst = dir.path().join("out/nested/dst.bin");
        fs::write(&src, bytes).unwrap();

        let encoded = encode_file(&src).unwrap();
        decode_to_file(&dst, &encoded.content).unwrap();
        fs::read(&dst).unwrap()
    }

    #[test]
    fn test_roundtrip_edge_inputs() {
        assert_eq!(roundtrip(b""), b"");
        assert_eq!(roundtrip(&[0u8; 4096]), vec![0u8; 4096]);
        assert_eq!(roundtrip(b"fn main() {}\r\n"), b"fn main() {}\r\n");

        let mut random = vec![0u8; 64 * 1024];
        rand::thread_rng().fill_bytes(&mut random);
        assert_eq!(roundtrip(&random), random);
    }

    #[test]
    fn test_non_utf8_text_is_framed() {
        // No NUL byte, so classified as text, but not valid UTF-8
        let bytes = [0xff, 0xfe, b'a', b'b'];
        assert!(!is_binary(&bytes));

        let encoded = encode_bytes(&bytes);
        assert!(encoded.is_base64());
        assert_eq!(decode_bytes(&encoded.content).unwrap(), bytes);
    }

    #[test]
    fn test_text_with_prefix_is_framed() {
        for text in ["base64:aGVsbG8=", "base64: notes about encodings\n"] {
            let encoded = encode_bytes(text.as_bytes());
            assert!(encoded.is_base64());
            assert_ne!(encoded.content, text);
            assert_eq!(decode_bytes(&encoded.content).unwrap(), text.as_bytes());
        }
    }

    #[test]
    fn test_prefixed_file_survives_disk_round_trip() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("enc.txt");
        fs::write(&src, "base64:aGVsbG8=").unwrap();

        let encoded = encode_file(&src).unwrap();
        let dst = dir.path().join("out.txt");
        assert_eq!(decode_to_file(&dst, &encoded.content).unwrap(), 15);
        assert_eq!(fs::read_to_string(&dst).unwrap(), "base64:aGVsbG8=");
    }

    #[test]
    fn test_text_is_verbatim() {
        let encoded = encode_bytes("héllo\nwörld\r\n".as_bytes());
        assert_eq!(encoded.content, "héllo\nwörld\r\n");
        assert!(!encoded.is_base64());
        assert_eq!(encoded.size, 15);
    }

    #[test]
    fn test_binary_is_base64() {
        let encoded = encode_bytes(&[0x89, b'P', b'N', b'G', 0x00, 0x01]);
        assert_eq!(encoded.content, "base64:iVBORwAB");
    }

    #[test]
    fn test_size_boundary() {
        let dir = tempdir().unwrap();

        let at_limit = dir.path().join("at_limit.txt");
        fs::write(&at_limit, vec![b'a'; MAX_FILE_SIZE as usize]).unwrap();
        let encoded = encode_file(&at_limit).unwrap();
        assert_eq!(encoded.size, MAX_FILE_SIZE);

        let over_limit = dir.path().join("over_limit.txt");
        fs::write(&over_limit, vec![b'a'; MAX_FILE_SIZE as usize + 1]).unwrap();
        match encode_file(&over_limit) {
            Err(Error::SizeLimitExceeded { size, limit, .. }) => {
                assert_eq!(size, MAX_FILE_SIZE + 1);
                assert_eq!(limit, MAX_FILE_SIZE);
            }
            other => panic!("expected size limit error, got {:?}", other),
        }
    }

    #[test]
    fn test_binary_sniff_window() {
        let mut inside = vec![b'x'; BINARY_SNIFF_LEN + 16];
        inside[BINARY_SNIFF_LEN - 1] = 0;
        assert!(is_binary(&inside));

        let mut outside = vec![b'x'; BINARY_SNIFF_LEN + 16];
        outside[BINARY_SNIFF_LEN] = 0;
        assert!(!is_binary(&outside));

        // Misclassified as text, but still valid UTF-8 so sent verbatim
        let encoded = encode_bytes(&outside);
        assert!(!encoded.is_base64());
        assert_eq!(decode_bytes(&encoded.content).unwrap(), outside);
    }

    #[test]
    fn test_hash_stability() {
        let a = encode_bytes(b"same bytes");
        let b = encode_bytes(b"same bytes");
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, encode_bytes(b"same bytez").hash);

        // Known MD5 of the empty input
        assert_eq!(content_hash(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(content_hash(b"hello"), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn test_hash_is_over_raw_bytes() {
        let bytes = [0u8, 1, 2, 3];
        let encoded = encode_bytes(&bytes);
        assert_eq!(encoded.hash, content_hash(&bytes));
        assert_ne!(encoded.hash, content_hash(encoded.content.as_bytes()));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        assert!(matches!(encode_file(&missing), Err(Error::FileNotFound(_))));
        assert_eq!(hash_file(&missing).unwrap(), None);
    }

    #[test]
    fn test_bad_base64_writes_nothing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("bad.bin");
        let result = decode_to_file(&target, "base64:!!!not base64!!!");
        assert!(matches!(result, Err(Error::InvalidContent(_))));
        assert!(!target.exists());
    }
}
