//! gzip framing for `.nii.gz`.
//!
//! Detection is by the two-byte gzip magic (`1f 8b`), never by file name:
//! plenty of pipelines write uncompressed data under a `.gz` suffix.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::error::{NiftiError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Whether `src` starts with a gzip member header.
pub fn is_gzip(src: &[u8]) -> bool {
    src.len() >= 2 && src[..2] == GZIP_MAGIC
}

/// Inflate all concatenated gzip members of `src`.
pub fn gunzip(src: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(src.len().saturating_mul(4));
    MultiGzDecoder::new(src)
        .read_to_end(&mut out)
        .map_err(|e| NiftiError::Decompression(format!("gzip: {}", e)))?;
    Ok(out)
}

/// Deflate `src` into a single gzip member.
pub fn gzip(src: &[u8]) -> Result<Vec<u8>> {
    let mut enc = GzEncoder::new(Vec::with_capacity(src.len() / 2), Compression::default());
    enc.write_all(src)?;
    Ok(enc.finish()?)
}

/// Inflate if gzip, otherwise hand the bytes back untouched.
pub fn maybe_gunzip(src: Vec<u8>) -> Result<Vec<u8>> {
    if is_gzip(&src) { gunzip(&src) } else { Ok(src) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gzip_then_gunzip_restores_bytes() {
        let payload: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let packed = gzip(&payload).unwrap();
        assert!(is_gzip(&packed));
        assert_eq!(gunzip(&packed).unwrap(), payload);
    }

    #[test]
    fn plain_bytes_pass_through() {
        let raw = vec![92u8, 1, 0, 0];
        assert!(!is_gzip(&raw));
        assert_eq!(maybe_gunzip(raw.clone()).unwrap(), raw);
    }

    #[test]
    fn corrupt_stream_is_reported() {
        let bad = vec![0x1f, 0x8b, 8, 0, 0, 0, 0, 0, 0, 255, 7, 0, 0];
        assert!(matches!(gunzip(&bad), Err(NiftiError::Decompression(_))));
    }
}
