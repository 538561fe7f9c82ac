//! Reading and writing `.nii` / `.nii.gz` files.

use std::path::Path;

use crate::compress::{gzip, maybe_gunzip};
use crate::error::{NiftiError, Result};
use crate::header::NiftiHeader;
use crate::image::NiftiImage;

/// Read a single-file NIfTI-1 image, gzip-compressed or not.
pub fn read_image(path: impl AsRef<Path>) -> Result<NiftiImage> {
    let path = path.as_ref();
    let raw = std::fs::read(path)?;
    let bytes = maybe_gunzip(raw)?;
    let header = NiftiHeader::parse(&bytes)?;
    tracing::debug!(
        path = %path.display(),
        shape = ?header.spatial_shape(),
        volumes = header.n_volumes(),
        "read NIfTI image"
    );
    NiftiImage::decode(header, &bytes)
}

/// Read only the header (still inflates the whole file when gzipped).
pub fn read_header(path: impl AsRef<Path>) -> Result<NiftiHeader> {
    let bytes = maybe_gunzip(std::fs::read(path.as_ref())?)?;
    NiftiHeader::parse(&bytes)
}

/// Encode an image as float32 NIfTI-1 bytes (uncompressed).
pub fn encode_image(img: &NiftiImage) -> Vec<u8> {
    let mut out = img.header().to_bytes();
    out.reserve(img.data().len() * 4);
    for v in img.data() {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Write `img` to `path`; gzip-compressed when the name ends in `.gz`.
pub fn write_image(path: impl AsRef<Path>, img: &NiftiImage) -> Result<()> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| NiftiError::Format(format!("not a file path: {}", path.display())))?;
    let raw = encode_image(img);
    let bytes = if name.ends_with(".gz") { gzip(&raw)? } else { raw };
    std::fs::write(path, bytes)?;
    Ok(())
}
