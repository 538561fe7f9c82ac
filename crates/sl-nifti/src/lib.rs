//! # sl-nifti
//!
//! Native NIfTI-1 reader/writer for slmvpa.
//!
//! Reads single-file `.nii` and `.nii.gz` images in either byte order and any
//! integer or real voxel type, decoding voxels to `f32` with `scl_slope` /
//! `scl_inter` applied. Writes float32, little-endian images that reuse a
//! template's geometry.
//!
//! ## Example
//!
//! ```no_run
//! use sl_nifti::{read_image, write_image};
//!
//! let betas = read_image("group_LSS_nilearn.nii.gz").unwrap();
//! let first = betas.select_volumes(&[0, 1, 2]).unwrap();
//! let template = first.mean_volume().unwrap();
//! write_image("mean.nii.gz", &template).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod buffer;
pub mod compress;
pub mod error;
pub mod file;
pub mod header;
pub mod image;

pub use error::{NiftiError, Result};
pub use file::{encode_image, read_header, read_image, write_image};
pub use header::{Affine, DataType, NiftiHeader};
pub use image::NiftiImage;
