//! In-memory NIfTI image: header plus voxels decoded to `f32`.
//!
//! Voxels are stored in file order: x fastest, then y, z, and volume index.

use crate::buffer::{ByteOrder, NiftiBuffer};
use crate::error::{NiftiError, Result};
use crate::header::{Affine, DEFAULT_VOX_OFFSET, DataType, NiftiHeader};

/// A decoded 3-D or 4-D image.
#[derive(Debug, Clone, PartialEq)]
pub struct NiftiImage {
    header: NiftiHeader,
    data: Vec<f32>,
}

impl NiftiImage {
    /// Assemble an image, checking that `data` matches the header extents.
    pub fn from_parts(header: NiftiHeader, data: Vec<f32>) -> Result<Self> {
        let expected = header.voxels_per_volume() * header.n_volumes();
        if data.len() != expected {
            return Err(NiftiError::Shape(format!(
                "header describes {} voxels but {} values were supplied",
                expected,
                data.len()
            )));
        }
        Ok(Self { header, data })
    }

    /// New float32 image with the given geometry.
    ///
    /// `data.len()` must equal `shape[0] * shape[1] * shape[2] * n_volumes`.
    pub fn from_volumes(
        shape: [usize; 3],
        n_volumes: usize,
        affine: &Affine,
        data: Vec<f32>,
    ) -> Result<Self> {
        let header = NiftiHeader::float32(shape, n_volumes, affine)?;
        Self::from_parts(header, data)
    }

    /// Decode voxel payload `bytes` (which starts at `header.vox_offset`).
    pub(crate) fn decode(header: NiftiHeader, bytes: &[u8]) -> Result<Self> {
        let n = header.voxels_per_volume() * header.n_volumes();
        let offset = header.vox_offset as usize;
        let needed = n * header.datatype.size();
        if bytes.len() < offset + needed {
            return Err(NiftiError::Format(format!(
                "truncated voxel data: need {} bytes after offset {}, have {}",
                needed,
                offset,
                bytes.len().saturating_sub(offset)
            )));
        }

        let mut r = NiftiBuffer::new(&bytes[offset..offset + needed], header.byte_order);
        let mut data = Vec::with_capacity(n);
        match header.datatype {
            DataType::U8 => read_into(&mut r, n, &mut data, |r| Ok(f32::from(r.read_u8()?)))?,
            DataType::I8 => read_into(&mut r, n, &mut data, |r| Ok(f32::from(r.read_i8()?)))?,
            DataType::I16 => read_into(&mut r, n, &mut data, |r| Ok(f32::from(r.read_i16()?)))?,
            DataType::U16 => read_into(&mut r, n, &mut data, |r| Ok(f32::from(r.read_u16()?)))?,
            DataType::I32 => read_into(&mut r, n, &mut data, |r| Ok(r.read_i32()? as f32))?,
            DataType::U32 => read_into(&mut r, n, &mut data, |r| Ok(r.read_u32()? as f32))?,
            DataType::F32 => read_into(&mut r, n, &mut data, |r| r.read_f32())?,
            DataType::F64 => read_into(&mut r, n, &mut data, |r| Ok(r.read_f64()? as f32))?,
        }

        if header.has_scaling() {
            let (slope, inter) = (header.scl_slope, header.scl_inter);
            for v in &mut data {
                *v = *v * slope + inter;
            }
        }

        // Decoded values are float32 and already scaled from here on.
        let mut header = header;
        header.datatype = DataType::F32;
        header.bitpix = 32;
        header.scl_slope = 1.0;
        header.scl_inter = 0.0;
        header.byte_order = ByteOrder::Little;
        header.vox_offset = DEFAULT_VOX_OFFSET as f32;
        Ok(Self { header, data })
    }

    /// Header (geometry and metadata).
    pub fn header(&self) -> &NiftiHeader {
        &self.header
    }

    /// All voxels, x fastest.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Consume into the raw voxel vector.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Spatial extents (x, y, z).
    pub fn spatial_shape(&self) -> [usize; 3] {
        self.header.spatial_shape()
    }

    /// Number of volumes (1 for a 3-D image).
    pub fn n_volumes(&self) -> usize {
        self.header.n_volumes()
    }

    /// Voxels per volume.
    pub fn voxels_per_volume(&self) -> usize {
        self.header.voxels_per_volume()
    }

    /// Voxel-to-world affine.
    pub fn affine(&self) -> Affine {
        self.header.affine()
    }

    /// Voxels of volume `t`.
    pub fn volume(&self, t: usize) -> Result<&[f32]> {
        if t >= self.n_volumes() {
            return Err(NiftiError::Shape(format!(
                "volume {} out of range ({} volumes)",
                t,
                self.n_volumes()
            )));
        }
        let v = self.voxels_per_volume();
        Ok(&self.data[t * v..(t + 1) * v])
    }

    /// Linear index of voxel (i, j, k) within one volume.
    #[inline]
    pub fn linear_index(&self, i: usize, j: usize, k: usize) -> usize {
        let [nx, ny, _] = self.spatial_shape();
        i + nx * (j + ny * k)
    }

    /// New image holding volumes `indices` (in the given order).
    pub fn select_volumes(&self, indices: &[usize]) -> Result<Self> {
        if indices.is_empty() {
            return Err(NiftiError::Shape("cannot select zero volumes".into()));
        }
        let v = self.voxels_per_volume();
        let mut data = Vec::with_capacity(v * indices.len());
        for &t in indices {
            data.extend_from_slice(self.volume(t)?);
        }
        let header = self.header_with_volumes(indices.len())?;
        Self::from_parts(header, data)
    }

    /// Voxel-wise mean over volumes, as a 3-D image with this geometry.
    pub fn mean_volume(&self) -> Result<Self> {
        let v = self.voxels_per_volume();
        let nt = self.n_volumes();
        let mut acc = vec![0f64; v];
        for t in 0..nt {
            for (a, &x) in acc.iter_mut().zip(self.volume(t)?) {
                *a += f64::from(x);
            }
        }
        let data = acc.into_iter().map(|s| (s / nt as f64) as f32).collect();
        self.like(data)
    }

    /// 3-D image with this image's geometry and the given voxels.
    pub fn like(&self, data: Vec<f32>) -> Result<Self> {
        let header = self.header_with_volumes(1)?;
        Self::from_parts(header, data)
    }

    /// Linear indices of non-zero voxels of the first volume (mask semantics).
    pub fn nonzero_voxels(&self) -> Vec<usize> {
        let v = self.voxels_per_volume();
        self.data[..v]
            .iter()
            .enumerate()
            .filter(|(_, x)| **x != 0.0 && !x.is_nan())
            .map(|(i, _)| i)
            .collect()
    }

    fn header_with_volumes(&self, n_volumes: usize) -> Result<NiftiHeader> {
        let mut h = self.header.clone();
        if n_volumes > 1 {
            h.dim[0] = 4;
            h.dim[4] = i16::try_from(n_volumes)
                .map_err(|_| NiftiError::Shape(format!("{n_volumes} volumes exceed NIfTI-1")))?;
        } else {
            h.dim[0] = 3;
            h.dim[4] = 1;
        }
        h.dim[5..].fill(1);
        Ok(h)
    }
}

fn read_into(
    r: &mut NiftiBuffer<'_>,
    n: usize,
    out: &mut Vec<f32>,
    mut f: impl FnMut(&mut NiftiBuffer<'_>) -> Result<f32>,
) -> Result<()> {
    for _ in 0..n {
        out.push(f(r)?);
    }
    Ok(())
}
