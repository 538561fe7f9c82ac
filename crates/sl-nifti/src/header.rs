//! NIfTI-1 header (348 bytes) parsing, serialisation and affine derivation.
//!
//! Layout (offsets in bytes):
//! ```text
//!   0  sizeof_hdr  i32   = 348 (also the byte-order probe)
//!  40  dim         i16[8]
//!  70  datatype    i16
//!  72  bitpix      i16
//!  76  pixdim      f32[8]
//! 108  vox_offset  f32
//! 112  scl_slope   f32,  116 scl_inter f32
//! 252  qform_code  i16,  254 sform_code i16
//! 256  quatern_b/c/d, qoffset_x/y/z   f32[6]
//! 280  srow_x/y/z  f32[4] x 3
//! 344  magic       "n+1\0" (single file) | "ni1\0" (pair)
//! ```

use crate::buffer::{ByteOrder, NiftiBuffer, NiftiWriter};
use crate::error::{NiftiError, Result};

/// Size of a NIfTI-1 header.
pub const HEADER_SIZE: usize = 348;

/// Offset of voxel data in files we write (header + 4-byte extension flag).
pub const DEFAULT_VOX_OFFSET: usize = 352;

/// 4×4 voxel-to-world matrix, row-major.
pub type Affine = [[f64; 4]; 4];

/// Voxel storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// unsigned char
    U8,
    /// signed char
    I8,
    /// signed short
    I16,
    /// unsigned short
    U16,
    /// signed int
    I32,
    /// unsigned int
    U32,
    /// float
    F32,
    /// double
    F64,
}

impl DataType {
    /// Decode the NIfTI `datatype` code.
    pub fn from_code(code: i16) -> Result<Self> {
        Ok(match code {
            2 => DataType::U8,
            4 => DataType::I16,
            8 => DataType::I32,
            16 => DataType::F32,
            64 => DataType::F64,
            256 => DataType::I8,
            512 => DataType::U16,
            768 => DataType::U32,
            other => {
                return Err(NiftiError::Unsupported(format!("datatype code {other}")));
            }
        })
    }

    /// NIfTI `datatype` code.
    pub fn code(self) -> i16 {
        match self {
            DataType::U8 => 2,
            DataType::I16 => 4,
            DataType::I32 => 8,
            DataType::F32 => 16,
            DataType::F64 => 64,
            DataType::I8 => 256,
            DataType::U16 => 512,
            DataType::U32 => 768,
        }
    }

    /// Bytes per voxel.
    pub fn size(self) -> usize {
        match self {
            DataType::U8 | DataType::I8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::F64 => 8,
        }
    }
}

/// Parsed NIfTI-1 header.
///
/// Only the fields that influence geometry or voxel decoding are kept; legacy
/// ANALYZE fields are dropped on read and zeroed on write.
#[derive(Debug, Clone, PartialEq)]
pub struct NiftiHeader {
    /// Byte order the header was read in
    pub byte_order: ByteOrder,
    /// MRI slice ordering
    pub dim_info: u8,
    /// `dim[0]` = rank, `dim[1..=rank]` = extents
    pub dim: [i16; 8],
    /// Intent parameters
    pub intent_p: [f32; 3],
    /// Intent code
    pub intent_code: i16,
    /// Voxel storage type
    pub datatype: DataType,
    /// Bits per voxel
    pub bitpix: i16,
    /// First slice index
    pub slice_start: i16,
    /// `pixdim[0]` = qfac, `pixdim[1..=3]` = voxel size
    pub pixdim: [f32; 8],
    /// Offset of voxel data in the file
    pub vox_offset: f32,
    /// Data scaling slope (0 = no scaling)
    pub scl_slope: f32,
    /// Data scaling intercept
    pub scl_inter: f32,
    /// Last slice index
    pub slice_end: i16,
    /// Slice timing order
    pub slice_code: u8,
    /// Units of pixdim
    pub xyzt_units: u8,
    /// Display range max
    pub cal_max: f32,
    /// Display range min
    pub cal_min: f32,
    /// Time for one slice
    pub slice_duration: f32,
    /// Time axis shift
    pub toffset: f32,
    /// Free-form description
    pub descrip: String,
    /// Auxiliary file name
    pub aux_file: String,
    /// qform code
    pub qform_code: i16,
    /// sform code
    pub sform_code: i16,
    /// Quaternion b, c, d
    pub quatern: [f32; 3],
    /// Quaternion offsets x, y, z
    pub qoffset: [f32; 3],
    /// Rows of the sform affine
    pub srow: [[f32; 4]; 3],
    /// Intent name
    pub intent_name: String,
}

impl NiftiHeader {
    /// Parse the first 348 bytes of a NIfTI-1 file.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(NiftiError::Format(format!(
                "file too short for a NIfTI-1 header: {} bytes",
                bytes.len()
            )));
        }
        let order = detect_byte_order(bytes)?;
        let mut r = NiftiBuffer::new(bytes, order);

        r.skip(4)?; // sizeof_hdr
        r.skip(10 + 18 + 4 + 2 + 1)?; // data_type, db_name, extents, session_error, regular
        let dim_info = r.read_u8()?;
        let dim = r.read_array_i16::<8>()?;
        let intent_p = r.read_array_f32::<3>()?;
        let intent_code = r.read_i16()?;
        let datatype = DataType::from_code(r.read_i16()?)?;
        let bitpix = r.read_i16()?;
        let slice_start = r.read_i16()?;
        let pixdim = r.read_array_f32::<8>()?;
        let vox_offset = r.read_f32()?;
        let scl_slope = r.read_f32()?;
        let scl_inter = r.read_f32()?;
        let slice_end = r.read_i16()?;
        let slice_code = r.read_u8()?;
        let xyzt_units = r.read_u8()?;
        let cal_max = r.read_f32()?;
        let cal_min = r.read_f32()?;
        let slice_duration = r.read_f32()?;
        let toffset = r.read_f32()?;
        r.skip(8)?; // glmax, glmin
        let descrip = r.read_fixed_str(80)?;
        let aux_file = r.read_fixed_str(24)?;
        let qform_code = r.read_i16()?;
        let sform_code = r.read_i16()?;
        let quatern = r.read_array_f32::<3>()?;
        let qoffset = r.read_array_f32::<3>()?;
        let srow = [r.read_array_f32::<4>()?, r.read_array_f32::<4>()?, r.read_array_f32::<4>()?];
        let intent_name = r.read_fixed_str(16)?;
        let magic = r.read_bytes(4)?;
        debug_assert_eq!(r.pos(), HEADER_SIZE);

        match magic {
            b"n+1\0" => {}
            b"ni1\0" => {
                return Err(NiftiError::Unsupported(
                    "header/image pairs (.hdr/.img) are not supported".into(),
                ));
            }
            b"n+2\0" | b"ni2\0" => return Err(NiftiError::Unsupported("NIfTI-2".into())),
            other => {
                return Err(NiftiError::Format(format!("bad magic {:?}", other)));
            }
        }

        let rank = dim[0];
        if !(1..=7).contains(&rank) {
            return Err(NiftiError::Format(format!("dim[0] must be in 1..=7, got {rank}")));
        }
        if dim[1..=rank as usize].iter().any(|&d| d < 1) {
            return Err(NiftiError::Format(format!("non-positive extent in dim {:?}", dim)));
        }
        if vox_offset < HEADER_SIZE as f32 {
            return Err(NiftiError::Format(format!("vox_offset {vox_offset} inside header")));
        }

        Ok(Self {
            byte_order: order,
            dim_info,
            dim,
            intent_p,
            intent_code,
            datatype,
            bitpix,
            slice_start,
            pixdim,
            vox_offset,
            scl_slope,
            scl_inter,
            slice_end,
            slice_code,
            xyzt_units,
            cal_max,
            cal_min,
            slice_duration,
            toffset,
            descrip,
            aux_file,
            qform_code,
            sform_code,
            quatern,
            qoffset,
            srow,
            intent_name,
        })
    }

    /// Minimal float32 header for an image of `shape` (x, y, z) with `n_volumes`
    /// volumes, whose geometry is given by `affine` (stored as sform).
    pub fn float32(shape: [usize; 3], n_volumes: usize, affine: &Affine) -> Result<Self> {
        let mut dim = [1i16; 8];
        dim[0] = if n_volumes > 1 { 4 } else { 3 };
        for (k, &n) in shape.iter().chain(std::iter::once(&n_volumes)).enumerate() {
            dim[k + 1] = i16::try_from(n)
                .ok()
                .filter(|&d| d >= 1)
                .ok_or_else(|| NiftiError::Shape(format!("extent {n} out of range")))?;
        }

        let mut pixdim = [1f32; 8];
        for k in 0..3 {
            let col = (0..3).map(|r| affine[r][k] * affine[r][k]).sum::<f64>().sqrt();
            pixdim[k + 1] = col as f32;
        }

        let mut srow = [[0f32; 4]; 3];
        for (r, row) in srow.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = affine[r][c] as f32;
            }
        }

        Ok(Self {
            byte_order: ByteOrder::Little,
            dim_info: 0,
            dim,
            intent_p: [0.0; 3],
            intent_code: 0,
            datatype: DataType::F32,
            bitpix: 32,
            slice_start: 0,
            pixdim,
            vox_offset: DEFAULT_VOX_OFFSET as f32,
            scl_slope: 1.0,
            scl_inter: 0.0,
            slice_end: 0,
            slice_code: 0,
            xyzt_units: 2, // mm
            cal_max: 0.0,
            cal_min: 0.0,
            slice_duration: 0.0,
            toffset: 0.0,
            descrip: String::new(),
            aux_file: String::new(),
            qform_code: 0,
            sform_code: 2,
            quatern: [0.0; 3],
            qoffset: [0.0; 3],
            srow,
            intent_name: String::new(),
        })
    }

    /// Number of dimensions (`dim[0]`).
    pub fn rank(&self) -> usize {
        self.dim[0] as usize
    }

    /// Spatial extents (x, y, z); missing axes count as 1.
    pub fn spatial_shape(&self) -> [usize; 3] {
        let rank = self.rank();
        let ext = |k: usize| if k <= rank { self.dim[k] as usize } else { 1 };
        [ext(1), ext(2), ext(3)]
    }

    /// Number of 3-D volumes (product of dims 4..=rank).
    pub fn n_volumes(&self) -> usize {
        (4..=self.rank()).map(|k| self.dim[k] as usize).product()
    }

    /// Voxels per 3-D volume.
    pub fn voxels_per_volume(&self) -> usize {
        self.spatial_shape().iter().product()
    }

    /// Whether `scl_slope`/`scl_inter` must be applied on read.
    pub fn has_scaling(&self) -> bool {
        self.scl_slope != 0.0
            && self.scl_slope.is_finite()
            && (self.scl_slope != 1.0 || self.scl_inter != 0.0)
    }

    /// Voxel-to-world affine.
    ///
    /// sform wins when `sform_code > 0`, then the qform quaternion when
    /// `qform_code > 0`, otherwise a plain pixdim scaling.
    pub fn affine(&self) -> Affine {
        if self.sform_code > 0 {
            let mut a = identity();
            for r in 0..3 {
                for c in 0..4 {
                    a[r][c] = f64::from(self.srow[r][c]);
                }
            }
            return a;
        }
        if self.qform_code > 0 {
            return self.qform_affine();
        }
        let mut a = identity();
        for k in 0..3 {
            a[k][k] = f64::from(self.pixdim[k + 1]);
        }
        a
    }

    fn qform_affine(&self) -> Affine {
        let [b, c, d] = self.quatern.map(f64::from);
        let mut a2 = 1.0 - (b * b + c * c + d * d);
        let (b, c, d) = if a2 < 1e-7 {
            // a == 0: renormalise (b, c, d), rotation by 180 degrees
            let n = (b * b + c * c + d * d).sqrt();
            a2 = 0.0;
            (b / n, c / n, d / n)
        } else {
            (b, c, d)
        };
        let a = a2.sqrt();

        let qfac = if self.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
        let dx = f64::from(self.pixdim[1]);
        let dy = f64::from(self.pixdim[2]);
        let dz = f64::from(self.pixdim[3]) * qfac;

        let r = [
            [a * a + b * b - c * c - d * d, 2.0 * (b * c - a * d), 2.0 * (b * d + a * c)],
            [2.0 * (b * c + a * d), a * a + c * c - b * b - d * d, 2.0 * (c * d - a * b)],
            [2.0 * (b * d - a * c), 2.0 * (c * d + a * b), a * a + d * d - c * c - b * b],
        ];
        let scale = [dx, dy, dz];

        let mut out = identity();
        for i in 0..3 {
            for j in 0..3 {
                out[i][j] = r[i][j] * scale[j];
            }
            out[i][3] = f64::from(self.qoffset[i]);
        }
        out
    }

    /// Serialise as a little-endian single-file header plus the 4-byte
    /// extension flag; voxel data follows at [`DEFAULT_VOX_OFFSET`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = NiftiWriter::with_capacity(DEFAULT_VOX_OFFSET);
        w.put_i32(HEADER_SIZE as i32);
        w.put_zeros(10 + 18 + 4 + 2 + 1);
        w.put_u8(self.dim_info);
        for d in self.dim {
            w.put_i16(d);
        }
        for p in self.intent_p {
            w.put_f32(p);
        }
        w.put_i16(self.intent_code);
        w.put_i16(self.datatype.code());
        w.put_i16(self.bitpix);
        w.put_i16(self.slice_start);
        for p in self.pixdim {
            w.put_f32(p);
        }
        w.put_f32(DEFAULT_VOX_OFFSET as f32);
        w.put_f32(self.scl_slope);
        w.put_f32(self.scl_inter);
        w.put_i16(self.slice_end);
        w.put_u8(self.slice_code);
        w.put_u8(self.xyzt_units);
        w.put_f32(self.cal_max);
        w.put_f32(self.cal_min);
        w.put_f32(self.slice_duration);
        w.put_f32(self.toffset);
        w.put_zeros(8);
        w.put_fixed_str(&self.descrip, 80);
        w.put_fixed_str(&self.aux_file, 24);
        w.put_i16(self.qform_code);
        w.put_i16(self.sform_code);
        for q in self.quatern.iter().chain(self.qoffset.iter()) {
            w.put_f32(*q);
        }
        for row in self.srow {
            for v in row {
                w.put_f32(v);
            }
        }
        w.put_fixed_str(&self.intent_name, 16);
        w.put_bytes(b"n+1\0");
        debug_assert_eq!(w.len(), HEADER_SIZE);
        w.put_zeros(4);
        w.into_inner()
    }
}

fn identity() -> Affine {
    let mut a = [[0.0; 4]; 4];
    for (k, row) in a.iter_mut().enumerate() {
        row[k] = 1.0;
    }
    a
}

fn detect_byte_order(bytes: &[u8]) -> Result<ByteOrder> {
    let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if i32::from_le_bytes(raw) == HEADER_SIZE as i32 {
        Ok(ByteOrder::Little)
    } else if i32::from_be_bytes(raw) == HEADER_SIZE as i32 {
        Ok(ByteOrder::Big)
    } else if i32::from_le_bytes(raw) == 540 || i32::from_be_bytes(raw) == 540 {
        Err(NiftiError::Unsupported("NIfTI-2".into()))
    } else {
        Err(NiftiError::Format(format!("sizeof_hdr is not 348 in either byte order: {:?}", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mni_2mm() -> Affine {
        [
            [-2.0, 0.0, 0.0, 90.0],
            [0.0, 2.0, 0.0, -126.0],
            [0.0, 0.0, 2.0, -72.0],
            [0.0, 0.0, 0.0, 1.0],
        ]
    }

    #[test]
    fn header_bytes_parse_back() {
        let h = NiftiHeader::float32([91, 109, 91], 12, &mni_2mm()).unwrap();
        let bytes = h.to_bytes();
        assert_eq!(bytes.len(), DEFAULT_VOX_OFFSET);
        let back = NiftiHeader::parse(&bytes).unwrap();
        assert_eq!(back, h);
        assert_eq!(back.spatial_shape(), [91, 109, 91]);
        assert_eq!(back.n_volumes(), 12);
        assert_eq!(back.affine(), mni_2mm());
    }

    #[test]
    fn float32_header_derives_voxel_size_from_affine() {
        let h = NiftiHeader::float32([4, 4, 4], 1, &mni_2mm()).unwrap();
        assert_eq!(h.rank(), 3);
        assert_eq!(&h.pixdim[1..4], &[2.0, 2.0, 2.0]);
    }

    #[test]
    fn qform_identity_quaternion_scales_by_pixdim() {
        let mut h = NiftiHeader::float32([2, 2, 2], 1, &identity()).unwrap();
        h.sform_code = 0;
        h.qform_code = 1;
        h.quatern = [0.0, 0.0, 0.0];
        h.qoffset = [10.0, 20.0, 30.0];
        h.pixdim = [1.0, 3.0, 3.0, 4.0, 1.0, 1.0, 1.0, 1.0];
        let a = h.affine();
        assert_relative_eq!(a[0][0], 3.0);
        assert_relative_eq!(a[1][1], 3.0);
        assert_relative_eq!(a[2][2], 4.0);
        assert_relative_eq!(a[2][3], 30.0);
    }

    #[test]
    fn qform_negative_qfac_flips_z() {
        let mut h = NiftiHeader::float32([2, 2, 2], 1, &identity()).unwrap();
        h.sform_code = 0;
        h.qform_code = 1;
        h.pixdim[0] = -1.0;
        assert_relative_eq!(h.affine()[2][2], -1.0);
    }

    #[test]
    fn big_endian_header_is_detected() {
        let h = NiftiHeader::float32([3, 2, 1], 1, &identity()).unwrap();
        let mut bytes = h.to_bytes();
        // only sizeof_hdr matters for detection
        bytes[0..4].copy_from_slice(&348i32.to_be_bytes());
        assert_eq!(detect_byte_order(&bytes).unwrap(), ByteOrder::Big);
    }

    #[test]
    fn rejects_garbage() {
        let bytes = vec![0u8; HEADER_SIZE];
        assert!(matches!(NiftiHeader::parse(&bytes), Err(NiftiError::Format(_))));
        assert!(NiftiHeader::parse(&bytes[..10]).is_err());
    }

    #[test]
    fn rejects_unknown_datatype() {
        let h = NiftiHeader::float32([2, 2, 2], 1, &identity()).unwrap();
        let mut bytes = h.to_bytes();
        bytes[70..72].copy_from_slice(&32i16.to_le_bytes()); // complex64
        assert!(matches!(NiftiHeader::parse(&bytes), Err(NiftiError::Unsupported(_))));
    }
}
