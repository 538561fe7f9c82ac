//! Spherical neighbourhoods in world space.
//!
//! A voxel `v` belongs to the sphere around centre `c` when both are in the
//! mask and `|A (v - c)| <= r`, with `A` the linear part of the voxel-to-world
//! affine. The centre is always a member. Memberships are stored CSR-style:
//! sphere `s` owns `indices[indptr[s]..indptr[s + 1]]` (sorted linear voxel
//! indices).

use nalgebra::Matrix3;
use sl_core::{Error, Result};
use sl_nifti::Affine;

/// Singular values below this make the affine unusable.
const DEGENERATE: f64 = 1e-12;

/// Sphere membership for every mask voxel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SphereIndex {
    centres: Vec<usize>,
    indptr: Vec<usize>,
    indices: Vec<usize>,
}

impl SphereIndex {
    /// Build spheres of radius `radius_mm` around each voxel of `mask`
    /// (linear indices into a grid of `shape`).
    pub fn new(shape: [usize; 3], affine: &Affine, mask: &[usize], radius_mm: f64) -> Result<Self> {
        if !(radius_mm.is_finite() && radius_mm >= 0.0) {
            return Err(Error::Validation(format!("radius must be a non-negative number, got {radius_mm}")));
        }
        let [nx, ny, nz] = shape;
        let n_vox = nx * ny * nz;
        let mut in_mask = vec![false; n_vox];
        for &v in mask {
            if v >= n_vox {
                return Err(Error::Validation(format!("mask voxel {v} outside a grid of {n_vox} voxels")));
            }
            in_mask[v] = true;
        }

        let offsets = ball_offsets(affine, radius_mm)?;

        let mut centres: Vec<usize> = mask.to_vec();
        centres.sort_unstable();
        centres.dedup();

        let mut indptr = Vec::with_capacity(centres.len() + 1);
        let mut indices = Vec::new();
        indptr.push(0);
        let mut members = Vec::with_capacity(offsets.len());
        for &c in &centres {
            let (ci, cj, ck) = (c % nx, (c / nx) % ny, c / (nx * ny));
            members.clear();
            for &[di, dj, dk] in &offsets {
                let (Some(i), Some(j), Some(k)) =
                    (ci.checked_add_signed(di), cj.checked_add_signed(dj), ck.checked_add_signed(dk))
                else {
                    continue;
                };
                if i >= nx || j >= ny || k >= nz {
                    continue;
                }
                let v = i + nx * (j + ny * k);
                if in_mask[v] {
                    members.push(v);
                }
            }
            members.sort_unstable();
            indices.extend_from_slice(&members);
            indptr.push(indices.len());
        }

        Ok(Self { centres, indptr, indices })
    }

    /// Number of spheres (= mask voxels).
    pub fn n_spheres(&self) -> usize {
        self.centres.len()
    }

    /// Centre voxel of each sphere.
    pub fn centres(&self) -> &[usize] {
        &self.centres
    }

    /// Member voxels of sphere `s`.
    pub fn members(&self, s: usize) -> &[usize] {
        &self.indices[self.indptr[s]..self.indptr[s + 1]]
    }

    /// Largest sphere size.
    pub fn max_size(&self) -> usize {
        self.indptr.windows(2).map(|w| w[1] - w[0]).max().unwrap_or(0)
    }

    /// Mean sphere size.
    pub fn mean_size(&self) -> f64 {
        if self.centres.is_empty() { 0.0 } else { self.indices.len() as f64 / self.centres.len() as f64 }
    }
}

/// Voxel offsets whose world-space length is within `radius_mm`.
fn ball_offsets(affine: &Affine, radius_mm: f64) -> Result<Vec<[isize; 3]>> {
    let lin = Matrix3::from_fn(|r, c| affine[r][c]);
    let sv = lin.singular_values();
    let smin = sv.min();
    if !(smin.is_finite() && smin > DEGENERATE) {
        return Err(Error::Validation("voxel-to-world affine is singular".into()));
    }
    let reach = (radius_mm / smin).floor() as isize;
    let r2 = radius_mm * radius_mm * (1.0 + 1e-9);

    let mut out = Vec::new();
    for dk in -reach..=reach {
        for dj in -reach..=reach {
            for di in -reach..=reach {
                let d = lin * nalgebra::Vector3::new(di as f64, dj as f64, dk as f64);
                if d.norm_squared() <= r2 {
                    out.push([di, dj, dk]);
                }
            }
        }
    }
    Ok(out)
}
