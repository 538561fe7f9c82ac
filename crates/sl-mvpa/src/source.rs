//! Where the driver gets its images from.

use sl_core::{Error, Result};
use sl_nifti::NiftiImage;

use crate::config::InputLayout;

/// Beta stack and ROI masks.
pub trait ImageSource {
    /// Fail with [`Error::MissingInput`] if the betas or any mask of `rois`
    /// is absent. Nothing is decoded.
    fn check_available(&self, rois: &[String]) -> Result<()>;

    /// The 4-D beta stack.
    fn load_betas(&self) -> Result<NiftiImage>;

    /// Mask of ROI `roi`.
    fn load_mask(&self, roi: &str) -> Result<NiftiImage>;
}

/// Images read from the configured layout.
#[derive(Debug, Clone)]
pub struct FsImageSource {
    layout: InputLayout,
}

impl FsImageSource {
    /// Source over `layout`.
    pub fn new(layout: InputLayout) -> Self {
        Self { layout }
    }
}

impl ImageSource for FsImageSource {
    fn check_available(&self, rois: &[String]) -> Result<()> {
        if !self.layout.betas.is_file() {
            return Err(Error::MissingInput { role: "beta stack".into(), path: self.layout.betas.clone() });
        }
        for roi in rois {
            let path = self.layout.mask(roi);
            if !path.is_file() {
                return Err(Error::MissingInput { role: format!("mask for ROI {roi}"), path });
            }
        }
        Ok(())
    }

    fn load_betas(&self) -> Result<NiftiImage> {
        Ok(sl_nifti::read_image(&self.layout.betas)?)
    }

    fn load_mask(&self, roi: &str) -> Result<NiftiImage> {
        Ok(sl_nifti::read_image(self.layout.mask(roi))?)
    }
}
