//! Image generator trait and shared types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Invalid image size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// Pixel size of a generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Largest width or height a cover may have.
pub const MAX_SIDE: u32 = 8192;

impl Dimensions {
    /// Both sides are non-zero and no larger than [`MAX_SIDE`].
    pub fn is_valid(&self) -> bool {
        (1..=MAX_SIDE).contains(&self.width) && (1..=MAX_SIDE).contains(&self.height)
    }
}

/// Produces the cover image for a post.
pub trait ImageGenerator {
    /// PNG bytes for the given citation (or title, or date).
    fn generate(&self, reference: &str) -> Result<Vec<u8>, ImagingError>;
}
