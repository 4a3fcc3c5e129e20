//! Solid-colour placeholder covers.
//!
//! Until real artwork is wired in, each post gets a flat PNG whose colour is
//! taken from the SHA-256 of its citation. The same citation always yields
//! the same bytes, which keeps the upload cache effective across re-runs.

use super::backend::{Dimensions, ImageGenerator, ImagingError};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};
use std::io::Cursor;

pub struct PlaceholderGenerator {
    size: Dimensions,
}

impl PlaceholderGenerator {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Dimensions { width, height },
        }
    }
}

impl Default for PlaceholderGenerator {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Colour derived from the first three digest bytes of `reference`.
pub fn reference_color(reference: &str) -> Rgb<u8> {
    let digest = Sha256::digest(reference.as_bytes());
    Rgb([digest[0], digest[1], digest[2]])
}

impl ImageGenerator for PlaceholderGenerator {
    fn generate(&self, reference: &str) -> Result<Vec<u8>, ImagingError> {
        let Dimensions { width, height } = self.size;
        if !self.size.is_valid() {
            return Err(ImagingError::InvalidSize { width, height });
        }

        let canvas = RgbImage::from_pixel(width, height, reference_color(reference));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}
