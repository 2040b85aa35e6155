//! Frame capture and image encoding.

use crate::error::GatewayError;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats accepted for snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Tiff,
    Bmp,
}

impl ImageFormat {
    /// Returns every supported format.
    pub fn all() -> [ImageFormat; 4] {
        [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Tiff, ImageFormat::Bmp]
    }

    /// File extension written for this format (no leading dot).
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Tiff => "tif",
            ImageFormat::Bmp => "bmp",
        }
    }

    fn encoder_format(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Tiff => image::ImageFormat::Tiff,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for ImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "tif" | "tiff" => Ok(ImageFormat::Tiff),
            "bmp" => Ok(ImageFormat::Bmp),
            _ => Err(format!("Unknown image format: {}", s)),
        }
    }
}

/// An encodable RGB8 frame grabbed from a render target.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major RGB8 pixels, top row first
    pub pixels: Vec<u8>,
}

impl CapturedFrame {
    /// Wraps a pixel buffer, checking that it matches the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, GatewayError> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() != expected {
            return Err(GatewayError::InvalidFrame(format!(
                "{}x{} frame needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    /// Returns the RGB value at `(x, y)`, if in bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
    }

    /// Encodes the frame to `path` in the given format.
    pub fn write_to(&self, path: &Path, format: ImageFormat) -> Result<(), GatewayError> {
        let img = RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| GatewayError::InvalidFrame("pixel buffer too small".to_string()))?;
        img.save_with_format(path, format.encoder_format())?;
        Ok(())
    }
}

/// Image-capture sink attached to a render target.
pub trait FrameCapture {
    /// Grabs the last rendered frame.
    fn capture(&mut self) -> Result<CapturedFrame, GatewayError>;

    /// Encodes a captured frame to disk.
    fn write(&self, frame: &CapturedFrame, path: &Path, format: ImageFormat) -> Result<(), GatewayError> {
        frame.write_to(path, format)
    }
}
