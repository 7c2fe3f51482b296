//! Attachment decoding for vision requests.
//!
//! Downloaded screenshots arrive as PNG, JPEG or WebP, sometimes with an alpha
//! channel. Everything is decoded and re-encoded as 3-channel RGB PNG before it
//! is handed to the model.

use std::io::Cursor;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat, ImageReader};

/// MIME type of every normalized image.
pub const MEDIA_TYPE: &str = "image/png";

#[derive(Debug)]
pub struct NormalizedImage {
    /// PNG-encoded RGB8 pixels.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl NormalizedImage {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", MEDIA_TYPE, STANDARD.encode(&self.data))
    }
}

/// Decode `data` and convert it to RGB8, dropping any alpha channel.
pub fn normalize(data: &[u8]) -> Result<NormalizedImage> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("failed to guess image format")?
        .decode()
        .context("failed to decode image")?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut output = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut output, ImageFormat::Png)
        .context("failed to encode normalized image")?;

    Ok(NormalizedImage {
        data: output.into_inner(),
        width,
        height,
    })
}
