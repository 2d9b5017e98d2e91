// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Photo loading.
//!
//! This module decodes user photos into RGBA bitmaps, rejecting anything
//! over the configured byte or dimension limits.

use crate::config::PhotoLimits;
use crate::error::{CardError, Result};
use image::{GenericImageView, RgbaImage};
use std::path::Path;

/// File extensions offered in the photo picker.
pub const PHOTO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Decode photo bytes into an RGBA bitmap.
pub fn decode_photo(bytes: &[u8], limits: &PhotoLimits) -> Result<RgbaImage> {
    if bytes.len() > limits.max_bytes {
        return Err(CardError::PhotoTooLarge(format!(
            "{} bytes exceeds the {} byte limit",
            bytes.len(),
            limits.max_bytes
        )));
    }

    let img = image::load_from_memory(bytes).map_err(|e| CardError::PhotoDecode(e.to_string()))?;

    let (width, height) = img.dimensions();
    if width > limits.max_dimension || height > limits.max_dimension {
        return Err(CardError::PhotoTooLarge(format!(
            "{}x{} exceeds the {} pixel limit",
            width, height, limits.max_dimension
        )));
    }
    if width == 0 || height == 0 {
        return Err(CardError::PhotoDecode("image has no pixels".to_string()));
    }

    Ok(img.to_rgba8())
}

/// Read and decode a photo from disk.
pub fn load_photo(path: &Path, limits: &PhotoLimits) -> Result<RgbaImage> {
    let bytes = std::fs::read(path)?;
    let img = decode_photo(&bytes, limits)?;
    log::info!("Loaded photo: {} ({}x{})", path.display(), img.width(), img.height());
    Ok(img)
}

#[cfg(test)]
pub(crate) fn png_bytes(img: &RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img.clone())
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}
