// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Circular photo layer.
//!
//! The photo is cover-fitted into a 130 px circle, which is then scaled
//! and rotated about its centre and moved by the transform offset.

use super::blend;
use crate::models::scene::PhotoTransform;
use crate::util::geometry::{rotate, Point};
use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};

/// Circle diameter in reference pixels.
pub const PHOTO_DIAMETER: f32 = 130.0;
/// Circle centre as a fraction of the card size, before the offset.
pub const PHOTO_CENTER: (f32, f32) = (0.5, 0.365);

/// Crop and resize to fill a `side` x `side` square.
fn cover_fit(photo: &RgbaImage, side: u32) -> RgbaImage {
    DynamicImage::ImageRgba8(photo.clone())
        .resize_to_fill(side, side, FilterType::Triangle)
        .to_rgba8()
}

pub fn draw_photo(canvas: &mut RgbaImage, photo: &RgbaImage, transform: &PhotoTransform, unit: f32) {
    let side = (PHOTO_DIAMETER * unit).round().max(1.0) as u32;
    let fitted = cover_fit(photo, side);
    let half = side as f32 / 2.0;

    let (cw, ch) = canvas.dimensions();
    let center = Point::new(
        cw as f32 * PHOTO_CENTER.0 + transform.offset_x * unit,
        ch as f32 * PHOTO_CENTER.1 + transform.offset_y * unit,
    );
    let radius = half * transform.scale;

    let x0 = (center.x - radius).floor().clamp(0.0, cw as f32) as u32;
    let x1 = (center.x + radius).ceil().clamp(0.0, cw as f32) as u32;
    let y0 = (center.y - radius).floor().clamp(0.0, ch as f32) as u32;
    let y1 = (center.y + radius).ceil().clamp(0.0, ch as f32) as u32;

    let max = (side - 1) as f32;
    for y in y0..y1 {
        for x in x0..x1 {
            let rel = Point::new(x as f32 + 0.5 - center.x, y as f32 + 0.5 - center.y);
            let dist = (rel.x * rel.x + rel.y * rel.y).sqrt();
            // Anti-aliased circle edge
            let coverage = (radius - dist + 0.5).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }

            let local = rotate(rel, -transform.rotation);
            let u = (local.x / transform.scale + half).floor().clamp(0.0, max) as u32;
            let v = (local.y / transform.scale + half).floor().clamp(0.0, max) as u32;

            let src = *fitted.get_pixel(u, v);
            blend(canvas.get_pixel_mut(x, y), src, coverage);
        }
    }
}
