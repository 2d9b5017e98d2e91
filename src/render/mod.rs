// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Software rasterizer for the card.
//!
//! Paint order is photo, then template, then labels. The template has a
//! transparent window, so the photo shows through from underneath.
//! Rendering is a pure function of the scene and template, so the same
//! inputs always give the same pixels.

pub mod photo;
pub mod text;

use crate::config::CardConfig;
use crate::error::{CardError, Result};
use crate::models::scene::{LayerId, Scene};
use crate::util::geometry::Rect;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use rusttype::Font;

/// Side length of the reference card all layout constants are given in.
pub const REFERENCE_SIZE: f32 = 500.0;

/// Rasterizes scenes at a fixed square canvas size.
pub struct Renderer {
    font: Font<'static>,
    size: u32,
}

impl Renderer {
    pub fn new(font: Font<'static>, size: u32) -> Self {
        Self { font, size: size.max(1) }
    }

    pub fn from_config(config: &CardConfig) -> Result<Self> {
        let font = text::load_font(config.font_path.as_deref())?;
        Ok(Self::new(font, config.canvas_size))
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Canvas pixels per reference pixel.
    fn unit(&self) -> f32 {
        self.size as f32 / REFERENCE_SIZE
    }

    /// Compose the scene. Without a template only photo and labels are drawn.
    pub fn render(&self, scene: &Scene, template: Option<&RgbaImage>) -> RgbaImage {
        let mut canvas = RgbaImage::new(self.size, self.size);

        if let Some(photo) = &scene.photo {
            photo::draw_photo(&mut canvas, photo, &scene.transform, self.unit());
        }
        if let Some(template) = template {
            draw_template(&mut canvas, template);
        }
        for id in LayerId::ALL {
            text::draw_label(&mut canvas, &self.font, scene.layer(id), &scene.style, self.unit());
        }

        canvas
    }

    /// Bounding box of a label in canvas pixels.
    pub fn label_rect(&self, scene: &Scene, id: LayerId) -> Rect {
        text::layout_label(&self.font, scene.layer(id), &scene.style, self.size, self.unit()).rect()
    }
}

/// Fit the template inside the canvas, keeping its aspect ratio, centred.
fn draw_template(canvas: &mut RgbaImage, template: &RgbaImage) {
    let (cw, ch) = canvas.dimensions();
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 {
        return;
    }

    let fit = (cw as f32 / tw as f32).min(ch as f32 / th as f32);
    let w = ((tw as f32 * fit).round() as u32).max(1);
    let h = ((th as f32 * fit).round() as u32).max(1);
    let x = (cw as i64 - w as i64) / 2;
    let y = (ch as i64 - h as i64) / 2;

    if (w, h) == (tw, th) {
        imageops::overlay(canvas, template, x, y);
    } else {
        let resized = imageops::resize(template, w, h, FilterType::Triangle);
        imageops::overlay(canvas, &resized, x, y);
    }
}

/// Encode a rendered card as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgba8)
        .map_err(|e| CardError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Source-over blend of `src` onto `dst`, scaled by `coverage`.
pub(crate) fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f32) {
    let sa = src.0[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);

    for c in 0..3 {
        let v = (src.0[c] as f32 * sa + dst.0[c] as f32 * da * (1.0 - sa)) / out_a;
        dst.0[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
