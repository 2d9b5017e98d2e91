// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label text layout and drawing.
//!
//! A label is centred horizontally on its anchor and sits with the bottom
//! of its line box `bottom%` of the card height plus its margin above the
//! bottom edge. Text is black faux-bold with an optional white outline.

use super::blend;
use crate::error::{CardError, Result};
use crate::models::scene::{TextLayer, TextStyle};
use crate::util::geometry::Rect;
use image::{Rgba, RgbaImage};
use rusttype::{point, Font, Scale};
use std::path::Path;

/// Name of the egui-bundled font used when no font path is configured.
const BUNDLED_FONT: &str = "Ubuntu-Light";

/// Line box height as a multiple of the font size.
const LINE_HEIGHT: f32 = 1.2;

const TEXT_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
const STROKE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

const OUTLINE_OFFSETS: [(i32, i32); 8] = [
    (1, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
];

/// Load a TrueType font from `path`, or the font bundled with egui.
pub fn load_font(path: Option<&Path>) -> Result<Font<'static>> {
    let bytes = match path {
        Some(path) => std::fs::read(path)
            .map_err(|e| CardError::AssetLoad(format!("font {}: {}", path.display(), e)))?,
        None => {
            let fonts = egui::FontDefinitions::default();
            fonts
                .font_data
                .get(BUNDLED_FONT)
                .map(|data| data.font.to_vec())
                .ok_or_else(|| CardError::AssetLoad(format!("bundled font {} missing", BUNDLED_FONT)))?
        }
    };

    Font::try_from_vec(bytes)
        .ok_or_else(|| CardError::AssetLoad("font data is not a valid TrueType font".to_string()))
}

/// Resolved placement of one label on the canvas.
#[derive(Debug, Clone, Copy)]
pub struct LabelLayout {
    pub scale: Scale,
    /// Left edge of the text run
    pub x: f32,
    pub baseline: f32,
    pub width: f32,
    pub top: f32,
    pub height: f32,
    /// Outline and faux-bold step in canvas pixels
    pub step: i32,
}

impl LabelLayout {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.top,
            width: self.width,
            height: self.height,
        }
    }
}

fn text_width(font: &Font<'static>, scale: Scale, text: &str) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

pub fn layout_label(
    font: &Font<'static>,
    layer: &TextLayer,
    style: &TextStyle,
    canvas_size: u32,
    unit: f32,
) -> LabelLayout {
    let px = style.font_size as f32 * unit;
    let scale = Scale::uniform(px);
    let v_metrics = font.v_metrics(scale);
    let step = (unit.round() as i32).max(1);
    // Faux bold widens the run by one step
    let width = text_width(font, scale, &layer.text) + step as f32;

    let size = canvas_size as f32;
    let center_x = size * layer.anchor.left / 100.0;
    let box_bottom = size - size * layer.anchor.bottom / 100.0 - layer.margin_bottom * unit;
    let height = px * LINE_HEIGHT;
    let top = box_bottom - height;

    let glyph_height = v_metrics.ascent - v_metrics.descent;
    let baseline = top + (height - glyph_height) / 2.0 + v_metrics.ascent;

    LabelLayout {
        scale,
        x: center_x - width / 2.0,
        baseline,
        width,
        top,
        height,
        step,
    }
}

fn draw_run(
    canvas: &mut RgbaImage,
    font: &Font<'static>,
    text: &str,
    layout: &LabelLayout,
    (dx, dy): (i32, i32),
    color: Rgba<u8>,
) {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    let origin = point(layout.x + dx as f32, layout.baseline + dy as f32);

    for glyph in font.layout(text, layout.scale, origin) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, v| {
            let px = gx as i32 + bb.min.x;
            let py = gy as i32 + bb.min.y;
            if px < 0 || py < 0 || px >= w || py >= h {
                return;
            }
            blend(canvas.get_pixel_mut(px as u32, py as u32), color, v);
        });
    }
}

pub fn draw_label(
    canvas: &mut RgbaImage,
    font: &Font<'static>,
    layer: &TextLayer,
    style: &TextStyle,
    unit: f32,
) {
    if layer.text.is_empty() {
        return;
    }

    let layout = layout_label(font, layer, style, canvas.width(), unit);
    let s = layout.step;
    let bold = [(0, 0), (s, 0)];

    if style.stroke {
        for (ox, oy) in OUTLINE_OFFSETS {
            for (bx, by) in bold {
                draw_run(canvas, font, &layer.text, &layout, (ox * s + bx, oy * s + by), STROKE_COLOR);
            }
        }
    }
    for offset in bold {
        draw_run(canvas, font, &layer.text, &layout, offset, TEXT_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scene::Scene;

    fn font() -> Font<'static> {
        load_font(None).unwrap()
    }

    fn count(canvas: &RgbaImage, pred: impl Fn(&Rgba<u8>) -> bool) -> usize {
        canvas.pixels().filter(|p| pred(p)).count()
    }

    #[test]
    fn test_bundled_font_loads() {
        let font = font();
        assert!(font.glyph('A').id().0 != 0);
    }

    #[test]
    fn test_missing_font_file() {
        let err = load_font(Some(Path::new("/nonexistent/font.ttf"))).unwrap_err();
        assert!(matches!(err, CardError::AssetLoad(_)));
    }

    #[test]
    fn test_layout_centred_on_anchor() {
        let mut scene = Scene::new();
        scene.name.text = "Alice".into();
        let layout = layout_label(&font(), &scene.name, &scene.style, 500, 1.0);

        let center = layout.x + layout.width / 2.0;
        assert!((center - 290.0).abs() < 0.01);
        // Bottom of the line box: 500 - 97.5 - 24
        assert!((layout.top + layout.height - 378.5).abs() < 0.01);
        assert!(layout.width > 0.0);
    }

    #[test]
    fn test_layout_grows_with_font_size() {
        let mut scene = Scene::new();
        scene.role.text = "Engineer".into();
        let f = font();
        let small = layout_label(&f, &scene.role, &scene.style, 500, 1.0);
        scene.style.adjust_font_size(10);
        let large = layout_label(&f, &scene.role, &scene.style, 500, 1.0);
        assert!(large.width > small.width);
        assert!(large.height > small.height);
    }

    #[test]
    fn test_draw_label_with_and_without_stroke() {
        let f = font();
        let mut scene = Scene::new();
        scene.name.text = "Alice".into();

        let mut stroked = RgbaImage::new(500, 500);
        draw_label(&mut stroked, &f, &scene.name, &scene.style, 1.0);
        let is_white = |p: &Rgba<u8>| p.0[0] > 200 && p.0[1] > 200 && p.0[2] > 200 && p.0[3] > 128;
        let is_dark = |p: &Rgba<u8>| p.0[3] > 128 && p.0[0] < 64;
        assert!(count(&stroked, is_white) > 0);
        assert!(count(&stroked, is_dark) > 0);

        scene.style.stroke = false;
        let mut plain = RgbaImage::new(500, 500);
        draw_label(&mut plain, &f, &scene.name, &scene.style, 1.0);
        assert_eq!(count(&plain, is_white), 0);
        assert!(count(&plain, is_dark) > 0);
    }

    #[test]
    fn test_empty_label_draws_nothing() {
        let scene = Scene::new();
        let mut canvas = RgbaImage::new(100, 100);
        draw_label(&mut canvas, &font(), &scene.name, &scene.style, 0.2);
        assert_eq!(count(&canvas, |p| p.0[3] != 0), 0);
    }
}
