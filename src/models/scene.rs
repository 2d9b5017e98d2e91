// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Scene data structures.
//!
//! This module defines the in-memory composition that drives both the
//! live preview and the export: the photo with its transform, and the
//! two text labels with their anchors and shared style.

use image::RgbaImage;
use std::sync::Arc;

pub const SCALE_RANGE: (f32, f32) = (0.5, 2.0);
pub const ROTATION_RANGE: (f32, f32) = (-180.0, 180.0);
pub const OFFSET_X_RANGE: (f32, f32) = (-50.0, 50.0);
pub const OFFSET_Y_RANGE: (f32, f32) = (-50.0, 150.0);
pub const FONT_SIZE_RANGE: (u32, u32) = (12, 30);
pub const ANCHOR_RANGE: (f32, f32) = (0.0, 100.0);

pub const DEFAULT_FONT_SIZE: u32 = 18;

fn clamp(value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

/// Which of the two draggable labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerId {
    Name,
    Role,
}

impl LayerId {
    pub const ALL: [LayerId; 2] = [LayerId::Name, LayerId::Role];
}

/// Photo placement inside the card, in reference pixels and degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoTransform {
    pub scale: f32,
    pub rotation: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for PhotoTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation: 0.0,
            offset_x: 0.0,
            offset_y: 25.0,
        }
    }
}

/// A partial transform change; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhotoTransformUpdate {
    pub scale: Option<f32>,
    pub rotation: Option<f32>,
    pub offset_x: Option<f32>,
    pub offset_y: Option<f32>,
}

impl PhotoTransform {
    /// Merge an update and clamp every field to its range.
    pub fn apply(&mut self, update: PhotoTransformUpdate) {
        if let Some(scale) = update.scale {
            self.scale = clamp(scale, SCALE_RANGE);
        }
        if let Some(rotation) = update.rotation {
            self.rotation = clamp(rotation, ROTATION_RANGE);
        }
        if let Some(x) = update.offset_x {
            self.offset_x = clamp(x, OFFSET_X_RANGE);
        }
        if let Some(y) = update.offset_y {
            self.offset_y = clamp(y, OFFSET_Y_RANGE);
        }
    }
}

/// Label position as percentage offsets from the left and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub left: f32,
    pub bottom: f32,
}

impl Anchor {
    pub fn new(left: f32, bottom: f32) -> Self {
        Self {
            left: clamp(left, ANCHOR_RANGE),
            bottom: clamp(bottom, ANCHOR_RANGE),
        }
    }

    /// Shift by a percentage delta, staying on the card.
    pub fn shifted(self, d_left: f32, d_bottom: f32) -> Self {
        Self::new(self.left + d_left, self.bottom + d_bottom)
    }
}

/// One draggable text label.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    pub text: String,
    pub anchor: Anchor,
    /// Extra lift above the anchor, in reference pixels
    pub margin_bottom: f32,
}

/// Style shared by both labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub font_size: u32,
    pub stroke: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            stroke: true,
        }
    }
}

impl TextStyle {
    /// Step the font size, clamped to the allowed range.
    pub fn adjust_font_size(&mut self, delta: i32) {
        let (min, max) = FONT_SIZE_RANGE;
        let size = (self.font_size as i64 + delta as i64).clamp(min as i64, max as i64);
        self.font_size = size as u32;
    }
}

/// Complete card composition.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub photo: Option<Arc<RgbaImage>>,
    pub transform: PhotoTransform,
    pub name: TextLayer,
    pub role: TextLayer,
    pub style: TextStyle,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene with the default label placement.
    pub fn new() -> Self {
        Self {
            photo: None,
            transform: PhotoTransform::default(),
            name: TextLayer {
                text: String::new(),
                anchor: Anchor::new(58.0, 19.5),
                margin_bottom: 24.0,
            },
            role: TextLayer {
                text: String::new(),
                anchor: Anchor::new(58.0, 11.5),
                margin_bottom: 17.0,
            },
            style: TextStyle::default(),
        }
    }

    pub fn layer(&self, id: LayerId) -> &TextLayer {
        match id {
            LayerId::Name => &self.name,
            LayerId::Role => &self.role,
        }
    }

    pub fn layer_mut(&mut self, id: LayerId) -> &mut TextLayer {
        match id {
            LayerId::Name => &mut self.name,
            LayerId::Role => &mut self.role,
        }
    }
}
