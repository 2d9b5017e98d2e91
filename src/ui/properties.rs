// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Card properties panel.
//!
//! This module provides the side panel for editing the label text and
//! adjusting the photo transform.

use crate::models::scene::{
    LayerId, PhotoTransformUpdate, Scene, OFFSET_X_RANGE, OFFSET_Y_RANGE, ROTATION_RANGE,
    SCALE_RANGE,
};

/// Result of properties panel interaction.
pub enum PropertiesAction {
    None,
    SetText(LayerId, String),
    Transform(PhotoTransformUpdate),
}

/// Display the properties panel.
pub fn show(ui: &mut egui::Ui, scene: &Scene, message: Option<&str>, error: Option<&str>) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Card");
    ui.separator();

    ui.label("Name");
    let mut name = scene.name.text.clone();
    if ui.add(egui::TextEdit::singleline(&mut name).hint_text("Enter your name")).changed() {
        action = PropertiesAction::SetText(LayerId::Name, name);
    }

    ui.label("Position");
    let mut role = scene.role.text.clone();
    if ui.add(egui::TextEdit::singleline(&mut role).hint_text("Enter position")).changed() {
        action = PropertiesAction::SetText(LayerId::Role, role);
    }

    ui.add_space(12.0);
    ui.heading("Photo");
    ui.separator();

    if scene.photo.is_none() {
        ui.label(egui::RichText::new("Select a photo to adjust it").weak());
    } else {
        let t = scene.transform;
        let mut scale = t.scale;
        let mut rotation = t.rotation;
        let mut offset_x = t.offset_x;
        let mut offset_y = t.offset_y;

        if ui.add(egui::Slider::new(&mut scale, SCALE_RANGE.0..=SCALE_RANGE.1).step_by(0.01).text("Scale")).changed() {
            action = PropertiesAction::Transform(PhotoTransformUpdate { scale: Some(scale), ..Default::default() });
        }
        if ui.add(egui::Slider::new(&mut rotation, ROTATION_RANGE.0..=ROTATION_RANGE.1).step_by(1.0).text("Rotate")).changed() {
            action = PropertiesAction::Transform(PhotoTransformUpdate { rotation: Some(rotation), ..Default::default() });
        }
        if ui.add(egui::Slider::new(&mut offset_x, OFFSET_X_RANGE.0..=OFFSET_X_RANGE.1).step_by(1.0).text("Horizontal")).changed() {
            action = PropertiesAction::Transform(PhotoTransformUpdate { offset_x: Some(offset_x), ..Default::default() });
        }
        if ui.add(egui::Slider::new(&mut offset_y, OFFSET_Y_RANGE.0..=OFFSET_Y_RANGE.1).step_by(1.0).text("Vertical")).changed() {
            action = PropertiesAction::Transform(PhotoTransformUpdate { offset_y: Some(offset_y), ..Default::default() });
        }
    }

    ui.add_space(12.0);
    if let Some(error) = error {
        ui.colored_label(egui::Color32::from_rgb(230, 90, 90), error);
    }
    if let Some(message) = message {
        ui.label(egui::RichText::new(message).italics());
    }

    ui.add_space(12.0);
    ui.label(
        egui::RichText::new("Your photo is processed locally and never uploaded.")
            .small()
            .weak(),
    );

    action
}
