// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with photo selection, text style and output buttons.

use crate::models::scene::{TextStyle, FONT_SIZE_RANGE};

/// Result of toolbar interaction.
pub enum ToolbarAction {
    None,
    SelectPhoto,
    FontSize(i32),
    ToggleStroke,
    Save,
    Share,
}

/// Display the toolbar. Output buttons are disabled while `busy`.
pub fn show(ui: &mut egui::Ui, style: &TextStyle, busy: bool) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        if ui.button("🖼 Select Photo").clicked() {
            action = ToolbarAction::SelectPhoto;
        }

        ui.separator();

        ui.label("Font size:");
        let (min, max) = FONT_SIZE_RANGE;
        if ui.add_enabled(style.font_size > min, egui::Button::new("−")).clicked() {
            action = ToolbarAction::FontSize(-1);
        }
        ui.label(format!("{}px", style.font_size));
        if ui.add_enabled(style.font_size < max, egui::Button::new("+")).clicked() {
            action = ToolbarAction::FontSize(1);
        }

        let mut stroke = style.stroke;
        if ui.checkbox(&mut stroke, "White outline").changed() {
            action = ToolbarAction::ToggleStroke;
        }

        ui.separator();

        if ui.add_enabled(!busy, egui::Button::new("⬇ Save Card")).clicked() {
            action = ToolbarAction::Save;
        }
        if ui.add_enabled(!busy, egui::Button::new("Share to X")).clicked() {
            action = ToolbarAction::Share;
        }
        if busy {
            ui.spinner();
        }
    });

    action
}
