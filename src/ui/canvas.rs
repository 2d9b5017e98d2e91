// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Card preview canvas.
//!
//! This module shows the composed card and turns pointer input on it
//! into label drag actions. Pointer positions are reported relative to
//! the displayed card, together with its current on-screen size.

use crate::compositor::Compositor;
use crate::models::scene::LayerId;
use crate::util::geometry::{Point, Size};

/// Largest on-screen card size, matching the export reference size.
const MAX_DISPLAY_SIZE: f32 = 500.0;

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    SelectPhoto,
    BeginDrag(LayerId, Point),
    DragMove(Point, Size),
    EndDrag,
}

/// Display the card preview and handle mouse/touch interactions.
pub fn show(
    ui: &mut egui::Ui,
    compositor: &Compositor,
    preview: &Option<egui::TextureHandle>,
) -> CanvasAction {
    let mut action = CanvasAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let available = ui.available_size();
        let side = available.x.min(available.y).min(MAX_DISPLAY_SIZE).max(1.0);
        let x_offset = (available.x - side) / 2.0;
        let y_offset = (available.y - side) / 2.0;
        let card_rect = egui::Rect::from_min_size(
            ui.min_rect().min + egui::vec2(x_offset, y_offset),
            egui::vec2(side, side),
        );
        let container = Size::square(side);

        let response = ui.allocate_rect(card_rect, egui::Sense::click_and_drag());
        let painter = ui.painter();

        painter.rect_filled(card_rect, 0.0, egui::Color32::from_gray(70));
        if let Some(texture) = preview {
            painter.image(
                texture.id(),
                card_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }

        let to_card = |pos: egui::Pos2| Point::new(pos.x - card_rect.min.x, pos.y - card_rect.min.y);

        if compositor.scene().photo.is_none() {
            painter.text(
                card_rect.center(),
                egui::Align2::CENTER_CENTER,
                "Click to upload your photo",
                egui::FontId::proportional(18.0),
                egui::Color32::WHITE,
            );
        }

        // Move cursor over a draggable label
        if let Some(hover) = response.hover_pos() {
            if compositor.dragging().is_some() || compositor.layer_at(to_card(hover), container).is_some() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::Move);
            }
        }

        if response.drag_started() {
            // Hit test where the press began, not where the drag threshold was crossed
            let origin = ui.input(|i| i.pointer.press_origin()).or(response.interact_pointer_pos());
            if let Some(origin) = origin {
                let point = to_card(origin);
                if let Some(layer) = compositor.layer_at(point, container) {
                    action = CanvasAction::BeginDrag(layer, point);
                }
            }
        } else if response.dragged() && compositor.dragging().is_some() {
            if let Some(pos) = response.interact_pointer_pos() {
                action = CanvasAction::DragMove(to_card(pos), container);
            }
        } else if response.drag_stopped() {
            action = CanvasAction::EndDrag;
        } else if response.clicked() && compositor.scene().photo.is_none() {
            action = CanvasAction::SelectPhoto;
        }
    });

    ui.separator();
    ui.horizontal(|ui| {
        let scene = compositor.scene();
        ui.label(format!("Font: {}px", scene.style.font_size));
        ui.separator();
        ui.label(if scene.style.stroke { "Outline on" } else { "Outline off" });
        ui.separator();
        match compositor.dragging() {
            Some(layer) => ui.label(format!("Dragging {:?} label", layer)),
            None => ui.label("Tip: drag the text to reposition it"),
        };
    });

    action
}
