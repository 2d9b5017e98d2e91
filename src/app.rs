// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait. It forwards UI actions to the compositor, runs
//! photo loading and template prefetch on background threads, and
//! finishes saves and shares once an export completes.

use crate::compositor::Compositor;
use crate::error::Result;
use crate::io::export::Artifact;
use crate::io::media::{self, PHOTO_EXTENSIONS};
use crate::share::ATTACH_HINT;
use crate::ui::{canvas, properties, toolbar};
use image::RgbaImage;
use std::sync::mpsc::{channel, Receiver};

/// What to do with the artifact once the running export finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingOutput {
    Save,
    Share,
    CopyDataUrl,
}

/// Main application state.
pub struct CardMakerApp {
    /// Scene, drag state and export pipeline
    compositor: Compositor,

    /// Rendered preview shown on the canvas
    preview_texture: Option<egui::TextureHandle>,

    /// (revision, template loaded) the preview was rendered for
    preview_key: Option<(u64, bool)>,

    /// Receiver for background photo decoding
    photo_loader: Option<Receiver<Result<RgbaImage>>>,

    /// Receiver for the template prefetch
    template_loader: Option<Receiver<Result<()>>>,

    /// Output waiting on the running export
    pending_output: Option<PendingOutput>,

    /// Informational message for the user
    status_message: Option<String>,

    /// Last error for the user
    error_message: Option<String>,
}

impl CardMakerApp {
    /// Create the app and start fetching the template in the background.
    pub fn new(compositor: Compositor) -> Self {
        let (sender, receiver) = channel();
        let templates = compositor.templates();
        std::thread::spawn(move || {
            let _ = sender.send(templates.get().map(|_| ()));
        });

        Self {
            compositor,
            preview_texture: None,
            preview_key: None,
            photo_loader: None,
            template_loader: Some(receiver),
            pending_output: None,
            status_message: Some("Loading template...".to_string()),
            error_message: None,
        }
    }

    fn busy(&self) -> bool {
        self.compositor.export_in_progress() || self.photo_loader.is_some()
    }

    /// Pick a photo with the native dialog and decode it in the background.
    fn select_photo(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", PHOTO_EXTENSIONS)
            .pick_file()
        else {
            return;
        };

        let (sender, receiver) = channel();
        self.photo_loader = Some(receiver);
        self.status_message = Some("Loading photo...".to_string());
        self.error_message = None;

        let limits = self.compositor.limits();
        std::thread::spawn(move || {
            let _ = sender.send(media::load_photo(&path, &limits));
        });
    }

    /// Save or share, exporting first unless the last artifact is current.
    fn request_output(&mut self, output: PendingOutput, ctx: &egui::Context) {
        self.error_message = None;

        if let Some(artifact) = self.compositor.valid_artifact().cloned() {
            self.deliver(output, artifact, ctx);
            return;
        }

        match self.compositor.start_export() {
            Ok(()) => {
                self.pending_output = Some(output);
                self.status_message = Some("Rendering card...".to_string());
            }
            Err(e) => self.error_message = Some(e.to_string()),
        }
    }

    fn deliver(&mut self, output: PendingOutput, artifact: Artifact, ctx: &egui::Context) {
        match output {
            PendingOutput::Save => {
                let Some(path) = rfd::FileDialog::new()
                    .add_filter("PNG", &["png"])
                    .set_file_name(self.compositor.export_filename())
                    .save_file()
                else {
                    self.status_message = None;
                    return;
                };
                match artifact.save(&path) {
                    Ok(()) => self.status_message = Some(format!("Saved to {}", path.display())),
                    Err(e) => self.error_message = Some(e.to_string()),
                }
            }
            PendingOutput::Share => match self.compositor.share_with(artifact) {
                Ok(intent) => {
                    log::info!(
                        "Opening share intent {} ({} byte card to attach)",
                        intent.url,
                        intent.artifact.png.len()
                    );
                    ctx.open_url(egui::OpenUrl::new_tab(intent.url.as_str()));
                    self.status_message = Some(ATTACH_HINT.to_string());
                }
                Err(e) => self.error_message = Some(e.to_string()),
            },
            PendingOutput::CopyDataUrl => {
                ctx.copy_text(artifact.data_url());
                self.status_message = Some("Card copied as a data URL".to_string());
            }
        }
    }

    fn poll_background(&mut self, ctx: &egui::Context) {
        if let Some(ref receiver) = self.photo_loader {
            if let Ok(result) = receiver.try_recv() {
                self.photo_loader = None;
                self.status_message = None;
                match result {
                    Ok(img) => self.compositor.set_photo_image(img),
                    Err(e) => {
                        log::error!("Failed to load photo: {}", e);
                        self.error_message = Some(e.to_string());
                    }
                }
            }
        }

        if let Some(ref receiver) = self.template_loader {
            if let Ok(result) = receiver.try_recv() {
                self.template_loader = None;
                self.status_message = None;
                if let Err(e) = result {
                    // Export fetches again, so this is not final
                    log::error!("Template prefetch failed: {}", e);
                    self.error_message = Some(e.to_string());
                }
            }
        }

        if let Some(result) = self.compositor.poll_export() {
            self.status_message = None;
            let output = self.pending_output.take();
            match (result, output) {
                (Ok(artifact), Some(output)) => self.deliver(output, artifact, ctx),
                (Ok(_), None) => {}
                (Err(e), _) => self.error_message = Some(e.to_string()),
            }
        }
    }

    fn refresh_preview(&mut self, ctx: &egui::Context) {
        let key = (
            self.compositor.revision(),
            self.compositor.templates().cached().is_some(),
        );
        if self.preview_key == Some(key) {
            return;
        }

        let img = self.compositor.preview();
        let size = [img.width() as usize, img.height() as usize];
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw());
        match self.preview_texture {
            Some(ref mut texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.preview_texture =
                    Some(ctx.load_texture("card_preview", color_image, egui::TextureOptions::LINEAR));
            }
        }
        self.preview_key = Some(key);
    }
}

impl eframe::App for CardMakerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_background(ctx);
        self.refresh_preview(ctx);

        // Keep polling while background work is outstanding
        if self.busy() || self.template_loader.is_some() {
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Select Photo...").clicked() {
                        self.select_photo();
                        ui.close_menu();
                    }
                    ui.separator();
                    let busy = self.busy();
                    if ui.add_enabled(!busy, egui::Button::new("Save Card...")).clicked() {
                        self.request_output(PendingOutput::Save, ctx);
                        ui.close_menu();
                    }
                    if ui.add_enabled(!busy, egui::Button::new("Share to X")).clicked() {
                        self.request_output(PendingOutput::Share, ctx);
                        ui.close_menu();
                    }
                    if ui.add_enabled(!busy, egui::Button::new("Copy as Data URL")).clicked() {
                        self.request_output(PendingOutput::CopyDataUrl, ctx);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        // Toolbar
        let busy = self.busy();
        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, &self.compositor.scene().style, busy))
            .inner;

        match toolbar_action {
            toolbar::ToolbarAction::SelectPhoto => self.select_photo(),
            toolbar::ToolbarAction::FontSize(delta) => self.compositor.adjust_font_size(delta),
            toolbar::ToolbarAction::ToggleStroke => self.compositor.toggle_stroke(),
            toolbar::ToolbarAction::Save => self.request_output(PendingOutput::Save, ctx),
            toolbar::ToolbarAction::Share => self.request_output(PendingOutput::Share, ctx),
            toolbar::ToolbarAction::None => {}
        }

        // Properties panel (right side)
        let properties_action = egui::SidePanel::right("properties")
            .default_width(260.0)
            .show(ctx, |ui| {
                properties::show(
                    ui,
                    self.compositor.scene(),
                    self.status_message.as_deref(),
                    self.error_message.as_deref(),
                )
            })
            .inner;

        match properties_action {
            properties::PropertiesAction::SetText(layer, text) => self.compositor.set_text(layer, text),
            properties::PropertiesAction::Transform(update) => self.compositor.update_photo_transform(update),
            properties::PropertiesAction::None => {}
        }

        // Main canvas (center)
        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| canvas::show(ui, &self.compositor, &self.preview_texture))
            .inner;

        match canvas_action {
            canvas::CanvasAction::SelectPhoto => self.select_photo(),
            canvas::CanvasAction::BeginDrag(layer, point) => {
                self.compositor.begin_drag(layer, point);
            }
            canvas::CanvasAction::DragMove(point, container) => {
                self.compositor.drag_move(point, container);
            }
            canvas::CanvasAction::EndDrag => self.compositor.end_drag(),
            canvas::CanvasAction::None => {}
        }
    }
}
