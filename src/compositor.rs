// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The card compositor.
//!
//! Owns the scene and every way of changing it: photo and transform,
//! label text and style, and the label drag interaction. Every change
//! bumps a revision counter, which is how exported artifacts are known
//! to be current or stale.
//!
//! Export renders a snapshot of the scene on a worker thread. Only one
//! export may be outstanding. The worker retries once on a retryable
//! failure, and the caller gives up after the export deadline, which
//! always leaves room for both template fetch attempts.

use crate::config::{CardConfig, PhotoLimits, ShareConfig};
use crate::error::{CardError, Result};
use crate::io::export::Artifact;
use crate::io::media;
use crate::io::template::{TemplateSource, TemplateStore};
use crate::models::drag::DragMachine;
use crate::models::scene::{LayerId, PhotoTransformUpdate, Scene};
use crate::render::{encode_png, Renderer};
use crate::share::{share_link, ShareIntent};
use crate::util::geometry::{Point, Size};
use image::RgbaImage;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An export running on a worker thread.
struct ExportJob {
    receiver: Receiver<Result<Artifact>>,
    started: Instant,
}

pub struct Compositor {
    scene: Scene,
    revision: u64,
    drag: DragMachine,
    renderer: Arc<Renderer>,
    templates: Arc<TemplateStore>,
    limits: PhotoLimits,
    share: ShareConfig,
    export_filename: String,
    export_timeout: Duration,
    job: Option<ExportJob>,
    last_artifact: Option<Artifact>,
}

impl Compositor {
    pub fn new(renderer: Renderer, templates: TemplateStore, config: &CardConfig) -> Self {
        Self {
            scene: Scene::new(),
            revision: 0,
            drag: DragMachine::new(),
            renderer: Arc::new(renderer),
            templates: Arc::new(templates),
            limits: config.limits,
            share: config.share.clone(),
            export_filename: config.export_filename.clone(),
            export_timeout: Duration::from_millis(config.timeouts.export_deadline_ms()),
            job: None,
            last_artifact: None,
        }
    }

    /// Build the renderer and template store described by `config`.
    pub fn from_config(config: &CardConfig) -> Result<Self> {
        let renderer = Renderer::from_config(config)?;
        let templates = TemplateStore::new(
            TemplateSource::from_config(&config.template),
            Duration::from_millis(config.timeouts.fetch_timeout_ms),
        );
        Ok(Self::new(renderer, templates, config))
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn templates(&self) -> Arc<TemplateStore> {
        self.templates.clone()
    }

    pub fn limits(&self) -> PhotoLimits {
        self.limits
    }

    pub fn export_filename(&self) -> &str {
        &self.export_filename
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // ---- Photo -------------------------------------------------------

    /// Decode and install a photo. On error the previous photo is kept.
    pub fn set_photo(&mut self, bytes: &[u8]) -> Result<()> {
        let img = media::decode_photo(bytes, &self.limits)?;
        self.set_photo_image(img);
        Ok(())
    }

    /// Install an already decoded photo.
    pub fn set_photo_image(&mut self, img: RgbaImage) {
        log::info!("Photo set ({}x{})", img.width(), img.height());
        self.scene.photo = Some(Arc::new(img));
        self.touch();
    }

    pub fn update_photo_transform(&mut self, update: PhotoTransformUpdate) {
        let before = self.scene.transform;
        self.scene.transform.apply(update);
        if self.scene.transform != before {
            self.touch();
        }
    }

    // ---- Labels ------------------------------------------------------

    pub fn set_text(&mut self, layer: LayerId, value: impl Into<String>) {
        let value = value.into();
        let text = &mut self.scene.layer_mut(layer).text;
        if *text != value {
            *text = value;
            self.touch();
        }
    }

    pub fn adjust_font_size(&mut self, delta: i32) {
        let before = self.scene.style.font_size;
        self.scene.style.adjust_font_size(delta);
        if self.scene.style.font_size != before {
            self.touch();
        }
    }

    pub fn toggle_stroke(&mut self) {
        self.scene.style.stroke = !self.scene.style.stroke;
        self.touch();
    }

    // ---- Drag --------------------------------------------------------

    pub fn begin_drag(&mut self, layer: LayerId, pointer: Point) {
        self.drag.begin(layer, pointer);
    }

    /// Move the dragged label. Returns whether an anchor changed.
    pub fn drag_move(&mut self, pointer: Point, container: Size) -> bool {
        let Some(step) = self.drag.move_to(pointer, container) else {
            return false;
        };

        let layer = self.scene.layer_mut(step.layer);
        let moved = layer.anchor.shifted(step.d_left, step.d_bottom);
        if moved == layer.anchor {
            return false;
        }
        layer.anchor = moved;
        self.touch();
        true
    }

    pub fn end_drag(&mut self) {
        if let Some(layer) = self.drag.end() {
            let anchor = self.scene.layer(layer).anchor;
            log::info!(
                "Moved {:?} label to ({:.1}%, {:.1}%)",
                layer,
                anchor.left,
                anchor.bottom
            );
        }
    }

    pub fn dragging(&self) -> Option<LayerId> {
        self.drag.active_layer()
    }

    /// Which non-empty label is under `pointer` in a container of `container` pixels.
    pub fn layer_at(&self, pointer: Point, container: Size) -> Option<LayerId> {
        if container.is_empty() {
            return None;
        }
        let size = self.renderer.size() as f32;
        let p = Point::new(
            pointer.x * size / container.width,
            pointer.y * size / container.height,
        );

        // Role is painted last, so it wins where the two overlap
        LayerId::ALL.iter().rev().copied().find(|&id| {
            !self.scene.layer(id).text.is_empty()
                && self.renderer.label_rect(&self.scene, id).contains(p)
        })
    }

    // ---- Rendering ---------------------------------------------------

    /// Render for on-screen preview, with the template if it is loaded.
    pub fn preview(&self) -> RgbaImage {
        let template = self.templates.cached();
        self.renderer.render(&self.scene, template.as_deref())
    }

    pub fn export_in_progress(&self) -> bool {
        self.job.is_some()
    }

    /// Start rendering the current scene on a worker thread.
    pub fn start_export(&mut self) -> Result<()> {
        if self.job.is_some() {
            return Err(CardError::ExportInProgress);
        }

        let (sender, receiver) = channel();
        let scene = self.scene.clone();
        let revision = self.revision;
        let renderer = self.renderer.clone();
        let templates = self.templates.clone();

        std::thread::spawn(move || {
            let result = render_with_retry(&renderer, &templates, &scene, revision);
            let _ = sender.send(result);
        });

        log::info!("Export started (revision {})", revision);
        self.job = Some(ExportJob {
            receiver,
            started: Instant::now(),
        });
        Ok(())
    }

    /// Check on the running export without blocking.
    pub fn poll_export(&mut self) -> Option<Result<Artifact>> {
        let job = self.job.as_ref()?;

        let result = match job.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => {
                if job.started.elapsed() < self.export_timeout {
                    return None;
                }
                Err(self.timeout_error())
            }
            Err(TryRecvError::Disconnected) => Err(worker_stopped()),
        };

        self.job = None;
        Some(self.finish_export(result))
    }

    /// Block until the running export finishes or times out.
    pub fn wait_export(&mut self) -> Result<Artifact> {
        let job = self
            .job
            .take()
            .ok_or_else(|| CardError::Render("no export is running".to_string()))?;

        let remaining = self.export_timeout.saturating_sub(job.started.elapsed());
        let result = match job.receiver.recv_timeout(remaining) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(self.timeout_error()),
            Err(RecvTimeoutError::Disconnected) => Err(worker_stopped()),
        };
        self.finish_export(result)
    }

    /// Render the current scene and wait for the PNG.
    pub fn export(&mut self) -> Result<Artifact> {
        self.start_export()?;
        self.wait_export()
    }

    fn timeout_error(&self) -> CardError {
        CardError::Timeout(self.export_timeout.as_millis() as u64)
    }

    fn finish_export(&mut self, result: Result<Artifact>) -> Result<Artifact> {
        match &result {
            Ok(artifact) => {
                log::info!(
                    "Export finished: {}x{}, {} bytes",
                    artifact.width,
                    artifact.height,
                    artifact.png.len()
                );
                self.last_artifact = Some(artifact.clone());
            }
            Err(e) => log::error!("Export failed: {}", e),
        }
        result
    }

    /// The last artifact, if nothing has changed since it was rendered.
    pub fn valid_artifact(&self) -> Option<&Artifact> {
        self.last_artifact
            .as_ref()
            .filter(|artifact| artifact.revision == self.revision)
    }

    // ---- Share -------------------------------------------------------

    /// Share intent for a specific artifact.
    pub fn share_with(&self, artifact: Artifact) -> Result<ShareIntent> {
        let url = share_link(&self.share)?;
        Ok(ShareIntent { url, artifact })
    }

    /// Share intent, reusing the last artifact when it is still current.
    pub fn share(&mut self) -> Result<ShareIntent> {
        let artifact = match self.valid_artifact() {
            Some(artifact) => artifact.clone(),
            None => self.export()?,
        };
        self.share_with(artifact)
    }
}

fn worker_stopped() -> CardError {
    CardError::Render("export worker stopped unexpectedly".to_string())
}

fn render_artifact(
    renderer: &Renderer,
    templates: &TemplateStore,
    scene: &Scene,
    revision: u64,
) -> Result<Artifact> {
    let template = templates.get()?;
    let img = renderer.render(scene, Some(&template));
    let png = encode_png(&img)?;
    Ok(Artifact {
        png,
        width: img.width(),
        height: img.height(),
        revision,
    })
}

fn render_with_retry(
    renderer: &Renderer,
    templates: &TemplateStore,
    scene: &Scene,
    revision: u64,
) -> Result<Artifact> {
    match render_artifact(renderer, templates, scene, revision) {
        Err(e) if e.is_retryable() => {
            log::warn!("Export attempt failed ({}), retrying once", e);
            render_artifact(renderer, templates, scene, revision)
        }
        result => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::png_bytes;
    use crate::io::template::serve_png;
    use crate::render::text::load_font;
    use crate::util::geometry::Rect;
    use image::Rgba;
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;

    fn config() -> CardConfig {
        CardConfig::default()
    }

    fn compositor_with(source: TemplateSource, config: &CardConfig) -> Compositor {
        let renderer = Renderer::new(load_font(None).unwrap(), config.canvas_size);
        let templates = TemplateStore::new(
            source,
            Duration::from_millis(config.timeouts.fetch_timeout_ms),
        );
        Compositor::new(renderer, templates, config)
    }

    fn dark_pixels_in(img: &RgbaImage, rect: Rect) -> usize {
        let x0 = rect.x.max(0.0) as u32;
        let y0 = rect.y.max(0.0) as u32;
        let x1 = ((rect.x + rect.width).ceil() as u32).min(img.width());
        let y1 = ((rect.y + rect.height).ceil() as u32).min(img.height());

        let mut count = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                let p = img.get_pixel(x, y).0;
                if p[0] < 80 && p[1] < 80 && p[2] < 80 && p[3] > 200 {
                    count += 1;
                }
            }
        }
        count
    }

    fn compositor() -> Compositor {
        let template = RgbaImage::from_pixel(500, 500, Rgba([240, 200, 20, 160]));
        compositor_with(TemplateSource::Image(Arc::new(template)), &config())
    }

    #[test]
    fn test_drag_example_scenario() {
        let mut c = compositor();
        c.begin_drag(LayerId::Name, Point::new(100.0, 100.0));
        assert!(c.drag_move(Point::new(150.0, 80.0), Size::square(500.0)));
        c.end_drag();

        let anchor = c.scene().name.anchor;
        assert!((anchor.left - 68.0).abs() < 0.001);
        assert!((anchor.bottom - 23.5).abs() < 0.001);
        assert_eq!(c.dragging(), None);
        // Role label untouched
        assert_eq!(c.scene().role.anchor.left, 58.0);
    }

    #[test]
    fn test_drag_accumulates_per_sample() {
        let mut c = compositor();
        c.begin_drag(LayerId::Role, Point::new(0.0, 0.0));
        for i in 1..=5 {
            c.drag_move(Point::new(i as f32 * 10.0, 0.0), Size::new(1000.0, 500.0));
        }
        c.end_drag();
        assert!((c.scene().role.anchor.left - 63.0).abs() < 0.001);
    }

    #[test]
    fn test_second_begin_drag_cancels_first() {
        let mut c = compositor();
        c.begin_drag(LayerId::Name, Point::new(0.0, 0.0));
        c.begin_drag(LayerId::Role, Point::new(0.0, 0.0));
        c.drag_move(Point::new(50.0, 0.0), Size::square(500.0));

        assert_eq!(c.scene().name.anchor.left, 58.0);
        assert!((c.scene().role.anchor.left - 68.0).abs() < 0.001);
    }

    #[test]
    fn test_move_without_drag_keeps_revision() {
        let mut c = compositor();
        let rev = c.revision();
        assert!(!c.drag_move(Point::new(10.0, 10.0), Size::square(500.0)));
        assert_eq!(c.revision(), rev);
    }

    #[test]
    fn test_font_size_applies_to_both_labels() {
        let mut c = compositor();
        for _ in 0..50 {
            c.adjust_font_size(1);
        }
        assert_eq!(c.scene().style.font_size, 30);
        let rev = c.revision();
        c.adjust_font_size(1);
        assert_eq!(c.revision(), rev);
    }

    #[test]
    fn test_mutations_bump_revision() {
        let mut c = compositor();
        let mut rev = c.revision();

        c.set_text(LayerId::Name, "Alice");
        assert!(c.revision() > rev);
        rev = c.revision();

        c.set_text(LayerId::Name, "Alice");
        assert_eq!(c.revision(), rev);

        c.toggle_stroke();
        assert!(!c.scene().style.stroke);
        assert!(c.revision() > rev);
        rev = c.revision();

        c.update_photo_transform(PhotoTransformUpdate { scale: Some(9.0), ..Default::default() });
        assert_eq!(c.scene().transform.scale, 2.0);
        assert!(c.revision() > rev);
    }

    #[test]
    fn test_set_photo_failure_keeps_previous() {
        let mut c = compositor();
        let photo = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 255, 255]));
        c.set_photo(&png_bytes(&photo)).unwrap();
        let rev = c.revision();

        let err = c.set_photo(b"garbage").unwrap_err();
        assert!(matches!(err, CardError::PhotoDecode(_)));
        assert_eq!(c.scene().photo.as_ref().unwrap().dimensions(), (8, 8));
        assert_eq!(c.revision(), rev);
    }

    #[test]
    fn test_export_without_photo() {
        let mut c = compositor();
        c.set_text(LayerId::Name, "Alice");
        c.set_text(LayerId::Role, "Engineer");

        let artifact = c.export().unwrap();
        assert!(!artifact.png.is_empty());
        assert_eq!((artifact.width, artifact.height), (500, 500));
        assert_eq!(artifact.revision, c.revision());
        assert_eq!(c.export_filename(), "bnb-sweatshop-card.png");

        let decoded = image::load_from_memory(&artifact.png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (500, 500));

        // Template shows away from the labels
        let corner = decoded.get_pixel(5, 5).0;
        assert!(corner[0] >= 238 && corner[1] >= 198 && corner[2] <= 22);
        assert!((158..=162).contains(&corner[3]));

        // Both labels are drawn where hit testing expects them
        for id in LayerId::ALL {
            let rect = c.renderer.label_rect(c.scene(), id);
            assert!(dark_pixels_in(&decoded, rect) > 20, "no text pixels for {:?}", id);
        }
    }

    #[test]
    fn test_exports_of_unchanged_scene_are_identical() {
        let mut c = compositor();
        c.set_text(LayerId::Name, "Alice");
        let photo = RgbaImage::from_pixel(30, 40, Rgba([10, 120, 10, 255]));
        c.set_photo(&png_bytes(&photo)).unwrap();

        let first = c.export().unwrap();
        let second = c.export().unwrap();
        assert_eq!(first.png, second.png);
    }

    #[test]
    fn test_reentrant_export_rejected() {
        let mut c = compositor();
        c.start_export().unwrap();
        assert!(c.export_in_progress());
        assert!(matches!(c.start_export(), Err(CardError::ExportInProgress)));
        assert!(matches!(c.export(), Err(CardError::ExportInProgress)));

        c.wait_export().unwrap();
        assert!(!c.export_in_progress());
    }

    #[test]
    fn test_poll_export_completes() {
        let mut c = compositor();
        assert!(c.poll_export().is_none());
        c.start_export().unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let result = loop {
            if let Some(result) = c.poll_export() {
                break result;
            }
            assert!(Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(5));
        };
        assert!(result.is_ok());
        assert!(c.valid_artifact().is_some());
    }

    #[test]
    fn test_unreachable_template_fails_export() {
        let mut c = compositor_with(
            TemplateSource::File(PathBuf::from("/nonexistent/template.png")),
            &config(),
        );
        assert!(matches!(c.export(), Err(CardError::AssetLoad(_))));
        assert!(c.valid_artifact().is_none());
        assert!(!c.export_in_progress());
    }

    #[test]
    fn test_export_timeout() {
        let mut cfg = config();
        cfg.timeouts.fetch_timeout_ms = 0;
        cfg.timeouts.export_timeout_ms = 0;
        let template = RgbaImage::from_pixel(500, 500, Rgba([0, 0, 0, 0]));
        let mut c = compositor_with(TemplateSource::Image(Arc::new(template)), &cfg);

        assert!(matches!(c.export(), Err(CardError::Timeout(0))));
        assert!(!c.export_in_progress());
    }

    #[test]
    fn test_fetch_retry_finishes_within_export_deadline() {
        let template = RgbaImage::from_pixel(500, 500, Rgba([30, 60, 90, 255]));
        let (url, hits) = serve_png(png_bytes(&template), 1, Duration::ZERO);

        // Export deadline shorter than two fetches, as with the defaults
        let mut cfg = config();
        cfg.timeouts.fetch_timeout_ms = 500;
        cfg.timeouts.export_timeout_ms = 750;
        let mut c = compositor_with(TemplateSource::Remote(url), &cfg);

        let artifact = c.export().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(artifact.revision, c.revision());
        assert!(c.templates().cached().is_some());
    }

    #[test]
    fn test_share_reuses_current_artifact() {
        let mut c = compositor();
        c.set_text(LayerId::Name, "Alice");
        let exported = c.export().unwrap();

        let intent = c.share().unwrap();
        assert_eq!(intent.artifact, exported);
        assert_eq!(intent.url.host_str(), Some("twitter.com"));
    }

    #[test]
    fn test_share_recomputes_stale_artifact() {
        let mut c = compositor();
        let exported = c.export().unwrap();
        c.set_text(LayerId::Role, "Engineer");
        assert!(c.valid_artifact().is_none());

        let intent = c.share().unwrap();
        assert_eq!(intent.artifact.revision, c.revision());
        assert!(intent.artifact.revision > exported.revision);
        assert_ne!(intent.artifact.png, exported.png);
    }

    #[test]
    fn test_share_without_prior_export() {
        let mut c = compositor();
        let intent = c.share().unwrap();
        assert_eq!(intent.artifact.revision, c.revision());
    }

    #[test]
    fn test_layer_at_finds_labels() {
        let mut c = compositor();
        c.set_text(LayerId::Name, "Alice");

        let rect = c.renderer.label_rect(c.scene(), LayerId::Name);
        let center = Point::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0);
        assert_eq!(c.layer_at(center, Size::square(500.0)), Some(LayerId::Name));

        // Same spot on a half-size container
        let half = Point::new(center.x / 2.0, center.y / 2.0);
        assert_eq!(c.layer_at(half, Size::square(250.0)), Some(LayerId::Name));

        // Empty role label is not hit
        let role = c.renderer.label_rect(c.scene(), LayerId::Role);
        let role_center = Point::new(role.x + role.width / 2.0, role.y + role.height / 2.0);
        assert_eq!(c.layer_at(role_center, Size::square(500.0)), None);
        assert_eq!(c.layer_at(Point::new(5.0, 5.0), Size::square(500.0)), None);
    }

    #[test]
    fn test_preview_uses_cached_template() {
        let c = compositor();
        let preview = c.preview();
        let corner = preview.get_pixel(5, 5);
        assert!(corner.0[0] >= 238 && corner.0[3] >= 158);
    }
}
