// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Card Maker
//!
//! A desktop application that places a photo and name/role labels onto
//! a card template, exports the result as PNG and prefills a share link.

mod app;
mod compositor;
mod config;
mod error;
mod io;
mod models;
mod render;
mod share;
mod ui;
mod util;

use anyhow::{Context, Result};
use app::CardMakerApp;
use clap::Parser;
use compositor::Compositor;
use config::CardConfig;
use models::scene::{LayerId, PhotoTransformUpdate};
use std::path::{Path, PathBuf};

/// Compose a photo onto a card template.
#[derive(Parser, Debug)]
#[command(name = "cardmaker", version, about)]
struct Args {
    /// Configuration file (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use a local template image instead of downloading it
    #[arg(long)]
    template: Option<PathBuf>,

    /// Render without opening a window and write the PNG here
    #[arg(long, value_name = "PNG")]
    output: Option<PathBuf>,

    /// Photo to place on the card
    #[arg(long)]
    photo: Option<PathBuf>,

    /// Name label text
    #[arg(long)]
    name: Option<String>,

    /// Position label text
    #[arg(long)]
    role: Option<String>,

    /// Photo zoom, 0.5 to 2
    #[arg(long)]
    scale: Option<f32>,

    /// Photo rotation in degrees, -180 to 180
    #[arg(long, allow_hyphen_values = true)]
    rotation: Option<f32>,

    /// Horizontal photo offset, -50 to 50
    #[arg(long, allow_hyphen_values = true)]
    offset_x: Option<f32>,

    /// Vertical photo offset, -50 to 150
    #[arg(long, allow_hyphen_values = true)]
    offset_y: Option<f32>,

    /// Label font size, 12 to 30
    #[arg(long)]
    font_size: Option<u32>,

    /// Draw the labels without the white outline
    #[arg(long)]
    no_stroke: bool,

    /// Print the share link after rendering with --output
    #[arg(long)]
    share: bool,
}

/// Apply the scene flags, so both modes start from the same card.
fn apply_args(args: &Args, compositor: &mut Compositor) -> Result<()> {
    if let Some(ref photo) = args.photo {
        let bytes = std::fs::read(photo)
            .with_context(|| format!("Failed to read photo {}", photo.display()))?;
        compositor.set_photo(&bytes)?;
    }

    if let Some(ref name) = args.name {
        compositor.set_text(LayerId::Name, name.clone());
    }
    if let Some(ref role) = args.role {
        compositor.set_text(LayerId::Role, role.clone());
    }
    compositor.update_photo_transform(PhotoTransformUpdate {
        scale: args.scale,
        rotation: args.rotation,
        offset_x: args.offset_x,
        offset_y: args.offset_y,
    });
    if let Some(size) = args.font_size {
        let current = compositor.scene().style.font_size as i64;
        let delta = (size as i64 - current).clamp(i32::MIN as i64, i32::MAX as i64);
        compositor.adjust_font_size(delta as i32);
    }
    if args.no_stroke {
        compositor.toggle_stroke();
    }

    Ok(())
}

/// Render the card without a window and write it to `output`.
fn render_headless(args: &Args, output: &Path, mut compositor: Compositor) -> Result<()> {
    let artifact = compositor.export()?;
    artifact
        .save(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!("Wrote {}", output.display());

    if args.share {
        // Reuses the artifact rendered above
        let intent = compositor.share()?;
        println!("{}", intent.url);
        eprintln!("{}", share::ATTACH_HINT);
    }

    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let mut config = match args.config {
        Some(ref path) => io::serialization::import_config(path)?,
        None => CardConfig::default(),
    };
    if let Some(ref template) = args.template {
        config.template.path = Some(template.clone());
    }

    let mut compositor = Compositor::from_config(&config).context("Failed to set up the compositor")?;
    apply_args(&args, &mut compositor)?;

    if let Some(ref output) = args.output {
        return render_headless(&args, output, compositor);
    }

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 680.0])
            .with_min_inner_size([720.0, 560.0])
            .with_title("Card Maker"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Card Maker",
        options,
        Box::new(|_cc| Ok(Box::new(CardMakerApp::new(compositor)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
