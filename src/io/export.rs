// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Exported card images.
//!
//! An `Artifact` is a snapshot: it records the scene revision it was
//! rendered from and is never updated afterwards.

use crate::error::Result;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use std::path::Path;

/// A rendered, PNG-encoded card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Scene revision this artifact was rendered from
    pub revision: u64,
}

impl Artifact {
    /// `data:` URL form of the PNG.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", BASE64_STANDARD.encode(&self.png))
    }

    /// Write the PNG to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.png)?;
        log::info!("Saved card to {} ({} bytes)", path.display(), self.png.len());
        Ok(())
    }
}
