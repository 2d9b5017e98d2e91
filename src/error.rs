// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the card compositor.

use thiserror::Error;

/// Result type alias for compositor operations.
pub type Result<T> = std::result::Result<T, CardError>;

/// Errors that can occur while composing or exporting a card.
#[derive(Error, Debug)]
pub enum CardError {
    /// The template (or the label font) could not be loaded
    #[error("Failed to load asset: {0}")]
    AssetLoad(String),

    /// The selected photo is not an image we can decode
    #[error("Failed to decode photo: {0}")]
    PhotoDecode(String),

    /// The selected photo exceeds the configured limits
    #[error("Photo too large: {0}")]
    PhotoTooLarge(String),

    /// An export is already running
    #[error("An export is already in progress")]
    ExportInProgress,

    /// Export did not finish in time
    #[error("Export timed out after {0}ms")]
    Timeout(u64),

    /// The export worker stopped without producing an image
    #[error("Rendering failed: {0}")]
    Render(String),

    /// PNG encoding failed
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// Share intent could not be built
    #[error("Failed to build share link: {0}")]
    Share(String),

    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CardError {
    /// Whether the export worker should try once more after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CardError::AssetLoad(_) | CardError::Timeout(_))
    }
}
