// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Social share intent links.
//!
//! Web intents carry text only. The exported card is never attached; the
//! user has to add the downloaded image to the post themselves.

use crate::config::ShareConfig;
use crate::error::{CardError, Result};
use crate::io::export::Artifact;
use url::Url;

/// Shown alongside the intent so the user knows to attach the card.
pub const ATTACH_HINT: &str =
    "The share page cannot attach images. Save the card first, then add it to your post.";

/// A ready-to-open share intent plus the card the user should attach.
#[derive(Debug, Clone)]
pub struct ShareIntent {
    pub url: Url,
    pub artifact: Artifact,
}

/// Build the intent URL with the campaign text and hashtags.
pub fn share_link(config: &ShareConfig) -> Result<Url> {
    let mut params = vec![("text", config.text.clone())];
    if !config.hashtags.is_empty() {
        params.push(("hashtags", config.hashtags.join(",")));
    }

    Url::parse_with_params(&config.intent_url, &params)
        .map_err(|e| CardError::Share(format!("{}: {}", config.intent_url, e)))
}
