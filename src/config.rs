// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! overrides. Files are read as YAML or JSON depending on the extension.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_TEMPLATE_URL: &str =
    "https://cdn.jsdelivr.net/gh/takahashigy/my-images/sweatshop-template.png";
/// Largest card side accepted from a config file.
pub const MAX_CANVAS_SIZE: u32 = 4096;
pub const DEFAULT_EXPORT_FILENAME: &str = "bnb-sweatshop-card.png";
pub const DEFAULT_SHARE_TEXT: &str =
    "Welcome to BNB Sweatshop!\nCA:0xae64edf818fa29522dc7ff8506efb44c5eb625f6";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    /// Side length of the exported square card in pixels
    pub canvas_size: u32,
    pub template: TemplateConfig,
    /// TrueType font for the labels; the bundled UI font when unset
    pub font_path: Option<PathBuf>,
    pub limits: PhotoLimits,
    pub timeouts: Timeouts,
    pub share: ShareConfig,
    pub export_filename: String,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            canvas_size: 500,
            template: TemplateConfig::default(),
            font_path: None,
            limits: PhotoLimits::default(),
            timeouts: Timeouts::default(),
            share: ShareConfig::default(),
            export_filename: DEFAULT_EXPORT_FILENAME.to_string(),
        }
    }
}

impl CardConfig {
    /// Bring loaded values into their working ranges, warning about each change.
    pub fn validated(mut self) -> Self {
        let size = self.canvas_size.clamp(1, MAX_CANVAS_SIZE);
        if size != self.canvas_size {
            log::warn!("canvas_size {} out of range, using {}", self.canvas_size, size);
            self.canvas_size = size;
        }

        let deadline = self.timeouts.export_deadline_ms();
        if deadline != self.timeouts.export_timeout_ms {
            log::warn!(
                "export_timeout_ms {} cannot cover a template fetch retry, using {}",
                self.timeouts.export_timeout_ms,
                deadline
            );
            self.timeouts.export_timeout_ms = deadline;
        }

        self
    }
}

/// Where the card template comes from. A local path wins over the URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub url: String,
    pub path: Option<PathBuf>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_TEMPLATE_URL.to_string(),
            path: None,
        }
    }
}

/// Upper bounds for user photos.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoLimits {
    pub max_bytes: usize,
    pub max_dimension: u32,
}

impl Default for PhotoLimits {
    fn default() -> Self {
        Self {
            max_bytes: 20 * 1024 * 1024,
            max_dimension: 8192,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub fetch_timeout_ms: u64,
    pub export_timeout_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: 10_000,
            export_timeout_ms: 15_000,
        }
    }
}

impl Timeouts {
    /// How long a caller waits on an export: at least two template fetches,
    /// since the worker retries a timed out fetch once.
    pub fn export_deadline_ms(&self) -> u64 {
        self.export_timeout_ms
            .max(self.fetch_timeout_ms.saturating_mul(2))
    }
}

/// Social share intent settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    pub intent_url: String,
    pub text: String,
    pub hashtags: Vec<String>,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            intent_url: "https://twitter.com/intent/tweet".to_string(),
            text: DEFAULT_SHARE_TEXT.to_string(),
            hashtags: vec!["BNBCHAIN".to_string(), "SWEATSHOP".to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = CardConfig::default();
        assert_eq!(cfg.canvas_size, 500);
        assert_eq!(cfg.export_filename, "bnb-sweatshop-card.png");
        assert_eq!(cfg.template.url, DEFAULT_TEMPLATE_URL);
        assert!(cfg.template.path.is_none());
        assert_eq!(cfg.share.hashtags, vec!["BNBCHAIN", "SWEATSHOP"]);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "canvas_size: 1000\ntimeouts:\n  export_timeout_ms: 500\n";
        let cfg: CardConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.canvas_size, 1000);
        assert_eq!(cfg.timeouts.export_timeout_ms, 500);
        assert_eq!(cfg.timeouts.fetch_timeout_ms, 10_000);
        assert_eq!(cfg.limits, PhotoLimits::default());
    }

    #[test]
    fn test_export_deadline_covers_fetch_retry() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.export_deadline_ms(), 20_000);

        let timeouts = Timeouts {
            fetch_timeout_ms: 1_000,
            export_timeout_ms: 30_000,
        };
        assert_eq!(timeouts.export_deadline_ms(), 30_000);
    }

    #[test]
    fn test_validated_clamps_canvas_and_timeouts() {
        let mut cfg = CardConfig::default();
        cfg.canvas_size = 100_000;
        cfg.timeouts.fetch_timeout_ms = 1_000;
        cfg.timeouts.export_timeout_ms = 1_500;

        let cfg = cfg.validated();
        assert_eq!(cfg.canvas_size, MAX_CANVAS_SIZE);
        assert_eq!(cfg.timeouts.export_timeout_ms, 2_000);

        let mut cfg = CardConfig::default();
        cfg.canvas_size = 0;
        assert_eq!(cfg.validated().canvas_size, 1);
    }

    #[test]
    fn test_validated_keeps_sane_values() {
        let mut cfg = CardConfig::default();
        cfg.timeouts.export_timeout_ms = 25_000;
        let expected = cfg.clone();
        assert_eq!(cfg.validated(), expected);
    }

    #[test]
    fn test_json_template_path() {
        let json = r#"{ "template": { "path": "card.png" } }"#;
        let cfg: CardConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.template.path, Some(PathBuf::from("card.png")));
        assert_eq!(cfg.template.url, DEFAULT_TEMPLATE_URL);
    }
}
