// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration file loading.
//!
//! This module reads `CardConfig` from YAML or JSON, chosen by the file
//! extension.

use crate::config::CardConfig;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Import configuration from YAML format.
pub fn import_yaml(path: &Path) -> Result<CardConfig> {
    let yaml = std::fs::read_to_string(path)?;
    let data = serde_yaml::from_str(&yaml)?;
    Ok(data)
}

/// Import configuration from JSON format.
pub fn import_json(path: &Path) -> Result<CardConfig> {
    let json = std::fs::read_to_string(path)?;
    let data = serde_json::from_str(&json)?;
    Ok(data)
}

/// Import configuration, picking the format from the extension.
pub fn import_config(path: &Path) -> Result<CardConfig> {
    let extension = path.extension().and_then(|s| s.to_str());
    let config = match extension {
        Some("yaml") | Some("yml") => import_yaml(path),
        Some("json") => import_json(path),
        _ => bail!("Unsupported config extension: {:?}", extension),
    }
    .with_context(|| format!("Failed to read config {}", path.display()))?;

    log::info!("Loaded config from {}", path.display());
    Ok(config.validated())
}
