// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Card template loading.
//!
//! The template is a read-only session asset: fetched on first use, then
//! served from memory. Loads are serialized, so concurrent callers share
//! one fetch. Failed loads are not cached so the next export tries again.

use crate::config::TemplateConfig;
use crate::error::{CardError, Result};
use image::RgbaImage;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Where template pixels come from.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Remote(String),
    File(PathBuf),
    #[cfg(test)]
    Image(Arc<RgbaImage>),
}

impl TemplateSource {
    pub fn from_config(config: &TemplateConfig) -> Self {
        match &config.path {
            Some(path) => TemplateSource::File(path.clone()),
            None => TemplateSource::Remote(config.url.clone()),
        }
    }
}

/// Session cache in front of a `TemplateSource`.
#[derive(Debug)]
pub struct TemplateStore {
    source: TemplateSource,
    fetch_timeout: Duration,
    cached: Mutex<Option<Arc<RgbaImage>>>,
    /// Held across a load
    loading: Mutex<()>,
}

impl TemplateStore {
    pub fn new(source: TemplateSource, fetch_timeout: Duration) -> Self {
        let cached = match &source {
            #[cfg(test)]
            TemplateSource::Image(img) => Some(img.clone()),
            _ => None,
        };
        Self {
            source,
            fetch_timeout,
            cached: Mutex::new(cached),
            loading: Mutex::new(()),
        }
    }

    /// The template if it has already been loaded.
    pub fn cached(&self) -> Option<Arc<RgbaImage>> {
        self.cached.lock().ok().and_then(|guard| guard.clone())
    }

    /// Return the template, loading it on first use.
    pub fn get(&self) -> Result<Arc<RgbaImage>> {
        if let Some(img) = self.cached() {
            return Ok(img);
        }

        // The guard protects no data, so poisoning is harmless
        let _loading = self.loading.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(img) = self.cached() {
            return Ok(img);
        }

        let img = Arc::new(self.load()?);
        log::info!("Loaded template ({}x{})", img.width(), img.height());

        if let Ok(mut guard) = self.cached.lock() {
            *guard = Some(img.clone());
        }
        Ok(img)
    }

    fn load(&self) -> Result<RgbaImage> {
        let bytes = match &self.source {
            #[cfg(test)]
            TemplateSource::Image(img) => return Ok(img.as_ref().clone()),
            TemplateSource::File(path) => std::fs::read(path).map_err(|e| {
                CardError::AssetLoad(format!("template {}: {}", path.display(), e))
            })?,
            TemplateSource::Remote(url) => self.fetch(url)?,
        };

        let img = image::load_from_memory(&bytes)
            .map_err(|e| CardError::AssetLoad(format!("template is not a valid image: {}", e)))?;
        Ok(img.to_rgba8())
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        log::info!("Fetching template from {}", url);

        let client = reqwest::blocking::Client::builder()
            .timeout(self.fetch_timeout)
            .build()
            .map_err(|e| CardError::AssetLoad(e.to_string()))?;

        let response = client
            .get(url)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    CardError::Timeout(self.fetch_timeout.as_millis() as u64)
                } else {
                    CardError::AssetLoad(format!("{}: {}", url, e))
                }
            })?
            .error_for_status()
            .map_err(|e| CardError::AssetLoad(format!("{}: {}", url, e)))?;

        let bytes = response
            .bytes()
            .map_err(|e| CardError::AssetLoad(format!("{}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

/// Serve `png` over HTTP on a local port, counting connections.
///
/// The first `stall` connections are accepted and never answered. The
/// rest get the image after `delay`.
#[cfg(test)]
pub(crate) fn serve_png(
    png: Vec<u8>,
    stall: usize,
    delay: Duration,
) -> (String, Arc<std::sync::atomic::AtomicUsize>) {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/template.png", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    std::thread::spawn(move || {
        let mut stalled = Vec::new();
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            if counter.fetch_add(1, Ordering::SeqCst) < stall {
                stalled.push(stream);
                continue;
            }

            let png = png.clone();
            std::thread::spawn(move || {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                std::thread::sleep(delay);
                let header = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    png.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(&png);
            });
        }
    });

    (url, hits)
}
