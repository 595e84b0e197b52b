// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings for one engine instance.
///
/// External tool names are plain strings resolved through `PATH`; point them
/// at absolute paths to pin specific installations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory for intermediate artifacts. Every generated path embeds a
    /// random identifier, so concurrent requests never collide.
    pub temp_dir: PathBuf,
    /// Hard per-invocation time limit for external tools, in seconds.
    pub bridge_timeout_secs: u64,
    /// Office-format converter (LibreOffice-compatible CLI).
    pub office_tool: String,
    /// Page rasterizer (poppler's pdftoppm-compatible CLI).
    pub raster_tool: String,
    /// First-choice compressor.
    pub compressor_tool: String,
    /// Stronger fallback compressor, parameterized by level.
    pub fallback_compressor_tool: String,
    /// Decryption tool.
    pub decrypt_tool: String,
    /// Detached signing tool; failures fall back to a visual stamp.
    pub sign_tool: String,
    /// Cap on pages submitted to text extraction.
    pub max_extract_pages: usize,
    /// Capacity of the archive producer's entry channel.
    pub archive_channel_capacity: usize,
    /// Delay before best-effort deletion of intermediates, in seconds.
    pub cleanup_delay_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
            bridge_timeout_secs: 120,
            office_tool: "soffice".into(),
            raster_tool: "pdftoppm".into(),
            compressor_tool: "qpdf".into(),
            fallback_compressor_tool: "gs".into(),
            decrypt_tool: "qpdf".into(),
            sign_tool: "jsignpdf".into(),
            max_extract_pages: 200,
            archive_channel_capacity: 4,
            cleanup_delay_secs: 2,
        }
    }
}

impl EngineConfig {
    /// A unique path in the temp area for a generated artifact.
    pub fn scratch_path(&self, suffix: &str) -> PathBuf {
        self.temp_dir
            .join(format!("quire_{}_{suffix}", uuid::Uuid::new_v4()))
    }
}
