// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterizing through a pdftoppm-compatible CLI.

use std::path::{Path, PathBuf};

use quire_core::error::{QuireError, Result};
use quire_core::types::RasterFormat;
use tracing::{info, instrument};

use crate::process::run_tool;
use crate::tool_args;

/// Renders PDF pages to image files.
pub struct Rasterizer {
    tool: String,
    timeout_secs: u64,
}

impl Rasterizer {
    pub fn new(tool: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            tool: tool.into(),
            timeout_secs,
        }
    }

    /// Render every page of `input` to an image file.
    ///
    /// Runs `<tool> <format-flag> <input> <prefix>`; the rasterizer writes
    /// one `<prefix>-<page>.<ext>` per page (page numbers zero-padded to a
    /// uniform width, so lexical order is page order). Returns the produced
    /// paths sorted.
    #[instrument(skip_all, fields(input = %input.display(), format = ?format))]
    pub async fn render_pages(
        &self,
        input: &Path,
        prefix: &Path,
        format: RasterFormat,
    ) -> Result<Vec<PathBuf>> {
        let args = tool_args![format.tool_flag(), input, prefix];
        run_tool(&self.tool, &args, self.timeout_secs).await?;

        let pages = collect_outputs(prefix)?;
        if pages.is_empty() {
            return Err(QuireError::BridgeFailed {
                tool: self.tool.clone(),
                detail: "rasterizer exited cleanly but produced no pages".to_string(),
            });
        }

        info!(pages = pages.len(), "document rasterized");
        Ok(pages)
    }
}

/// Files in the prefix's directory whose names extend the prefix, sorted.
fn collect_outputs(prefix: &Path) -> Result<Vec<PathBuf>> {
    let dir = prefix.parent().unwrap_or_else(|| Path::new("."));
    let stem = prefix
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(&stem) && name.len() > stem.len() {
            pages.push(entry.path());
        }
    }
    pages.sort();
    Ok(pages)
}
