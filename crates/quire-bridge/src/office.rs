// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Office-format conversion through a LibreOffice-compatible CLI.

use std::path::{Path, PathBuf};

use quire_core::error::{QuireError, Result};
use tracing::{info, instrument};

use crate::process::run_tool;
use crate::tool_args;

/// Converts office documents (docx, xlsx, pptx, odt, ...) to PDF.
pub struct OfficeConverter {
    tool: String,
    timeout_secs: u64,
}

impl OfficeConverter {
    pub fn new(tool: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            tool: tool.into(),
            timeout_secs,
        }
    }

    /// Convert `input` to PDF, writing into `outdir`.
    ///
    /// Runs `<tool> --headless --convert-to pdf --outdir <outdir> <input>`
    /// and returns the path of the produced PDF. The converter names its
    /// output after the input stem; a clean exit without that file is still
    /// a failure.
    #[instrument(skip_all, fields(input = %input.display()))]
    pub async fn to_pdf(&self, input: &Path, outdir: &Path) -> Result<PathBuf> {
        let args = tool_args![
            "--headless",
            "--convert-to",
            "pdf",
            "--outdir",
            outdir,
            input,
        ];
        run_tool(&self.tool, &args, self.timeout_secs).await?;

        let stem = input.file_stem().ok_or_else(|| QuireError::BridgeFailed {
            tool: self.tool.clone(),
            detail: format!("input path has no file stem: {}", input.display()),
        })?;
        let produced = outdir.join(stem).with_extension("pdf");
        if !produced.is_file() {
            return Err(QuireError::BridgeFailed {
                tool: self.tool.clone(),
                detail: format!(
                    "converter exited cleanly but produced no {}",
                    produced.display()
                ),
            });
        }

        info!(output = %produced.display(), "office document converted");
        Ok(produced)
    }
}
