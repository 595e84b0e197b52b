// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF compression through qpdf, with a Ghostscript fallback.
//
// qpdf losslessly restructures streams and object layout; Ghostscript
// re-renders at a quality level and usually shrinks further. The chain tries
// qpdf first, Ghostscript second, and gives up with `NoCompressorAvailable`
// only once both are exhausted.

use std::path::Path;

use quire_core::error::{QuireError, Result};
use quire_core::types::CompressionLevel;
use tracing::{info, instrument, warn};

use crate::process::run_tool;
use crate::tool_args;

/// Ordered first-success-wins compressor chain.
pub struct CompressorChain {
    primary_tool: String,
    fallback_tool: String,
    timeout_secs: u64,
}

impl CompressorChain {
    pub fn new(
        primary_tool: impl Into<String>,
        fallback_tool: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            primary_tool: primary_tool.into(),
            fallback_tool: fallback_tool.into(),
            timeout_secs,
        }
    }

    /// Compress `input` into `output` through the tool chain.
    #[instrument(skip_all, fields(level = ?level))]
    pub async fn compress(
        &self,
        input: &Path,
        output: &Path,
        level: CompressionLevel,
    ) -> Result<()> {
        let primary = tool_args![
            "--stream-data=compress",
            "--object-streams=generate",
            input,
            output,
        ];
        match run_tool(&self.primary_tool, &primary, self.timeout_secs).await {
            Ok(_) if output.is_file() => {
                info!(tool = %self.primary_tool, "compressed");
                return Ok(());
            }
            Ok(_) => {
                warn!(tool = %self.primary_tool, "clean exit but no output, trying fallback");
            }
            Err(err) => {
                warn!(tool = %self.primary_tool, %err, "primary compressor failed, trying fallback");
            }
        }

        let fallback = tool_args![
            "-sDEVICE=pdfwrite",
            "-dCompatibilityLevel=1.4",
            format!("-dPDFSETTINGS={}", level.settings_token()),
            "-dNOPAUSE",
            "-dQUIET",
            "-dBATCH",
            {
                let mut arg = std::ffi::OsString::from("-sOutputFile=");
                arg.push(output);
                arg
            },
            input,
        ];
        match run_tool(&self.fallback_tool, &fallback, self.timeout_secs).await {
            Ok(_) if output.is_file() => {
                info!(tool = %self.fallback_tool, "compressed via fallback");
                Ok(())
            }
            Ok(_) => Err(QuireError::NoCompressorAvailable),
            Err(err) => {
                warn!(tool = %self.fallback_tool, %err, "fallback compressor failed");
                Err(QuireError::NoCompressorAvailable)
            }
        }
    }
}
