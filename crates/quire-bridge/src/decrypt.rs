// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Password removal through qpdf.

use std::path::Path;

use quire_core::error::Result;
use tracing::{info, instrument};

use crate::process::run_tool;
use crate::tool_args;

/// Strips encryption from password-protected documents.
pub struct Decryptor {
    tool: String,
    timeout_secs: u64,
}

impl Decryptor {
    pub fn new(tool: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            tool: tool.into(),
            timeout_secs,
        }
    }

    /// Write a decrypted copy of `input` to `output`.
    ///
    /// Runs `<tool> --password=<pw> --decrypt <input> <output>`. A wrong
    /// password surfaces as `BridgeFailed`; the caller decides whether that
    /// means `WrongPassword` by re-inspecting the input.
    #[instrument(skip_all, fields(input = %input.display()))]
    pub async fn decrypt(&self, input: &Path, output: &Path, password: &str) -> Result<()> {
        let args = tool_args![
            format!("--password={password}"),
            "--decrypt",
            input,
            output,
        ];
        run_tool(&self.tool, &args, self.timeout_secs).await?;
        info!(output = %output.display(), "decrypted copy written");
        Ok(())
    }
}
