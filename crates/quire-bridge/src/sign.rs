// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cryptographic signing through a jsignpdf-compatible CLI.

use std::path::{Path, PathBuf};

use quire_core::error::{QuireError, Result};
use tracing::{info, instrument};

use crate::process::run_tool;
use crate::tool_args;

/// Applies detached signatures with a PKCS#12 keystore.
pub struct Signer {
    tool: String,
    timeout_secs: u64,
}

impl Signer {
    pub fn new(tool: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            tool: tool.into(),
            timeout_secs,
        }
    }

    /// Sign `input`, writing into `outdir`.
    ///
    /// Runs `<tool> -kst PKCS12 -ksf <keystore> -ksp <passphrase> -d
    /// <outdir> <input>` and returns the `<stem>_signed.pdf` the signer
    /// writes there.
    #[instrument(skip_all, fields(input = %input.display()))]
    pub async fn sign(
        &self,
        input: &Path,
        outdir: &Path,
        keystore: &Path,
        passphrase: &str,
    ) -> Result<PathBuf> {
        let args = tool_args![
            "-kst",
            "PKCS12",
            "-ksf",
            keystore,
            "-ksp",
            passphrase,
            "-d",
            outdir,
            input,
        ];
        run_tool(&self.tool, &args, self.timeout_secs).await?;

        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let produced = outdir.join(format!("{stem}_signed.pdf"));
        if !produced.is_file() {
            return Err(QuireError::BridgeFailed {
                tool: self.tool.clone(),
                detail: format!(
                    "signer exited cleanly but produced no {}",
                    produced.display()
                ),
            });
        }

        info!(output = %produced.display(), "document signed");
        Ok(produced)
    }
}
