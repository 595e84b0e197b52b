// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Protection, compression, and signing.

use quire_core::error::{QuireError, Result};
use quire_core::types::{CompressionLevel, FileHandle};
use quire_document::DocumentModel;
use tracing::{info, instrument, warn};

use crate::output::OpOutput;
use crate::stamp::visual_signature;
use crate::{Engine, cleanup, load_handle};

impl Engine {
    /// Encrypt a document with the given password (used for both the user
    /// and owner password) and a printing-allowed permission set.
    ///
    /// The result is a rebuilt copy, so protecting an already-loaded
    /// document never disturbs the uploaded bytes.
    #[instrument(skip_all)]
    pub fn protect(&self, file: &FileHandle, password: &str) -> Result<OpOutput> {
        let source = load_handle(file, None)?;

        let mut result = DocumentModel::create();
        let all: Vec<usize> = (0..source.page_count()).collect();
        result.copy_pages_from(&source, &all)?;
        result.encrypt(password, password)?;

        info!(pages = source.page_count(), "protect complete");
        Ok(OpOutput::Pdf(result.serialize()?))
    }

    /// Remove encryption from a document, given its password.
    ///
    /// The decryption tool does the heavy lifting. When it fails, the
    /// outcome depends on the document itself: an unencrypted input is
    /// simply re-serialized (nothing to remove), an encrypted one means the
    /// password was wrong.
    #[instrument(skip_all)]
    pub async fn unprotect(&self, file: &FileHandle, password: &str) -> Result<OpOutput> {
        let decryptor = quire_bridge::Decryptor::new(
            self.config().decrypt_tool.clone(),
            self.config().bridge_timeout_secs,
        );
        let scratch = self.config().scratch_path("decrypted.pdf");

        match decryptor.decrypt(&file.path, &scratch, password).await {
            Ok(()) => {
                let bytes = std::fs::read(&scratch)?;
                cleanup::schedule_removal(self.config(), vec![scratch]);
                // Validate before handing it back.
                DocumentModel::from_bytes(&bytes, None)?;
                info!("unprotect complete");
                Ok(OpOutput::Pdf(bytes))
            }
            Err(err) => {
                warn!(%err, "decryption tool failed, inspecting input directly");
                cleanup::schedule_removal(self.config(), vec![scratch]);
                match load_handle(file, None) {
                    Ok(model) => Ok(OpOutput::Pdf(model.serialize()?)),
                    Err(QuireError::RequiresPassword) => Err(QuireError::WrongPassword),
                    Err(other) => Err(other),
                }
            }
        }
    }

    /// Shrink a document through the compressor chain.
    #[instrument(skip_all, fields(level = ?level))]
    pub async fn compress(&self, file: &FileHandle, level: CompressionLevel) -> Result<OpOutput> {
        let chain = quire_bridge::CompressorChain::new(
            self.config().compressor_tool.clone(),
            self.config().fallback_compressor_tool.clone(),
            self.config().bridge_timeout_secs,
        );
        let scratch = self.config().scratch_path("compressed.pdf");

        let outcome = chain.compress(&file.path, &scratch, level).await;
        let result = match outcome {
            Ok(()) => {
                let bytes = std::fs::read(&scratch)?;
                info!(bytes = bytes.len(), "compress complete");
                Ok(OpOutput::Pdf(bytes))
            }
            Err(err) => Err(err),
        };
        cleanup::schedule_removal(self.config(), vec![scratch]);
        result
    }

    /// Sign a document.
    ///
    /// With a PKCS#12 keystore upload and its passphrase, the external
    /// signer applies a real cryptographic signature; without them, or when
    /// the signer fails, the document gets a visual signature line instead.
    #[instrument(skip_all, fields(has_keystore = keystore.is_some()))]
    pub async fn sign(
        &self,
        file: &FileHandle,
        signer_name: Option<&str>,
        keystore: Option<&FileHandle>,
        passphrase: Option<&str>,
    ) -> Result<OpOutput> {
        if let (Some(keystore), Some(passphrase)) = (keystore, passphrase) {
            let signer = quire_bridge::Signer::new(
                self.config().sign_tool.clone(),
                self.config().bridge_timeout_secs,
            );
            let outdir = self.config().scratch_path("signed");
            std::fs::create_dir_all(&outdir)?;

            match signer
                .sign(&file.path, &outdir, &keystore.path, passphrase)
                .await
            {
                Ok(produced) => {
                    let bytes = std::fs::read(&produced)?;
                    cleanup::schedule_removal(self.config(), vec![outdir]);
                    info!("cryptographic signature applied");
                    return Ok(OpOutput::Pdf(bytes));
                }
                Err(err) => {
                    warn!(%err, "signer failed, falling back to visual signature");
                    cleanup::schedule_removal(self.config(), vec![outdir]);
                }
            }
        }

        let mut model = load_handle(file, None)?;
        visual_signature(&mut model, signer_name.unwrap_or("Unknown"))?;
        info!("visual signature applied");
        Ok(OpOutput::Pdf(model.serialize()?))
    }
}
