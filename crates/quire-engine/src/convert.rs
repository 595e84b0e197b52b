// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The format conversion pipeline.
//
// Inputs are classified by declared MIME type, then extension. PDF is the
// canonical format: PDFs pass through validated, raster images become
// single full-page documents, everything else is delegated to the office
// converter bridge. With a raster target set, canonical inputs go the other
// way, through the rasterizer.
//
// A single-file request is strict: its failure is the response. Multi-file
// requests are tolerant: each failed input degrades to a placeholder (an
// error page in merged output, an `_ERROR.txt` entry in archive output) and
// the batch continues.

use quire_core::describe;
use quire_core::error::{QuireError, Result};
use quire_core::types::{
    ConversionRequest, DocumentKind, FileHandle, OutputPolicy, RasterFormat,
};
use quire_document::{DocumentModel, TextStamp, builder};
use tracing::{info, instrument, warn};

use crate::archive::{ArchiveEntry, ArchiveProducer};
use crate::output::OpOutput;
use crate::{Engine, cleanup};

/// Size of the placeholder page stamped for a failed input in merged output.
const PLACEHOLDER_PAGE: (f32, f32) = (600.0, 100.0);

impl Engine {
    /// Run one conversion request to completion.
    #[instrument(skip_all, fields(files = request.files.len(), policy = ?request.policy))]
    pub async fn convert(&self, request: ConversionRequest) -> Result<OpOutput> {
        if request.files.is_empty() {
            return Err(QuireError::NoFiles);
        }

        if let Some(format) = request.raster_target {
            return self.convert_to_images(&request.files, format).await;
        }

        if request.files.len() == 1 {
            let bytes = self.convert_one_to_pdf(&request.files[0]).await?;
            return Ok(OpOutput::Pdf(bytes));
        }

        match request.policy {
            OutputPolicy::SingleMerged => self.convert_merged(&request.files).await,
            OutputPolicy::PerFileArchive => self.convert_archived(&request.files).await,
        }
    }

    /// Tolerant multi-file conversion into one merged document.
    async fn convert_merged(&self, files: &[FileHandle]) -> Result<OpOutput> {
        let mut merged = DocumentModel::create();

        for handle in files {
            match self.convert_one_to_pdf(handle).await {
                Ok(bytes) => {
                    let converted = DocumentModel::from_bytes(&bytes, None)?;
                    let all: Vec<usize> = (0..converted.page_count()).collect();
                    merged.copy_pages_from(&converted, &all)?;
                }
                Err(err) => {
                    warn!(file = %handle.original_name, %err, "input failed, stamping placeholder");
                    let (w, h) = PLACEHOLDER_PAGE;
                    let index = merged.page_count();
                    merged.add_blank_page(w, h)?;
                    let line = describe::placeholder_line(&handle.original_name, &err);
                    merged.draw_text(index, &TextStamp::plain(20.0, h / 2.0, 12.0, line))?;
                }
            }
        }

        info!(pages = merged.page_count(), "merged conversion complete");
        Ok(OpOutput::Pdf(merged.serialize()?))
    }

    /// Tolerant multi-file conversion into a zip, one entry per input.
    async fn convert_archived(&self, files: &[FileHandle]) -> Result<OpOutput> {
        let producer = ArchiveProducer::new(self.config().archive_channel_capacity);

        for handle in files {
            let entry = match self.convert_one_to_pdf(handle).await {
                Ok(bytes) => ArchiveEntry::from_bytes(format!("{}.pdf", handle.stem()), bytes),
                Err(err) => {
                    warn!(file = %handle.original_name, %err, "input failed, adding error entry");
                    ArchiveEntry::from_bytes(
                        format!("{}_ERROR.txt", handle.stem()),
                        describe::placeholder_report(&handle.original_name, &err).into_bytes(),
                    )
                }
            };
            producer.append(entry).await?;
        }

        info!("archived conversion complete");
        Ok(OpOutput::Archive(producer.finish().await?))
    }

    /// Canonical-to-raster conversion. A single input with a single page
    /// comes back as the bare image; anything more becomes a zip.
    async fn convert_to_images(
        &self,
        files: &[FileHandle],
        format: RasterFormat,
    ) -> Result<OpOutput> {
        let rasterizer = quire_bridge::Rasterizer::new(
            self.config().raster_tool.clone(),
            self.config().bridge_timeout_secs,
        );

        // Strict single-file fast path.
        if let [handle] = files {
            let prefix = self.config().scratch_path("render");
            let pages = rasterizer
                .render_pages(&handle.path, &prefix, format)
                .await
                .map_err(|err| conversion_failure(handle, err))?;

            if let [only] = pages.as_slice() {
                let bytes = std::fs::read(only)?;
                cleanup::schedule_removal(self.config(), pages);
                return Ok(OpOutput::Raster(bytes, format));
            }

            let producer = ArchiveProducer::new(self.config().archive_channel_capacity);
            for (i, path) in pages.iter().enumerate() {
                let name = format!("{}_{}.{}", handle.stem(), i + 1, format.extension());
                producer.append(ArchiveEntry::from_file(name, path)).await?;
            }
            let bytes = producer.finish().await?;
            cleanup::schedule_removal(self.config(), pages);
            return Ok(OpOutput::Archive(bytes));
        }

        // Tolerant multi-file path.
        let producer = ArchiveProducer::new(self.config().archive_channel_capacity);
        let mut intermediates = Vec::new();
        for handle in files {
            let prefix = self.config().scratch_path("render");
            match rasterizer.render_pages(&handle.path, &prefix, format).await {
                Ok(pages) => {
                    for (i, path) in pages.iter().enumerate() {
                        let name = format!("{}_{}.{}", handle.stem(), i + 1, format.extension());
                        producer.append(ArchiveEntry::from_file(name, path)).await?;
                    }
                    intermediates.extend(pages);
                }
                Err(err) => {
                    let err = conversion_failure(handle, err);
                    warn!(file = %handle.original_name, %err, "rasterizing failed, adding error entry");
                    producer
                        .append(ArchiveEntry::from_bytes(
                            format!("{}_ERROR.txt", handle.stem()),
                            describe::placeholder_report(&handle.original_name, &err).into_bytes(),
                        ))
                        .await?;
                }
            }
        }

        let bytes = producer.finish().await?;
        cleanup::schedule_removal(self.config(), intermediates);
        info!("raster conversion complete");
        Ok(OpOutput::Archive(bytes))
    }

    /// Convert one input to PDF bytes. Every failure comes back as
    /// `ConversionFailed` naming the input and, when detectable, its format.
    async fn convert_one_to_pdf(&self, handle: &FileHandle) -> Result<Vec<u8>> {
        let kind = DocumentKind::classify(&handle.content_type, handle.extension().as_deref());

        match kind {
            DocumentKind::Pdf => {
                let bytes = std::fs::read(&handle.path)?;
                DocumentModel::from_bytes(&bytes, None)
                    .map_err(|err| conversion_failure(handle, err))?;
                Ok(bytes)
            }
            DocumentKind::RasterImage => {
                let bytes = std::fs::read(&handle.path)?;
                builder::image_to_pdf(&bytes, handle.stem())
                    .map_err(|err| conversion_failure(handle, err))
            }
            DocumentKind::Office | DocumentKind::Text | DocumentKind::Unknown => {
                let converter = quire_bridge::OfficeConverter::new(
                    self.config().office_tool.clone(),
                    self.config().bridge_timeout_secs,
                );
                let outdir = self.config().scratch_path("office");
                std::fs::create_dir_all(&outdir)?;

                let outcome = converter.to_pdf(&handle.path, &outdir).await;
                let result = match outcome {
                    Ok(produced) => Ok(std::fs::read(&produced)?),
                    Err(err) => Err(conversion_failure(handle, err)),
                };
                cleanup::schedule_removal(self.config(), vec![outdir]);
                result
            }
        }
    }
}

/// Wrap a per-file failure, attaching the detected source format when the
/// bytes look like a known image type.
fn conversion_failure(handle: &FileHandle, err: QuireError) -> QuireError {
    let detected = std::fs::read(&handle.path)
        .ok()
        .and_then(|bytes| image::guess_format(&bytes).ok())
        .and_then(|format| format.extensions_str().first().copied())
        .map(String::from);

    QuireError::ConversionFailed {
        filename: handle.original_name.clone(),
        detail: err.to_string(),
        detected,
    }
}
