// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inspection: structural comparison and content extraction.

use serde::Serialize;

use quire_core::error::{QuireError, Result};
use quire_core::types::{FileHandle, RasterFormat};
use tracing::{info, instrument, warn};

use crate::archive::{ArchiveEntry, ArchiveProducer};
use crate::output::OpOutput;
use crate::{Engine, cleanup, load_handle};

/// Structural comparison of two documents.
#[derive(Debug, Serialize)]
pub struct CompareReport {
    pub pages_a: usize,
    pub pages_b: usize,
    pub same_page_count: bool,
    /// First-page (width, height) in points; `None` for zero-page documents.
    pub first_page_dims_a: Option<(f32, f32)>,
    pub first_page_dims_b: Option<(f32, f32)>,
}

impl Engine {
    /// Compare two documents structurally: page counts and first-page
    /// geometry. Content is not diffed.
    #[instrument(skip_all)]
    pub fn compare(&self, a: &FileHandle, b: &FileHandle) -> Result<OpOutput> {
        let doc_a = load_handle(a, None)?;
        let doc_b = load_handle(b, None)?;

        let report = CompareReport {
            pages_a: doc_a.page_count(),
            pages_b: doc_b.page_count(),
            same_page_count: doc_a.page_count() == doc_b.page_count(),
            first_page_dims_a: first_page_dims(&doc_a),
            first_page_dims_b: first_page_dims(&doc_b),
        };

        info!(pages_a = report.pages_a, pages_b = report.pages_b, "compare complete");
        Ok(OpOutput::Report(serde_json::to_vec_pretty(&report)?))
    }

    /// Extract a document's content into a zip: the normalized document
    /// itself, its text, and a page-image rendering.
    ///
    /// Text and images are best-effort stages; either may be missing from
    /// the archive without failing the operation.
    #[instrument(skip_all)]
    pub async fn extract(&self, file: &FileHandle) -> Result<OpOutput> {
        let model = load_handle(file, None)?;
        let producer = ArchiveProducer::new(self.config().archive_channel_capacity);

        producer
            .append(ArchiveEntry::from_bytes("document.pdf", model.serialize()?))
            .await?;

        let text = model.extract_text(self.config().max_extract_pages);
        producer
            .append(ArchiveEntry::from_bytes("text.txt", text.into_bytes()))
            .await?;

        let rasterizer = quire_bridge::Rasterizer::new(
            self.config().raster_tool.clone(),
            self.config().bridge_timeout_secs,
        );
        let prefix = self.config().scratch_path("page");
        match rasterizer
            .render_pages(&file.path, &prefix, RasterFormat::Png)
            .await
        {
            Ok(pages) => {
                for path in &pages {
                    let name = path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .ok_or_else(|| {
                            QuireError::Io(std::io::Error::other("rasterizer output has no name"))
                        })?;
                    producer
                        .append(ArchiveEntry::from_file(format!("images/{name}"), path))
                        .await?;
                }
                let bytes = producer.finish().await?;
                cleanup::schedule_removal(self.config(), pages);
                info!("extract complete");
                Ok(OpOutput::Archive(bytes))
            }
            Err(err) => {
                warn!(%err, "page rendering unavailable, extracting without images");
                let bytes = producer.finish().await?;
                Ok(OpOutput::Archive(bytes))
            }
        }
    }
}

fn first_page_dims(model: &quire_document::DocumentModel) -> Option<(f32, f32)> {
    if model.page_count() == 0 {
        return None;
    }
    model.page_size(0).ok()
}
