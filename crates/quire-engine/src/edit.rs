// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Structural page operations: merge, split, remove, add, reorder, rotate,
// resize.
//
// Every operation builds its result in a fresh document by deep-copying
// pages out of the loaded inputs, so inputs are never mutated and a failed
// operation leaves nothing half-changed.

use quire_core::error::{QuireError, Result};
use quire_core::selector::PageSelector;
use quire_core::types::FileHandle;
use quire_document::DocumentModel;
use tracing::{info, instrument};

use crate::archive::{ArchiveEntry, ArchiveProducer};
use crate::output::OpOutput;
use crate::{Engine, load_handle};

impl Engine {
    /// Concatenate the pages of every input, in file order. Fail-fast: any
    /// unreadable input aborts the whole merge.
    #[instrument(skip_all, fields(files = files.len()))]
    pub fn merge(&self, files: &[FileHandle]) -> Result<OpOutput> {
        if files.is_empty() {
            return Err(QuireError::NoFiles);
        }

        let mut merged = DocumentModel::create();
        for handle in files {
            let source = load_handle(handle, None)?;
            let all: Vec<usize> = (0..source.page_count()).collect();
            merged.copy_pages_from(&source, &all)?;
        }

        info!(pages = merged.page_count(), "merge complete");
        Ok(OpOutput::Pdf(merged.serialize()?))
    }

    /// Split a document into one PDF per selector group, delivered as a zip
    /// of `split_1.pdf`, `split_2.pdf`, ... An empty selector produces one
    /// single-page document per page.
    #[instrument(skip_all, fields(ranges))]
    pub async fn split(&self, file: &FileHandle, ranges: &str) -> Result<OpOutput> {
        let source = load_handle(file, None)?;
        let selector = PageSelector::parse_groups(ranges, source.page_count());

        let producer = ArchiveProducer::new(self.config().archive_channel_capacity);
        for (i, group) in selector.groups().iter().enumerate() {
            let mut part = DocumentModel::create();
            part.copy_pages_from(&source, group)?;
            producer
                .append(ArchiveEntry::from_bytes(
                    format!("split_{}.pdf", i + 1),
                    part.serialize()?,
                ))
                .await?;
        }

        info!(parts = selector.groups().len(), "split complete");
        Ok(OpOutput::Archive(producer.finish().await?))
    }

    /// Drop the selected pages (1-based selector). Unknown page numbers are
    /// ignored; removing every page yields a valid zero-page document.
    #[instrument(skip_all, fields(pages))]
    pub fn remove(&self, file: &FileHandle, pages: &str) -> Result<OpOutput> {
        let source = load_handle(file, None)?;
        let doomed = PageSelector::parse_set(pages, source.page_count());

        let kept: Vec<usize> = (0..source.page_count())
            .filter(|index| !doomed.contains(index))
            .collect();
        let mut result = DocumentModel::create();
        result.copy_pages_from(&source, &kept)?;

        info!(removed = doomed.len(), kept = kept.len(), "remove complete");
        Ok(OpOutput::Pdf(result.serialize()?))
    }

    /// Insert all pages of every extra document into the base document.
    /// `position` is a 0-based page index clamped to the base's page count;
    /// `None` appends. Extras keep their file order.
    #[instrument(skip_all, fields(extras = extras.len(), position))]
    pub fn add(
        &self,
        base: &FileHandle,
        extras: &[FileHandle],
        position: Option<usize>,
    ) -> Result<OpOutput> {
        if extras.is_empty() {
            return Err(QuireError::NoFiles);
        }

        let source = load_handle(base, None)?;
        let mut result = DocumentModel::create();
        let all: Vec<usize> = (0..source.page_count()).collect();
        result.copy_pages_from(&source, &all)?;

        let mut cursor = position.unwrap_or(result.page_count()).min(result.page_count());
        for handle in extras {
            let extra = load_handle(handle, None)?;
            let pages: Vec<usize> = (0..extra.page_count()).collect();
            let inserted = result.insert_pages_from(&extra, &pages, cursor)?;
            cursor += inserted.len();
        }

        info!(pages = result.page_count(), "add complete");
        Ok(OpOutput::Pdf(result.serialize()?))
    }

    /// Rebuild the document with pages in the given 1-based order. Pages not
    /// named are dropped; duplicates collapse to their first mention. An
    /// order with no valid entries is refused.
    #[instrument(skip_all, fields(order))]
    pub fn reorder(&self, file: &FileHandle, order: &str) -> Result<OpOutput> {
        let source = load_handle(file, None)?;
        let sequence = PageSelector::parse_sequence(order, source.page_count());
        if sequence.is_empty() {
            return Err(QuireError::InvalidOrder);
        }

        let mut result = DocumentModel::create();
        result.copy_pages_from(&source, &sequence)?;

        info!(pages = sequence.len(), "reorder complete");
        Ok(OpOutput::Pdf(result.serialize()?))
    }

    /// Add `degrees` to the rotation of the selected pages (all pages when
    /// the selector is empty). Rotation accumulates across calls, mod 360.
    #[instrument(skip_all, fields(pages, degrees))]
    pub fn rotate(&self, file: &FileHandle, pages: &str, degrees: i64) -> Result<OpOutput> {
        let mut model = load_handle(file, None)?;
        let selected = PageSelector::parse_set(pages, model.page_count());

        for index in 0..model.page_count() {
            if selected.is_empty() || selected.contains(&index) {
                model.rotate_page(index, degrees)?;
            }
        }

        info!(pages = model.page_count(), degrees, "rotate complete");
        Ok(OpOutput::Pdf(model.serialize()?))
    }

    /// Set an explicit page size on every page, in points. A zero or
    /// negative dimension keeps that axis of each page unchanged.
    #[instrument(skip_all, fields(width, height))]
    pub fn resize(&self, file: &FileHandle, width: f32, height: f32) -> Result<OpOutput> {
        let mut model = load_handle(file, None)?;

        for index in 0..model.page_count() {
            let (own_width, own_height) = model.page_size(index)?;
            let new_width = if width > 0.0 { width } else { own_width };
            let new_height = if height > 0.0 { height } else { own_height };
            model.set_page_size(index, new_width, new_height)?;
        }

        info!(pages = model.page_count(), "resize complete");
        Ok(OpOutput::Pdf(model.serialize()?))
    }
}
