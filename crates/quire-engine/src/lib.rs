// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quire-engine — the transformation operations.
//
// One `Engine` value per deployment, cheap to clone per request. Operations
// consume `FileHandle`s produced by the intake layer, work on exclusively
// owned `DocumentModel`s, and return an `OpOutput` ready for delivery. The
// operation methods live in focused modules, one `impl Engine` block each:
//
//   edit     merge, split, remove, add, reorder, rotate, resize
//   stamp    overlay, paginate, watermark
//   secure   protect, unprotect, compress, sign
//   inspect  compare, extract
//   convert  the format conversion pipeline
//
// `archive` holds the streaming zip producer and `cleanup` the deferred
// removal of intermediates.

pub mod archive;
pub mod cleanup;
pub mod convert;
pub mod edit;
pub mod inspect;
pub mod output;
pub mod secure;
pub mod stamp;

use quire_core::EngineConfig;
use quire_core::error::Result;
use quire_core::types::FileHandle;
use quire_document::DocumentModel;

pub use archive::{ArchiveEntry, ArchiveProducer, EntrySource};
pub use output::OpOutput;

/// Load the document behind an uploaded handle.
pub(crate) fn load_handle(handle: &FileHandle, password: Option<&str>) -> Result<DocumentModel> {
    DocumentModel::from_file(&handle.path, password)
}

/// The document transformation engine.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
