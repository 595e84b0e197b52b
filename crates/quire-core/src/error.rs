// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Quire.

use thiserror::Error;

/// Top-level error type for all Quire operations.
#[derive(Debug, Error)]
pub enum QuireError {
    // -- Document model errors --
    #[error("document is corrupt or not a valid PDF: {0}")]
    CorruptDocument(String),

    #[error("document is encrypted and no password was supplied")]
    RequiresPassword,

    #[error("the supplied password was rejected")]
    WrongPassword,

    #[error("page index {index} out of range (document has {page_count} pages)")]
    IndexOutOfRange { index: usize, page_count: usize },

    #[error("page order is empty or contains no valid page numbers")]
    InvalidOrder,

    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    // -- Bridge errors --
    #[error("no compressor available (all compression tools failed)")]
    NoCompressorAvailable,

    #[error("external tool '{tool}' could not be started")]
    BridgeUnavailable { tool: String },

    #[error("external tool '{tool}' failed: {detail}")]
    BridgeFailed { tool: String, detail: String },

    #[error("external tool '{tool}' exceeded the {seconds}s time limit")]
    BridgeTimeout { tool: String, seconds: u64 },

    // -- Pipeline errors --
    #[error("failed to convert '{filename}': {detail}{}", detected_suffix(.detected))]
    ConversionFailed {
        filename: String,
        detail: String,
        detected: Option<String>,
    },

    #[error("no input files provided")]
    NoFiles,

    // -- Ambient --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

fn detected_suffix(detected: &Option<String>) -> String {
    match detected {
        Some(format) => format!(" (detected format: {format})"),
        None => String::new(),
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, QuireError>;
