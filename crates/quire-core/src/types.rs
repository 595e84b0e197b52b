// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Quire document engine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an uploaded blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobId(pub Uuid);

impl BlobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One uploaded file, persisted to a temporary path by the intake layer.
///
/// Immutable once constructed. The intake layer owns the lifecycle of the
/// backing temp file; the engine never deletes it (only intermediates the
/// engine itself created are scheduled for cleanup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHandle {
    pub id: BlobId,
    /// Multipart field role this file arrived under (e.g. "file", "cert").
    pub field: String,
    /// Display name reduced to `[A-Za-z0-9_.-]`.
    pub filename: String,
    /// Name exactly as the uploader supplied it.
    pub original_name: String,
    /// Temp storage location.
    pub path: PathBuf,
    /// Declared MIME type (not verified).
    pub content_type: String,
}

impl FileHandle {
    pub fn new(
        field: impl Into<String>,
        original_name: impl Into<String>,
        path: impl Into<PathBuf>,
        content_type: impl Into<String>,
    ) -> Self {
        let id = BlobId::new();
        let original_name = original_name.into();
        let filename = sanitize_filename(&original_name, id);
        Self {
            id,
            field: field.into(),
            filename,
            original_name,
            path: path.into(),
            content_type: content_type.into(),
        }
    }

    /// Filename without its final extension, for naming derived outputs.
    pub fn stem(&self) -> &str {
        match self.filename.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.filename,
        }
    }

    /// File extension, lowercased, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}

/// Reduce a display name to a shell- and archive-safe subset.
fn sanitize_filename(name: &str, id: BlobId) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.trim_matches('_').is_empty() {
        format!("file_{id}")
    } else {
        safe
    }
}

/// Classification of an input file for the conversion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    /// The canonical paginated format all conversions target.
    Pdf,
    /// Raster image (embedded as one full-page image).
    RasterImage,
    /// Office format delegated to the external converter bridge.
    Office,
    /// Plain text / markup, also delegated to the converter bridge.
    Text,
    /// Nothing we recognise; the converter bridge gets the last word.
    Unknown,
}

impl DocumentKind {
    /// Classify by declared MIME type first, file extension second.
    pub fn classify(content_type: &str, extension: Option<&str>) -> Self {
        match content_type {
            "application/pdf" => return Self::Pdf,
            "image/jpeg" | "image/png" | "image/bmp" | "image/tiff" | "image/webp"
            | "image/gif" => return Self::RasterImage,
            "text/plain" | "text/html" => return Self::Text,
            _ => {}
        }
        match extension.unwrap_or_default() {
            "pdf" => Self::Pdf,
            "jpg" | "jpeg" | "png" | "bmp" | "tif" | "tiff" | "webp" | "gif" => Self::RasterImage,
            "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "odt" | "ods" | "odp" | "rtf" => {
                Self::Office
            }
            "txt" | "html" | "htm" => Self::Text,
            _ => Self::Unknown,
        }
    }
}

/// Target raster format for canonical-to-image conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterFormat {
    Png,
    Jpeg,
}

impl RasterFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Flag understood by the rasterizer tool.
    pub fn tool_flag(&self) -> &'static str {
        match self {
            Self::Png => "-png",
            Self::Jpeg => "-jpeg",
        }
    }
}

/// Strength setting passed to the fallback compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompressionLevel {
    #[default]
    Default,
    Screen,
    Ebook,
    Printer,
    Prepress,
}

impl CompressionLevel {
    /// Token consumed by the stronger compressor's `-dPDFSETTINGS` switch.
    pub fn settings_token(&self) -> &'static str {
        match self {
            Self::Default => "/default",
            Self::Screen => "/screen",
            Self::Ebook => "/ebook",
            Self::Printer => "/printer",
            Self::Prepress => "/prepress",
        }
    }

    /// Parse a caller-supplied level string; anything unrecognised maps to
    /// the default level rather than failing.
    pub fn parse(level: &str) -> Self {
        match level.trim().to_ascii_lowercase().as_str() {
            "screen" => Self::Screen,
            "ebook" => Self::Ebook,
            "printer" => Self::Printer,
            "prepress" => Self::Prepress,
            _ => Self::Default,
        }
    }
}

/// How a multi-file conversion should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputPolicy {
    /// Convert each input independently and merge all pages into one document.
    SingleMerged,
    /// Convert each input independently and stream the results into a zip.
    PerFileArchive,
}

/// One conversion request: constructed per call, consumed once.
#[derive(Debug)]
pub struct ConversionRequest {
    pub files: Vec<FileHandle>,
    pub policy: OutputPolicy,
    /// When set, canonical-format inputs are rasterized to this format
    /// instead of being passed through the office converter.
    pub raster_target: Option<RasterFormat>,
}
