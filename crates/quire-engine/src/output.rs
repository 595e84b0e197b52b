// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operation results.

use quire_core::types::RasterFormat;

/// The finished artifact of one operation, ready for delivery.
#[derive(Debug)]
pub enum OpOutput {
    /// A single PDF document.
    Pdf(Vec<u8>),
    /// A single rendered page image.
    Raster(Vec<u8>, RasterFormat),
    /// A structured JSON report.
    Report(Vec<u8>),
    /// A zip archive of several artifacts.
    Archive(Vec<u8>),
}

impl OpOutput {
    /// MIME type for the delivery layer's Content-Type header.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf(_) => "application/pdf",
            Self::Raster(_, format) => format.mime_type(),
            Self::Report(_) => "application/json",
            Self::Archive(_) => "application/zip",
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Pdf(bytes) | Self::Raster(bytes, _) | Self::Report(bytes) | Self::Archive(bytes) => {
                bytes
            }
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Pdf(bytes) | Self::Raster(bytes, _) | Self::Report(bytes) | Self::Archive(bytes) => {
                bytes
            }
        }
    }
}
