// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quire-bridge — subprocess bridges to external document tools.
//
// Some transformations are delegated to battle-tested external programs:
// LibreOffice for office formats, poppler's pdftoppm for rasterizing, qpdf
// and Ghostscript for compression and decryption, and a detached signer.
// Every bridge runs through one spawn path with a hard timeout; a missing
// binary, a timeout, and a nonzero exit each map to a distinct error so
// callers can decide between failing, falling back, and degrading.

pub mod compress;
pub mod decrypt;
pub mod office;
pub mod process;
pub mod raster;
pub mod sign;

pub use compress::CompressorChain;
pub use decrypt::Decryptor;
pub use office::OfficeConverter;
pub use process::{ToolOutput, run_tool};
pub use raster::Rasterizer;
pub use sign::Signer;
