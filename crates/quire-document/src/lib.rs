// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quire-document — the document model adapter for the Quire engine.
//
// Wraps `lopdf` behind an addressable, page-indexed model (load, copy pages,
// reorder, rotate, resize, encrypt, serialize) and provides content-stream
// drawing primitives plus a `printpdf`-based builder for turning raster
// images into single-page documents. Everything above this crate is built
// from these primitives only.

pub mod builder;
pub mod draw;
pub mod model;

pub use draw::{EllipseStamp, LineStamp, RectStamp, TextStamp};
pub use model::DocumentModel;
