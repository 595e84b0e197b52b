// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content stamping: overlay, paginate, watermark.

use quire_core::error::{QuireError, Result};
use quire_core::overlay::{OverlayOp, parse_color};
use quire_core::types::FileHandle;
use quire_document::{DocumentModel, RectStamp, TextStamp};
use tracing::{info, instrument, warn};

use crate::output::OpOutput;
use crate::{Engine, load_handle};

/// Marker rectangles are translucent yellow.
const HIGHLIGHT_COLOR: (f32, f32, f32) = (1.0, 1.0, 0.0);
const HIGHLIGHT_OPACITY: f32 = 0.4;

/// Watermark appearance when the caller gives only the text.
const WATERMARK_TEXT: &str = "WATERMARK";
const WATERMARK_COLOR: (f32, f32, f32) = (0.8, 0.1, 0.1);
const WATERMARK_OPACITY: f32 = 0.15;
const WATERMARK_SIZE: f32 = 48.0;
const WATERMARK_ANGLE: f32 = 35.0;

impl Engine {
    /// Apply a JSON-described list of overlays (text, image, highlight) to
    /// the first uploaded document. Remaining uploads serve as image
    /// sources, matched by original filename.
    #[instrument(skip_all, fields(files = files.len()))]
    pub fn overlay(&self, files: &[FileHandle], ops_json: &str) -> Result<OpOutput> {
        let (base, extras) = files.split_first().ok_or(QuireError::NoFiles)?;
        let ops = OverlayOp::parse_list(ops_json)?;

        let mut model = load_handle(base, None)?;
        let page_count = model.page_count();
        if page_count == 0 {
            return Ok(OpOutput::Pdf(model.serialize()?));
        }

        for op in &ops {
            // 1-based from the caller; anything out of range lands on the
            // first page.
            let page = match op.page() {
                p if p >= 1 && p <= page_count => p - 1,
                _ => 0,
            };
            match op {
                OverlayOp::Text { x, y, text, size, color, .. } => {
                    let stamp = TextStamp {
                        x: *x,
                        y: *y,
                        size: *size,
                        color: parse_color(color),
                        opacity: None,
                        rotate_degrees: None,
                        text: text.clone(),
                    };
                    model.draw_text(page, &stamp)?;
                }
                OverlayOp::Image { x, y, width, height, filename, .. } => {
                    let Some(source) = find_image(extras, filename.as_deref()) else {
                        warn!(?filename, "overlay image upload not found, skipping");
                        continue;
                    };
                    let bytes = std::fs::read(&source.path)?;
                    let (w, h) = intrinsic_size(&bytes, *width, *height)?;
                    model.draw_image(page, &bytes, *x, *y, w, h)?;
                }
                OverlayOp::Highlight { x, y, width, height, .. } => {
                    let stamp = RectStamp {
                        x: *x,
                        y: *y,
                        width: *width,
                        height: *height,
                        color: HIGHLIGHT_COLOR,
                        opacity: Some(HIGHLIGHT_OPACITY),
                    };
                    model.draw_rect(page, &stamp)?;
                }
            }
        }

        info!(ops = ops.len(), "overlay complete");
        Ok(OpOutput::Pdf(model.serialize()?))
    }

    /// Stamp a page number near the bottom center of every page, counting
    /// from `start_at`.
    #[instrument(skip_all, fields(start_at))]
    pub fn paginate(&self, file: &FileHandle, start_at: usize) -> Result<OpOutput> {
        let mut model = load_handle(file, None)?;

        for index in 0..model.page_count() {
            let (width, _) = model.page_size(index)?;
            let label = (start_at + index).to_string();
            let size = 10.0;
            let stamp = TextStamp::plain(
                width / 2.0 - label.len() as f32 * size * 0.25,
                15.0,
                size,
                label,
            );
            model.draw_text(index, &stamp)?;
        }

        info!(pages = model.page_count(), "paginate complete");
        Ok(OpOutput::Pdf(model.serialize()?))
    }

    /// Stamp a large translucent diagonal text watermark on every page.
    #[instrument(skip_all)]
    pub fn watermark(&self, file: &FileHandle, text: Option<&str>) -> Result<OpOutput> {
        let mut model = load_handle(file, None)?;
        let text = match text {
            Some(text) if !text.trim().is_empty() => text,
            _ => WATERMARK_TEXT,
        };

        for index in 0..model.page_count() {
            let (width, height) = model.page_size(index)?;
            let stamp = TextStamp {
                x: width / 4.0,
                y: height / 2.0,
                size: WATERMARK_SIZE,
                color: WATERMARK_COLOR,
                opacity: Some(WATERMARK_OPACITY),
                rotate_degrees: Some(WATERMARK_ANGLE),
                text: text.to_string(),
            };
            model.draw_text(index, &stamp)?;
        }

        info!(pages = model.page_count(), "watermark complete");
        Ok(OpOutput::Pdf(model.serialize()?))
    }
}

/// Stamp the visual signature line used when no signing credential is
/// available (or the signer failed). First page only.
pub(crate) fn visual_signature(model: &mut DocumentModel, name: &str) -> Result<()> {
    if model.page_count() == 0 {
        return Ok(());
    }
    let stamp = TextStamp::plain(50.0, 30.0, 10.0, format!("Signed by: {name}"));
    model.draw_text(0, &stamp)
}

/// Pick the upload backing an image overlay: by original filename when one
/// is given, otherwise the first extra upload.
fn find_image<'a>(extras: &'a [FileHandle], filename: Option<&str>) -> Option<&'a FileHandle> {
    match filename {
        Some(name) => extras.iter().find(|handle| handle.original_name == name),
        None => extras.first(),
    }
}

/// Resolve zero overlay dimensions to the image's pixel dimensions.
fn intrinsic_size(bytes: &[u8], width: f32, height: f32) -> Result<(f32, f32)> {
    if width > 0.0 && height > 0.0 {
        return Ok((width, height));
    }
    let (px_w, px_h) = image::load_from_memory(bytes)
        .map(|img| (img.width() as f32, img.height() as f32))
        .map_err(|err| QuireError::UnsupportedImageFormat(err.to_string()))?;
    Ok((
        if width > 0.0 { width } else { px_w },
        if height > 0.0 { height } else { px_h },
    ))
}
