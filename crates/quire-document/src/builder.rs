// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document builder — turn raster images into single-page PDF documents.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use quire_core::error::{QuireError, Result};
use tracing::{debug, instrument};

/// Points per millimetre (1 pt = 1/72 in, 1 in = 25.4 mm).
const MM_PER_PT: f32 = 25.4 / 72.0;

/// Create a single-page PDF from encoded image data.
///
/// The page is sized to the image's pixel dimensions taken as points, so the
/// image fills the page exactly at 72 DPI with no margins or rescaling.
#[instrument(skip(image_bytes), fields(title, bytes_len = image_bytes.len()))]
pub fn image_to_pdf(image_bytes: &[u8], title: &str) -> Result<Vec<u8>> {
    let dynamic_image = ::image::load_from_memory(image_bytes).map_err(|err| {
        QuireError::UnsupportedImageFormat(format!("failed to decode image: {err}"))
    })?;

    let img_width = dynamic_image.width() as usize;
    let img_height = dynamic_image.height() as usize;

    // Convert to RGB8 for printpdf.
    let rgb_image = dynamic_image.to_rgb8();
    let raw = RawImage {
        pixels: RawImageData::U8(rgb_image.into_raw()),
        width: img_width,
        height: img_height,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    };

    let mut doc = PdfDocument::new(title);
    let xobject_id = doc.add_image(&raw);

    let page_w = Mm(img_width as f32 * MM_PER_PT);
    let page_h = Mm(img_height as f32 * MM_PER_PT);

    let ops = vec![Op::UseXobject {
        id: xobject_id,
        transform: XObjectTransform {
            translate_x: None,
            translate_y: None,
            scale_x: None,
            scale_y: None,
            dpi: Some(72.0),
            rotate: None,
        },
    }];

    let page = PdfPage::new(page_w, page_h, ops);
    doc.with_pages(vec![page]);

    debug!(img_width, img_height, "image page built");

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    Ok(doc.save(&PdfSaveOptions::default(), &mut warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentModel;

    fn png_fixture(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 90, 200]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn page_matches_pixel_dimensions() {
        let bytes = image_to_pdf(&png_fixture(200, 100), "snapshot").unwrap();
        let model = DocumentModel::from_bytes(&bytes, None).unwrap();
        assert_eq!(model.page_count(), 1);
        let (w, h) = model.page_size(0).unwrap();
        assert!((w - 200.0).abs() < 1.0, "width was {w}");
        assert!((h - 100.0).abs() < 1.0, "height was {h}");
    }

    #[test]
    fn undecodable_data_is_rejected() {
        let result = image_to_pdf(b"definitely not pixels", "broken");
        assert!(matches!(result, Err(QuireError::UnsupportedImageFormat(_))));
    }
}
