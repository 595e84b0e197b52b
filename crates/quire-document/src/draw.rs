// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-stream drawing on existing pages.
//
// Stamps append a fresh content stream after the page's existing content so
// they always render on top. Coordinates are PDF points with the origin at
// the lower-left corner of the page. Resources added here use the `Q` prefix
// (`QF1`, `QGS15`, `QIm0`) to stay clear of names already on the page.

use image::{GenericImageView, ImageFormat};
use lopdf::{Dictionary, Object, ObjectId, Stream};
use quire_core::error::{QuireError, Result};
use tracing::{debug, instrument};

use crate::model::DocumentModel;

/// Name of the Helvetica font resource registered on stamped pages.
const FONT_RESOURCE: &str = "QF1";

/// A piece of text to place on a page.
#[derive(Debug, Clone)]
pub struct TextStamp {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    /// RGB in [0, 1].
    pub color: (f32, f32, f32),
    /// Fill opacity in [0, 1]; `None` means fully opaque.
    pub opacity: Option<f32>,
    /// Counter-clockwise rotation around the anchor point.
    pub rotate_degrees: Option<f32>,
    pub text: String,
}

impl TextStamp {
    pub fn plain(x: f32, y: f32, size: f32, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            size,
            color: (0.0, 0.0, 0.0),
            opacity: None,
            rotate_degrees: None,
            text: text.into(),
        }
    }
}

/// A filled rectangle.
#[derive(Debug, Clone)]
pub struct RectStamp {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: (f32, f32, f32),
    pub opacity: Option<f32>,
}

/// A filled ellipse inscribed in a bounding box.
#[derive(Debug, Clone)]
pub struct EllipseStamp {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: (f32, f32, f32),
    pub opacity: Option<f32>,
}

/// A stroked line segment.
#[derive(Debug, Clone)]
pub struct LineStamp {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub color: (f32, f32, f32),
    pub line_width: f32,
}

impl DocumentModel {
    /// Draw text on a page.
    #[instrument(skip_all, fields(page = index, len = stamp.text.len()))]
    pub fn draw_text(&mut self, index: usize, stamp: &TextStamp) -> Result<()> {
        let page_id = self.page_id(index)?;
        let font_id = self.ensure_helvetica();
        self.set_resource(page_id, b"Font", FONT_RESOURCE, Object::Reference(font_id))?;

        let mut ops = String::from("q\n");
        if let Some(opacity) = stamp.opacity {
            let gs_name = self.ensure_ext_g_state(page_id, opacity)?;
            ops.push_str(&format!("/{gs_name} gs\n"));
        }
        let (r, g, b) = stamp.color;
        ops.push_str(&format!("BT\n/{FONT_RESOURCE} {} Tf\n{r} {g} {b} rg\n", stamp.size));

        let radians = stamp.rotate_degrees.unwrap_or(0.0).to_radians();
        let (sin, cos) = radians.sin_cos();
        ops.push_str(&format!(
            "{cos} {sin} {} {cos} {} {} Tm\n",
            -sin, stamp.x, stamp.y
        ));
        ops.push_str(&format!("({}) Tj\nET\nQ\n", escape_pdf_string(&stamp.text)));

        self.append_page_content(page_id, ops.into_bytes())
    }

    /// Draw a filled rectangle on a page.
    pub fn draw_rect(&mut self, index: usize, stamp: &RectStamp) -> Result<()> {
        let page_id = self.page_id(index)?;
        let mut ops = String::from("q\n");
        if let Some(opacity) = stamp.opacity {
            let gs_name = self.ensure_ext_g_state(page_id, opacity)?;
            ops.push_str(&format!("/{gs_name} gs\n"));
        }
        let (r, g, b) = stamp.color;
        ops.push_str(&format!(
            "{r} {g} {b} rg\n{} {} {} {} re\nf\nQ\n",
            stamp.x, stamp.y, stamp.width, stamp.height
        ));
        self.append_page_content(page_id, ops.into_bytes())
    }

    /// Draw a filled ellipse inscribed in the stamp's bounding box.
    pub fn draw_ellipse(&mut self, index: usize, stamp: &EllipseStamp) -> Result<()> {
        let page_id = self.page_id(index)?;
        let mut ops = String::from("q\n");
        if let Some(opacity) = stamp.opacity {
            let gs_name = self.ensure_ext_g_state(page_id, opacity)?;
            ops.push_str(&format!("/{gs_name} gs\n"));
        }
        let (r, g, b) = stamp.color;
        ops.push_str(&format!("{r} {g} {b} rg\n"));

        // Four Bezier arcs approximating a quarter ellipse each.
        let k = 0.5523;
        let (cx, cy) = (stamp.x + stamp.width / 2.0, stamp.y + stamp.height / 2.0);
        let (rx, ry) = (stamp.width / 2.0, stamp.height / 2.0);
        ops.push_str(&format!("{} {cy} m\n", cx + rx));
        ops.push_str(&format!(
            "{} {} {} {} {cx} {} c\n",
            cx + rx,
            cy + k * ry,
            cx + k * rx,
            cy + ry,
            cy + ry
        ));
        ops.push_str(&format!(
            "{} {} {} {} {} {cy} c\n",
            cx - k * rx,
            cy + ry,
            cx - rx,
            cy + k * ry,
            cx - rx
        ));
        ops.push_str(&format!(
            "{} {} {} {} {cx} {} c\n",
            cx - rx,
            cy - k * ry,
            cx - k * rx,
            cy - ry,
            cy - ry
        ));
        ops.push_str(&format!(
            "{} {} {} {} {} {cy} c\n",
            cx + k * rx,
            cy - ry,
            cx + rx,
            cy - k * ry,
            cx + rx
        ));
        ops.push_str("f\nQ\n");
        self.append_page_content(page_id, ops.into_bytes())
    }

    /// Draw a stroked line on a page.
    pub fn draw_line(&mut self, index: usize, stamp: &LineStamp) -> Result<()> {
        let page_id = self.page_id(index)?;
        let (r, g, b) = stamp.color;
        let ops = format!(
            "q\n{r} {g} {b} RG\n{} w\n{} {} m\n{} {} l\nS\nQ\n",
            stamp.line_width, stamp.from.0, stamp.from.1, stamp.to.0, stamp.to.1
        );
        self.append_page_content(page_id, ops.into_bytes())
    }

    /// Place a raster image on a page, scaled to `width` x `height` points
    /// with its lower-left corner at `(x, y)`.
    ///
    /// JPEG data passes through undecoded as a DCTDecode stream; every other
    /// format `image` can decode is embedded as raw RGB (deflated when the
    /// document is serialized).
    #[instrument(skip_all, fields(page = index, bytes = data.len()))]
    pub fn draw_image(
        &mut self,
        index: usize,
        data: &[u8],
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Result<()> {
        let page_id = self.page_id(index)?;
        let xobject_id = self.embed_image(data)?;

        let name = format!("QIm{}", self.image_counter);
        self.image_counter += 1;
        self.set_resource(page_id, b"XObject", &name, Object::Reference(xobject_id))?;

        let ops = format!("q\n{width} 0 0 {height} {x} {y} cm\n/{name} Do\nQ\n");
        self.append_page_content(page_id, ops.into_bytes())
    }

    /// Build an image XObject from encoded image data.
    fn embed_image(&mut self, data: &[u8]) -> Result<ObjectId> {
        let format = image::guess_format(data)
            .map_err(|_| QuireError::UnsupportedImageFormat("unrecognized data".to_string()))?;

        let decoded = image::load_from_memory(data).map_err(|err| {
            QuireError::UnsupportedImageFormat(format!("{format:?}: {err}"))
        })?;
        let (width, height) = decoded.dimensions();

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XObject".to_vec()));
        dict.set("Subtype", Object::Name(b"Image".to_vec()));
        dict.set("Width", Object::Integer(width as i64));
        dict.set("Height", Object::Integer(height as i64));
        dict.set("BitsPerComponent", Object::Integer(8));

        let stream = if format == ImageFormat::Jpeg {
            // Keep the compressed JPEG bytes as-is.
            let color_space: &[u8] = match decoded {
                image::DynamicImage::ImageLuma8(_) => b"DeviceGray",
                _ => b"DeviceRGB",
            };
            dict.set("ColorSpace", Object::Name(color_space.to_vec()));
            dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
            // Already compressed; never re-filter on save.
            let mut stream = Stream::new(dict, data.to_vec());
            stream.allows_compression = false;
            stream
        } else {
            dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
            let pixels = decoded.to_rgb8().into_raw();
            Stream::new(dict, pixels)
        };

        debug!(width, height, ?format, "image embedded");
        Ok(self.doc.add_object(stream))
    }

    /// Register the shared Helvetica font object, once per document.
    fn ensure_helvetica(&mut self) -> ObjectId {
        if let Some(id) = self.helvetica {
            return id;
        }
        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
        let id = self.doc.add_object(Object::Dictionary(font));
        self.helvetica = Some(id);
        id
    }

    /// Register an ExtGState with the given fill/stroke opacity and return
    /// its resource name. Opacity is quantized to whole percent so repeated
    /// stamps share one graphics state.
    fn ensure_ext_g_state(&mut self, page_id: ObjectId, opacity: f32) -> Result<String> {
        let pct = (opacity.clamp(0.0, 1.0) * 100.0).round() as u32;
        let name = format!("QGS{pct}");

        let mut gs = Dictionary::new();
        gs.set("Type", Object::Name(b"ExtGState".to_vec()));
        gs.set("ca", Object::Real(pct as f32 / 100.0));
        gs.set("CA", Object::Real(pct as f32 / 100.0));
        let gs_id = self.doc.add_object(Object::Dictionary(gs));

        self.set_resource(page_id, b"ExtGState", &name, Object::Reference(gs_id))?;
        Ok(name)
    }

    /// Set `Resources/<category>/<name>` on a page, creating the nested
    /// dictionaries as needed and resolving an indirect Resources reference
    /// into a direct dictionary first.
    fn set_resource(
        &mut self,
        page_id: ObjectId,
        category: &[u8],
        name: &str,
        value: Object,
    ) -> Result<()> {
        // Indirect Resources would alias other pages; inline a copy.
        let resolved = match self.doc.get_object(page_id) {
            Ok(Object::Dictionary(page)) => match page.get(b"Resources") {
                Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                    Ok(Object::Dictionary(dict)) => Some(dict.clone()),
                    _ => Some(Dictionary::new()),
                },
                Ok(Object::Dictionary(dict)) => Some(dict.clone()),
                _ => Some(Dictionary::new()),
            },
            _ => None,
        };
        let mut resources = resolved
            .ok_or_else(|| QuireError::Pdf(format!("page {page_id:?} is not a dictionary")))?;

        let mut group = match resources.get(category) {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Dictionary(dict)) => dict.clone(),
                _ => Dictionary::new(),
            },
            _ => Dictionary::new(),
        };
        group.set(name.as_bytes().to_vec(), value);
        resources.set(category.to_vec(), Object::Dictionary(group));

        if let Ok(Object::Dictionary(page)) = self.doc.get_object_mut(page_id) {
            page.set("Resources", Object::Dictionary(resources));
        }
        Ok(())
    }

    /// Append a content stream to a page, preserving existing content.
    fn append_page_content(&mut self, page_id: ObjectId, content: Vec<u8>) -> Result<()> {
        let stream_id = self.doc.add_object(Stream::new(Dictionary::new(), content));

        let existing = match self.doc.get_object(page_id) {
            Ok(Object::Dictionary(page)) => page.get(b"Contents").ok().cloned(),
            _ => {
                return Err(QuireError::Pdf(format!("page {page_id:?} is not a dictionary")));
            }
        };

        let contents = match existing {
            Some(Object::Array(mut items)) => {
                items.push(Object::Reference(stream_id));
                Object::Array(items)
            }
            Some(Object::Reference(old)) => {
                Object::Array(vec![Object::Reference(old), Object::Reference(stream_id)])
            }
            _ => Object::Reference(stream_id),
        };

        if let Ok(Object::Dictionary(page)) = self.doc.get_object_mut(page_id) {
            page.set("Contents", contents);
        }
        Ok(())
    }
}

/// Escape the characters PDF literal strings reserve.
fn escape_pdf_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}
