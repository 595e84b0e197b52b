// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay operation parsing.
//
// Callers describe content overlays as a JSON array of tagged operations.
// The array is parsed once at the operation boundary; the document model
// receives typed values only. Coordinates are in points with a bottom-left
// origin, matching the page coordinate system.

use serde::Deserialize;

use crate::error::Result;

/// One content overlay, applied to a single 1-based page.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverlayOp {
    /// Draw a text run.
    Text {
        #[serde(default = "default_page")]
        page: usize,
        #[serde(default = "default_x")]
        x: f32,
        #[serde(default = "default_y")]
        y: f32,
        #[serde(default)]
        text: String,
        #[serde(default = "default_size")]
        size: f32,
        #[serde(default = "default_color")]
        color: String,
    },
    /// Draw an uploaded image, referenced by its original filename.
    Image {
        #[serde(default = "default_page")]
        page: usize,
        #[serde(default = "default_x")]
        x: f32,
        #[serde(default = "default_y")]
        y: f32,
        /// Zero means "use the image's intrinsic width".
        #[serde(default)]
        width: f32,
        #[serde(default)]
        height: f32,
        #[serde(default)]
        filename: Option<String>,
    },
    /// Draw a translucent yellow marker rectangle.
    Highlight {
        #[serde(default = "default_page")]
        page: usize,
        #[serde(default = "default_x")]
        x: f32,
        #[serde(default = "default_y")]
        y: f32,
        #[serde(default = "default_width")]
        width: f32,
        #[serde(default = "default_height")]
        height: f32,
    },
}

fn default_page() -> usize {
    1
}
fn default_x() -> f32 {
    50.0
}
fn default_y() -> f32 {
    50.0
}
fn default_size() -> f32 {
    12.0
}
fn default_color() -> String {
    "#000000".to_string()
}
fn default_width() -> f32 {
    100.0
}
fn default_height() -> f32 {
    20.0
}

impl OverlayOp {
    /// Parse a JSON array of overlay operations. An empty or missing spec
    /// yields an empty list; malformed JSON is a hard error.
    pub fn parse_list(json: &str) -> Result<Vec<OverlayOp>> {
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(json)?)
    }

    /// Target page number (1-based, unvalidated).
    pub fn page(&self) -> usize {
        match self {
            Self::Text { page, .. } | Self::Image { page, .. } | Self::Highlight { page, .. } => {
                *page
            }
        }
    }
}

/// Parse a `#rrggbb` or `#rgb` hex color into unit-range RGB components.
/// Anything unparseable falls back to black, like the original callers
/// expect.
pub fn parse_color(color: &str) -> (f32, f32, f32) {
    let hex = color.strip_prefix('#').unwrap_or(color);
    let expand = |c: u8| -> u8 { c << 4 | c };
    match hex.len() {
        6 => {
            let parse = |range| u8::from_str_radix(&hex[range], 16).ok();
            match (parse(0..2), parse(2..4), parse(4..6)) {
                (Some(r), Some(g), Some(b)) => {
                    (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
                }
                _ => (0.0, 0.0, 0.0),
            }
        }
        3 => {
            let parse = |i| u8::from_str_radix(&hex[i..i + 1], 16).ok();
            match (parse(0), parse(1), parse(2)) {
                (Some(r), Some(g), Some(b)) => (
                    expand(r) as f32 / 255.0,
                    expand(g) as f32 / 255.0,
                    expand(b) as f32 / 255.0,
                ),
                _ => (0.0, 0.0, 0.0),
            }
        }
        _ => (0.0, 0.0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_ops_with_defaults() {
        let ops = OverlayOp::parse_list(
            r#"[{"type":"text","text":"hello","page":2},{"type":"highlight","x":10,"y":20}]"#,
        )
        .unwrap();
        assert_eq!(ops.len(), 2);
        match &ops[0] {
            OverlayOp::Text { page, text, size, color, .. } => {
                assert_eq!(*page, 2);
                assert_eq!(text, "hello");
                assert_eq!(*size, 12.0);
                assert_eq!(color, "#000000");
            }
            other => panic!("expected text op, got {other:?}"),
        }
        match &ops[1] {
            OverlayOp::Highlight { page, width, height, .. } => {
                assert_eq!(*page, 1);
                assert_eq!(*width, 100.0);
                assert_eq!(*height, 20.0);
            }
            other => panic!("expected highlight op, got {other:?}"),
        }
    }

    #[test]
    fn empty_spec_is_no_ops() {
        assert!(OverlayOp::parse_list("").unwrap().is_empty());
        assert!(OverlayOp::parse_list("  ").unwrap().is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(OverlayOp::parse_list("{not json").is_err());
    }

    #[test]
    fn color_parsing() {
        assert_eq!(parse_color("#ff0000"), (1.0, 0.0, 0.0));
        assert_eq!(parse_color("#fff"), (1.0, 1.0, 1.0));
        assert_eq!(parse_color("bogus"), (0.0, 0.0, 0.0));
    }
}
