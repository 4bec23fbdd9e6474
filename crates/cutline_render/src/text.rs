// SPDX-License-Identifier: MIT OR Apache-2.0
//! Text rasterization through resvg.
//!
//! A text clip becomes a one-element SVG document centred in its own
//! canvas; the canvas centre is the text's anchor point. The document is
//! laid out on an estimated canvas, then rendered into a canvas fitted to
//! the measured glyph bounds.

use cutline_timeline::TextStyle;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use resvg::usvg;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Largest edge of a rasterized text canvas
const MAX_TEXT_EXTENT: f32 = 8192.0;

/// Rasterized text is cached per distinct style
const MAX_CACHED_TEXTS: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextKey {
    content: String,
    family: String,
    size_bits: u32,
    color: [u8; 4],
}

impl From<&TextStyle> for TextKey {
    fn from(style: &TextStyle) -> Self {
        Self {
            content: style.content.clone(),
            family: style.font_family.clone(),
            size_bits: style.font_size.to_bits(),
            color: style.color.0,
        }
    }
}

/// Renders [`TextStyle`]s to straight-alpha images
#[derive(Default)]
pub struct TextRasterizer {
    fontdb: OnceLock<Arc<usvg::fontdb::Database>>,
    cache: Mutex<HashMap<TextKey, Option<Arc<RgbaImage>>>>,
}

impl TextRasterizer {
    /// Create a rasterizer that loads system fonts on first use
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rasterizer with no fonts; every text draws nothing
    pub fn without_fonts() -> Self {
        Self::with_fontdb(usvg::fontdb::Database::new())
    }

    /// Create a rasterizer over a prepared font database
    pub fn with_fontdb(fontdb: usvg::fontdb::Database) -> Self {
        let rasterizer = Self::default();
        let _ = rasterizer.fontdb.set(Arc::new(fontdb));
        rasterizer
    }

    fn fontdb(&self) -> Arc<usvg::fontdb::Database> {
        self.fontdb
            .get_or_init(|| {
                let mut db = usvg::fontdb::Database::new();
                db.load_system_fonts();
                tracing::debug!(faces = db.len(), "Loaded system fonts");
                Arc::new(db)
            })
            .clone()
    }

    /// Rasterize a text style.
    ///
    /// Returns `None` for empty strings, degenerate sizes, or when no font
    /// produced any coverage.
    pub fn rasterize(&self, style: &TextStyle) -> Option<Arc<RgbaImage>> {
        let key = TextKey::from(style);
        if let Some(cached) = self.cache.lock().get(&key) {
            return cached.clone();
        }

        let rendered = self.render_uncached(style).map(Arc::new);
        let mut cache = self.cache.lock();
        if cache.len() >= MAX_CACHED_TEXTS {
            cache.clear();
        }
        cache.insert(key, rendered.clone());
        rendered
    }

    fn render_uncached(&self, style: &TextStyle) -> Option<RgbaImage> {
        if style.content.trim().is_empty() || style.font_size.is_nan() || style.font_size <= 0.0 {
            return None;
        }
        let (layout_width, layout_height) = text_canvas_size(style);
        let svg = text_svg(style, layout_width, layout_height);

        let mut options = usvg::Options::default();
        options.fontdb = self.fontdb();
        let tree = match usvg::Tree::from_str(&svg, &options) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build text document");
                return None;
            }
        };

        if !tree.root().has_children() {
            tracing::debug!(family = %style.font_family, "No font could shape the text");
            return None;
        }
        let bounds = tree.root().abs_stroke_bounding_box();
        let (width, height) = fitted_canvas_size((layout_width, layout_height), bounds);
        let shift = tiny_skia::Transform::from_translate(
            (width as f32 - layout_width as f32) / 2.0,
            (height as f32 - layout_height as f32) / 2.0,
        );

        let mut pixmap = tiny_skia::Pixmap::new(width, height)?;
        resvg::render(&tree, shift, &mut pixmap.as_mut());

        let mut image = RgbaImage::new(width, height);
        let mut covered = false;
        for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            covered |= c.alpha() > 0;
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        if !covered {
            tracing::debug!(family = %style.font_family, "Text produced no coverage");
            return None;
        }
        Some(image)
    }
}

/// Estimated layout canvas for the text at its font size
fn text_canvas_size(style: &TextStyle) -> (u32, u32) {
    let longest_line = style
        .content
        .lines()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0) as f32;
    let line_count = style.content.lines().count().max(1) as f32;
    let width = (longest_line * style.font_size * 0.75 + style.font_size).min(MAX_TEXT_EXTENT);
    let height = (line_count * style.font_size * 1.5).min(MAX_TEXT_EXTENT);
    (width.ceil().max(1.0) as u32, height.ceil().max(1.0) as u32)
}

/// Smallest canvas centred on the layout centre that holds `bounds`
fn fitted_canvas_size(layout: (u32, u32), bounds: usvg::Rect) -> (u32, u32) {
    let cx = layout.0 as f32 / 2.0;
    let cy = layout.1 as f32 / 2.0;
    let half_w = (cx - bounds.left()).max(bounds.right() - cx).max(0.5);
    let half_h = (cy - bounds.top()).max(bounds.bottom() - cy).max(0.5);
    // One pixel of slack on each side for antialiased edges.
    let width = (2.0 * half_w.ceil() + 2.0).min(MAX_TEXT_EXTENT);
    let height = (2.0 * half_h.ceil() + 2.0).min(MAX_TEXT_EXTENT);
    (width as u32, height as u32)
}

/// SVG document with the text centred on the canvas
fn text_svg(style: &TextStyle, width: u32, height: u32) -> String {
    let [_, _, _, alpha] = style.color.0;
    let family = quick_xml::escape::escape(style.font_family.as_str());
    let lines: Vec<&str> = style.content.lines().collect();
    let line_height = style.font_size * 1.2;
    let first_y = height as f32 / 2.0 - line_height * (lines.len().saturating_sub(1)) as f32 / 2.0;

    let mut spans = String::new();
    for (i, line) in lines.iter().enumerate() {
        spans.push_str(&format!(
            r#"<tspan x="{x}" y="{y}">{text}</tspan>"#,
            x = width as f32 / 2.0,
            y = first_y + line_height * i as f32,
            text = quick_xml::escape::escape(*line),
        ));
    }

    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<text font-family="{family}" font-size="{size}" fill="{fill}" fill-opacity="{opacity}" "#,
            r#"text-anchor="middle" dominant-baseline="central" xml:space="preserve">{spans}</text></svg>"#,
        ),
        w = width,
        h = height,
        family = family,
        size = style.font_size,
        fill = style.color.to_hex_rgb(),
        opacity = f32::from(alpha) / 255.0,
        spans = spans,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_escapes_content() {
        let mut style = TextStyle::new("a < b & \"c\"");
        style.font_family = "Fira <Sans>".to_string();
        let svg = text_svg(&style, 100, 50);
        assert!(svg.contains("a &lt; b &amp; &quot;c&quot;"));
        assert!(svg.contains("Fira &lt;Sans&gt;"));
        assert!(svg.contains(r##"fill="#ffffff""##));
    }

    #[test]
    fn test_canvas_size_grows_with_lines() {
        let one = text_canvas_size(&TextStyle::new("abcd"));
        let two = text_canvas_size(&TextStyle::new("abcd\nabcdefgh"));
        assert!(two.0 > one.0);
        assert!(two.1 > one.1);
    }

    #[test]
    fn test_fitted_canvas_grows_around_centre() {
        // Glyphs spill 30px past both sides of a 100x40 layout.
        let bounds = usvg::Rect::from_ltrb(-30.0, 5.0, 130.0, 35.0).unwrap();
        assert_eq!(fitted_canvas_size((100, 40), bounds), (162, 32));

        // Off-centre bounds keep the anchor in the middle.
        let bounds = usvg::Rect::from_ltrb(40.0, 0.0, 90.0, 10.0).unwrap();
        assert_eq!(fitted_canvas_size((100, 40), bounds), (82, 42));
    }

    #[test]
    fn test_fitted_canvas_is_capped() {
        let bounds = usvg::Rect::from_ltrb(-20000.0, 0.0, 20000.0, 10.0).unwrap();
        let (w, _) = fitted_canvas_size((100, 40), bounds);
        assert_eq!(w, MAX_TEXT_EXTENT as u32);
    }

    #[test]
    fn test_empty_text_is_skipped() {
        let rasterizer = TextRasterizer::without_fonts();
        assert!(rasterizer.rasterize(&TextStyle::new("   ")).is_none());
    }

    #[test]
    fn test_missing_fonts_draw_nothing() {
        let rasterizer = TextRasterizer::without_fonts();
        assert!(rasterizer.rasterize(&TextStyle::new("Hello")).is_none());
        // The miss is cached.
        assert_eq!(rasterizer.cache.lock().len(), 1);
    }
}
