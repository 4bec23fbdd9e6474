// SPDX-License-Identifier: MIT OR Apache-2.0
//! Output surface and layer drawing.
//!
//! Layers are drawn by inverse-mapping every covered output pixel centre
//! into layer space and taking the nearest source pixel. No filtering is
//! applied, so the same inputs always produce the same bytes.

use crate::color::{blend_over, blend_tint, BlendMode, ColorGrade};
use cutline_timeline::{Color, Properties};
use image::{Rgba, RgbaImage};
use tiny_skia::{Point, Transform};

/// An RGBA frame buffer with straight alpha
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    image: RgbaImage,
}

impl Surface {
    /// Create a surface filled with a color
    pub fn new(width: u32, height: u32, fill: Color) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(fill.0)),
        }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Read a pixel; out-of-bounds reads return `None`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Borrow the underlying image
    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Blend a flat tint over the whole surface
    pub fn fill_tint(&mut self, tint: Color, opacity: f32, mode: BlendMode) {
        if opacity <= 0.0 {
            return;
        }
        for pixel in self.image.pixels_mut() {
            pixel.0 = blend_tint(pixel.0, tint.0, opacity, mode);
        }
    }

    /// Composite `layer` through `transform` (layer space to surface space)
    pub fn draw_layer(
        &mut self,
        layer: &RgbaImage,
        transform: Transform,
        opacity: f32,
        grade: Option<&ColorGrade>,
    ) {
        if opacity <= 0.0 || layer.width() == 0 || layer.height() == 0 {
            return;
        }
        let Some(inverse) = transform.invert() else {
            return;
        };
        let Some((x0, y0, x1, y1)) = self.footprint(layer, transform) else {
            return;
        };

        let (lw, lh) = (layer.width() as f32, layer.height() as f32);
        for py in y0..y1 {
            for px in x0..x1 {
                let mut p = Point::from_xy(px as f32 + 0.5, py as f32 + 0.5);
                inverse.map_point(&mut p);
                if !(p.x >= 0.0 && p.y >= 0.0 && p.x < lw && p.y < lh) {
                    continue;
                }
                let mut src = layer.get_pixel(p.x as u32, p.y as u32).0;
                if src[3] == 0 {
                    continue;
                }
                if let Some(grade) = grade {
                    src = grade.apply(src);
                }
                let dst = self.image.get_pixel_mut(px, py);
                dst.0 = blend_over(dst.0, src, opacity);
            }
        }
    }

    /// Surface-space pixel bounds covered by a transformed layer
    fn footprint(&self, layer: &RgbaImage, transform: Transform) -> Option<(u32, u32, u32, u32)> {
        let (lw, lh) = (layer.width() as f32, layer.height() as f32);
        let mut corners = [
            Point::from_xy(0.0, 0.0),
            Point::from_xy(lw, 0.0),
            Point::from_xy(0.0, lh),
            Point::from_xy(lw, lh),
        ];
        transform.map_points(&mut corners);

        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for c in &corners {
            if !(c.x.is_finite() && c.y.is_finite()) {
                return None;
            }
            min_x = min_x.min(c.x);
            min_y = min_y.min(c.y);
            max_x = max_x.max(c.x);
            max_y = max_y.max(c.y);
        }

        let clamp = |v: f32, limit: u32| v.clamp(0.0, limit as f32) as u32;
        let x0 = clamp(min_x.floor(), self.width());
        let y0 = clamp(min_y.floor(), self.height());
        let x1 = clamp(max_x.ceil(), self.width());
        let y1 = clamp(max_y.ceil(), self.height());
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }
}

/// Layer-to-surface transform for a `layer_width` x `layer_height` layer.
///
/// Order: translate to the frame centre offset by `(x, y)`, rotate, scale,
/// then centre the layer on the origin.
pub fn layer_transform(
    props: &Properties,
    surface_width: u32,
    surface_height: u32,
    layer_width: u32,
    layer_height: u32,
) -> Transform {
    Transform::from_translate(
        surface_width as f32 / 2.0 + props.x,
        surface_height as f32 / 2.0 + props.y,
    )
    .pre_concat(Transform::from_rotate(props.rotation))
    .pre_scale(props.scale, props.scale)
    .pre_translate(-(layer_width as f32) / 2.0, -(layer_height as f32) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn quad() -> RgbaImage {
        let mut layer = RgbaImage::new(2, 2);
        layer.put_pixel(0, 0, Rgba(RED));
        layer.put_pixel(1, 0, Rgba(GREEN));
        layer.put_pixel(0, 1, Rgba(BLUE));
        layer.put_pixel(1, 1, Rgba([255, 255, 255, 255]));
        layer
    }

    #[test]
    fn test_default_props_centre_layer() {
        let mut surface = Surface::new(4, 4, Color::BLACK);
        let props = Properties::default();
        surface.draw_layer(&quad(), layer_transform(&props, 4, 4, 2, 2), 1.0, None);
        assert_eq!(surface.pixel(1, 1), Some(RED));
        assert_eq!(surface.pixel(2, 1), Some(GREEN));
        assert_eq!(surface.pixel(1, 2), Some(BLUE));
        assert_eq!(surface.pixel(0, 0), Some(BLACK));
        assert_eq!(surface.pixel(3, 3), Some(BLACK));
    }

    #[test]
    fn test_offset_and_scale() {
        let mut surface = Surface::new(8, 8, Color::BLACK);
        let props = Properties {
            x: 2.0,
            y: -2.0,
            scale: 2.0,
            ..Properties::default()
        };
        surface.draw_layer(&quad(), layer_transform(&props, 8, 8, 2, 2), 1.0, None);
        // Centre moves to (6, 2); each source pixel covers 2x2.
        for (x, y) in [(4, 0), (5, 0), (4, 1), (5, 1)] {
            assert_eq!(surface.pixel(x, y), Some(RED));
        }
        assert_eq!(surface.pixel(7, 3), Some([255, 255, 255, 255]));
        assert_eq!(surface.pixel(3, 0), Some(BLACK));
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let mut surface = Surface::new(4, 4, Color::BLACK);
        let props = Properties {
            rotation: 90.0,
            ..Properties::default()
        };
        surface.draw_layer(&quad(), layer_transform(&props, 4, 4, 2, 2), 1.0, None);
        assert_eq!(surface.pixel(2, 1), Some(RED));
        assert_eq!(surface.pixel(1, 1), Some(BLUE));
    }

    #[test]
    fn test_zero_scale_draws_nothing() {
        let mut surface = Surface::new(4, 4, Color::BLACK);
        let props = Properties {
            scale: 0.0,
            ..Properties::default()
        };
        surface.draw_layer(&quad(), layer_transform(&props, 4, 4, 2, 2), 1.0, None);
        assert!(surface.as_image().pixels().all(|p| p.0 == BLACK));
    }

    #[test]
    fn test_offscreen_layer_is_clipped() {
        let mut surface = Surface::new(4, 4, Color::BLACK);
        let props = Properties {
            x: 100.0,
            ..Properties::default()
        };
        surface.draw_layer(&quad(), layer_transform(&props, 4, 4, 2, 2), 1.0, None);
        assert!(surface.as_image().pixels().all(|p| p.0 == BLACK));
    }

    #[test]
    fn test_opacity_and_tint() {
        let mut surface = Surface::new(4, 4, Color::BLACK);
        let layer = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        surface.draw_layer(&layer, layer_transform(&Properties::default(), 4, 4, 4, 4), 0.5, None);
        assert_eq!(surface.pixel(0, 0), Some([128, 128, 128, 255]));

        surface.fill_tint(Color::rgb(255, 0, 0), 1.0, BlendMode::Multiply);
        assert_eq!(surface.pixel(3, 3), Some([128, 0, 0, 255]));
    }
}
