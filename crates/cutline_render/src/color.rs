// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-pixel color grading and blend math.
//!
//! The grade follows CSS filter semantics, applied in the order
//! brightness, contrast, saturate, hue-rotate, with each stage clamped
//! to `0..=1`.

use cutline_timeline::Properties;
use serde::{Deserialize, Serialize};

/// Luma weights shared by the saturate and hue-rotate matrices
const LUMA: [f32; 3] = [0.213, 0.715, 0.072];

/// Blend mode for adjustment overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Darkens or lightens depending on the backdrop
    #[default]
    Overlay,
    /// Backdrop times tint
    Multiply,
}

impl BlendMode {
    /// Blend one normalized channel
    pub fn apply(&self, backdrop: f32, source: f32) -> f32 {
        match self {
            Self::Overlay => {
                if backdrop <= 0.5 {
                    2.0 * backdrop * source
                } else {
                    1.0 - 2.0 * (1.0 - backdrop) * (1.0 - source)
                }
            }
            Self::Multiply => backdrop * source,
        }
    }
}

type Matrix3 = [[f32; 3]; 3];

fn saturate_matrix(s: f32) -> Matrix3 {
    [
        [LUMA[0] + 0.787 * s, LUMA[1] - 0.715 * s, LUMA[2] - 0.072 * s],
        [LUMA[0] - 0.213 * s, LUMA[1] + 0.285 * s, LUMA[2] - 0.072 * s],
        [LUMA[0] - 0.213 * s, LUMA[1] - 0.715 * s, LUMA[2] + 0.928 * s],
    ]
}

fn hue_rotate_matrix(degrees: f32) -> Matrix3 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            LUMA[0] + cos * 0.787 - sin * 0.213,
            LUMA[1] - cos * 0.715 - sin * 0.715,
            LUMA[2] - cos * 0.072 + sin * 0.928,
        ],
        [
            LUMA[0] - cos * 0.213 + sin * 0.143,
            LUMA[1] + cos * 0.285 + sin * 0.140,
            LUMA[2] - cos * 0.072 - sin * 0.283,
        ],
        [
            LUMA[0] - cos * 0.213 - sin * 0.787,
            LUMA[1] - cos * 0.715 + sin * 0.715,
            LUMA[2] + cos * 0.928 + sin * 0.072,
        ],
    ]
}

fn apply_matrix(m: &Matrix3, rgb: [f32; 3]) -> [f32; 3] {
    let row = |r: &[f32; 3]| (r[0] * rgb[0] + r[1] * rgb[1] + r[2] * rgb[2]).clamp(0.0, 1.0);
    [row(&m[0]), row(&m[1]), row(&m[2])]
}

/// Precomputed brightness/contrast/saturation/hue filter
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGrade {
    brightness: f32,
    contrast: f32,
    saturate: Option<Matrix3>,
    hue_rotate: Option<Matrix3>,
}

impl ColorGrade {
    /// Build a grade from resolved clip properties.
    ///
    /// Returns `None` when the grade would leave pixels unchanged.
    pub fn from_properties(props: &Properties) -> Option<Self> {
        if props.is_neutral_grade() {
            return None;
        }
        let saturation = (props.saturation / 100.0).max(0.0);
        Some(Self {
            brightness: (props.brightness / 100.0).max(0.0),
            contrast: (props.contrast / 100.0).max(0.0),
            saturate: (props.saturation != 100.0).then(|| saturate_matrix(saturation)),
            hue_rotate: (props.hue % 360.0 != 0.0).then(|| hue_rotate_matrix(props.hue)),
        })
    }

    /// Grade one straight-alpha pixel; alpha is untouched
    pub fn apply(&self, pixel: [u8; 4]) -> [u8; 4] {
        let mut rgb = [0.0f32; 3];
        for (c, v) in rgb.iter_mut().zip(pixel) {
            let value = f32::from(v) / 255.0;
            let value = (value * self.brightness).clamp(0.0, 1.0);
            *c = ((value - 0.5) * self.contrast + 0.5).clamp(0.0, 1.0);
        }
        if let Some(m) = &self.saturate {
            rgb = apply_matrix(m, rgb);
        }
        if let Some(m) = &self.hue_rotate {
            rgb = apply_matrix(m, rgb);
        }
        [to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2]), pixel[3]]
    }
}

/// Convert a normalized channel to a byte
pub fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Source-over composite of a straight-alpha pixel with extra opacity
pub fn blend_over(dst: [u8; 4], src: [u8; 4], opacity: f32) -> [u8; 4] {
    let sa = f32::from(src[3]) / 255.0 * opacity;
    if sa <= 0.0 {
        return dst;
    }
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| {
        let s = f32::from(s) / 255.0;
        let d = f32::from(d) / 255.0;
        (s * sa + d * da * (1.0 - sa)) / out_a
    };
    [
        to_u8(channel(src[0], dst[0])),
        to_u8(channel(src[1], dst[1])),
        to_u8(channel(src[2], dst[2])),
        to_u8(out_a),
    ]
}

/// Mix a blend-mode result of `tint` over `dst` at `opacity`
pub fn blend_tint(dst: [u8; 4], tint: [u8; 4], opacity: f32, mode: BlendMode) -> [u8; 4] {
    let alpha = f32::from(tint[3]) / 255.0 * opacity;
    if alpha <= 0.0 {
        return dst;
    }
    let channel = |d: u8, t: u8| {
        let d = f32::from(d) / 255.0;
        let blended = mode.apply(d, f32::from(t) / 255.0);
        to_u8(d + (blended - d) * alpha)
    };
    [
        channel(dst[0], tint[0]),
        channel(dst[1], tint[1]),
        channel(dst[2], tint[2]),
        dst[3],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_grade_is_none() {
        assert!(ColorGrade::from_properties(&Properties::default()).is_none());
    }

    #[test]
    fn test_brightness_scales() {
        let props = Properties {
            brightness: 50.0,
            ..Properties::default()
        };
        let grade = ColorGrade::from_properties(&props).unwrap();
        assert_eq!(grade.apply([200, 100, 0, 77]), [100, 50, 0, 77]);
    }

    #[test]
    fn test_zero_contrast_is_mid_grey() {
        let props = Properties {
            contrast: 0.0,
            ..Properties::default()
        };
        let grade = ColorGrade::from_properties(&props).unwrap();
        assert_eq!(grade.apply([255, 0, 30, 255]), [128, 128, 128, 255]);
    }

    #[test]
    fn test_zero_saturation_is_grey() {
        let props = Properties {
            saturation: 0.0,
            ..Properties::default()
        };
        let grade = ColorGrade::from_properties(&props).unwrap();
        let [r, g, b, _] = grade.apply([255, 0, 0, 255]);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(r, 54);
    }

    #[test]
    fn test_full_hue_turn_is_identity() {
        let props = Properties {
            hue: 360.0,
            brightness: 100.0,
            ..Properties::default()
        };
        assert!(ColorGrade::from_properties(&props).unwrap().hue_rotate.is_none());
    }

    #[test]
    fn test_blend_over() {
        assert_eq!(blend_over([0, 0, 0, 255], [255, 255, 255, 255], 1.0), [255, 255, 255, 255]);
        assert_eq!(blend_over([0, 0, 0, 255], [255, 255, 255, 255], 0.5), [128, 128, 128, 255]);
        assert_eq!(blend_over([10, 20, 30, 255], [255, 0, 0, 0], 1.0), [10, 20, 30, 255]);
    }

    #[test]
    fn test_blend_tint_overlay() {
        // Overlay on black stays black, on white stays white.
        assert_eq!(blend_tint([0, 0, 0, 255], [255, 0, 0, 255], 1.0, BlendMode::Overlay), [0, 0, 0, 255]);
        assert_eq!(
            blend_tint([255, 255, 255, 255], [0, 0, 255, 255], 1.0, BlendMode::Overlay),
            [255, 255, 255, 255]
        );
        let mid = blend_tint([128, 128, 128, 255], [255, 0, 0, 255], 0.5, BlendMode::Multiply);
        assert_eq!(mid, [128, 64, 64, 255]);
    }
}
