// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compositor tunables

use crate::color::BlendMode;
use cutline_timeline::Color;
use serde::{Deserialize, Serialize};

/// Default drift, in seconds, tolerated before a video source is seeked
pub const DEFAULT_SEEK_TOLERANCE: f64 = 0.2;

/// Compositor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Maximum drift between requested and buffered source time before a seek
    pub seek_tolerance: f64,
    /// Adjustment overlays draw at `opacity * adjustment_alpha`
    pub adjustment_alpha: f32,
    /// Blend used by adjustment overlays
    pub adjustment_blend: BlendMode,
    /// Color every frame starts from
    pub background: Color,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            seek_tolerance: DEFAULT_SEEK_TOLERANCE,
            adjustment_alpha: 0.5,
            adjustment_blend: BlendMode::Overlay,
            background: Color::BLACK,
        }
    }
}
