// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animatable clip properties.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A clip property that can carry keyframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Property {
    /// Horizontal offset of the layer centre from the frame centre in output pixels
    X,
    /// Vertical offset of the layer centre from the frame centre in output pixels
    Y,
    /// Uniform scale multiplier
    Scale,
    /// Rotation in degrees, clockwise
    Rotation,
    /// Opacity in percent (0..=100)
    Opacity,
    /// Brightness in percent, 100 is unchanged
    Brightness,
    /// Contrast in percent, 100 is unchanged
    Contrast,
    /// Saturation in percent, 100 is unchanged
    Saturation,
    /// Hue rotation in degrees
    Hue,
}

impl Property {
    /// Every animatable property
    pub const ALL: [Property; 9] = [
        Property::X,
        Property::Y,
        Property::Scale,
        Property::Rotation,
        Property::Opacity,
        Property::Brightness,
        Property::Contrast,
        Property::Saturation,
        Property::Hue,
    ];

    /// Get the property name as used in project files
    pub fn name(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Scale => "scale",
            Self::Rotation => "rotation",
            Self::Opacity => "opacity",
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Saturation => "saturation",
            Self::Hue => "hue",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Property {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| format!("unknown property '{s}'"))
    }
}

/// Static property values, used wherever a property has no keyframes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Properties {
    /// Horizontal offset of the layer centre from the frame centre
    pub x: f32,
    /// Vertical offset of the layer centre from the frame centre
    pub y: f32,
    /// Scale multiplier
    pub scale: f32,
    /// Rotation in degrees
    pub rotation: f32,
    /// Opacity percent
    pub opacity: f32,
    /// Brightness percent
    pub brightness: f32,
    /// Contrast percent
    pub contrast: f32,
    /// Saturation percent
    pub saturation: f32,
    /// Hue rotation in degrees
    pub hue: f32,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            rotation: 0.0,
            opacity: 100.0,
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            hue: 0.0,
        }
    }
}

impl Properties {
    /// Read a property value
    pub fn get(&self, property: Property) -> f32 {
        match property {
            Property::X => self.x,
            Property::Y => self.y,
            Property::Scale => self.scale,
            Property::Rotation => self.rotation,
            Property::Opacity => self.opacity,
            Property::Brightness => self.brightness,
            Property::Contrast => self.contrast,
            Property::Saturation => self.saturation,
            Property::Hue => self.hue,
        }
    }

    /// Write a property value
    pub fn set(&mut self, property: Property, value: f32) {
        let slot = match property {
            Property::X => &mut self.x,
            Property::Y => &mut self.y,
            Property::Scale => &mut self.scale,
            Property::Rotation => &mut self.rotation,
            Property::Opacity => &mut self.opacity,
            Property::Brightness => &mut self.brightness,
            Property::Contrast => &mut self.contrast,
            Property::Saturation => &mut self.saturation,
            Property::Hue => &mut self.hue,
        };
        *slot = value;
    }

    /// Global alpha derived from opacity, clamped to `0..=1`
    pub fn alpha(&self) -> f32 {
        (self.opacity / 100.0).clamp(0.0, 1.0)
    }

    /// Whether the color grade leaves pixels unchanged
    pub fn is_neutral_grade(&self) -> bool {
        self.brightness == 100.0
            && self.contrast == 100.0
            && self.saturation == 100.0
            && self.hue == 0.0
    }
}
