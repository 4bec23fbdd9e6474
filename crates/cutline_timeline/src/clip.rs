// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clip definitions.

use crate::error::{Result, TimelineError};
use crate::keyframe::KeyframeSet;
use crate::property::{Properties, Property};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClipId(pub Uuid);

impl ClipId {
    /// Create a new random clip ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key into the content-addressable asset store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    /// Create an asset id from any string key
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Straight (non-premultiplied) RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub [u8; 4]);

impl Color {
    /// Opaque white
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    /// Opaque black
    pub const BLACK: Color = Color([0, 0, 0, 255]);

    /// Create an opaque color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    /// Format as `#rrggbb` (alpha is dropped)
    pub fn to_hex_rgb(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

/// Text clip styling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// String to render
    pub content: String,
    /// Font family name
    pub font_family: String,
    /// Font size in output pixels
    pub font_size: f32,
    /// Fill color
    pub color: Color,
}

impl TextStyle {
    /// Create a text style with default font settings
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_family: "sans-serif".to_string(),
            font_size: 48.0,
            color: Color::WHITE,
        }
    }
}

/// Discriminant of [`ClipContent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClipKind {
    /// Time-based asset
    Video,
    /// Still asset
    Image,
    /// Rendered string
    Text,
    /// Tinted overlay that grades everything below it
    Adjustment,
}

impl ClipKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Image => "Image",
            Self::Text => "Text",
            Self::Adjustment => "Adjustment",
        }
    }
}

/// Kind-specific clip payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClipContent {
    /// Video asset reference
    Video {
        /// Asset to sample
        asset: AssetId,
    },
    /// Image asset reference
    Image {
        /// Asset to sample
        asset: AssetId,
    },
    /// Text overlay
    Text(TextStyle),
    /// Adjustment layer
    Adjustment {
        /// Overlay tint
        tint: Color,
    },
}

impl ClipContent {
    /// Get the content kind
    pub fn kind(&self) -> ClipKind {
        match self {
            Self::Video { .. } => ClipKind::Video,
            Self::Image { .. } => ClipKind::Image,
            Self::Text(_) => ClipKind::Text,
            Self::Adjustment { .. } => ClipKind::Adjustment,
        }
    }

    /// Referenced asset, for video and image clips
    pub fn asset(&self) -> Option<&AssetId> {
        match self {
            Self::Video { asset } | Self::Image { asset } => Some(asset),
            Self::Text(_) | Self::Adjustment { .. } => None,
        }
    }
}

fn default_speed() -> f64 {
    1.0
}

/// A clip placed on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique clip ID
    pub id: ClipId,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Timeline start in seconds
    pub start: f64,
    /// Timeline duration in seconds
    pub duration: f64,
    /// Seconds into the source at the clip start
    #[serde(default)]
    pub offset: f64,
    /// Playback rate multiplier
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Kind-specific payload
    pub content: ClipContent,
    /// Static property values
    #[serde(default)]
    pub properties: Properties,
    /// Keyframes per property, times relative to `start`
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub keyframes: IndexMap<Property, KeyframeSet>,
}

impl Clip {
    /// Create a new clip
    pub fn new(content: ClipContent, start: f64, duration: f64) -> Self {
        Self {
            id: ClipId::new(),
            name: content.kind().name().to_string(),
            start,
            duration,
            offset: 0.0,
            speed: 1.0,
            content,
            properties: Properties::default(),
            keyframes: IndexMap::new(),
        }
    }

    /// Create a video clip
    pub fn video(asset: AssetId, start: f64, duration: f64) -> Self {
        Self::new(ClipContent::Video { asset }, start, duration)
    }

    /// Create an image clip
    pub fn image(asset: AssetId, start: f64, duration: f64) -> Self {
        Self::new(ClipContent::Image { asset }, start, duration)
    }

    /// Create a text clip
    pub fn text(style: TextStyle, start: f64, duration: f64) -> Self {
        Self::new(ClipContent::Text(style), start, duration)
    }

    /// Create an adjustment clip
    pub fn adjustment(tint: Color, start: f64, duration: f64) -> Self {
        Self::new(ClipContent::Adjustment { tint }, start, duration)
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the source offset
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Set the playback rate
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Set the offset from the frame centre
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.properties.x = x;
        self.properties.y = y;
        self
    }

    /// Set a static property value
    pub fn with_property(mut self, property: Property, value: f32) -> Self {
        self.properties.set(property, value);
        self
    }

    /// Attach keyframes to a property
    pub fn with_keyframes(mut self, property: Property, keyframes: KeyframeSet) -> Self {
        self.keyframes.insert(property, keyframes);
        self
    }

    /// Get the content kind
    pub fn kind(&self) -> ClipKind {
        self.content.kind()
    }

    /// Timeline end (exclusive)
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Whether `time` falls inside `[start, end)`
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end()
    }

    /// Whether `[start, end)` intersects this clip's range
    pub fn overlaps_range(&self, start: f64, end: f64) -> bool {
        start < self.end() && self.start < end
    }

    /// Whether two clips occupy intersecting ranges
    pub fn overlaps(&self, other: &Clip) -> bool {
        self.overlaps_range(other.start, other.end())
    }

    /// Source position sampled at timeline `time`
    pub fn source_time(&self, time: f64) -> f64 {
        (time - self.start) * self.speed + self.offset
    }

    /// End of the source window, exclusive
    pub fn source_end(&self) -> f64 {
        self.offset + self.duration * self.speed
    }

    /// Value of a property at a clip-relative time
    pub fn value_at(&self, property: Property, local_time: f64) -> f32 {
        let fallback = self.properties.get(property);
        self.keyframes
            .get(&property)
            .map_or(fallback, |set| set.evaluate(local_time, fallback))
    }

    /// Resolve every property at timeline `time`
    pub fn resolve(&self, time: f64) -> Properties {
        let local_time = time - self.start;
        let mut resolved = self.properties;
        for (property, set) in &self.keyframes {
            resolved.set(*property, set.evaluate(local_time, self.properties.get(*property)));
        }
        resolved
    }

    /// Check clip-level invariants
    pub fn validate(&self) -> Result<()> {
        if !self.start.is_finite() || self.start < 0.0 {
            return Err(TimelineError::validation(
                "start",
                format!("must be >= 0, got {}", self.start),
            ));
        }
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(TimelineError::validation(
                "duration",
                format!("must be > 0, got {}", self.duration),
            ));
        }
        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(TimelineError::validation(
                "speed",
                format!("must be > 0, got {}", self.speed),
            ));
        }
        if !self.offset.is_finite() {
            return Err(TimelineError::validation("offset", "must be finite"));
        }
        if let ClipContent::Text(style) = &self.content {
            if !style.font_size.is_finite() || style.font_size <= 0.0 {
                return Err(TimelineError::validation(
                    "font_size",
                    format!("must be > 0, got {}", style.font_size),
                ));
            }
        }
        if let Some(property) = Property::ALL
            .into_iter()
            .find(|p| !self.properties.get(*p).is_finite())
        {
            return Err(TimelineError::validation(
                "properties",
                format!("non-finite value for '{property}'"),
            ));
        }
        if let Some((property, _)) = self.keyframes.iter().find(|(_, set)| !set.is_finite()) {
            return Err(TimelineError::validation(
                "keyframes",
                format!("non-finite keyframe on '{property}'"),
            ));
        }
        Ok(())
    }

    /// Split at a clip-relative time.
    ///
    /// The left half keeps this clip's id, the right half gets a fresh one.
    /// Keyframes are copied unchanged to both halves, so each half evaluates
    /// them relative to its own start.
    pub fn split_at(&self, local_time: f64) -> Result<(Clip, Clip)> {
        if !(local_time > 0.0 && local_time < self.duration) {
            return Err(TimelineError::Range {
                what: "split time",
                value: local_time,
                min: 0.0,
                max: self.duration,
            });
        }

        let mut left = self.clone();
        left.duration = local_time;

        let mut right = self.clone();
        right.id = ClipId::new();
        right.start = self.start + local_time;
        right.duration = self.duration - local_time;
        right.offset = self.offset + local_time * self.speed;

        Ok((left, right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Keyframe;

    fn image_clip(start: f64, duration: f64) -> Clip {
        Clip::image(AssetId::new("still"), start, duration)
    }

    #[test]
    fn test_contains_is_half_open() {
        let clip = image_clip(2.0, 3.0);
        assert!(!clip.contains(1.999));
        assert!(clip.contains(2.0));
        assert!(clip.contains(4.999));
        assert!(!clip.contains(5.0));
    }

    #[test]
    fn test_source_time() {
        let clip = image_clip(10.0, 4.0).with_offset(1.5).with_speed(2.0);
        assert_eq!(clip.source_time(10.0), 1.5);
        assert_eq!(clip.source_time(12.0), 5.5);
        assert_eq!(clip.source_end(), 9.5);
    }

    #[test]
    fn test_split_tiles_original_range() {
        let clip = image_clip(0.0, 10.0);
        let (left, right) = clip.split_at(4.0).unwrap();
        assert_eq!(left.id, clip.id);
        assert_ne!(right.id, clip.id);
        assert_eq!((left.start, left.end()), (0.0, 4.0));
        assert_eq!((right.start, right.end()), (4.0, 10.0));
    }

    #[test]
    fn test_split_offset_accounts_for_speed() {
        let clip = image_clip(1.0, 6.0).with_offset(0.5).with_speed(1.5);
        let (_, right) = clip.split_at(2.0).unwrap();
        assert_eq!(right.offset, 3.5);
        assert_eq!(right.source_time(right.start), clip.source_time(3.0));
    }

    #[test]
    fn test_split_rejects_edges() {
        let clip = image_clip(0.0, 10.0);
        for t in [0.0, 10.0, -1.0, 12.0, f64::NAN] {
            assert!(matches!(clip.split_at(t), Err(TimelineError::Range { .. })));
        }
    }

    #[test]
    fn test_split_keeps_keyframes_relative_to_each_start() {
        let fade = KeyframeSet::from_keyframes([Keyframe::new(0.0, 0.0), Keyframe::new(4.0, 100.0)]);
        let clip = image_clip(10.0, 8.0).with_keyframes(Property::Opacity, fade.clone());
        let (left, right) = clip.split_at(2.0).unwrap();

        assert_eq!(left.keyframes[&Property::Opacity], fade);
        assert_eq!(right.keyframes[&Property::Opacity], fade);
        // One second into each half evaluates the same keyframe position.
        assert_eq!(left.resolve(11.0).opacity, 25.0);
        assert_eq!(right.resolve(13.0).opacity, 25.0);
    }

    #[test]
    fn test_resolve_falls_back_to_static() {
        let clip = image_clip(0.0, 5.0)
            .with_position(320.0, 240.0)
            .with_keyframes(
                Property::X,
                KeyframeSet::from_keyframes([Keyframe::new(0.0, 0.0), Keyframe::new(2.0, 200.0)]),
            );
        let resolved = clip.resolve(1.0);
        assert_eq!(resolved.x, 100.0);
        assert_eq!(resolved.y, 240.0);
        assert_eq!(resolved.scale, 1.0);
    }

    #[test]
    fn test_validate() {
        assert!(image_clip(0.0, 1.0).validate().is_ok());
        assert!(image_clip(-0.5, 1.0).validate().is_err());
        assert!(image_clip(0.0, 0.0).validate().is_err());
        assert!(image_clip(0.0, 1.0).with_speed(0.0).validate().is_err());
        let mut style = TextStyle::new("hi");
        style.font_size = 0.0;
        assert!(Clip::text(style, 0.0, 1.0).validate().is_err());
    }

    #[test]
    fn test_non_finite_static_property_rejected() {
        for value in [f32::NAN, f32::INFINITY] {
            let mut clip = image_clip(0.0, 1.0);
            clip.properties.set(Property::Opacity, value);
            let err = clip.validate().unwrap_err();
            assert!(err.to_string().contains("opacity"), "{err}");
        }
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::rgb(1, 2, 3).to_hex_rgb(), "#010203");
    }
}
