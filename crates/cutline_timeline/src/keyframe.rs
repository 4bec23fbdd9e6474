// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyframes and linear interpolation.
//!
//! Keyframe times are seconds relative to the owning clip's start, so `0.0`
//! is the first visible instant of the clip.

use serde::{Deserialize, Serialize};

/// A single animation sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time in seconds from the clip start
    pub time: f64,
    /// Value at this keyframe
    pub value: f32,
}

impl Keyframe {
    /// Create a new keyframe
    pub fn new(time: f64, value: f32) -> Self {
        Self { time, value }
    }
}

/// Linear interpolation between two floats
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Evaluate a time-sorted keyframe slice at `time`.
///
/// Returns `default` for an empty slice and clamps to the first/last value
/// outside the keyed range.
pub fn evaluate(keyframes: &[Keyframe], time: f64, default: f32) -> f32 {
    let (Some(first), Some(last)) = (keyframes.first(), keyframes.last()) else {
        return default;
    };

    if time.is_nan() || time <= first.time {
        return first.value;
    }
    if time >= last.time {
        return last.value;
    }

    // First keyframe strictly after `time`; never 0 or len here because of the clamps above.
    let next_idx = keyframes.partition_point(|k| k.time <= time);
    let prev = &keyframes[next_idx - 1];
    let next = &keyframes[next_idx];

    let t = (time - prev.time) / (next.time - prev.time);
    lerp(prev.value, next.value, t as f32)
}

/// Keyframes for one property, always sorted by time.
///
/// Inserting at a time that is already keyed replaces the existing value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct KeyframeSet {
    keyframes: Vec<Keyframe>,
}

impl KeyframeSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from keyframes in any order.
    ///
    /// Later entries win over earlier ones with the same time.
    pub fn from_keyframes(keyframes: impl IntoIterator<Item = Keyframe>) -> Self {
        let mut set = Self::new();
        for keyframe in keyframes {
            set.insert(keyframe);
        }
        set
    }

    /// Insert or replace a keyframe
    pub fn insert(&mut self, keyframe: Keyframe) {
        let idx = self.keyframes.partition_point(|k| k.time < keyframe.time);
        match self.keyframes.get_mut(idx) {
            Some(existing) if existing.time == keyframe.time => existing.value = keyframe.value,
            _ => self.keyframes.insert(idx, keyframe),
        }
    }

    /// Remove the keyframe at exactly `time`, returning it
    pub fn remove_at(&mut self, time: f64) -> Option<Keyframe> {
        let idx = self.keyframes.iter().position(|k| k.time == time)?;
        Some(self.keyframes.remove(idx))
    }

    /// Evaluate at a clip-relative time
    pub fn evaluate(&self, time: f64, default: f32) -> f32 {
        evaluate(&self.keyframes, time, default)
    }

    /// Get all keyframes
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Get keyframe count
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Whether the set has no keyframes
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Check that every keyframe time is finite
    pub fn is_finite(&self) -> bool {
        self.keyframes
            .iter()
            .all(|k| k.time.is_finite() && k.value.is_finite())
    }
}

impl<'de> Deserialize<'de> for KeyframeSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let keyframes = Vec::<Keyframe>::deserialize(deserializer)?;
        Ok(Self::from_keyframes(keyframes))
    }
}

impl FromIterator<Keyframe> for KeyframeSet {
    fn from_iter<I: IntoIterator<Item = Keyframe>>(iter: I) -> Self {
        Self::from_keyframes(iter)
    }
}
