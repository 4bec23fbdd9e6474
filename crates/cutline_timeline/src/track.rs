// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track definitions.

use crate::clip::{Clip, ClipId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    /// Create a new random track ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type of track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    /// Video and image clips
    Video,
    /// Audio clips; never composited
    Audio,
    /// Generic visual layer (text, adjustments)
    Overlay,
}

impl TrackKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::Overlay => "Overlay",
        }
    }

    /// Whether clips on this track contribute pixels
    pub fn is_visual(&self) -> bool {
        !matches!(self, Self::Audio)
    }
}

/// A track in the project.
///
/// Clips are kept ordered by start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Track type
    pub kind: TrackKind,
    /// Track name
    pub name: String,
    /// Whether the track is muted
    #[serde(default)]
    pub muted: bool,
    /// Whether the track is soloed
    #[serde(default)]
    pub solo: bool,
    /// Clips on this track
    #[serde(default)]
    clips: Vec<Clip>,
}

impl Track {
    /// Create a new track
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: TrackId::new(),
            kind,
            name: name.into(),
            muted: false,
            solo: false,
            clips: Vec::new(),
        }
    }

    /// Get all clips, ordered by start
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Get clip count
    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }

    /// Get clip by ID
    pub fn clip(&self, clip_id: ClipId) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == clip_id)
    }

    /// Get mutable clip by ID.
    ///
    /// Call [`Track::sort_clips`] after changing a clip's start.
    pub(crate) fn clip_mut(&mut self, clip_id: ClipId) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == clip_id)
    }

    /// Position of a clip in start order
    pub fn clip_index(&self, clip_id: ClipId) -> Option<usize> {
        self.clips.iter().position(|c| c.id == clip_id)
    }

    /// First clip in start order whose range contains `time`
    pub fn active_clip(&self, time: f64) -> Option<&Clip> {
        self.clips.iter().find(|c| c.contains(time))
    }

    /// First clip other than `ignore` that intersects `[start, end)`
    pub fn find_overlap(&self, start: f64, end: f64, ignore: Option<ClipId>) -> Option<&Clip> {
        self.clips
            .iter()
            .filter(|c| Some(c.id) != ignore)
            .find(|c| c.overlaps_range(start, end))
    }

    /// First pair of clips sharing time, in start order
    pub fn first_overlapping_pair(&self) -> Option<(&Clip, &Clip)> {
        self.clips
            .iter()
            .enumerate()
            .find_map(|(i, a)| self.clips[i + 1..].iter().find(|b| a.overlaps(b)).map(|b| (a, b)))
    }

    /// End of the last clip
    pub fn content_end(&self) -> f64 {
        self.clips.iter().map(Clip::end).fold(0.0, f64::max)
    }

    /// Insert a clip keeping start order. Equal starts keep insertion order.
    pub(crate) fn insert_clip(&mut self, clip: Clip) {
        let idx = self.clips.partition_point(|c| c.start <= clip.start);
        self.clips.insert(idx, clip);
    }

    /// Remove a clip
    pub(crate) fn remove_clip(&mut self, clip_id: ClipId) -> Option<Clip> {
        let idx = self.clip_index(clip_id)?;
        Some(self.clips.remove(idx))
    }

    /// Replace a clip in place with one or more clips
    pub(crate) fn splice_clip(&mut self, clip_id: ClipId, replacement: impl IntoIterator<Item = Clip>) {
        if let Some(idx) = self.clip_index(clip_id) {
            self.clips.splice(idx..=idx, replacement);
            self.sort_clips();
        }
    }

    /// Restore start order (stable)
    pub(crate) fn sort_clips(&mut self) {
        self.clips.sort_by(|a, b| a.start.total_cmp(&b.start));
    }
}
