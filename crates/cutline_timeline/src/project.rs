// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project containing the ordered track stack.
//!
//! Track order is compositing order: index 0 is the bottom layer.
//! The project is the sole owner of its tracks and clips; every mutation
//! either applies completely or leaves the project unchanged.

use crate::clip::{Clip, ClipId};
use crate::error::{Result, TimelineError};
use crate::track::{Track, TrackId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A timeline project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project name
    pub name: String,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Output frame rate
    pub fps: f64,
    /// Valid query range is `[0, duration]`
    pub duration: f64,
    /// Tracks, bottom to top
    #[serde(with = "tracks_as_vec")]
    tracks: IndexMap<TrackId, Track>,
}

impl Project {
    /// Create a new empty project
    pub fn new(name: impl Into<String>, width: u32, height: u32, fps: f64) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            fps,
            duration: 0.0,
            tracks: IndexMap::new(),
        }
    }

    /// Set the project duration
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Get all tracks, bottom to top
    pub fn tracks(&self) -> impl DoubleEndedIterator<Item = &Track> {
        self.tracks.values()
    }

    /// Get track count
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Get a track
    pub fn track(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    /// Get the track at a stack index
    pub fn track_at(&self, index: usize) -> Option<&Track> {
        self.tracks.get_index(index).map(|(_, track)| track)
    }

    /// Stack index of a track
    pub fn track_index(&self, track_id: TrackId) -> Option<usize> {
        self.tracks.get_index_of(&track_id)
    }

    fn track_mut(&mut self, track_id: TrackId) -> Result<&mut Track> {
        self.tracks
            .get_mut(&track_id)
            .ok_or(TimelineError::TrackNotFound(track_id))
    }

    /// Track holding a clip
    pub fn locate_clip(&self, clip_id: ClipId) -> Option<TrackId> {
        self.tracks
            .values()
            .find(|t| t.clip(clip_id).is_some())
            .map(|t| t.id)
    }

    /// Get a clip anywhere in the project
    pub fn clip(&self, clip_id: ClipId) -> Option<&Clip> {
        self.tracks.values().find_map(|t| t.clip(clip_id))
    }

    fn clip_track_mut(&mut self, clip_id: ClipId) -> Result<&mut Track> {
        let track_id = self
            .locate_clip(clip_id)
            .ok_or(TimelineError::ClipNotFound(clip_id))?;
        self.track_mut(track_id)
    }

    /// Iterate over every clip with its track
    pub fn clips(&self) -> impl Iterator<Item = (&Track, &Clip)> {
        self.tracks
            .values()
            .flat_map(|t| t.clips().iter().map(move |c| (t, c)))
    }

    /// Add a track on top of the stack
    pub fn add_track(&mut self, track: Track) -> Result<TrackId> {
        if self.tracks.contains_key(&track.id) {
            return Err(TimelineError::DuplicateId(track.id.to_string()));
        }
        let existing: HashSet<ClipId> = self.clips().map(|(_, c)| c.id).collect();
        validate_track(&track, &existing)?;

        let id = track.id;
        tracing::debug!(track = %id, name = %track.name, "Adding track");
        self.tracks.insert(id, track);
        Ok(id)
    }

    /// Remove a track and all its clips
    pub fn delete_track(&mut self, track_id: TrackId) -> Result<Track> {
        let track = self
            .tracks
            .shift_remove(&track_id)
            .ok_or(TimelineError::TrackNotFound(track_id))?;
        tracing::debug!(track = %track_id, clips = track.clip_count(), "Deleted track");
        Ok(track)
    }

    /// Move a track to a new stack index
    pub fn move_track(&mut self, track_id: TrackId, index: usize) -> Result<()> {
        let from = self
            .track_index(track_id)
            .ok_or(TimelineError::TrackNotFound(track_id))?;
        if index >= self.tracks.len() {
            return Err(TimelineError::Range {
                what: "track index",
                value: index as f64,
                min: -1.0,
                max: self.tracks.len() as f64,
            });
        }
        self.tracks.move_index(from, index);
        Ok(())
    }

    /// Add a clip to a track.
    ///
    /// Rejects clips that break clip invariants, reuse an id, or overlap
    /// an existing clip on the track.
    pub fn add_clip(&mut self, track_id: TrackId, clip: Clip) -> Result<ClipId> {
        clip.validate()?;
        if self.clip(clip.id).is_some() {
            return Err(TimelineError::DuplicateId(clip.id.to_string()));
        }

        let track = self.track_mut(track_id)?;
        if let Some(existing) = track.find_overlap(clip.start, clip.end(), None) {
            return Err(TimelineError::Conflict {
                track: track_id,
                clip: clip.id,
                existing: existing.id,
            });
        }

        let id = clip.id;
        tracing::debug!(track = %track_id, clip = %id, start = clip.start, duration = clip.duration, "Adding clip");
        track.insert_clip(clip);
        Ok(id)
    }

    /// Move a clip to a new start, clamped to `>= 0`.
    ///
    /// Overlap is tolerated so drags can pass over other clips; call
    /// [`Project::check_placement`] to revalidate. Returns the applied start.
    pub fn move_clip(&mut self, clip_id: ClipId, new_start: f64) -> Result<f64> {
        if !new_start.is_finite() {
            return Err(TimelineError::validation("start", "must be finite"));
        }
        let start = new_start.max(0.0);
        let track = self.clip_track_mut(clip_id)?;
        if let Some(clip) = track.clip_mut(clip_id) {
            clip.start = start;
        }
        track.sort_clips();
        Ok(start)
    }

    /// Check that a clip does not overlap its neighbours
    pub fn check_placement(&self, clip_id: ClipId) -> Result<()> {
        let track_id = self
            .locate_clip(clip_id)
            .ok_or(TimelineError::ClipNotFound(clip_id))?;
        let track = &self.tracks[&track_id];
        let Some(clip) = track.clip(clip_id) else {
            return Err(TimelineError::ClipNotFound(clip_id));
        };
        match track.find_overlap(clip.start, clip.end(), Some(clip_id)) {
            Some(existing) => Err(TimelineError::Conflict {
                track: track_id,
                clip: clip_id,
                existing: existing.id,
            }),
            None => Ok(()),
        }
    }

    /// Split a clip at a time relative to its start.
    ///
    /// The left part keeps `clip_id`; the id of the new right part is returned.
    pub fn split_clip(&mut self, clip_id: ClipId, local_time: f64) -> Result<ClipId> {
        let track = self.clip_track_mut(clip_id)?;
        let Some(clip) = track.clip(clip_id) else {
            return Err(TimelineError::ClipNotFound(clip_id));
        };
        let (left, right) = clip.split_at(local_time)?;
        let right_id = right.id;

        tracing::debug!(clip = %clip_id, right = %right_id, at = local_time, "Split clip");
        track.splice_clip(clip_id, [left, right]);
        Ok(right_id)
    }

    /// Remove a clip
    pub fn delete_clip(&mut self, clip_id: ClipId) -> Result<Clip> {
        let track = self.clip_track_mut(clip_id)?;
        track
            .remove_clip(clip_id)
            .ok_or(TimelineError::ClipNotFound(clip_id))
    }

    /// Replace a clip with an edited copy that keeps the same id.
    ///
    /// The copy must not overlap its neighbours.
    pub(crate) fn replace_clip(&mut self, clip: Clip) -> Result<()> {
        clip.validate()?;
        let track_id = self
            .locate_clip(clip.id)
            .ok_or(TimelineError::ClipNotFound(clip.id))?;
        let track = self.track_mut(track_id)?;
        if let Some(existing) = track.find_overlap(clip.start, clip.end(), Some(clip.id)) {
            return Err(TimelineError::Conflict {
                track: track_id,
                clip: clip.id,
                existing: existing.id,
            });
        }
        let id = clip.id;
        track.splice_clip(id, [clip]);
        Ok(())
    }

    /// Mute or unmute a track
    pub fn set_mute(&mut self, track_id: TrackId, muted: bool) -> Result<()> {
        self.track_mut(track_id)?.muted = muted;
        Ok(())
    }

    /// Solo or unsolo a track
    pub fn set_solo(&mut self, track_id: TrackId, solo: bool) -> Result<()> {
        self.track_mut(track_id)?.solo = solo;
        Ok(())
    }

    /// The soloed track, if any. With several solo flags the lowest wins.
    pub fn solo_track(&self) -> Option<&Track> {
        self.tracks.values().find(|t| t.solo)
    }

    /// End of the last clip on any track
    pub fn content_duration(&self) -> f64 {
        self.tracks
            .values()
            .map(Track::content_end)
            .fold(0.0, f64::max)
    }

    /// Grow the duration to cover every clip
    pub fn fit_duration_to_content(&mut self) {
        self.duration = self.duration.max(self.content_duration());
    }

    /// Check output settings
    pub fn validate_settings(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(TimelineError::validation(
                "resolution",
                format!("{}x{} has a zero dimension", self.width, self.height),
            ));
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(TimelineError::validation(
                "fps",
                format!("must be > 0, got {}", self.fps),
            ));
        }
        if !self.duration.is_finite() || self.duration < 0.0 {
            return Err(TimelineError::validation(
                "duration",
                format!("must be >= 0, got {}", self.duration),
            ));
        }
        Ok(())
    }

    /// Check every structural invariant, e.g. after loading from disk
    pub fn validate(&self) -> Result<()> {
        self.validate_settings()?;
        let mut seen = HashSet::new();
        for track in self.tracks.values() {
            validate_track(track, &seen)?;
            seen.extend(track.clips().iter().map(|c| c.id));
        }
        Ok(())
    }

    /// Restore clip start order on every track
    pub fn normalize(&mut self) {
        for track in self.tracks.values_mut() {
            track.sort_clips();
        }
    }
}

fn validate_track(track: &Track, existing: &HashSet<ClipId>) -> Result<()> {
    let mut ids = HashSet::new();
    for clip in track.clips() {
        clip.validate()?;
        if existing.contains(&clip.id) || !ids.insert(clip.id) {
            return Err(TimelineError::DuplicateId(clip.id.to_string()));
        }
    }
    if let Some((a, b)) = track.first_overlapping_pair() {
        return Err(TimelineError::Conflict {
            track: track.id,
            clip: b.id,
            existing: a.id,
        });
    }
    Ok(())
}

mod tracks_as_vec {
    use super::{IndexMap, Track, TrackId};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        tracks: &IndexMap<TrackId, Track>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let list: Vec<&Track> = tracks.values().collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<IndexMap<TrackId, Track>, D::Error> {
        let list = Vec::<Track>::deserialize(deserializer)?;
        let mut tracks = IndexMap::with_capacity(list.len());
        for track in list {
            if tracks.contains_key(&track.id) {
                return Err(serde::de::Error::custom(format!(
                    "duplicate track id {}",
                    track.id
                )));
            }
            tracks.insert(track.id, track);
        }
        Ok(tracks)
    }
}
