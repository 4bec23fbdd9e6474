// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed timeline commands.
//!
//! Every edit, interactive or scripted, goes through [`Project::apply`] so
//! validation lives in one place.

use crate::clip::{Clip, ClipContent, ClipId, Color};
use crate::error::{Result, TimelineError};
use crate::keyframe::{Keyframe, KeyframeSet};
use crate::project::Project;
use crate::property::Property;
use crate::track::{Track, TrackId};
use serde::{Deserialize, Serialize};

/// A single field update on a clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyUpdate {
    /// Set the static value of a property
    Static(Property, f32),
    /// Replace a property's keyframes; an empty set removes the animation
    Keyframes(Property, KeyframeSet),
    /// Insert or replace one keyframe
    AddKeyframe(Property, Keyframe),
    /// Remove the keyframe at an exact clip-relative time
    RemoveKeyframe(Property, f64),
    /// Set the timeline duration
    Duration(f64),
    /// Set the source offset
    Offset(f64),
    /// Set the playback rate
    Speed(f64),
    /// Set the display name
    Name(String),
    /// Set the text string of a text clip
    TextContent(String),
    /// Set font family and size of a text clip
    Font {
        /// Font family name
        family: String,
        /// Font size in pixels
        size: f32,
    },
    /// Set the fill color of a text clip or the tint of an adjustment clip
    Color(Color),
}

impl PropertyUpdate {
    /// Apply to a clip copy. The caller validates the result.
    fn apply_to(self, clip: &mut Clip) -> Result<()> {
        match self {
            Self::Static(property, value) => clip.properties.set(property, value),
            Self::Keyframes(property, set) if set.is_empty() => {
                clip.keyframes.shift_remove(&property);
            }
            Self::Keyframes(property, set) => {
                clip.keyframes.insert(property, set);
            }
            Self::AddKeyframe(property, keyframe) => {
                clip.keyframes.entry(property).or_default().insert(keyframe);
            }
            Self::RemoveKeyframe(property, time) => {
                if let Some(set) = clip.keyframes.get_mut(&property) {
                    set.remove_at(time);
                    if set.is_empty() {
                        clip.keyframes.shift_remove(&property);
                    }
                }
            }
            Self::Duration(duration) => clip.duration = duration,
            Self::Offset(offset) => clip.offset = offset,
            Self::Speed(speed) => clip.speed = speed,
            Self::Name(name) => clip.name = name,
            Self::TextContent(content) => match &mut clip.content {
                ClipContent::Text(style) => style.content = content,
                _ => return Err(wrong_kind("text content", clip)),
            },
            Self::Font { family, size } => match &mut clip.content {
                ClipContent::Text(style) => {
                    style.font_family = family;
                    style.font_size = size;
                }
                _ => return Err(wrong_kind("font", clip)),
            },
            Self::Color(color) => match &mut clip.content {
                ClipContent::Text(style) => style.color = color,
                ClipContent::Adjustment { tint } => *tint = color,
                _ => return Err(wrong_kind("color", clip)),
            },
        }
        Ok(())
    }
}

fn wrong_kind(field: &'static str, clip: &Clip) -> TimelineError {
    TimelineError::validation(
        field,
        format!("not applicable to {} clips", clip.kind().name()),
    )
}

/// An edit request against a [`Project`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimelineCommand {
    /// Add a track on top of the stack
    AddTrack(Track),
    /// Remove a track
    DeleteTrack(TrackId),
    /// Add a clip to a track
    AddClip {
        /// Destination track
        track: TrackId,
        /// Clip to insert
        clip: Clip,
    },
    /// Reposition a clip (overlap tolerated)
    Move {
        /// Clip to move
        clip: ClipId,
        /// Requested start, clamped to `>= 0`
        start: f64,
    },
    /// Split a clip at a clip-relative time
    Split {
        /// Clip to split
        clip: ClipId,
        /// Seconds from the clip start
        at: f64,
    },
    /// Remove a clip
    DeleteClip(ClipId),
    /// Toggle track mute
    SetMute {
        /// Track to change
        track: TrackId,
        /// New mute flag
        muted: bool,
    },
    /// Toggle track solo
    SetSolo {
        /// Track to change
        track: TrackId,
        /// New solo flag
        solo: bool,
    },
    /// Update a clip field
    UpdateClip {
        /// Clip to change
        clip: ClipId,
        /// The update
        update: PropertyUpdate,
    },
}

impl TimelineCommand {
    /// Get a description of this command
    pub fn description(&self) -> &'static str {
        match self {
            Self::AddTrack(_) => "Add Track",
            Self::DeleteTrack(_) => "Delete Track",
            Self::AddClip { .. } => "Add Clip",
            Self::Move { .. } => "Move Clip",
            Self::Split { .. } => "Split Clip",
            Self::DeleteClip(_) => "Delete Clip",
            Self::SetMute { .. } => "Set Mute",
            Self::SetSolo { .. } => "Set Solo",
            Self::UpdateClip { .. } => "Update Clip",
        }
    }
}

/// What a successfully applied command produced
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The project changed, nothing new was created
    Applied,
    /// A track was created
    TrackAdded(TrackId),
    /// A track was removed
    TrackRemoved(Track),
    /// A clip was created (add, or the right half of a split)
    ClipAdded(ClipId),
    /// A clip was removed
    ClipRemoved(Clip),
    /// A clip moved; carries the applied start
    Moved(f64),
}

impl Project {
    /// Apply a command. On error the project is unchanged.
    pub fn apply(&mut self, command: TimelineCommand) -> Result<CommandOutcome> {
        let description = command.description();
        let result = match command {
            TimelineCommand::AddTrack(track) => self.add_track(track).map(CommandOutcome::TrackAdded),
            TimelineCommand::DeleteTrack(id) => self.delete_track(id).map(CommandOutcome::TrackRemoved),
            TimelineCommand::AddClip { track, clip } => {
                self.add_clip(track, clip).map(CommandOutcome::ClipAdded)
            }
            TimelineCommand::Move { clip, start } => self.move_clip(clip, start).map(CommandOutcome::Moved),
            TimelineCommand::Split { clip, at } => self.split_clip(clip, at).map(CommandOutcome::ClipAdded),
            TimelineCommand::DeleteClip(id) => self.delete_clip(id).map(CommandOutcome::ClipRemoved),
            TimelineCommand::SetMute { track, muted } => {
                self.set_mute(track, muted).map(|()| CommandOutcome::Applied)
            }
            TimelineCommand::SetSolo { track, solo } => {
                self.set_solo(track, solo).map(|()| CommandOutcome::Applied)
            }
            TimelineCommand::UpdateClip { clip, update } => {
                self.update_clip(clip, update).map(|()| CommandOutcome::Applied)
            }
        };

        match &result {
            Ok(_) => tracing::debug!(command = description, "Applied command"),
            Err(e) => tracing::debug!(command = description, error = %e, "Command rejected"),
        }
        result
    }

    /// Merge a field update into a clip, re-checking clip invariants
    pub fn update_clip(&mut self, clip_id: ClipId, update: PropertyUpdate) -> Result<()> {
        let mut edited = self
            .clip(clip_id)
            .cloned()
            .ok_or(TimelineError::ClipNotFound(clip_id))?;
        update.apply_to(&mut edited)?;
        self.replace_clip(edited)
    }
}
