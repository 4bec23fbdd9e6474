// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for timeline mutations.

use crate::clip::ClipId;
use crate::track::TrackId;
use thiserror::Error;

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;

/// Errors reported by timeline mutations.
///
/// A mutation that returns an error leaves the project untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    /// Malformed clip, track or project field
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Operation argument outside its valid domain
    #[error("{what} {value} is outside {min}..{max}")]
    Range {
        /// Argument being checked
        what: &'static str,
        /// Value that was supplied
        value: f64,
        /// Exclusive lower bound
        min: f64,
        /// Exclusive upper bound
        max: f64,
    },

    /// Clip id not present in the project
    #[error("Clip not found: {0}")]
    ClipNotFound(ClipId),

    /// Track id not present in the project
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// Clip placement overlaps another clip on the same track
    #[error("Clip {clip} overlaps clip {existing} on track {track}")]
    Conflict {
        /// Track the placement was attempted on
        track: TrackId,
        /// Clip being placed
        clip: ClipId,
        /// Clip already occupying the range
        existing: ClipId,
    },

    /// Id already used elsewhere in the project
    #[error("Duplicate id: {0}")]
    DuplicateId(String),
}

impl TimelineError {
    /// Build a validation error
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Whether this error means a referenced id was missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ClipNotFound(_) | Self::TrackNotFound(_))
    }
}
