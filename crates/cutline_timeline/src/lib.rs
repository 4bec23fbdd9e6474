// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline model for Cutline.
//!
//! This crate owns the editable project tree:
//! - Tracks in compositing order
//! - Clips with static and keyframed properties
//! - Typed edit commands with atomic application
//! - Pointer interaction (scrub, drag, razor)
//! - Wall-clock playback
//!
//! ## Architecture
//!
//! [`Project`] is the single writer-facing structure. The interaction
//! controller and any scripted caller build [`TimelineCommand`]s and hand
//! them to [`Project::apply`]; renderers only ever borrow the project.

pub mod clip;
pub mod command;
pub mod error;
pub mod interaction;
pub mod keyframe;
pub mod playback;
pub mod project;
pub mod property;
pub mod track;

pub use clip::{AssetId, Clip, ClipContent, ClipId, ClipKind, Color, TextStyle};
pub use command::{CommandOutcome, PropertyUpdate, TimelineCommand};
pub use error::{Result, TimelineError};
pub use interaction::{
    HitTarget, Interaction, InteractionController, InteractionState, PointerEvent, TimelineView,
    Tool,
};
pub use keyframe::{Keyframe, KeyframeSet};
pub use playback::{PlaybackClock, PlaybackState};
pub use project::Project;
pub use property::{Properties, Property};
pub use track::{Track, TrackId, TrackKind};
