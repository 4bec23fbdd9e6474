// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer interaction on the timeline.
//!
//! The controller turns screen-space pointer events into timeline commands:
//! - Ruler press scrubs the playhead
//! - Clip press with the select tool drags the clip
//! - Clip press with the razor tool splits the clip
//!
//! All edits are dispatched through [`Project::apply`].

use crate::clip::ClipId;
use crate::command::{CommandOutcome, TimelineCommand};
use crate::error::{Result, TimelineError};
use crate::project::Project;
use crate::track::TrackId;
use serde::{Deserialize, Serialize};

/// Default width of the track header column in pixels
pub const TRACK_HEADER_WIDTH: f64 = 200.0;
/// Default height of the time ruler in pixels
pub const RULER_HEIGHT: f64 = 32.0;
/// Default height of one track row in pixels
pub const TRACK_HEIGHT: f64 = 48.0;
/// Default horizontal zoom
pub const PIXELS_PER_SECOND: f64 = 100.0;

/// Timeline viewport geometry.
///
/// Track rows are laid out in stack order, so row 0 is track index 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineView {
    /// Width of the track header column
    pub track_header_width: f64,
    /// Height of the ruler strip above the tracks
    pub ruler_height: f64,
    /// Height of one track row
    pub track_height: f64,
    /// Horizontal zoom
    pub pixels_per_second: f64,
    /// Horizontal scroll in pixels
    pub scroll_offset: f64,
}

impl Default for TimelineView {
    fn default() -> Self {
        Self {
            track_header_width: TRACK_HEADER_WIDTH,
            ruler_height: RULER_HEIGHT,
            track_height: TRACK_HEIGHT,
            pixels_per_second: PIXELS_PER_SECOND,
            scroll_offset: 0.0,
        }
    }
}

impl TimelineView {
    /// Check that the geometry maps pixels to finite times
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("pixels_per_second", self.pixels_per_second),
            ("track_height", self.track_height),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(TimelineError::validation(field, format!("must be > 0, got {value}")));
            }
        }
        let non_negative = [
            ("track_header_width", self.track_header_width),
            ("ruler_height", self.ruler_height),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(TimelineError::validation(field, format!("must be >= 0, got {value}")));
            }
        }
        if !self.scroll_offset.is_finite() {
            return Err(TimelineError::validation("scroll_offset", "must be finite"));
        }
        Ok(())
    }

    /// Convert an x position to a timeline time, clamped to `>= 0`
    pub fn x_to_time(&self, x: f64) -> f64 {
        ((x - self.track_header_width + self.scroll_offset) / self.pixels_per_second).max(0.0)
    }

    /// Convert a timeline time to an x position
    pub fn time_to_x(&self, time: f64) -> f64 {
        time * self.pixels_per_second - self.scroll_offset + self.track_header_width
    }

    /// Convert a horizontal pixel distance to seconds
    pub fn delta_to_seconds(&self, dx: f64) -> f64 {
        dx / self.pixels_per_second
    }

    /// Stack index of the row under `y`
    pub fn row_at(&self, y: f64) -> Option<usize> {
        if y < self.ruler_height {
            return None;
        }
        Some(((y - self.ruler_height) / self.track_height).floor() as usize)
    }

    /// Find what lies under a pointer position
    pub fn hit_test(&self, project: &Project, x: f64, y: f64) -> HitTarget {
        if y < self.ruler_height {
            return if x >= self.track_header_width {
                HitTarget::Ruler
            } else {
                HitTarget::Empty
            };
        }
        let Some(track) = self.row_at(y).and_then(|row| project.track_at(row)) else {
            return HitTarget::Empty;
        };
        if x < self.track_header_width {
            return HitTarget::TrackHeader(track.id);
        }
        let time = self.x_to_time(x);
        match track.active_clip(time) {
            Some(clip) => HitTarget::Clip {
                track: track.id,
                clip: clip.id,
            },
            None => HitTarget::TrackArea {
                track: track.id,
                time,
            },
        }
    }
}

/// Result of a hit test
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    /// Time ruler
    Ruler,
    /// Track header column
    TrackHeader(TrackId),
    /// A clip body
    Clip {
        /// Track holding the clip
        track: TrackId,
        /// Clip under the pointer
        clip: ClipId,
    },
    /// Empty part of a track row
    TrackArea {
        /// Track row
        track: TrackId,
        /// Time under the pointer
        time: f64,
    },
    /// Nothing
    Empty,
}

/// Active editing tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tool {
    /// Select and drag clips
    #[default]
    Select,
    /// Split clips on click
    Razor,
}

impl Tool {
    /// Get the name of this tool
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select => "Select",
            Self::Razor => "Razor",
        }
    }
}

/// Pointer input in timeline widget coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Button pressed
    Down {
        /// Horizontal position
        x: f64,
        /// Vertical position
        y: f64,
    },
    /// Pointer moved
    Move {
        /// Horizontal position
        x: f64,
        /// Vertical position
        y: f64,
    },
    /// Button released
    Up {
        /// Horizontal position
        x: f64,
        /// Vertical position
        y: f64,
    },
}

/// Gesture in progress
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    /// No gesture
    #[default]
    Idle,
    /// Dragging the playhead along the ruler
    ScrubbingPlayhead,
    /// Dragging a clip horizontally
    DraggingClip {
        /// Clip being dragged
        clip: ClipId,
        /// Pointer x when the drag started
        pointer_start_x: f64,
        /// Clip start when the drag started
        original_start: f64,
    },
}

/// What an event did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    /// Event had no effect
    Ignored,
    /// Playhead moved
    Scrubbed(f64),
    /// A clip drag began
    DragStarted(ClipId),
    /// The dragged clip moved to a new start
    ClipMoved {
        /// Clip being dragged
        clip: ClipId,
        /// Applied start
        start: f64,
    },
    /// The drag finished at the clip's current start
    DragEnded(ClipId),
    /// A clip was split
    ClipSplit {
        /// Left part, keeps the original id
        left: ClipId,
        /// New right part
        right: ClipId,
    },
}

/// Pointer state machine for the timeline
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    /// Viewport geometry
    pub view: TimelineView,
    /// Active tool
    pub tool: Tool,
    state: InteractionState,
    playhead: f64,
}

impl InteractionController {
    /// Create a controller for a viewport
    pub fn new(view: TimelineView) -> Self {
        Self {
            view,
            ..Self::default()
        }
    }

    /// Current gesture
    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Playhead time owned by the controller
    pub fn playhead(&self) -> f64 {
        self.playhead
    }

    /// Set the playhead, e.g. from playback
    pub fn set_playhead(&mut self, time: f64) {
        self.playhead = time.max(0.0);
    }

    /// Switch tools.
    ///
    /// A gesture in progress is finished first, as if the pointer had been
    /// released. The tool changes even when that drop is rejected.
    pub fn set_tool(&mut self, project: &mut Project, tool: Tool) -> Result<Interaction> {
        let settled = self.pointer_up(project);
        self.tool = tool;
        settled
    }

    /// Feed a pointer event.
    ///
    /// A failed edit leaves the controller idle and the project unchanged.
    pub fn handle(&mut self, project: &mut Project, event: PointerEvent) -> Result<Interaction> {
        let result = match event {
            PointerEvent::Down { x, y } => self.pointer_down(project, x, y),
            PointerEvent::Move { x, .. } => self.pointer_move(project, x),
            PointerEvent::Up { .. } => self.pointer_up(project),
        };
        if result.is_err() {
            self.state = InteractionState::Idle;
        }
        result
    }

    /// Abort a clip drag, restoring the original start
    pub fn cancel(&mut self, project: &mut Project) -> Result<Interaction> {
        let state = std::mem::take(&mut self.state);
        match state {
            InteractionState::DraggingClip { clip, original_start, .. } => {
                project.apply(TimelineCommand::Move { clip, start: original_start })?;
                Ok(Interaction::ClipMoved { clip, start: original_start })
            }
            InteractionState::Idle | InteractionState::ScrubbingPlayhead => Ok(Interaction::Ignored),
        }
    }

    fn pointer_down(&mut self, project: &mut Project, x: f64, y: f64) -> Result<Interaction> {
        if self.state != InteractionState::Idle {
            tracing::debug!(state = ?self.state, "Pointer down without release, finishing gesture");
            if let Err(e) = self.pointer_up(project) {
                tracing::debug!(error = %e, "Unreleased gesture did not settle");
            }
        }

        match self.view.hit_test(project, x, y) {
            HitTarget::Ruler => {
                self.state = InteractionState::ScrubbingPlayhead;
                self.playhead = self.view.x_to_time(x);
                Ok(Interaction::Scrubbed(self.playhead))
            }
            HitTarget::Clip { clip, .. } => match self.tool {
                Tool::Select => {
                    let original_start = project
                        .clip(clip)
                        .map(|c| c.start)
                        .ok_or(TimelineError::ClipNotFound(clip))?;
                    self.state = InteractionState::DraggingClip {
                        clip,
                        pointer_start_x: x,
                        original_start,
                    };
                    Ok(Interaction::DragStarted(clip))
                }
                Tool::Razor => {
                    let start = project
                        .clip(clip)
                        .map(|c| c.start)
                        .ok_or(TimelineError::ClipNotFound(clip))?;
                    let at = self.view.x_to_time(x) - start;
                    match project.apply(TimelineCommand::Split { clip, at })? {
                        CommandOutcome::ClipAdded(right) => Ok(Interaction::ClipSplit { left: clip, right }),
                        _ => Ok(Interaction::Ignored),
                    }
                }
            },
            HitTarget::TrackHeader(_) | HitTarget::TrackArea { .. } | HitTarget::Empty => {
                Ok(Interaction::Ignored)
            }
        }
    }

    fn pointer_move(&mut self, project: &mut Project, x: f64) -> Result<Interaction> {
        match self.state {
            InteractionState::Idle => Ok(Interaction::Ignored),
            InteractionState::ScrubbingPlayhead => {
                self.playhead = self.view.x_to_time(x);
                Ok(Interaction::Scrubbed(self.playhead))
            }
            InteractionState::DraggingClip {
                clip,
                pointer_start_x,
                original_start,
            } => {
                let requested = original_start + self.view.delta_to_seconds(x - pointer_start_x);
                let start = match project.apply(TimelineCommand::Move { clip, start: requested.max(0.0) })? {
                    CommandOutcome::Moved(start) => start,
                    _ => requested.max(0.0),
                };
                Ok(Interaction::ClipMoved { clip, start })
            }
        }
    }

    fn pointer_up(&mut self, project: &mut Project) -> Result<Interaction> {
        let state = std::mem::take(&mut self.state);
        match state {
            InteractionState::Idle => Ok(Interaction::Ignored),
            InteractionState::ScrubbingPlayhead => Ok(Interaction::Scrubbed(self.playhead)),
            InteractionState::DraggingClip {
                clip,
                original_start,
                ..
            } => {
                if let Err(conflict) = project.check_placement(clip) {
                    tracing::debug!(clip = %clip, error = %conflict, "Drop overlaps, reverting");
                    project.apply(TimelineCommand::Move { clip, start: original_start })?;
                    return Err(conflict);
                }
                Ok(Interaction::DragEnded(clip))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::{AssetId, Clip};
    use crate::track::{Track, TrackKind};

    fn view() -> TimelineView {
        TimelineView {
            track_header_width: 100.0,
            ruler_height: 20.0,
            track_height: 40.0,
            pixels_per_second: 50.0,
            scroll_offset: 0.0,
        }
    }

    /// One track with clips at [2, 6) and [8, 10).
    fn setup() -> (Project, InteractionController, ClipId, ClipId) {
        let mut project = Project::new("Test", 320, 240, 30.0).with_duration(20.0);
        let track = project.add_track(Track::new("V1", TrackKind::Video)).unwrap();
        let a = project
            .add_clip(track, Clip::image(AssetId::new("a"), 2.0, 4.0))
            .unwrap();
        let b = project
            .add_clip(track, Clip::image(AssetId::new("b"), 8.0, 2.0))
            .unwrap();
        (project, InteractionController::new(view()), a, b)
    }

    #[test]
    fn test_view_mapping() {
        let mut v = view();
        assert_eq!(v.x_to_time(100.0), 0.0);
        assert_eq!(v.x_to_time(50.0), 0.0);
        assert_eq!(v.x_to_time(225.0), 2.5);
        v.scroll_offset = 50.0;
        assert_eq!(v.x_to_time(100.0), 1.0);
        assert_eq!(v.time_to_x(1.0), 100.0);
    }

    #[test]
    fn test_view_validation() {
        assert!(TimelineView::default().validate().is_ok());
        assert!(view().validate().is_ok());
        let bad = [
            TimelineView { pixels_per_second: 0.0, ..view() },
            TimelineView { pixels_per_second: -10.0, ..view() },
            TimelineView { track_height: 0.0, ..view() },
            TimelineView { ruler_height: f64::NAN, ..view() },
            TimelineView { track_header_width: -1.0, ..view() },
            TimelineView { scroll_offset: f64::INFINITY, ..view() },
        ];
        for v in bad {
            assert!(matches!(v.validate(), Err(TimelineError::Validation { .. })), "{v:?}");
        }
    }

    #[test]
    fn test_hit_test() {
        let (project, controller, a, _) = setup();
        let v = controller.view;
        assert_eq!(v.hit_test(&project, 150.0, 5.0), HitTarget::Ruler);
        assert!(matches!(v.hit_test(&project, 50.0, 30.0), HitTarget::TrackHeader(_)));
        assert!(matches!(v.hit_test(&project, 250.0, 30.0), HitTarget::Clip { clip, .. } if clip == a));
        assert!(matches!(v.hit_test(&project, 150.0, 30.0), HitTarget::TrackArea { .. }));
        assert_eq!(v.hit_test(&project, 250.0, 90.0), HitTarget::Empty);
    }

    #[test]
    fn test_scrub() {
        let (mut project, mut c, _, _) = setup();
        assert_eq!(
            c.handle(&mut project, PointerEvent::Down { x: 150.0, y: 10.0 }).unwrap(),
            Interaction::Scrubbed(1.0)
        );
        assert_eq!(c.state(), InteractionState::ScrubbingPlayhead);
        c.handle(&mut project, PointerEvent::Move { x: 400.0, y: 300.0 }).unwrap();
        assert_eq!(c.playhead(), 6.0);
        c.handle(&mut project, PointerEvent::Move { x: 10.0, y: 10.0 }).unwrap();
        assert_eq!(c.playhead(), 0.0);
        c.handle(&mut project, PointerEvent::Up { x: 10.0, y: 10.0 }).unwrap();
        assert_eq!(c.state(), InteractionState::Idle);
    }

    #[test]
    fn test_drag_moves_live_and_clamps() {
        let (mut project, mut c, a, _) = setup();
        c.handle(&mut project, PointerEvent::Down { x: 250.0, y: 30.0 }).unwrap();
        assert!(matches!(c.state(), InteractionState::DraggingClip { clip, original_start, .. } if clip == a && original_start == 2.0));

        // +25px = +0.5s, applied immediately.
        c.handle(&mut project, PointerEvent::Move { x: 275.0, y: 30.0 }).unwrap();
        assert_eq!(project.clip(a).unwrap().start, 2.5);

        // -500px would put the start at -8s.
        let moved = c.handle(&mut project, PointerEvent::Move { x: -250.0, y: 30.0 }).unwrap();
        assert_eq!(moved, Interaction::ClipMoved { clip: a, start: 0.0 });
        assert_eq!(project.clip(a).unwrap().start, 0.0);

        assert_eq!(
            c.handle(&mut project, PointerEvent::Up { x: -250.0, y: 30.0 }).unwrap(),
            Interaction::DragEnded(a)
        );
        assert_eq!(project.clip(a).unwrap().start, 0.0);
        assert_eq!(c.state(), InteractionState::Idle);
    }

    #[test]
    fn test_drop_onto_occupied_range_reverts() {
        let (mut project, mut c, a, _) = setup();
        c.handle(&mut project, PointerEvent::Down { x: 250.0, y: 30.0 }).unwrap();
        // +5s puts [7, 11) over the clip at [8, 10); tolerated while dragging.
        c.handle(&mut project, PointerEvent::Move { x: 500.0, y: 30.0 }).unwrap();
        assert_eq!(project.clip(a).unwrap().start, 7.0);

        let err = c.handle(&mut project, PointerEvent::Up { x: 500.0, y: 30.0 }).unwrap_err();
        assert!(matches!(err, TimelineError::Conflict { clip, .. } if clip == a));
        assert_eq!(project.clip(a).unwrap().start, 2.0);
        assert_eq!(c.state(), InteractionState::Idle);
    }

    #[test]
    fn test_razor_splits_without_dragging() {
        let (mut project, mut c, a, _) = setup();
        c.set_tool(&mut project, Tool::Razor).unwrap();
        // x = 300 is t = 4.0, two seconds into the clip at [2, 6).
        let result = c.handle(&mut project, PointerEvent::Down { x: 300.0, y: 30.0 }).unwrap();
        let Interaction::ClipSplit { left, right } = result else {
            panic!("expected split, got {result:?}");
        };
        assert_eq!(left, a);
        assert_eq!(c.state(), InteractionState::Idle);
        assert_eq!(project.clip(a).unwrap().end(), 4.0);
        assert_eq!(project.clip(right).unwrap().start, 4.0);
        assert_eq!(project.clip(right).unwrap().end(), 6.0);

        // Moving afterwards does nothing.
        assert_eq!(
            c.handle(&mut project, PointerEvent::Move { x: 400.0, y: 30.0 }).unwrap(),
            Interaction::Ignored
        );
    }

    #[test]
    fn test_razor_on_clip_edge_fails_cleanly() {
        let (mut project, mut c, _, _) = setup();
        c.set_tool(&mut project, Tool::Razor).unwrap();
        let before = project.clone();
        // x = 200 is exactly the start of the clip at [2, 6).
        let err = c.handle(&mut project, PointerEvent::Down { x: 200.0, y: 30.0 }).unwrap_err();
        assert!(matches!(err, TimelineError::Range { .. }));
        assert_eq!(project, before);
        assert_eq!(c.state(), InteractionState::Idle);
    }

    #[test]
    fn test_drag_of_deleted_clip_resets() {
        let (mut project, mut c, a, _) = setup();
        c.handle(&mut project, PointerEvent::Down { x: 250.0, y: 30.0 }).unwrap();
        project.delete_clip(a).unwrap();
        let err = c.handle(&mut project, PointerEvent::Move { x: 260.0, y: 30.0 }).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(c.state(), InteractionState::Idle);
    }

    #[test]
    fn test_cancel_restores_start() {
        let (mut project, mut c, a, _) = setup();
        c.handle(&mut project, PointerEvent::Down { x: 250.0, y: 30.0 }).unwrap();
        c.handle(&mut project, PointerEvent::Move { x: 350.0, y: 30.0 }).unwrap();
        assert_eq!(project.clip(a).unwrap().start, 4.0);
        c.cancel(&mut project).unwrap();
        assert_eq!(project.clip(a).unwrap().start, 2.0);
        assert_eq!(c.state(), InteractionState::Idle);
    }

    #[test]
    fn test_tool_switch_mid_drag_reverts_overlapping_drop() {
        let (mut project, mut c, a, _) = setup();
        c.handle(&mut project, PointerEvent::Down { x: 250.0, y: 30.0 }).unwrap();
        c.handle(&mut project, PointerEvent::Move { x: 500.0, y: 30.0 }).unwrap();
        assert_eq!(project.clip(a).unwrap().start, 7.0);

        let err = c.set_tool(&mut project, Tool::Razor).unwrap_err();
        assert!(matches!(err, TimelineError::Conflict { clip, .. } if clip == a));
        assert_eq!(c.tool, Tool::Razor);
        assert_eq!(c.state(), InteractionState::Idle);
        assert_eq!(project.clip(a).unwrap().start, 2.0);
        assert!(project.validate().is_ok());
    }

    #[test]
    fn test_tool_switch_mid_drag_keeps_free_drop() {
        let (mut project, mut c, a, _) = setup();
        c.handle(&mut project, PointerEvent::Down { x: 250.0, y: 30.0 }).unwrap();
        c.handle(&mut project, PointerEvent::Move { x: 200.0, y: 30.0 }).unwrap();
        assert_eq!(
            c.set_tool(&mut project, Tool::Razor).unwrap(),
            Interaction::DragEnded(a)
        );
        assert_eq!(project.clip(a).unwrap().start, 1.0);
    }

    #[test]
    fn test_second_press_mid_drag_settles_previous_drop() {
        let (mut project, mut c, a, _) = setup();
        c.handle(&mut project, PointerEvent::Down { x: 250.0, y: 30.0 }).unwrap();
        c.handle(&mut project, PointerEvent::Move { x: 500.0, y: 30.0 }).unwrap();

        // The release was lost; the next press lands on the ruler.
        assert_eq!(
            c.handle(&mut project, PointerEvent::Down { x: 150.0, y: 5.0 }).unwrap(),
            Interaction::Scrubbed(1.0)
        );
        assert_eq!(c.state(), InteractionState::ScrubbingPlayhead);
        assert_eq!(project.clip(a).unwrap().start, 2.0);
        assert!(project.validate().is_ok());
    }
}
