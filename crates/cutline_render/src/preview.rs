// SPDX-License-Identifier: MIT OR Apache-2.0
//! Real-time preview.
//!
//! The preview loop is export with a wall clock in place of the frame
//! counter: an external scheduler calls [`Preview::tick`] with a monotonic
//! timestamp, and the clock decides which time to render.

use crate::asset::AssetResolver;
use crate::compositor::Compositor;
use crate::error::RenderError;
use crate::surface::Surface;
use cutline_timeline::{PlaybackClock, Project};
use std::time::Instant;

/// Preview driver
#[derive(Debug, Default)]
pub struct Preview {
    clock: PlaybackClock,
}

impl Preview {
    /// Create a stopped preview at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// The playback clock
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    /// Mutable playback clock, for play/pause/seek
    pub fn clock_mut(&mut self) -> &mut PlaybackClock {
        &mut self.clock
    }

    /// Advance the clock to `now` and render the frame it lands on
    pub fn tick(
        &mut self,
        now: Instant,
        compositor: &Compositor,
        project: &Project,
        assets: &dyn AssetResolver,
    ) -> Result<Surface, RenderError> {
        let time = self.clock.tick(now, project.duration);
        compositor.render_frame(project, assets, time)
    }
}
