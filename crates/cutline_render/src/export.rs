// SPDX-License-Identifier: MIT OR Apache-2.0
//! Export sequencing.
//!
//! Frames are rendered strictly in order at `t_i = i / fps`, each handed to
//! the sink before the next is rendered. The end is exclusive: a 2 s project
//! at 30 fps yields frames 0..60.

use crate::asset::AssetResolver;
use crate::compositor::Compositor;
use crate::error::{ExportError, SinkError};
use crate::surface::Surface;
use cutline_timeline::Project;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One rendered output frame
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFrame {
    /// Zero-based frame index
    pub index: u64,
    /// Timeline time of the frame
    pub time: f64,
    /// Composited pixels
    pub surface: Surface,
}

/// Destination for exported frames, in presentation order
pub trait FrameSink {
    /// Take the next frame
    fn consume(&mut self, frame: ExportFrame) -> Result<(), SinkError>;

    /// Called once after the last frame, including after a cancel
    fn finish(&mut self) -> Result<(), SinkError>;
}

/// Number of frames exported for `duration` seconds at `fps`
pub fn frame_count(duration: f64, fps: f64) -> u64 {
    if !(duration.is_finite() && fps.is_finite()) || duration <= 0.0 || fps <= 0.0 {
        return 0;
    }
    (duration * fps - 1e-9).ceil().max(0.0) as u64
}

/// Timeline time of frame `index`
pub fn frame_time(index: u64, fps: f64) -> f64 {
    index as f64 / fps
}

/// Result of an export run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportSummary {
    /// Frames delivered to the sink
    pub frames: u64,
    /// Frames the full run would have delivered
    pub total_frames: u64,
    /// Whether the run stopped on the cancel flag
    pub cancelled: bool,
}

/// Drives the compositor once per output frame
pub struct ExportSequencer<'a> {
    compositor: &'a Compositor,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> ExportSequencer<'a> {
    /// Create a sequencer over a compositor
    pub fn new(compositor: &'a Compositor) -> Self {
        Self {
            compositor,
            cancel: None,
        }
    }

    /// Stop before the next frame once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    /// Render every frame of `project` into `sink`.
    ///
    /// A render or sink failure aborts the run without calling
    /// [`FrameSink::finish`].
    pub fn export(
        &self,
        project: &Project,
        assets: &dyn AssetResolver,
        sink: &mut dyn FrameSink,
    ) -> Result<ExportSummary, ExportError> {
        project.validate_settings()?;
        let total_frames = frame_count(project.duration, project.fps);
        tracing::info!(
            project = %project.name,
            frames = total_frames,
            fps = project.fps,
            "Starting export"
        );

        let mut summary = ExportSummary {
            frames: 0,
            total_frames,
            cancelled: false,
        };
        for index in 0..total_frames {
            if self.is_cancelled() {
                tracing::info!(frame = index, "Export cancelled");
                summary.cancelled = true;
                break;
            }

            let time = frame_time(index, project.fps);
            let surface = self
                .compositor
                .render_frame(project, assets, time)
                .map_err(|source| ExportError::Render { frame: index, source })?;
            sink.consume(ExportFrame { index, time, surface })
                .map_err(|source| ExportError::Sink { frame: index, source })?;
            tracing::debug!(frame = index, time, "Exported frame");
            summary.frames += 1;
        }

        sink.finish().map_err(ExportError::Finish)?;
        tracing::info!(frames = summary.frames, cancelled = summary.cancelled, "Export finished");
        Ok(summary)
    }
}

/// Sink that keeps every frame in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Frames received so far
    pub frames: Vec<ExportFrame>,
    /// Whether `finish` was called
    pub finished: bool,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Times of the received frames
    pub fn times(&self) -> Vec<f64> {
        self.frames.iter().map(|frame| frame.time).collect()
    }
}

impl FrameSink for MemorySink {
    fn consume(&mut self, frame: ExportFrame) -> Result<(), SinkError> {
        if self.finished {
            return Err(SinkError::Rejected("sink already finished".to_string()));
        }
        self.frames.push(frame);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.finished = true;
        Ok(())
    }
}
