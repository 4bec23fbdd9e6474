// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render and export error types

use cutline_timeline::TimelineError;

/// Hard failures of a single frame render.
///
/// Missing or unready assets are not errors; those clips are skipped.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Query time is negative or not finite
    #[error("Invalid query time: {0}")]
    InvalidTime(f64),
    /// Project settings cannot produce a frame
    #[error("Invalid project: {0}")]
    InvalidProject(#[from] TimelineError),
}

/// Errors raised by a frame sink
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Image encoding error
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    /// The sink refused the frame
    #[error("Frame rejected: {0}")]
    Rejected(String),
}

/// Errors that abort an export run
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Project settings cannot be exported
    #[error("Invalid project: {0}")]
    InvalidProject(#[from] TimelineError),
    /// A frame failed to render
    #[error("Frame {frame} failed to render: {source}")]
    Render {
        /// Index of the failing frame
        frame: u64,
        /// Underlying error
        source: RenderError,
    },
    /// The sink failed to consume a frame
    #[error("Sink failed at frame {frame}: {source}")]
    Sink {
        /// Index of the failing frame
        frame: u64,
        /// Underlying error
        source: SinkError,
    },
    /// The sink failed to finish
    #[error("Sink failed to finish: {0}")]
    Finish(SinkError),
}
