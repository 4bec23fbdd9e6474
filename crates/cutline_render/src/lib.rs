// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame compositing and export for Cutline timelines.
//!
//! - [`Compositor`] turns a [`cutline_timeline::Project`] and a query time
//!   into a [`Surface`]
//! - [`ExportSequencer`] drives the compositor frame by frame into a
//!   [`FrameSink`]
//! - [`Preview`] drives it from a wall clock
//!
//! Media is reached only through [`AssetResolver`] and [`PixelSource`].

pub mod asset;
pub mod color;
pub mod compositor;
pub mod config;
pub mod error;
pub mod export;
pub mod preview;
pub mod surface;
pub mod text;

pub use asset::{
    Asset, AssetKind, AssetResolver, FrameSequence, MemoryAssetStore, NoAssets, PixelSource,
    SeekMode, StillImage,
};
pub use color::{BlendMode, ColorGrade};
pub use compositor::Compositor;
pub use config::CompositorConfig;
pub use error::{ExportError, RenderError, SinkError};
pub use export::{frame_count, frame_time, ExportFrame, ExportSequencer, ExportSummary, FrameSink, MemorySink};
pub use preview::Preview;
pub use surface::Surface;
pub use text::TextRasterizer;
