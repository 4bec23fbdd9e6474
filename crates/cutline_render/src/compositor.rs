// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame compositor.
//!
//! Tracks draw bottom to top. Each visual track contributes at most its
//! active clip, resolved at the query time with all keyframes applied.
//!
//! Output is bit-reproducible for still and text content. Video content is
//! reproducible only up to the source's seek tolerance: a frame within
//! `seek_tolerance` of the buffered position is taken without reseeking.
//!
//! Adjustment clips are a flat tinted overlay over everything drawn so
//! far, not a filter over the backdrop.

use crate::asset::{AssetKind, AssetResolver};
use crate::color::ColorGrade;
use crate::config::CompositorConfig;
use crate::error::RenderError;
use crate::surface::{layer_transform, Surface};
use crate::text::TextRasterizer;
use cutline_timeline::{AssetId, Clip, ClipContent, Project, Track};
use image::RgbaImage;
use std::sync::Arc;

/// Renders project frames
#[derive(Default)]
pub struct Compositor {
    config: CompositorConfig,
    text: TextRasterizer,
}

impl Compositor {
    /// Create a compositor with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compositor with explicit settings
    pub fn with_config(config: CompositorConfig) -> Self {
        Self {
            config,
            text: TextRasterizer::new(),
        }
    }

    /// Replace the text rasterizer
    pub fn with_text_rasterizer(mut self, text: TextRasterizer) -> Self {
        self.text = text;
        self
    }

    /// Current settings
    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }

    /// Tracks that draw in this project, bottom to top
    pub fn visible_tracks<'a>(&self, project: &'a Project) -> impl Iterator<Item = &'a Track> {
        let solo = project.solo_track().map(|track| track.id);
        project.tracks().filter(move |track| {
            track.kind.is_visual()
                && match solo {
                    Some(id) => track.id == id,
                    None => !track.muted,
                }
        })
    }

    /// Render the frame at `time`
    pub fn render_frame(
        &self,
        project: &Project,
        assets: &dyn AssetResolver,
        time: f64,
    ) -> Result<Surface, RenderError> {
        if !time.is_finite() || time < 0.0 {
            return Err(RenderError::InvalidTime(time));
        }
        project.validate_settings()?;

        let mut surface = Surface::new(project.width, project.height, self.config.background);
        for track in self.visible_tracks(project) {
            if let Some(clip) = track.active_clip(time) {
                self.draw_clip(&mut surface, clip, assets, time);
            }
        }
        Ok(surface)
    }

    fn draw_clip(&self, surface: &mut Surface, clip: &Clip, assets: &dyn AssetResolver, time: f64) {
        let props = clip.resolve(time);
        let opacity = props.alpha();

        match &clip.content {
            ClipContent::Adjustment { tint } => {
                surface.fill_tint(
                    *tint,
                    opacity * self.config.adjustment_alpha,
                    self.config.adjustment_blend,
                );
            }
            ClipContent::Video { asset } | ClipContent::Image { asset } => {
                let Some(frame) = self.sample_asset(clip, asset, assets, time) else {
                    return;
                };
                let grade = ColorGrade::from_properties(&props);
                let transform =
                    layer_transform(&props, surface.width(), surface.height(), frame.width(), frame.height());
                surface.draw_layer(&frame, transform, opacity, grade.as_ref());
            }
            ClipContent::Text(style) => {
                let Some(image) = self.text.rasterize(style) else {
                    return;
                };
                let transform =
                    layer_transform(&props, surface.width(), surface.height(), image.width(), image.height());
                surface.draw_layer(&image, transform, opacity, None);
            }
        }
    }

    /// Pull the frame for `clip` at timeline `time`, or `None` to skip the clip
    fn sample_asset(
        &self,
        clip: &Clip,
        asset_id: &AssetId,
        assets: &dyn AssetResolver,
        time: f64,
    ) -> Option<Arc<RgbaImage>> {
        let Some(asset) = assets.resolve(asset_id) else {
            tracing::warn!(clip = %clip.id, asset = %asset_id, "Asset unavailable, skipping clip");
            return None;
        };
        let source = asset.source;
        let source_time = clip.source_time(time);

        if asset.kind == AssetKind::Video {
            let past_end = asset
                .duration_hint
                .or_else(|| source.native_duration())
                .is_some_and(|duration| source_time >= duration);
            if source_time < 0.0 || past_end {
                tracing::debug!(clip = %clip.id, source_time, "Source time outside asset");
                return None;
            }

            let drift = source
                .buffered_time()
                .map_or(f64::INFINITY, |buffered| (buffered - source_time).abs());
            if drift > self.config.seek_tolerance {
                tracing::debug!(clip = %clip.id, source_time, drift, "Seeking source");
                source.request_seek(source_time);
            }
        }

        if !source.is_ready(source_time) {
            tracing::debug!(clip = %clip.id, source_time, "Source not ready, skipping clip");
            return None;
        }
        source.sample(source_time)
    }
}
