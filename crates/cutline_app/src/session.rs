// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor session.
//!
//! Owns the shared project and everything that drives it: the pointer
//! controller, the preview clock and the export path. The project sits
//! behind a single-writer lock. While an export runs, the session refuses
//! edits and playback, and the export holds a read lock for its whole run.
//!
//! The exporting flag is only raised under the project write lock, and every
//! mutating path re-checks it under the project lock. Locks are taken in the
//! order controller, project, preview.

use crate::assets::AssetLoader;
use crate::config::AppConfig;
use crate::project_file::ProjectDocument;
use cutline_render::{
    Compositor, ExportError, ExportSequencer, ExportSummary, FrameSink, MemoryAssetStore, Preview,
    RenderError, Surface,
};
use cutline_timeline::{
    CommandOutcome, Interaction, InteractionController, PlaybackState, PointerEvent, Project,
    TimelineCommand, TimelineError, Tool,
};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Session errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The project is locked by a running export
    #[error("An export is in progress")]
    ExportInProgress,
    /// A timeline edit was rejected
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    /// A frame failed to render
    #[error(transparent)]
    Render(#[from] RenderError),
    /// The export failed
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Clears the exporting flag when an export ends, however it ends
struct ExportGuard<'a>(&'a AtomicBool);

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A loaded project with its editing and playback state
pub struct EditorSession {
    project: Arc<RwLock<Project>>,
    assets: MemoryAssetStore,
    compositor: Compositor,
    controller: Mutex<InteractionController>,
    preview: Mutex<Preview>,
    exporting: AtomicBool,
    cancel: Arc<AtomicBool>,
}

impl EditorSession {
    /// Create a session
    pub fn new(project: Project, assets: MemoryAssetStore, config: &AppConfig) -> Self {
        Self {
            project: Arc::new(RwLock::new(project)),
            assets,
            compositor: Compositor::with_config(config.compositor.clone()),
            controller: Mutex::new(InteractionController::new(config.view)),
            preview: Mutex::new(Preview::new()),
            exporting: AtomicBool::new(false),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a session from a project document, loading its assets
    /// relative to `base_dir`
    pub fn from_document(document: ProjectDocument, base_dir: &Path, config: &AppConfig) -> Self {
        let assets = AssetLoader::new(base_dir).load_all(&document.assets);
        Self::new(document.project, assets, config)
    }

    /// Replace the compositor, e.g. to use a custom text rasterizer
    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = compositor;
        self
    }

    /// Read access to the project
    pub fn project(&self) -> RwLockReadGuard<'_, Project> {
        self.project.read()
    }

    /// Shared handle to the project
    pub fn shared_project(&self) -> Arc<RwLock<Project>> {
        self.project.clone()
    }

    /// Loaded assets
    pub fn assets(&self) -> &MemoryAssetStore {
        &self.assets
    }

    /// Whether an export is running
    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::Acquire)
    }

    /// Flag that cancels a running export when set
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Cheap pre-check; callers re-check once they hold the project lock
    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.is_exporting() {
            return Err(SessionError::ExportInProgress);
        }
        Ok(())
    }

    /// Apply a timeline command
    pub fn apply(&self, command: TimelineCommand) -> Result<CommandOutcome, SessionError> {
        self.ensure_idle()?;
        let mut project = self.project.write();
        self.ensure_idle()?;
        Ok(project.apply(command)?)
    }

    /// Feed a pointer event to the timeline controller.
    ///
    /// Scrubbing moves the preview clock along with the playhead.
    pub fn handle_pointer(&self, event: PointerEvent, now: Instant) -> Result<Interaction, SessionError> {
        self.ensure_idle()?;
        let interaction = {
            let mut controller = self.controller.lock();
            let mut project = self.project.write();
            self.ensure_idle()?;
            controller.handle(&mut project, event)?
        };
        if let Interaction::Scrubbed(time) = interaction {
            self.preview.lock().clock_mut().seek(time, now);
        }
        Ok(interaction)
    }

    /// Switch the active tool, settling any clip drag in progress
    pub fn set_tool(&self, tool: Tool) -> Result<Interaction, SessionError> {
        self.ensure_idle()?;
        let mut controller = self.controller.lock();
        let mut project = self.project.write();
        self.ensure_idle()?;
        Ok(controller.set_tool(&mut project, tool)?)
    }

    /// Playhead position
    pub fn playhead(&self) -> f64 {
        self.preview.lock().clock().time()
    }

    /// Playback state
    pub fn playback_state(&self) -> PlaybackState {
        self.preview.lock().clock().state()
    }

    /// Toggle play/pause
    pub fn toggle_playback(&self, now: Instant) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let project = self.project.read();
        self.ensure_idle()?;
        self.preview.lock().clock_mut().toggle(now, project.duration);
        Ok(())
    }

    /// Advance playback to `now` and render the current frame
    pub fn tick(&self, now: Instant) -> Result<Surface, SessionError> {
        self.ensure_idle()?;
        let (surface, time) = {
            let project = self.project.read();
            self.ensure_idle()?;
            let mut preview = self.preview.lock();
            let surface = preview.tick(now, &self.compositor, &project, &self.assets)?;
            (surface, preview.clock().time())
        };
        self.controller.lock().set_playhead(time);
        Ok(surface)
    }

    /// Render a single frame
    pub fn render_at(&self, time: f64) -> Result<Surface, SessionError> {
        let project = self.project.read();
        Ok(self.compositor.render_frame(&project, &self.assets, time)?)
    }

    /// Export the whole project into `sink`.
    ///
    /// Abandons any clip drag, stops playback and rewinds to zero first.
    /// Edits and playback are refused until the export returns.
    pub fn export(&self, sink: &mut dyn FrameSink) -> Result<ExportSummary, SessionError> {
        self.ensure_idle()?;
        let _guard = {
            let mut controller = self.controller.lock();
            let mut project = self.project.write();
            if self
                .exporting
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return Err(SessionError::ExportInProgress);
            }
            let guard = ExportGuard(&self.exporting);
            self.cancel.store(false, Ordering::Release);
            controller.cancel(&mut project)?;
            controller.set_playhead(0.0);
            self.preview.lock().clock_mut().stop();
            guard
        };

        let project = self.project.read();
        let summary = ExportSequencer::new(&self.compositor)
            .with_cancel_flag(self.cancel.clone())
            .export(&project, &self.assets, sink)?;
        Ok(summary)
    }
}
