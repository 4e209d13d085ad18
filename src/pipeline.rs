use std::sync::Arc;

use crate::{
    background::{
        descriptor::BackgroundRequest,
        manager::{BackgroundManager, BackgroundReport, BackgroundStats},
        source::BackgroundLoader,
    },
    config::{DEFAULT_BACKGROUND, EffectConfig},
    effects::{composite::CompositeParams, state_update::StateUpdateParams},
    foundation::{
        core::{MaskPlane, Rgba8, VideoFrame},
        error::{MatteError, MatteResult},
    },
    render::backend::{BackendStats, MatteBackend},
    segmentation::SegmentationMasks,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing rendered yet, no resources allocated.
    Uninitialized,
    Passthrough,
    Effecting,
    /// Released. Renders return the input frame, or an error if a fatal failure closed it.
    Closed,
}

/// Per-track matting pipeline: temporal mask state, compositing, and the active background.
///
/// Not `Sync`; calls must be serialized. Independent pipelines share nothing.
pub struct MattePipeline {
    backend: Box<dyn MatteBackend>,
    config: EffectConfig,
    backgrounds: BackgroundManager,
    state: PipelineState,
    failure: Option<String>,
}

impl MattePipeline {
    pub fn new(
        backend: Box<dyn MatteBackend>,
        loader: Arc<dyn BackgroundLoader>,
        config: EffectConfig,
    ) -> MatteResult<Self> {
        Self::with_default_background(backend, loader, config, DEFAULT_BACKGROUND)
    }

    /// Like [`MattePipeline::new`], with the colour used when no background is set or a
    /// background fails to load.
    pub fn with_default_background(
        backend: Box<dyn MatteBackend>,
        loader: Arc<dyn BackgroundLoader>,
        config: EffectConfig,
        default_background: Rgba8,
    ) -> MatteResult<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            config,
            backgrounds: BackgroundManager::new(loader, default_background),
            state: PipelineState::Uninitialized,
            failure: None,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Replace the configuration; the next render picks it up.
    pub fn update_config(&mut self, config: EffectConfig) -> MatteResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Ask for a new background without blocking. The current one stays in use until the new
    /// one is ready. Returns whether a load was started.
    pub fn request_background(&mut self, request: BackgroundRequest) -> MatteResult<bool> {
        if self.state == PipelineState::Closed {
            return Ok(false);
        }
        self.backgrounds.request(request)
    }

    /// Load and activate a background on the calling thread.
    pub fn set_background(&mut self, request: &BackgroundRequest) -> MatteResult<()> {
        if self.state == PipelineState::Closed {
            return Err(self.closed_error());
        }
        let resolved = self
            .backgrounds
            .resolve(request, self.backend.as_mut())
            .map(|_| ());
        resolved.map_err(|e| self.fail(e))
    }

    pub fn background_reports(&mut self) -> Vec<BackgroundReport> {
        self.backgrounds.drain_reports()
    }

    pub fn background_stats(&self) -> BackgroundStats {
        self.backgrounds.stats()
    }

    pub fn backend_stats(&self) -> BackendStats {
        self.backend.stats()
    }

    /// Current smoothed mask, `None` before the first effected frame or after close.
    pub fn mask_snapshot(&mut self) -> MatteResult<Option<MaskPlane>> {
        if self.state == PipelineState::Closed {
            return Ok(None);
        }
        self.backend.mask_snapshot()
    }

    /// Composite one frame.
    ///
    /// Without masks, or with effects disabled, the frame is forwarded untouched. A fatal
    /// backend error closes the pipeline and is returned here and on every later call.
    #[tracing::instrument(
        skip_all,
        fields(width = frame.width(), height = frame.height(), masked = masks.is_some())
    )]
    pub fn render(
        &mut self,
        frame: VideoFrame,
        masks: Option<&SegmentationMasks>,
    ) -> MatteResult<VideoFrame> {
        if self.state == PipelineState::Closed {
            if self.failure.is_some() {
                return Err(self.closed_error());
            }
            return Ok(frame);
        }
        if frame.size().is_empty() {
            return Ok(frame);
        }

        let config = self.config;
        let Some(masks) = masks.filter(|_| config.enabled) else {
            self.transition(PipelineState::Passthrough);
            return self.passthrough(frame);
        };

        self.transition(PipelineState::Effecting);
        match self.effect(&config, &frame, masks) {
            Ok(out) => Ok(out),
            Err(e) if e.is_fatal() => Err(self.fail(e)),
            Err(e) => {
                tracing::warn!("effect skipped for this frame: {e}");
                self.passthrough(frame)
            }
        }
    }

    /// Release everything. Idempotent; in-flight background loads are discarded.
    pub fn close(&mut self) {
        if self.state == PipelineState::Closed {
            return;
        }
        self.backgrounds.shutdown();
        self.backend.release();
        self.transition(PipelineState::Closed);
    }

    fn effect(
        &mut self,
        config: &EffectConfig,
        frame: &VideoFrame,
        masks: &SegmentationMasks,
    ) -> MatteResult<VideoFrame> {
        let backend = self.backend.as_mut();
        if backend.ensure_targets(frame.size())? {
            tracing::debug!("mask history reset");
        }

        self.backgrounds.apply_ready(backend)?;
        if let Err(e) = self.backgrounds.refresh_streaming(backend) {
            if e.is_fatal() {
                return Err(e);
            }
            tracing::warn!("video background refresh failed: {e}");
        }
        let background = self.backgrounds.ensure_default(backend)?.texture();

        let update = StateUpdateParams::from_config(config, masks.polarity());
        backend.exec_state_update(&update, masks)?;
        backend.exec_composite(&CompositeParams::from_config(config), frame, background)
    }

    fn passthrough(&mut self, frame: VideoFrame) -> MatteResult<VideoFrame> {
        match self.backend.exec_passthrough(frame) {
            Err(e) if e.is_fatal() => Err(self.fail(e)),
            other => other,
        }
    }

    fn transition(&mut self, next: PipelineState) {
        if self.state != next {
            tracing::debug!(from = ?self.state, to = ?next, "pipeline state");
            self.state = next;
        }
    }

    fn fail(&mut self, err: MatteError) -> MatteError {
        tracing::error!("closing pipeline after fatal error: {err}");
        self.failure = Some(err.to_string());
        self.close();
        err
    }

    fn closed_error(&self) -> MatteError {
        match &self.failure {
            Some(reason) => MatteError::resource(format!("pipeline failed: {reason}")),
            None => MatteError::resource("pipeline is closed"),
        }
    }
}

impl Drop for MattePipeline {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for MattePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MattePipeline")
            .field("backend", &self.backend.name())
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
