use crate::{
    background::{descriptor::TextureId, source::BackgroundPixels},
    effects::{composite::CompositeParams, state_update::StateUpdateParams},
    foundation::{
        core::{FrameSize, MaskPlane, VideoFrame},
        error::{MatteError, MatteResult},
    },
    segmentation::SegmentationMasks,
};

/// Executor of the two matting passes and owner of their long-lived resources: the ping-pong
/// mask targets and the resident background textures.
///
/// Calls on one backend must be serialized; call N's state-update write target is call N+1's
/// history.
pub trait MatteBackend: Send {
    fn name(&self) -> &'static str;

    /// Make sure both mask targets are `size`. Returns `true` when they were (re)allocated,
    /// which clears history to all-background.
    fn ensure_targets(&mut self, size: FrameSize) -> MatteResult<bool>;

    fn upload_background(&mut self, pixels: &BackgroundPixels) -> MatteResult<TextureId>;

    /// Overwrite a resident texture in place with a frame of the same size.
    fn refresh_background(
        &mut self,
        texture: TextureId,
        pixels: &BackgroundPixels,
    ) -> MatteResult<()>;

    fn release_background(&mut self, texture: TextureId);

    /// Write the next smoothed mask from `masks` and the current one, then swap roles.
    /// Roles are left untouched on error.
    fn exec_state_update(
        &mut self,
        params: &StateUpdateParams,
        masks: &SegmentationMasks,
    ) -> MatteResult<()>;

    fn exec_composite(
        &mut self,
        params: &CompositeParams,
        frame: &VideoFrame,
        background: TextureId,
    ) -> MatteResult<VideoFrame>;

    /// Forward a frame without sampling any mask or background.
    fn exec_passthrough(&mut self, frame: VideoFrame) -> MatteResult<VideoFrame>;

    /// Copy of the current smoothed mask, `None` before targets exist.
    fn mask_snapshot(&mut self) -> MatteResult<Option<MaskPlane>>;

    /// Drop every resource. The backend may be reused; the next call allocates again.
    fn release(&mut self);

    fn stats(&self) -> BackendStats;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackendStats {
    pub target_allocations: u64,
    pub background_uploads: u64,
    pub background_refreshes: u64,
    pub background_releases: u64,
    pub state_updates: u64,
    pub composites: u64,
    pub passthroughs: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Cpu,
    #[cfg(feature = "gpu")]
    Gpu,
}

impl std::str::FromStr for BackendKind {
    type Err = MatteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            #[cfg(feature = "gpu")]
            "gpu" => Ok(Self::Gpu),
            other => Err(MatteError::validation(format!(
                "unknown backend '{other}' (available: {})",
                available_backends().join(", ")
            ))),
        }
    }
}

pub fn available_backends() -> &'static [&'static str] {
    #[cfg(feature = "gpu")]
    {
        &["cpu", "gpu"]
    }
    #[cfg(not(feature = "gpu"))]
    {
        &["cpu"]
    }
}

/// The GPU backend defers device creation to the first pass, so construction never fails on
/// machines without an adapter; the first render does.
pub fn create_backend(kind: BackendKind) -> MatteResult<Box<dyn MatteBackend>> {
    match kind {
        BackendKind::Cpu => Ok(Box::new(crate::render::cpu::CpuBackend::new())),
        #[cfg(feature = "gpu")]
        BackendKind::Gpu => Ok(Box::new(crate::render::gpu::WgpuBackend::new())),
    }
}
