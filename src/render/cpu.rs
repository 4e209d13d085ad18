use std::collections::HashMap;

use crate::{
    background::{descriptor::TextureId, source::BackgroundPixels},
    effects::{
        composite::{self, CompositeParams},
        state_update::{self, StateUpdateParams},
    },
    foundation::{
        core::{FrameSize, MaskPlane, VideoFrame},
        error::{MatteError, MatteResult},
    },
    render::{
        backend::{BackendStats, MatteBackend},
        ping_pong::PingPong,
    },
    segmentation::SegmentationMasks,
};

/// Reference backend: both passes run on the CPU, row-parallel.
#[derive(Debug, Default)]
pub struct CpuBackend {
    targets: Option<PingPong<MaskPlane>>,
    backgrounds: HashMap<TextureId, BackgroundPixels>,
    next_texture: u64,
    stats: BackendStats,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn background(&self, texture: TextureId) -> MatteResult<&BackgroundPixels> {
        self.backgrounds.get(&texture).ok_or_else(|| {
            MatteError::resource(format!(
                "background texture {} is not resident",
                texture.as_u64()
            ))
        })
    }
}

impl MatteBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn ensure_targets(&mut self, size: FrameSize) -> MatteResult<bool> {
        if let Some(targets) = &self.targets
            && targets.read().size() == size
        {
            return Ok(false);
        }
        self.targets = Some(PingPong::new(
            MaskPlane::filled(size, 0.0),
            MaskPlane::filled(size, 0.0),
        ));
        self.stats.target_allocations += 1;
        tracing::debug!(
            width = size.width,
            height = size.height,
            "allocated cpu mask targets"
        );
        Ok(true)
    }

    fn upload_background(&mut self, pixels: &BackgroundPixels) -> MatteResult<TextureId> {
        self.next_texture += 1;
        let id = TextureId(self.next_texture);
        self.backgrounds.insert(id, pixels.clone());
        self.stats.background_uploads += 1;
        Ok(id)
    }

    fn refresh_background(
        &mut self,
        texture: TextureId,
        pixels: &BackgroundPixels,
    ) -> MatteResult<()> {
        let slot = self.backgrounds.get_mut(&texture).ok_or_else(|| {
            MatteError::resource(format!(
                "background texture {} is not resident",
                texture.as_u64()
            ))
        })?;
        if slot.size() != pixels.size() {
            return Err(MatteError::asset(
                "streaming background changed size mid-stream",
            ));
        }
        *slot = pixels.clone();
        self.stats.background_refreshes += 1;
        Ok(())
    }

    fn release_background(&mut self, texture: TextureId) {
        if self.backgrounds.remove(&texture).is_some() {
            self.stats.background_releases += 1;
        }
    }

    fn exec_state_update(
        &mut self,
        params: &StateUpdateParams,
        masks: &SegmentationMasks,
    ) -> MatteResult<()> {
        let targets = self
            .targets
            .as_mut()
            .ok_or_else(|| MatteError::input("mask targets are not allocated"))?;
        let (previous, next) = targets.split();
        state_update::run(params, masks, previous, next)?;
        targets.swap();
        self.stats.state_updates += 1;
        Ok(())
    }

    fn exec_composite(
        &mut self,
        params: &CompositeParams,
        frame: &VideoFrame,
        background: TextureId,
    ) -> MatteResult<VideoFrame> {
        let mask = self
            .targets
            .as_ref()
            .map(PingPong::read)
            .ok_or_else(|| MatteError::input("mask targets are not allocated"))?;
        let out = composite::run(params, frame, mask, self.background(background)?)?;
        self.stats.composites += 1;
        Ok(out)
    }

    fn exec_passthrough(&mut self, frame: VideoFrame) -> MatteResult<VideoFrame> {
        self.stats.passthroughs += 1;
        Ok(frame)
    }

    fn mask_snapshot(&mut self) -> MatteResult<Option<MaskPlane>> {
        Ok(self.targets.as_ref().map(|t| t.read().clone()))
    }

    fn release(&mut self) {
        self.targets = None;
        self.stats.background_releases += self.backgrounds.len() as u64;
        self.backgrounds.clear();
    }

    fn stats(&self) -> BackendStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
