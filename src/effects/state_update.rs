//! Temporal mask filter.
//!
//! Turns one noisy category/confidence pair into the next smoothed mask, reading the previous
//! smoothed mask as history. The WGSL pass in `render::shaders` implements the same math; this
//! module is the reference used by the CPU backend and by tests.

use rayon::prelude::*;

use crate::{
    config::{EffectConfig, StickinessConfig},
    effects::mask_blur_3x3,
    foundation::{
        core::MaskPlane,
        error::{MatteError, MatteResult},
        math::{clamp_finite, mix, smoothstep},
    },
    segmentation::{ModelPolarity, SegmentationMasks},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StateUpdateParams {
    pub smoothing: f32,
    pub smoothstep_min: f32,
    pub smoothstep_max: f32,
    /// Sampling radius of the 3x3 history blur, in pixels of the mask buffers.
    pub blur_radius: f32,
    pub polarity: ModelPolarity,
    pub stickiness: StickinessConfig,
}

impl StateUpdateParams {
    pub fn from_config(cfg: &EffectConfig, polarity: ModelPolarity) -> Self {
        Self {
            smoothing: cfg.smoothing,
            smoothstep_min: cfg.smoothstep_min,
            smoothstep_max: cfg.smoothstep_max,
            blur_radius: cfg.state_blur_radius,
            polarity,
            stickiness: cfg.stickiness,
        }
    }
}

/// Steps 1-3: polarity, foreground pinning, confidence easing.
///
/// Returns `(category, weight)` where `category` is `1.0` for person pixels and `weight` is
/// the eased confidence in that category.
pub fn shape_signal(category: f32, confidence: f32, params: &StateUpdateParams) -> (f32, f32) {
    let (mut category, mut confidence) = (category, confidence);
    if params.polarity.is_inverted() {
        category = 1.0 - category;
        confidence = 1.0 - confidence;
    }
    if category > 0.0 {
        category = 1.0;
        confidence = 1.0 - confidence;
    }
    let weight = smoothstep(params.smoothstep_min, params.smoothstep_max, confidence);
    (category, weight)
}

/// Steps 5-7: blend factor, stickiness, temporal mix. Always lands in `[0, 1]`.
pub fn blend(category: f32, weight: f32, previous: f32, params: &StateUpdateParams) -> f32 {
    let category = clamp_finite(category, 0.0, 1.0);
    let previous = clamp_finite(previous, 0.0, 1.0);
    let mut alpha = clamp_finite(params.smoothing * weight, 0.0, 1.0);

    let sticky = params.stickiness;
    if category < 0.5 && previous > sticky.threshold {
        let t = smoothstep(sticky.threshold, 1.0, previous);
        let factor = clamp_finite(mix(sticky.slow_factor, sticky.slowest_factor, t), 0.0, 1.0);
        alpha *= factor;
    }

    clamp_finite(mix(previous, category, alpha), 0.0, 1.0)
}

/// Step 4: spatially denoised history around pixel `(x, y)`.
pub fn blur_previous(previous: &MaskPlane, x: u32, y: u32, radius: f32) -> f32 {
    mask_blur_3x3(previous, x, y, radius)
}

/// Runs one state update pass from `previous` into `next` (both frame-sized).
pub fn run(
    params: &StateUpdateParams,
    masks: &SegmentationMasks,
    previous: &MaskPlane,
    next: &mut MaskPlane,
) -> MatteResult<()> {
    let size = previous.size();
    if next.size() != size {
        return Err(MatteError::input(
            "state update expects equal-sized previous and next planes",
        ));
    }
    if size.is_empty() {
        return Ok(());
    }

    let width = size.width as usize;
    let inv_w = 1.0 / size.width as f32;
    let inv_h = 1.0 / size.height as f32;
    let radius = params.blur_radius.max(0.0);

    next.values_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let v = (y as f32 + 0.5) * inv_h;
            for (x, out) in row.iter_mut().enumerate() {
                let u = (x as f32 + 0.5) * inv_w;
                let (category, weight) = shape_signal(
                    masks.category().sample_uv(u, v),
                    masks.confidence().sample_uv(u, v),
                    params,
                );
                let history = blur_previous(previous, x as u32, y as u32, radius);
                *out = blend(category, weight, history, params);
            }
        });
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/effects/state_update.rs"]
mod tests;
