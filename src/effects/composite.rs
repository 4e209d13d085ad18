//! Final compositing laws.
//!
//! Both laws soften the smoothed mask with a second 3x3 blur, then ease it through a threshold
//! band. Background blur mixes towards a radially blurred copy of the frame; virtual background
//! mixes towards the active background texture sampled with cover scaling.

use rayon::prelude::*;

use crate::{
    background::source::BackgroundPixels,
    config::{EffectConfig, EffectMode, MAX_RADIAL_STEPS},
    effects::mask_blur_3x3,
    foundation::{
        core::{FrameSize, MaskPlane, VideoFrame, sample_rgba, unit_to_u8},
        error::{MatteError, MatteResult},
        math::{mix, smoothstep},
    },
};

/// Multi-angle, multi-radius gaussian blur evaluated directly per output pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialBlur {
    /// Gaussian sigma in pixels.
    pub sigma: f32,
    /// Sampling extent in pixels.
    pub kernel_radius: f32,
    pub angle_steps: u32,
    pub radius_step: f32,
}

impl RadialBlur {
    /// Number of samples taken along each direction.
    pub fn steps(&self) -> u32 {
        if self.kernel_radius <= 0.0 || self.radius_step <= 0.0 {
            return 0;
        }
        ((self.kernel_radius / self.radius_step).floor() as u32).min(MAX_RADIAL_STEPS)
    }

    /// Blurred RGBA (`0..1`) around pixel `(x, y)` of a straight-alpha RGBA8 buffer.
    pub fn sample(&self, data: &[u8], size: FrameSize, x: f32, y: f32) -> [f32; 4] {
        let mut acc = sample_rgba(data, size, x, y);
        let steps = self.steps();
        if steps == 0 || self.sigma <= 0.0 {
            return acc;
        }

        let mut total = 1.0f32;
        let denom = 2.0 * self.sigma * self.sigma;
        let angle_steps = self.angle_steps.max(1);
        for a in 0..angle_steps {
            let theta = a as f32 * std::f32::consts::TAU / angle_steps as f32;
            let (dy, dx) = theta.sin_cos();
            for s in 1..=steps {
                let r = s as f32 * self.radius_step;
                let w = (-(r * r) / denom).exp();
                let px = sample_rgba(data, size, x + dx * r, y + dy * r);
                for c in 0..4 {
                    acc[c] += px[c] * w;
                }
                total += w;
            }
        }
        for c in &mut acc {
            *c /= total;
        }
        acc
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlendLaw {
    BackgroundBlur {
        edge_lo: f32,
        edge_hi: f32,
        blur: RadialBlur,
    },
    VirtualBackground {
        edge_lo: f32,
        edge_hi: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeParams {
    /// Sampling radius of the compositing mask blur, in pixels.
    pub blend_radius: f32,
    pub law: BlendLaw,
}

impl CompositeParams {
    pub fn from_config(cfg: &EffectConfig) -> Self {
        let law = match cfg.mode() {
            EffectMode::BackgroundBlur => {
                let (edge_lo, edge_hi) = border_band(cfg.border_smooth);
                BlendLaw::BackgroundBlur {
                    edge_lo,
                    edge_hi,
                    blur: RadialBlur {
                        sigma: cfg.blur_intensity,
                        kernel_radius: cfg.blur_kernel_radius,
                        angle_steps: cfg.radial_blur.angle_steps.max(1),
                        radius_step: cfg.radial_blur.radius_step,
                    },
                }
            }
            EffectMode::VirtualBackground => BlendLaw::VirtualBackground {
                edge_lo: cfg.background_threshold_min,
                edge_hi: cfg.background_threshold_max,
            },
        };
        Self {
            blend_radius: cfg.blend_radius(),
            law,
        }
    }

    pub fn samples_background(&self) -> bool {
        matches!(self.law, BlendLaw::VirtualBackground { .. })
    }
}

/// Threshold band symmetric around 0.5 whose half-width is `border_smooth`.
pub fn border_band(border_smooth: f32) -> (f32, f32) {
    let half = border_smooth.clamp(0.0, 0.5);
    (0.5 - half, 0.5 + half)
}

/// Map canvas uv to background uv so the background covers the canvas without distortion,
/// cropping its longer axis symmetrically.
pub fn cover_uv(u: f32, v: f32, canvas: FrameSize, background: FrameSize) -> (f32, f32) {
    let canvas_aspect = canvas.aspect();
    let bg_aspect = background.aspect();
    if canvas_aspect > bg_aspect {
        let scale = bg_aspect / canvas_aspect;
        (u, (v - 0.5) * scale + 0.5)
    } else {
        let scale = canvas_aspect / bg_aspect;
        ((u - 0.5) * scale + 0.5, v)
    }
}

/// Soft foreground weight of pixel `(x, y)`: blurred mask eased through the law's band.
pub fn soft_mask(mask: &MaskPlane, x: u32, y: u32, params: &CompositeParams) -> f32 {
    let m = mask_blur_3x3(mask, x, y, params.blend_radius.max(0.0));
    let (lo, hi) = match params.law {
        BlendLaw::BackgroundBlur {
            edge_lo, edge_hi, ..
        }
        | BlendLaw::VirtualBackground { edge_lo, edge_hi } => (edge_lo, edge_hi),
    };
    smoothstep(lo, hi, m)
}

/// Composite `frame` against the current mask. `mask` must be frame-sized.
pub fn run(
    params: &CompositeParams,
    frame: &VideoFrame,
    mask: &MaskPlane,
    background: &BackgroundPixels,
) -> MatteResult<VideoFrame> {
    let size = frame.size();
    if mask.size() != size {
        return Err(MatteError::input(format!(
            "mask is {}x{} but frame is {}x{}",
            mask.size().width,
            mask.size().height,
            size.width,
            size.height
        )));
    }
    if size.is_empty() {
        return Ok(frame.clone());
    }

    let width = size.width as usize;
    let src = frame.data();
    let bg_size = background.size();
    let bg = background.data();
    let mut out = vec![0u8; src.len()];

    out.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let v = (y as f32 + 0.5) / size.height as f32;
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let soft = soft_mask(mask, x as u32, y as u32, params);
                let i = (y * width + x) * 4;
                let sharp = [
                    f32::from(src[i]) / 255.0,
                    f32::from(src[i + 1]) / 255.0,
                    f32::from(src[i + 2]) / 255.0,
                    f32::from(src[i + 3]) / 255.0,
                ];
                let behind = match params.law {
                    BlendLaw::BackgroundBlur { blur, .. } => {
                        if soft >= 1.0 {
                            sharp
                        } else {
                            blur.sample(src, size, x as f32, y as f32)
                        }
                    }
                    BlendLaw::VirtualBackground { .. } => {
                        let u = (x as f32 + 0.5) / size.width as f32;
                        let (bu, bv) = cover_uv(u, v, size, bg_size);
                        sample_rgba(
                            bg,
                            bg_size,
                            bu * bg_size.width as f32 - 0.5,
                            bv * bg_size.height as f32 - 0.5,
                        )
                    }
                };
                for c in 0..4 {
                    px[c] = unit_to_u8(mix(behind[c], sharp[c], soft));
                }
            }
        });

    VideoFrame::new(size.width, size.height, out)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
