use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::foundation::{
    core::Rgba8,
    error::{MatteError, MatteResult},
};

/// Color composited behind the subject when no background has been supplied (or one failed
/// to load).
pub const DEFAULT_BACKGROUND: Rgba8 = Rgba8::opaque(0x1e, 0x1e, 0x23);

/// Upper bound on radial blur samples along one direction; keeps the per-pixel cost bounded
/// whatever `blur_kernel_radius` and `radius_step` are set to.
pub const MAX_RADIAL_STEPS: u32 = 64;

/// Damping applied while a pixel that used to be foreground reads as background.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StickinessConfig {
    /// Blurred previous mask value above which damping kicks in.
    pub threshold: f32,
    /// Alpha multiplier right at `threshold`.
    pub slow_factor: f32,
    /// Alpha multiplier for a fully foreground history.
    pub slowest_factor: f32,
}

impl Default for StickinessConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            slow_factor: 0.7,
            slowest_factor: 0.25,
        }
    }
}

/// Sampling pattern of the background-blur compositing law.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RadialBlurQuality {
    /// Number of directions sampled around each pixel.
    pub angle_steps: u32,
    /// Distance in pixels between consecutive samples along a direction.
    pub radius_step: f32,
}

impl Default for RadialBlurQuality {
    fn default() -> Self {
        Self {
            angle_steps: 12,
            radius_step: 1.0,
        }
    }
}

/// Numeric tuning consumed by every render call.
///
/// The pipeline snapshots this value at the start of each frame; changes apply from the next
/// frame on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EffectConfig {
    pub enabled: bool,
    /// Base weight of the current frame in the temporal blend.
    pub smoothing: f32,
    /// Lower edge of the confidence easing band.
    pub smoothstep_min: f32,
    /// Upper edge of the confidence easing band.
    pub smoothstep_max: f32,
    /// Half-width of the soft edge band around 0.5 in background-blur mode.
    pub border_smooth: f32,
    /// Sampling radius (pixels) of the 3x3 blur over the previous mask.
    pub state_blur_radius: f32,
    /// Sampling radius (pixels) of the compositing mask blur in background-blur mode.
    pub blur_blend_radius: f32,
    /// Sampling radius (pixels) of the compositing mask blur in virtual-background mode.
    pub background_blend_radius: f32,
    pub background_threshold_min: f32,
    pub background_threshold_max: f32,
    /// Gaussian sigma of the background blur, in pixels.
    pub blur_intensity: f32,
    /// Sampling extent of the background blur, in pixels.
    pub blur_kernel_radius: f32,
    pub stickiness: StickinessConfig,
    pub radial_blur: RadialBlurQuality,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            smoothing: 0.7,
            smoothstep_min: 0.25,
            smoothstep_max: 0.85,
            border_smooth: 0.1,
            state_blur_radius: 1.0,
            blur_blend_radius: 3.0,
            background_blend_radius: 2.0,
            background_threshold_min: 0.45,
            background_threshold_max: 0.55,
            blur_intensity: 0.0,
            blur_kernel_radius: 0.0,
            stickiness: StickinessConfig::default(),
            radial_blur: RadialBlurQuality::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectMode {
    /// Background pixels are replaced by a blurred copy of the frame.
    BackgroundBlur,
    /// Background pixels are replaced by the active background texture.
    VirtualBackground,
}

impl EffectConfig {
    /// Preset for blurring the camera background.
    pub fn background_blur(intensity: f32, kernel_radius: f32) -> Self {
        Self {
            blur_intensity: intensity,
            blur_kernel_radius: kernel_radius,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> EffectMode {
        if self.blur_intensity > 0.0 && self.blur_kernel_radius > 0.0 {
            EffectMode::BackgroundBlur
        } else {
            EffectMode::VirtualBackground
        }
    }

    /// Mask blur radius used by the compositing pass for the current mode.
    pub fn blend_radius(&self) -> f32 {
        match self.mode() {
            EffectMode::BackgroundBlur => self.blur_blend_radius,
            EffectMode::VirtualBackground => self.background_blend_radius,
        }
    }

    pub fn validate(&self) -> MatteResult<()> {
        let fields = [
            ("smoothing", self.smoothing),
            ("smoothstep_min", self.smoothstep_min),
            ("smoothstep_max", self.smoothstep_max),
            ("border_smooth", self.border_smooth),
            ("state_blur_radius", self.state_blur_radius),
            ("blur_blend_radius", self.blur_blend_radius),
            ("background_blend_radius", self.background_blend_radius),
            ("background_threshold_min", self.background_threshold_min),
            ("background_threshold_max", self.background_threshold_max),
            ("blur_intensity", self.blur_intensity),
            ("blur_kernel_radius", self.blur_kernel_radius),
            ("stickiness.threshold", self.stickiness.threshold),
            ("stickiness.slow_factor", self.stickiness.slow_factor),
            ("stickiness.slowest_factor", self.stickiness.slowest_factor),
            ("radial_blur.radius_step", self.radial_blur.radius_step),
        ];
        for (name, v) in fields {
            if !v.is_finite() {
                return Err(MatteError::validation(format!("{name} must be finite")));
            }
        }

        let radii = [
            ("state_blur_radius", self.state_blur_radius),
            ("blur_blend_radius", self.blur_blend_radius),
            ("background_blend_radius", self.background_blend_radius),
            ("border_smooth", self.border_smooth),
            ("blur_intensity", self.blur_intensity),
            ("blur_kernel_radius", self.blur_kernel_radius),
        ];
        for (name, v) in radii {
            if v < 0.0 {
                return Err(MatteError::validation(format!("{name} must be >= 0")));
            }
        }

        if self.radial_blur.angle_steps == 0 {
            return Err(MatteError::validation(
                "radial_blur.angle_steps must be > 0",
            ));
        }
        if self.radial_blur.radius_step <= 0.0 {
            return Err(MatteError::validation(
                "radial_blur.radius_step must be > 0",
            ));
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> MatteResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| MatteError::validation(format!("effect config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_path(path: &Path) -> MatteResult<Self> {
        let s = std::fs::read_to_string(path).map_err(|e| {
            MatteError::validation(format!(
                "read effect config '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&s)
    }
}
