//! segmatte turns a noisy, low-resolution person segmentation into a stable matte and
//! composites live video frames with it.
//!
//! - Build a [`MattePipeline`] over a [`MatteBackend`] (CPU by default, wgpu with `gpu`)
//! - Feed it each [`VideoFrame`] plus the model's [`SegmentationMasks`] when available
//! - Swap backgrounds with [`MattePipeline::request_background`] without stalling frames
#![forbid(unsafe_code)]

mod foundation;

pub mod background;
pub mod config;
pub mod effects;
pub mod pipeline;
pub mod render;
pub mod segmentation;
pub mod worker;

pub use crate::foundation::core::{FrameSize, MaskPlane, Rgba8, VideoFrame};
pub use crate::foundation::error::{MatteError, MatteResult};
pub use crate::foundation::math::smoothstep;

pub use crate::background::{
    ActiveBackground, BackgroundKey, BackgroundLoader, BackgroundPixels, BackgroundReport,
    BackgroundRequest, FsBackgroundLoader, LoadedBackground, VideoSurface,
};
pub use crate::config::{
    DEFAULT_BACKGROUND, EffectConfig, EffectMode, RadialBlurQuality, StickinessConfig,
};
pub use crate::pipeline::{MattePipeline, PipelineState};
pub use crate::render::{BackendKind, BackendStats, CpuBackend, MatteBackend, create_backend};
pub use crate::segmentation::{ModelPolarity, SegmentationMasks};
pub use crate::worker::PipelineWorker;
