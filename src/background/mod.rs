pub mod descriptor;
#[cfg(feature = "media-ffmpeg")]
pub(crate) mod ffmpeg;
pub mod manager;
pub mod source;

pub use descriptor::{ActiveBackground, BackgroundKey, BackgroundRequest, TextureId};
pub use manager::{BackgroundManager, BackgroundReport, BackgroundStats};
pub use source::{
    BackgroundLoader, BackgroundPixels, FsBackgroundLoader, LoadedBackground, VideoSurface,
};
