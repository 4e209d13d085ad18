use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    background::descriptor::BackgroundRequest,
    foundation::{
        core::{FrameSize, Rgba8},
        error::{MatteError, MatteResult},
    },
};

/// Decoded background pixels, straight-alpha RGBA8, ready for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackgroundPixels {
    size: FrameSize,
    data: Arc<Vec<u8>>,
}

impl BackgroundPixels {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> MatteResult<Self> {
        let size = FrameSize::new(width, height);
        if size.is_empty() {
            return Err(MatteError::asset("background image has zero area"));
        }
        let expected = size.rgba_len()?;
        if data.len() != expected {
            return Err(MatteError::asset(format!(
                "background buffer is {} bytes, expected {expected}",
                data.len()
            )));
        }
        Ok(Self {
            size,
            data: Arc::new(data),
        })
    }

    /// 1x1 texture for a solid color.
    pub fn solid(color: Rgba8) -> Self {
        Self {
            size: FrameSize::new(1, 1),
            data: Arc::new(color.to_array().to_vec()),
        }
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Decode an encoded image (png, jpeg, ...) with the `image` crate.
    pub fn decode(bytes: &[u8]) -> MatteResult<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| MatteError::asset(format!("image decode failed: {e}")))?
            .to_rgba8();
        let (w, h) = img.dimensions();
        Self::new(w, h, img.into_raw())
    }
}

#[derive(Debug, Default)]
struct SurfaceSlot {
    frame: RwLock<Option<BackgroundPixels>>,
    version: AtomicU64,
}

/// Live decode target of a looping video background.
///
/// An external decode loop calls [`VideoSurface::publish`]; the compositor reads whatever frame
/// is current. There is no pacing or synchronization beyond that.
#[derive(Clone, Debug)]
pub struct VideoSurface {
    size: FrameSize,
    slot: Arc<SurfaceSlot>,
}

impl VideoSurface {
    pub fn new(width: u32, height: u32) -> MatteResult<Self> {
        let size = FrameSize::new(width, height);
        if size.is_empty() {
            return Err(MatteError::asset("video surface has zero area"));
        }
        Ok(Self {
            size,
            slot: Arc::new(SurfaceSlot::default()),
        })
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Store the most recently decoded frame; frames of the wrong size are rejected.
    pub fn publish(&self, frame: BackgroundPixels) -> MatteResult<()> {
        if frame.size() != self.size {
            return Err(MatteError::asset(format!(
                "video frame is {}x{}, surface is {}x{}",
                frame.size().width,
                frame.size().height,
                self.size.width,
                self.size.height
            )));
        }
        let mut guard = self
            .slot
            .frame
            .write()
            .map_err(|_| MatteError::asset("video surface lock poisoned"))?;
        *guard = Some(frame);
        self.slot.version.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Bumped on every publish; `0` until the first frame arrives.
    pub fn version(&self) -> u64 {
        self.slot.version.load(Ordering::Acquire)
    }

    pub fn latest(&self) -> Option<BackgroundPixels> {
        self.slot.frame.read().ok().and_then(|g| g.clone())
    }

    #[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
    pub(crate) fn downgrade(&self) -> WeakVideoSurface {
        WeakVideoSurface {
            size: self.size,
            slot: Arc::downgrade(&self.slot),
        }
    }
}

/// Handle held by decode loops; stops resolving once every [`VideoSurface`] is gone.
#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
#[derive(Clone, Debug)]
pub(crate) struct WeakVideoSurface {
    size: FrameSize,
    slot: std::sync::Weak<SurfaceSlot>,
}

#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
impl WeakVideoSurface {
    pub(crate) fn upgrade(&self) -> Option<VideoSurface> {
        self.slot.upgrade().map(|slot| VideoSurface {
            size: self.size,
            slot,
        })
    }
}

/// Result of resolving a [`BackgroundRequest`] into pixels.
#[derive(Clone, Debug)]
pub enum LoadedBackground {
    Image(BackgroundPixels),
    Video {
        surface: VideoSurface,
        /// First frame to upload; `None` when the decoder has not produced one yet.
        first_frame: Option<BackgroundPixels>,
    },
    Color(Rgba8),
}

impl LoadedBackground {
    /// Pixels to upload when this background becomes active.
    pub fn initial_pixels(&self) -> BackgroundPixels {
        match self {
            Self::Image(px) => px.clone(),
            Self::Video {
                surface,
                first_frame,
            } => first_frame
                .clone()
                .or_else(|| surface.latest())
                .unwrap_or_else(|| placeholder(surface.size())),
            Self::Color(c) => BackgroundPixels::solid(*c),
        }
    }
}

fn placeholder(size: FrameSize) -> BackgroundPixels {
    let data = vec![0u8; size.pixel_count() * 4];
    BackgroundPixels {
        size,
        data: Arc::new(data),
    }
}

/// Fetches and decodes background sources. Runs off the render thread.
pub trait BackgroundLoader: Send + Sync {
    fn load(&self, request: &BackgroundRequest) -> MatteResult<LoadedBackground>;
}

/// Loads images (and, with `media-ffmpeg`, videos) from the local filesystem.
///
/// Accepts plain paths (relative ones resolve against `root`) and `file://` URLs.
#[derive(Clone, Debug)]
pub struct FsBackgroundLoader {
    root: PathBuf,
}

impl FsBackgroundLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve_path(&self, url: &str) -> MatteResult<PathBuf> {
        let path = if let Some(rest) = url.strip_prefix("file://") {
            PathBuf::from(rest)
        } else if url.contains("://") {
            return Err(MatteError::asset(format!(
                "unsupported background url scheme: {url}"
            )));
        } else {
            PathBuf::from(url)
        };
        if path.as_os_str().is_empty() {
            return Err(MatteError::asset("background url is empty"));
        }
        Ok(if path.is_absolute() {
            path
        } else {
            self.root.join(path)
        })
    }

    fn load_image(&self, path: &Path) -> MatteResult<BackgroundPixels> {
        let bytes = std::fs::read(path).map_err(|e| {
            MatteError::asset(format!("read background '{}': {e}", path.display()))
        })?;
        BackgroundPixels::decode(&bytes)
    }
}

impl BackgroundLoader for FsBackgroundLoader {
    fn load(&self, request: &BackgroundRequest) -> MatteResult<LoadedBackground> {
        match request {
            BackgroundRequest::Color(c) => Ok(LoadedBackground::Color(*c)),
            BackgroundRequest::Image { url } => {
                let path = self.resolve_path(url)?;
                Ok(LoadedBackground::Image(self.load_image(&path)?))
            }
            BackgroundRequest::Video { url } => {
                let path = self.resolve_path(url)?;
                open_video(&path)
            }
        }
    }
}

#[cfg(feature = "media-ffmpeg")]
fn open_video(path: &Path) -> MatteResult<LoadedBackground> {
    let surface = crate::background::ffmpeg::spawn_looping_decoder(path)?;
    Ok(LoadedBackground::Video {
        surface,
        first_frame: None,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
fn open_video(path: &Path) -> MatteResult<LoadedBackground> {
    Err(MatteError::asset(format!(
        "video background '{}' needs the media-ffmpeg feature",
        path.display()
    )))
}

#[cfg(test)]
#[path = "../../tests/unit/background/source.rs"]
mod tests;
