use crate::{
    background::source::VideoSurface,
    foundation::{
        core::{FrameSize, Rgba8},
        math::Fnv1a64,
    },
};

/// What the caller wants behind the subject.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackgroundRequest {
    Image { url: String },
    Video { url: String },
    Color(Rgba8),
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "mkv", "m4v", "avi"];

impl BackgroundRequest {
    /// Classify a url by its extension: known video containers become `Video`, anything else
    /// is treated as an image.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let ext = url
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video { url }
        } else {
            Self::Image { url }
        }
    }

    pub fn key(&self) -> BackgroundKey {
        let mut h = Fnv1a64::new_default();
        match self {
            Self::Image { url } => {
                h.write_u8(1);
                h.write_bytes(normalize_url(url).as_bytes());
            }
            Self::Video { url } => {
                h.write_u8(2);
                h.write_bytes(normalize_url(url).as_bytes());
            }
            Self::Color(c) => {
                h.write_u8(3);
                h.write_bytes(&c.to_array());
            }
        }
        BackgroundKey(h.finish())
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().replace('\\', "/")
}

/// Stable identity of a background source (kind + normalized url, or color).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BackgroundKey(u64);

impl BackgroundKey {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Backend-issued handle for an uploaded background texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) u64);

impl TextureId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// The background the compositor is currently sampling.
#[derive(Clone, Debug)]
pub enum ActiveBackground {
    Image {
        key: BackgroundKey,
        texture: TextureId,
        size: FrameSize,
    },
    Video {
        key: BackgroundKey,
        texture: TextureId,
        size: FrameSize,
        surface: VideoSurface,
        /// Surface version last copied into `texture`.
        uploaded_version: u64,
    },
    Color {
        key: BackgroundKey,
        texture: TextureId,
        color: Rgba8,
    },
}

impl ActiveBackground {
    pub fn key(&self) -> BackgroundKey {
        match self {
            Self::Image { key, .. } | Self::Video { key, .. } | Self::Color { key, .. } => *key,
        }
    }

    pub fn texture(&self) -> TextureId {
        match self {
            Self::Image { texture, .. }
            | Self::Video { texture, .. }
            | Self::Color { texture, .. } => *texture,
        }
    }

    /// Pixel dimensions used for aspect-correct placement; colors are 1x1.
    pub fn size(&self) -> FrameSize {
        match self {
            Self::Image { size, .. } | Self::Video { size, .. } => *size,
            Self::Color { .. } => FrameSize::new(1, 1),
        }
    }
}
