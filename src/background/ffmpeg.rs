use std::{
    io::Read as _,
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
};

use crate::{
    background::source::{BackgroundPixels, VideoSurface, WeakVideoSurface},
    foundation::{
        core::FrameSize,
        error::{MatteError, MatteResult},
    },
};

pub(crate) fn probe_size(path: &Path) -> MatteResult<FrameSize> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
    }

    let out = Command::new("ffprobe")
        .args(["-v", "error", "-print_format", "json", "-show_streams"])
        .arg(path)
        .output()
        .map_err(|e| MatteError::asset(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(MatteError::asset(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| MatteError::asset(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| MatteError::asset("no video stream found"))?;
    match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Ok(FrameSize::new(w, h)),
        _ => Err(MatteError::asset("missing video dimensions from ffprobe")),
    }
}

/// Start an `ffmpeg` child that decodes `path` in an endless loop at native rate and a reader
/// thread that publishes every frame into the returned surface.
///
/// The reader holds only a weak handle; once the last [`VideoSurface`] is dropped it kills the
/// child and exits.
pub(crate) fn spawn_looping_decoder(path: &Path) -> MatteResult<VideoSurface> {
    let size = probe_size(path)?;
    let surface = VideoSurface::new(size.width, size.height)?;

    let mut child = Command::new("ffmpeg")
        .args(["-v", "error", "-stream_loop", "-1", "-re", "-i"])
        .arg(path)
        .args(["-an", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| {
            MatteError::asset(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| MatteError::asset("failed to open ffmpeg stdout"))?;

    let weak = surface.downgrade();
    let frame_len = size.rgba_len()?;
    let source = path.to_path_buf();
    std::thread::Builder::new()
        .name("segmatte-video-bg".to_string())
        .spawn(move || pump(child, stdout, weak, size, frame_len, source))
        .map_err(|e| MatteError::asset(format!("failed to spawn video reader: {e}")))?;

    Ok(surface)
}

fn pump(
    mut child: Child,
    mut stdout: std::process::ChildStdout,
    surface: WeakVideoSurface,
    size: FrameSize,
    frame_len: usize,
    source: PathBuf,
) {
    loop {
        let mut buf = vec![0u8; frame_len];
        if let Err(e) = stdout.read_exact(&mut buf) {
            tracing::warn!(path = %source.display(), "video background decoder stopped: {e}");
            break;
        }
        let Some(surface) = surface.upgrade() else {
            tracing::debug!(path = %source.display(), "video background released");
            break;
        };
        let published = BackgroundPixels::new(size.width, size.height, buf)
            .and_then(|px| surface.publish(px));
        if let Err(e) = published {
            tracing::warn!(path = %source.display(), "dropping video background frame: {e}");
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}
