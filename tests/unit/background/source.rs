use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(w, h, px.repeat((w * h) as usize)).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "segmatte_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

#[test]
fn decode_png_keeps_dimensions_and_pixels() {
    let px = BackgroundPixels::decode(&png_bytes(3, 2, [9, 8, 7, 255])).unwrap();
    assert_eq!(px.size(), FrameSize::new(3, 2));
    assert_eq!(&px.data()[0..4], &[9, 8, 7, 255]);
}

#[test]
fn decode_garbage_is_an_asset_error() {
    let err = BackgroundPixels::decode(b"not an image").unwrap_err();
    assert!(matches!(err, MatteError::Asset(_)));
}

#[test]
fn solid_color_is_one_pixel() {
    let px = BackgroundPixels::solid(Rgba8::opaque(1, 2, 3));
    assert_eq!(px.size(), FrameSize::new(1, 1));
    assert_eq!(px.data(), &[1, 2, 3, 255]);
}

#[test]
fn fs_loader_resolves_relative_and_file_urls() {
    let tmp = temp_dir("fs_loader");
    std::fs::create_dir_all(&tmp).unwrap();
    std::fs::write(tmp.join("bg.png"), png_bytes(4, 4, [0, 0, 255, 255])).unwrap();

    let loader = FsBackgroundLoader::new(&tmp);
    let loaded = loader
        .load(&BackgroundRequest::Image {
            url: "bg.png".to_string(),
        })
        .unwrap();
    assert!(matches!(loaded, LoadedBackground::Image(ref px) if px.size() == FrameSize::new(4, 4)));

    let url = format!("file://{}", tmp.join("bg.png").display());
    assert!(loader.load(&BackgroundRequest::Image { url }).is_ok());

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn fs_loader_rejects_remote_schemes_and_missing_files() {
    let loader = FsBackgroundLoader::new(".");
    let err = loader
        .load(&BackgroundRequest::Image {
            url: "https://example.com/bg.png".to_string(),
        })
        .unwrap_err();
    assert!(err.to_string().contains("unsupported background url scheme"));

    let err = loader
        .load(&BackgroundRequest::Image {
            url: "definitely/missing.png".to_string(),
        })
        .unwrap_err();
    assert!(matches!(err, MatteError::Asset(_)));
}

#[cfg(not(feature = "media-ffmpeg"))]
#[test]
fn video_without_decoder_feature_is_an_asset_error() {
    let err = FsBackgroundLoader::new(".")
        .load(&BackgroundRequest::Video {
            url: "loop.mp4".to_string(),
        })
        .unwrap_err();
    assert!(err.to_string().contains("media-ffmpeg"));
}

#[test]
fn video_surface_tracks_latest_frame() {
    let surface = VideoSurface::new(2, 2).unwrap();
    assert_eq!(surface.version(), 0);
    assert!(surface.latest().is_none());

    let red = BackgroundPixels::new(2, 2, [255, 0, 0, 255].repeat(4)).unwrap();
    surface.publish(red.clone()).unwrap();
    assert_eq!(surface.version(), 1);
    assert_eq!(surface.latest(), Some(red));

    let wrong = BackgroundPixels::new(1, 1, vec![0, 0, 0, 255]).unwrap();
    assert!(surface.publish(wrong).is_err());
    assert_eq!(surface.version(), 1);
}

#[test]
fn weak_surface_dies_with_its_owners() {
    let surface = VideoSurface::new(1, 1).unwrap();
    let weak = surface.downgrade();
    assert!(weak.upgrade().is_some());
    drop(surface);
    assert!(weak.upgrade().is_none());
}

#[test]
fn video_without_frames_uploads_a_placeholder() {
    let surface = VideoSurface::new(3, 1).unwrap();
    let loaded = LoadedBackground::Video {
        surface,
        first_frame: None,
    };
    let px = loaded.initial_pixels();
    assert_eq!(px.size(), FrameSize::new(3, 1));
}
