use std::{
    sync::atomic::AtomicUsize,
    time::Duration,
};

use super::*;
use crate::{
    background::source::{BackgroundPixels, VideoSurface},
    render::cpu::CpuBackend,
};

const DEFAULT: Rgba8 = Rgba8::opaque(0x1e, 0x1e, 0x23);

#[derive(Default)]
struct MockLoader {
    loads: AtomicUsize,
    video: Option<VideoSurface>,
}

impl BackgroundLoader for MockLoader {
    fn load(&self, request: &BackgroundRequest) -> MatteResult<LoadedBackground> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match request {
            BackgroundRequest::Color(c) => Ok(LoadedBackground::Color(*c)),
            BackgroundRequest::Image { url } if url.starts_with("missing") => {
                Err(MatteError::asset(format!("no such file: {url}")))
            }
            BackgroundRequest::Image { url } => {
                if url.starts_with("slow") {
                    std::thread::sleep(Duration::from_millis(150));
                }
                Ok(LoadedBackground::Image(BackgroundPixels::new(
                    4,
                    2,
                    vec![url.len() as u8; 32],
                )?))
            }
            BackgroundRequest::Video { .. } => match &self.video {
                Some(surface) => Ok(LoadedBackground::Video {
                    surface: surface.clone(),
                    first_frame: None,
                }),
                None => Err(MatteError::asset("no video")),
            },
        }
    }
}

fn image(url: &str) -> BackgroundRequest {
    BackgroundRequest::Image {
        url: url.to_string(),
    }
}

fn manager(loader: MockLoader) -> (BackgroundManager, Arc<MockLoader>) {
    let loader = Arc::new(loader);
    (BackgroundManager::new(loader.clone(), DEFAULT), loader)
}

fn wait_applied(mgr: &mut BackgroundManager, be: &mut CpuBackend) {
    for _ in 0..400 {
        mgr.apply_ready(be).unwrap();
        if !mgr.is_pending() {
            return;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("background load never completed");
}

#[test]
fn same_identity_uploads_once() {
    let (mut mgr, loader) = manager(MockLoader::default());
    let mut be = CpuBackend::new();

    let first = mgr.resolve(&image("beach.png"), &mut be).unwrap().texture();
    let second = mgr.resolve(&image("beach.png"), &mut be).unwrap().texture();

    assert_eq!(first, second);
    assert_eq!(mgr.stats().uploads, 1);
    assert_eq!(mgr.stats().cache_hits, 1);
    assert_eq!(be.stats().background_uploads, 1);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
}

#[test]
fn swapping_releases_the_previous_texture() {
    let (mut mgr, _) = manager(MockLoader::default());
    let mut be = CpuBackend::new();
    let a = mgr.resolve(&image("a.png"), &mut be).unwrap().texture();
    let b = mgr.resolve(&image("b.png"), &mut be).unwrap().texture();
    assert_ne!(a, b);
    assert_eq!(be.stats().background_releases, 1);
}

#[test]
fn failed_load_falls_back_to_default_and_reports() {
    let (mut mgr, _) = manager(MockLoader::default());
    let mut be = CpuBackend::new();

    let active = mgr.resolve(&image("missing.png"), &mut be).unwrap();
    assert!(matches!(active, ActiveBackground::Color { color, .. } if *color == DEFAULT));

    let reports = mgr.drain_reports();
    assert_eq!(reports.len(), 1);
    assert!(matches!(reports[0].error, MatteError::Asset(_)));
    assert_eq!(reports[0].request, image("missing.png"));
    assert!(mgr.drain_reports().is_empty());
    assert_eq!(mgr.stats().failures, 1);
}

#[test]
fn async_request_is_applied_between_frames() {
    let (mut mgr, _) = manager(MockLoader::default());
    let mut be = CpuBackend::new();

    assert!(mgr.request(image("office.jpg")).unwrap());
    assert!(!mgr.request(image("office.jpg")).unwrap());
    wait_applied(&mut mgr, &mut be);

    let active = mgr.active().unwrap();
    assert_eq!(active.key(), image("office.jpg").key());
    assert_eq!(active.size().width, 4);

    assert!(!mgr.request(image("office.jpg")).unwrap());
    assert_eq!(mgr.stats().uploads, 1);
}

#[test]
fn newer_request_supersedes_a_slow_one() {
    let (mut mgr, _) = manager(MockLoader::default());
    let mut be = CpuBackend::new();

    mgr.request(image("slow.png")).unwrap();
    let green = BackgroundRequest::Color(Rgba8::opaque(0, 255, 0));
    mgr.request(green.clone()).unwrap();
    wait_applied(&mut mgr, &mut be);
    assert_eq!(mgr.active().unwrap().key(), green.key());

    std::thread::sleep(Duration::from_millis(300));
    mgr.apply_ready(&mut be).unwrap();
    assert_eq!(mgr.active().unwrap().key(), green.key());
    assert_eq!(mgr.stats().uploads, 1);
}

#[test]
fn synchronous_resolve_supersedes_a_pending_load() {
    let (mut mgr, loader) = manager(MockLoader::default());
    let mut be = CpuBackend::new();

    assert!(mgr.request(image("slow.png")).unwrap());
    let green = BackgroundRequest::Color(Rgba8::opaque(0, 255, 0));
    mgr.resolve(&green, &mut be).unwrap();
    assert!(!mgr.is_pending());

    std::thread::sleep(Duration::from_millis(300));
    mgr.apply_ready(&mut be).unwrap();
    assert_eq!(mgr.active().unwrap().key(), green.key());
    assert_eq!(mgr.stats().uploads, 1);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 2);
}

#[test]
fn shutdown_discards_in_flight_loads() {
    let (mut mgr, loader) = manager(MockLoader::default());
    let mut be = CpuBackend::new();

    mgr.request(image("slow.png")).unwrap();
    mgr.shutdown();
    std::thread::sleep(Duration::from_millis(300));
    mgr.apply_ready(&mut be).unwrap();

    assert!(mgr.active().is_none());
    assert_eq!(be.stats().background_uploads, 0);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
}

#[test]
fn streaming_video_refreshes_only_on_new_frames() {
    let surface = VideoSurface::new(2, 2).unwrap();
    let (mut mgr, _) = manager(MockLoader {
        video: Some(surface.clone()),
        ..Default::default()
    });
    let mut be = CpuBackend::new();
    let req = BackgroundRequest::Video {
        url: "waves.mp4".to_string(),
    };

    mgr.resolve(&req, &mut be).unwrap();
    mgr.refresh_streaming(&mut be).unwrap();
    assert_eq!(be.stats().background_refreshes, 0);

    surface
        .publish(BackgroundPixels::new(2, 2, vec![200; 16]).unwrap())
        .unwrap();
    mgr.refresh_streaming(&mut be).unwrap();
    mgr.refresh_streaming(&mut be).unwrap();
    assert_eq!(be.stats().background_refreshes, 1);
}

#[test]
fn ensure_default_installs_once() {
    let (mut mgr, loader) = manager(MockLoader::default());
    let mut be = CpuBackend::new();
    mgr.ensure_default(&mut be).unwrap();
    mgr.ensure_default(&mut be).unwrap();
    assert_eq!(mgr.stats().uploads, 1);
    assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
}
