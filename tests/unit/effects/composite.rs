use super::*;
use crate::foundation::core::Rgba8;

fn vb_params() -> CompositeParams {
    CompositeParams::from_config(&EffectConfig::default())
}

fn blur_params() -> CompositeParams {
    CompositeParams::from_config(&EffectConfig::background_blur(3.0, 6.0))
}

fn checkerboard(w: u32, h: u32) -> VideoFrame {
    let mut data = Vec::with_capacity((w * h * 4) as usize);
    for y in 0..h {
        for x in 0..w {
            let v = if (x + y) % 2 == 0 { 255 } else { 0 };
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    VideoFrame::new(w, h, data).unwrap()
}

#[test]
fn cover_16_9_into_4_3_stays_inside_and_keeps_center() {
    let canvas = FrameSize::new(640, 480);
    let bg = FrameSize::new(1600, 900);

    let (cu, cv) = cover_uv(0.5, 0.5, canvas, bg);
    assert!((cu - 0.5).abs() < 1e-6 && (cv - 0.5).abs() < 1e-6);

    for &(u, v) in &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)] {
        let (bu, bv) = cover_uv(u, v, canvas, bg);
        assert!((0.0..=1.0).contains(&bu), "u {bu}");
        assert!((0.0..=1.0).contains(&bv), "v {bv}");
    }

    // crop is horizontal and symmetric
    let (left, _) = cover_uv(0.0, 0.5, canvas, bg);
    let (right, _) = cover_uv(1.0, 0.5, canvas, bg);
    assert!((left - 0.125).abs() < 1e-6);
    assert!((right - 0.875).abs() < 1e-6);

    // no distortion: the visible bg region has the canvas aspect ratio
    let visible_w = (right - left) * bg.width as f32;
    let (_, top) = cover_uv(0.5, 0.0, canvas, bg);
    let (_, bottom) = cover_uv(0.5, 1.0, canvas, bg);
    let visible_h = (bottom - top) * bg.height as f32;
    assert!((visible_w / visible_h - canvas.aspect()).abs() < 1e-4);
}

#[test]
fn cover_crops_vertically_for_tall_backgrounds() {
    let (u, v) = cover_uv(0.5, 0.0, FrameSize::new(1920, 1080), FrameSize::new(1000, 1000));
    assert!((u - 0.5).abs() < 1e-6);
    assert!(v > 0.0 && v < 0.5);
}

#[test]
fn virtual_background_replaces_background_and_keeps_person() {
    let frame = VideoFrame::filled(6, 4, Rgba8::opaque(200, 10, 10)).unwrap();
    let bg = BackgroundPixels::solid(Rgba8::opaque(0, 0, 255));
    let p = vb_params();

    let person = MaskPlane::filled(frame.size(), 1.0);
    let out = run(&p, &frame, &person, &bg).unwrap();
    assert_eq!(out, frame);

    let nobody = MaskPlane::filled(frame.size(), 0.0);
    let out = run(&p, &frame, &nobody, &bg).unwrap();
    assert!(out.data().chunks_exact(4).all(|px| px == [0, 0, 255, 255]));
}

#[test]
fn virtual_background_band_is_tight() {
    let p = vb_params();
    let size = FrameSize::new(3, 3);
    assert_eq!(soft_mask(&MaskPlane::filled(size, 0.44), 1, 1, &p), 0.0);
    assert_eq!(soft_mask(&MaskPlane::filled(size, 0.56), 1, 1, &p), 1.0);
}

#[test]
fn background_blur_softens_only_the_background() {
    let frame = checkerboard(9, 9);
    let bg = BackgroundPixels::solid(Rgba8::opaque(0, 0, 0));
    let p = blur_params();

    let person = MaskPlane::filled(frame.size(), 1.0);
    assert_eq!(run(&p, &frame, &person, &bg).unwrap(), frame);

    let nobody = MaskPlane::filled(frame.size(), 0.0);
    let out = run(&p, &frame, &nobody, &bg).unwrap();
    let center = out.pixel(4, 4);
    assert!(center[0] > 40 && center[0] < 215, "center {center:?}");
    // blurred background is not replaced by the background texture
    assert!(out.data().chunks_exact(4).any(|px| px[0] > 0));
}

#[test]
fn background_blur_of_flat_frame_is_identity() {
    let frame = VideoFrame::filled(5, 5, Rgba8::opaque(90, 120, 30)).unwrap();
    let bg = BackgroundPixels::solid(Rgba8::opaque(0, 0, 0));
    let out = run(
        &blur_params(),
        &frame,
        &MaskPlane::filled(frame.size(), 0.0),
        &bg,
    )
    .unwrap();
    assert_eq!(out, frame);
}

#[test]
fn radial_blur_sample_count_is_capped() {
    let blur = RadialBlur {
        sigma: 1.0,
        kernel_radius: 10_000.0,
        angle_steps: 8,
        radius_step: 0.5,
    };
    assert_eq!(blur.steps(), MAX_RADIAL_STEPS);
    let off = RadialBlur {
        kernel_radius: 0.0,
        ..blur
    };
    assert_eq!(off.steps(), 0);
}

#[test]
fn border_band_is_symmetric_and_clamped() {
    assert_eq!(border_band(0.1), (0.4, 0.6));
    assert_eq!(border_band(3.0), (0.0, 1.0));
    assert_eq!(border_band(-1.0), (0.5, 0.5));
}

#[test]
fn mismatched_mask_is_an_input_error() {
    let frame = VideoFrame::filled(4, 4, Rgba8::opaque(1, 1, 1)).unwrap();
    let mask = MaskPlane::filled(FrameSize::new(2, 2), 1.0);
    let bg = BackgroundPixels::solid(Rgba8::opaque(0, 0, 0));
    let err = run(&vb_params(), &frame, &mask, &bg).unwrap_err();
    assert!(matches!(err, MatteError::Input(_)));
}

#[test]
fn mode_selects_the_blend_radius() {
    let cfg = EffectConfig::background_blur(2.0, 4.0);
    assert_eq!(CompositeParams::from_config(&cfg).blend_radius, cfg.blur_blend_radius);
    assert!(!CompositeParams::from_config(&cfg).samples_background());
    assert!(vb_params().samples_background());
}
