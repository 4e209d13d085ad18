use super::*;
use crate::{
    config::EffectConfig,
    foundation::core::Rgba8,
    segmentation::ModelPolarity,
};

fn person(size: FrameSize) -> SegmentationMasks {
    SegmentationMasks::uniform(size, 1.0, 0.0, ModelPolarity::Multiclass).unwrap()
}

#[test]
fn targets_are_reallocated_only_on_resize() {
    let mut be = CpuBackend::new();
    assert!(be.ensure_targets(FrameSize::new(4, 4)).unwrap());
    assert!(!be.ensure_targets(FrameSize::new(4, 4)).unwrap());
    assert!(be.ensure_targets(FrameSize::new(8, 4)).unwrap());
    assert_eq!(be.stats().target_allocations, 2);
    let snap = be.mask_snapshot().unwrap().unwrap();
    assert!(snap.values().iter().all(|&v| v == 0.0));
}

#[test]
fn state_update_swaps_after_each_pass() {
    let mut be = CpuBackend::new();
    let size = FrameSize::new(3, 3);
    be.ensure_targets(size).unwrap();
    let params = StateUpdateParams::from_config(&EffectConfig::default(), ModelPolarity::Multiclass);

    be.exec_state_update(&params, &person(size)).unwrap();
    let first = be.mask_snapshot().unwrap().unwrap().get(1, 1);
    be.exec_state_update(&params, &person(size)).unwrap();
    let second = be.mask_snapshot().unwrap().unwrap().get(1, 1);

    assert!(first > 0.0);
    assert!(second > first);
    assert_eq!(be.stats().state_updates, 2);
}

#[test]
fn state_update_without_targets_is_an_input_error() {
    let mut be = CpuBackend::new();
    let params = StateUpdateParams::from_config(&EffectConfig::default(), ModelPolarity::Multiclass);
    let err = be
        .exec_state_update(&params, &person(FrameSize::new(2, 2)))
        .unwrap_err();
    assert!(matches!(err, MatteError::Input(_)));
}

#[test]
fn composite_needs_a_resident_background() {
    let mut be = CpuBackend::new();
    let frame = VideoFrame::filled(2, 2, Rgba8::opaque(5, 5, 5)).unwrap();
    be.ensure_targets(frame.size()).unwrap();
    let tex = be
        .upload_background(&BackgroundPixels::solid(Rgba8::opaque(0, 255, 0)))
        .unwrap();
    let params = CompositeParams::from_config(&EffectConfig::default());

    // empty history: everything is background
    let out = be.exec_composite(&params, &frame, tex).unwrap();
    assert_eq!(out.pixel(0, 0), [0, 255, 0, 255]);

    be.release_background(tex);
    let err = be.exec_composite(&params, &frame, tex).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn refresh_rejects_size_changes() {
    let mut be = CpuBackend::new();
    let tex = be
        .upload_background(&BackgroundPixels::new(2, 1, vec![0; 8]).unwrap())
        .unwrap();
    be.refresh_background(tex, &BackgroundPixels::new(2, 1, vec![9; 8]).unwrap())
        .unwrap();
    assert!(
        be.refresh_background(tex, &BackgroundPixels::solid(Rgba8::opaque(1, 1, 1)))
            .is_err()
    );
    assert_eq!(be.stats().background_refreshes, 1);
}

#[test]
fn release_drops_everything() {
    let mut be = CpuBackend::new();
    be.ensure_targets(FrameSize::new(2, 2)).unwrap();
    be.upload_background(&BackgroundPixels::solid(Rgba8::opaque(1, 1, 1)))
        .unwrap();
    be.release();
    assert!(be.mask_snapshot().unwrap().is_none());
    assert_eq!(be.stats().background_releases, 1);
}
