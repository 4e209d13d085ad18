use super::*;
use crate::foundation::core::FrameSize;

fn params(smoothing: f32) -> StateUpdateParams {
    StateUpdateParams {
        smoothing,
        smoothstep_min: 0.25,
        smoothstep_max: 0.85,
        blur_radius: 1.0,
        polarity: ModelPolarity::Multiclass,
        stickiness: StickinessConfig::default(),
    }
}

fn step_uniform(p: &StateUpdateParams, masks: &SegmentationMasks, prev: &MaskPlane) -> MaskPlane {
    let mut next = MaskPlane::filled(prev.size(), 0.0);
    run(p, masks, prev, &mut next).unwrap();
    next
}

#[test]
fn all_foreground_signal_converges_within_thirty_frames() {
    let size = FrameSize::new(8, 6);
    let p = params(0.7);
    // person everywhere: category 1, background score 0
    let masks = SegmentationMasks::uniform(size, 1.0, 0.0, ModelPolarity::Multiclass).unwrap();

    let mut mask = MaskPlane::filled(size, 0.0);
    let mut last = 0.0f32;
    let mut crossed_at = None;
    for frame in 0..30 {
        mask = step_uniform(&p, &masks, &mask);
        let v = mask.get(4, 3);
        assert!(v + 1e-6 >= last, "frame {frame}: {v} < {last}");
        last = v;
        if crossed_at.is_none() && v > 0.95 {
            crossed_at = Some(frame);
        }
    }
    assert!(crossed_at.is_some());
    assert!(mask.values().iter().all(|&v| v > 0.95 && v <= 1.0));
}

#[test]
fn person_with_full_background_score_never_moves_the_mask() {
    // confidence is the background-class score, so (1, 1) eases to a zero weight
    let size = FrameSize::new(4, 4);
    let p = params(0.7);
    let masks = SegmentationMasks::uniform(size, 1.0, 1.0, ModelPolarity::Multiclass).unwrap();
    assert_eq!(shape_signal(1.0, 1.0, &p), (1.0, 0.0));

    let mut mask = MaskPlane::filled(size, 0.0);
    for _ in 0..30 {
        mask = step_uniform(&p, &masks, &mask);
    }
    assert!(mask.values().iter().all(|&v| v == 0.0));
}

#[test]
fn deep_background_pulls_mask_to_zero() {
    let size = FrameSize::new(4, 4);
    let p = params(0.7);
    let masks = SegmentationMasks::uniform(size, 0.0, 1.0, ModelPolarity::Multiclass).unwrap();
    let mut mask = MaskPlane::filled(size, 1.0);
    for _ in 0..60 {
        mask = step_uniform(&p, &masks, &mask);
    }
    assert!(mask.values().iter().all(|&v| v < 0.05));
}

#[test]
fn binary_polarity_inverts_both_planes() {
    let p = StateUpdateParams {
        polarity: ModelPolarity::Binary,
        ..params(0.7)
    };
    // inverted encoding of a confident person pixel
    assert_eq!(shape_signal(0.0, 1.0, &p), (1.0, 1.0));
    // inverted encoding of a confident background pixel
    assert_eq!(shape_signal(1.0, 0.0, &p), (0.0, 1.0));
}

#[test]
fn foreground_category_is_pinned_and_confidence_inverted() {
    let p = params(0.7);
    let (category, weight) = shape_signal(0.3, 0.9, &p);
    assert_eq!(category, 1.0);
    // 1 - 0.9 = 0.1 sits below smoothstep_min
    assert_eq!(weight, 0.0);
}

#[test]
fn output_stays_in_unit_range_for_extreme_configs() {
    let extremes = [
        StateUpdateParams {
            smoothing: 50.0,
            smoothstep_min: 0.9,
            smoothstep_max: 0.1,
            blur_radius: 40.0,
            polarity: ModelPolarity::Binary,
            stickiness: StickinessConfig {
                threshold: -1.0,
                slow_factor: 5.0,
                slowest_factor: -3.0,
            },
        },
        StateUpdateParams {
            smoothing: -2.0,
            smoothstep_min: -1.0,
            smoothstep_max: -1.0,
            blur_radius: 0.0,
            polarity: ModelPolarity::Multiclass,
            stickiness: StickinessConfig::default(),
        },
        StateUpdateParams {
            smoothing: f32::MAX,
            ..params(1.0)
        },
    ];

    let size = FrameSize::new(5, 3);
    let cat: Vec<f32> = (0..15).map(|i| (i % 3) as f32 * 0.5).collect();
    let conf: Vec<f32> = (0..15).map(|i| (i % 4) as f32 / 3.0).collect();
    let masks = SegmentationMasks::from_f32(5, 3, cat, conf, ModelPolarity::Multiclass).unwrap();
    let prev_vals: Vec<f32> = (0..15).map(|i| [0.0, 1.0, 0.4, 0.95, 0.31][i % 5]).collect();
    let prev = MaskPlane::new(5, 3, prev_vals).unwrap();

    for p in extremes {
        let mut next = MaskPlane::filled(size, -7.0);
        run(&p, &masks, &prev, &mut next).unwrap();
        for &v in next.values() {
            assert!((0.0..=1.0).contains(&v), "{v} out of range for {p:?}");
        }
    }
}

#[test]
fn person_to_background_is_never_faster_than_background_to_person() {
    let p = params(0.7);
    let weight = 1.0;

    let mut leaving = 1.0f32; // person -> background
    let mut arriving = 0.0f32; // background -> person
    let mut first = true;
    for step in 0..40 {
        let next_leaving = blend(0.0, weight, leaving, &p);
        let next_arriving = blend(1.0, weight, arriving, &p);

        let d_leaving = (next_leaving - leaving).abs();
        let d_arriving = (next_arriving - arriving).abs();
        if first {
            assert!(d_leaving <= d_arriving);
            first = false;
        }

        leaving = next_leaving;
        arriving = next_arriving;
        let progress_leaving = 1.0 - leaving;
        let progress_arriving = arriving;
        assert!(
            progress_leaving <= progress_arriving + 1e-6,
            "step {step}: leaving progressed {progress_leaving}, arriving {progress_arriving}"
        );
    }
}

#[test]
fn stickiness_only_damps_the_leaving_direction() {
    let p = params(0.7);
    // history below the threshold: no damping
    assert!((blend(0.0, 1.0, 0.2, &p) - 0.2 * 0.3).abs() < 1e-6);
    // full foreground history: alpha shrinks to smoothing * slowest_factor
    let expected = 1.0 - 0.7 * 0.25;
    assert!((blend(0.0, 1.0, 1.0, &p) - expected).abs() < 1e-6);
    // arriving direction keeps the full alpha
    assert!((blend(1.0, 1.0, 0.0, &p) - 0.7).abs() < 1e-6);
}

#[test]
fn history_blur_suppresses_isolated_pixels() {
    let size = FrameSize::new(5, 5);
    let mut prev = MaskPlane::filled(size, 0.0);
    prev.values_mut()[2 * 5 + 2] = 1.0;
    assert!((blur_previous(&prev, 2, 2, 1.0) - 0.25).abs() < 1e-6);
    assert!((blur_previous(&prev, 1, 1, 1.0) - 1.0 / 16.0).abs() < 1e-6);
    assert_eq!(blur_previous(&prev, 2, 2, 0.0), 1.0);
}

#[test]
fn low_resolution_masks_are_sampled_at_frame_uvs() {
    let p = params(1.0);
    // 2x1 model output: left half background, right half person
    let masks =
        SegmentationMasks::from_f32(2, 1, vec![0.0, 1.0], vec![1.0, 0.0], ModelPolarity::Multiclass)
            .unwrap();
    let size = FrameSize::new(8, 2);
    let prev = MaskPlane::filled(size, 0.0);
    let mut next = MaskPlane::filled(size, 0.0);
    run(&p, &masks, &prev, &mut next).unwrap();
    assert_eq!(next.get(0, 0), 0.0);
    assert_eq!(next.get(7, 1), 1.0);
}
