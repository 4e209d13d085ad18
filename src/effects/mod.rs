pub mod composite;
pub mod state_update;

use crate::foundation::{
    core::MaskPlane,
    math::{GAUSS_3X3, GAUSS_3X3_NORM},
};

/// 3x3 binomial average of `plane` around pixel `(x, y)`, taps spaced `radius` pixels apart.
pub fn mask_blur_3x3(plane: &MaskPlane, x: u32, y: u32, radius: f32) -> f32 {
    let cx = x as f32;
    let cy = y as f32;
    let mut acc = 0.0f32;
    for &(dx, dy, w) in &GAUSS_3X3 {
        acc += plane.sample(cx + dx as f32 * radius, cy + dy as f32 * radius) * w;
    }
    acc / GAUSS_3X3_NORM
}
