//! WGSL for the wgpu backend. Mirrors `effects::state_update` and `effects::composite`.
//!
//! All textures are sampled with a linear clamp-to-edge sampler at `(p + 0.5) / size`, so a
//! fragment at pixel `p` reads exactly the texel the CPU backend reads at `p`.

const COMMON: &str = r#"
struct VsOut {
  @builtin(position) pos: vec4<f32>,
};

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> VsOut {
  var p = array<vec2<f32>, 3>(
    vec2<f32>(-1.0, -1.0),
    vec2<f32>( 3.0, -1.0),
    vec2<f32>(-1.0,  3.0),
  );
  var o: VsOut;
  o.pos = vec4<f32>(p[vi], 0.0, 1.0);
  return o;
}

// smoothstep that degrades to a step for empty bands
fn ease(e0: f32, e1: f32, x: f32) -> f32 {
  if (e1 <= e0) {
    return select(0.0, 1.0, x >= e0);
  }
  let t = clamp((x - e0) / (e1 - e0), 0.0, 1.0);
  return t * t * (3.0 - 2.0 * t);
}

// 3x3 binomial average, taps `tap` apart in uv units
fn blur3x3(t: texture_2d<f32>, s: sampler, uv: vec2<f32>, tap: vec2<f32>) -> f32 {
  var acc = 0.0;
  for (var j = -1; j <= 1; j = j + 1) {
    for (var i = -1; i <= 1; i = i + 1) {
      let w = f32((2 - abs(i)) * (2 - abs(j)));
      let o = vec2<f32>(f32(i), f32(j)) * tap;
      acc = acc + textureSampleLevel(t, s, uv + o, 0.0).r * w;
    }
  }
  return acc / 16.0;
}
"#;

const STATE_UPDATE: &str = r#"
struct StateParams {
  resolution: vec2<f32>,
  smoothing: f32,
  smoothstep_min: f32,
  smoothstep_max: f32,
  blur_radius: f32,
  inverted: f32,
  sticky_threshold: f32,
  sticky_slow: f32,
  sticky_slowest: f32,
  _pad: vec2<f32>,
};

@group(0) @binding(0) var t_category: texture_2d<f32>;
@group(0) @binding(1) var t_confidence: texture_2d<f32>;
@group(0) @binding(2) var t_previous: texture_2d<f32>;
@group(0) @binding(3) var s_linear: sampler;
@group(0) @binding(4) var<uniform> params: StateParams;

@fragment
fn fs(in: VsOut) -> @location(0) vec4<f32> {
  let uv = in.pos.xy / params.resolution;
  var category = textureSampleLevel(t_category, s_linear, uv, 0.0).r;
  var confidence = textureSampleLevel(t_confidence, s_linear, uv, 0.0).r;
  if (params.inverted > 0.5) {
    category = 1.0 - category;
    confidence = 1.0 - confidence;
  }
  if (category > 0.0) {
    category = 1.0;
    confidence = 1.0 - confidence;
  }
  let weight = ease(params.smoothstep_min, params.smoothstep_max, confidence);

  let tap = vec2<f32>(params.blur_radius) / params.resolution;
  let previous = clamp(blur3x3(t_previous, s_linear, uv, tap), 0.0, 1.0);

  var alpha = clamp(params.smoothing * weight, 0.0, 1.0);
  if (category < 0.5 && previous > params.sticky_threshold) {
    let t = ease(params.sticky_threshold, 1.0, previous);
    alpha = alpha * clamp(mix(params.sticky_slow, params.sticky_slowest, t), 0.0, 1.0);
  }

  let next = clamp(mix(previous, category, alpha), 0.0, 1.0);
  return vec4<f32>(next, 0.0, 0.0, 1.0);
}
"#;

const COMPOSITE: &str = r#"
struct CompositeParams {
  resolution: vec2<f32>,
  bg_size: vec2<f32>,
  blend_radius: f32,
  edge_lo: f32,
  edge_hi: f32,
  mode: f32,
  sigma: f32,
  kernel_radius: f32,
  radius_step: f32,
  angle_steps: f32,
  steps: f32,
  _pad0: f32,
  _pad1: f32,
  _pad2: f32,
};

@group(0) @binding(0) var t_frame: texture_2d<f32>;
@group(0) @binding(1) var t_mask: texture_2d<f32>;
@group(0) @binding(2) var t_background: texture_2d<f32>;
@group(0) @binding(3) var s_linear: sampler;
@group(0) @binding(4) var<uniform> params: CompositeParams;

fn cover_uv(uv: vec2<f32>) -> vec2<f32> {
  let canvas_aspect = params.resolution.x / params.resolution.y;
  let bg_aspect = params.bg_size.x / params.bg_size.y;
  if (canvas_aspect > bg_aspect) {
    let s = bg_aspect / canvas_aspect;
    return vec2<f32>(uv.x, (uv.y - 0.5) * s + 0.5);
  }
  let s = canvas_aspect / bg_aspect;
  return vec2<f32>((uv.x - 0.5) * s + 0.5, uv.y);
}

fn radial_blur(uv: vec2<f32>) -> vec4<f32> {
  var acc = textureSampleLevel(t_frame, s_linear, uv, 0.0);
  let steps = u32(params.steps);
  if (steps == 0u || params.sigma <= 0.0) {
    return acc;
  }
  var total = 1.0;
  let denom = 2.0 * params.sigma * params.sigma;
  let angles = max(u32(params.angle_steps), 1u);
  let texel = vec2<f32>(1.0) / params.resolution;
  for (var a = 0u; a < angles; a = a + 1u) {
    let theta = f32(a) * 6.283185307 / f32(angles);
    let dir = vec2<f32>(cos(theta), sin(theta));
    for (var s = 1u; s <= steps; s = s + 1u) {
      let r = f32(s) * params.radius_step;
      let w = exp(-(r * r) / denom);
      acc = acc + textureSampleLevel(t_frame, s_linear, uv + dir * r * texel, 0.0) * w;
      total = total + w;
    }
  }
  return acc / total;
}

@fragment
fn fs(in: VsOut) -> @location(0) vec4<f32> {
  let uv = in.pos.xy / params.resolution;
  let tap = vec2<f32>(params.blend_radius) / params.resolution;
  let soft = ease(params.edge_lo, params.edge_hi, blur3x3(t_mask, s_linear, uv, tap));
  let sharp = textureSampleLevel(t_frame, s_linear, uv, 0.0);

  var behind: vec4<f32>;
  if (params.mode < 0.5) {
    if (soft >= 1.0) {
      behind = sharp;
    } else {
      behind = radial_blur(uv);
    }
  } else {
    behind = textureSampleLevel(t_background, s_linear, cover_uv(uv), 0.0);
  }
  return mix(behind, sharp, soft);
}
"#;

pub(crate) fn state_update_wgsl() -> String {
    format!("{COMMON}{STATE_UPDATE}")
}

pub(crate) fn composite_wgsl() -> String {
    format!("{COMMON}{COMPOSITE}")
}

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct StateUniforms {
    pub resolution: [f32; 2],
    pub smoothing: f32,
    pub smoothstep_min: f32,
    pub smoothstep_max: f32,
    pub blur_radius: f32,
    pub inverted: f32,
    pub sticky_threshold: f32,
    pub sticky_slow: f32,
    pub sticky_slowest: f32,
    pub _pad: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct CompositeUniforms {
    pub resolution: [f32; 2],
    pub bg_size: [f32; 2],
    pub blend_radius: f32,
    pub edge_lo: f32,
    pub edge_hi: f32,
    pub mode: f32,
    pub sigma: f32,
    pub kernel_radius: f32,
    pub radius_step: f32,
    pub angle_steps: f32,
    pub steps: f32,
    pub _pad: [f32; 3],
}
