use crate::foundation::error::{MatteError, MatteResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Width over height; `1.0` for degenerate sizes.
    pub fn aspect(self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub(crate) fn rgba_len(self) -> MatteResult<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| MatteError::input("rgba buffer size overflow"))
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the `#` is optional, case-insensitive).
    pub fn parse_hex(s: &str) -> MatteResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> MatteResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| MatteError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        if !s.is_ascii() {
            return Err(MatteError::validation("hex color must be ascii"));
        }
        match s.len() {
            6 => Ok(Self::opaque(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
            )),
            8 => Ok(Self::new(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
                hex_byte(&s[6..8])?,
            )),
            _ => Err(MatteError::validation(
                "hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)",
            )),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// One decoded video image, straight-alpha RGBA8, row-major and tightly packed.
///
/// Frames are single-use: a render call takes ownership of its input frame and hands back a
/// new (or the same) frame of identical size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFrame {
    size: FrameSize,
    data: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> MatteResult<Self> {
        let size = FrameSize::new(width, height);
        let expected = size.rgba_len()?;
        if data.len() != expected {
            return Err(MatteError::input(format!(
                "frame buffer is {} bytes, expected {expected} for {width}x{height} rgba8",
                data.len()
            )));
        }
        Ok(Self { size, data })
    }

    pub fn filled(width: u32, height: u32, color: Rgba8) -> MatteResult<Self> {
        let size = FrameSize::new(width, height);
        let data = color.to_array().repeat(size.pixel_count());
        Self::new(width, height, data)
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.size.width as usize + x as usize) * 4;
        [
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ]
    }
}

/// Single-channel `f32` plane (mask values, category/confidence scores).
#[derive(Clone, Debug, PartialEq)]
pub struct MaskPlane {
    size: FrameSize,
    values: Vec<f32>,
}

impl MaskPlane {
    pub fn new(width: u32, height: u32, values: Vec<f32>) -> MatteResult<Self> {
        let size = FrameSize::new(width, height);
        if values.len() != size.pixel_count() {
            return Err(MatteError::input(format!(
                "mask plane has {} values, expected {} for {width}x{height}",
                values.len(),
                size.pixel_count()
            )));
        }
        Ok(Self { size, values })
    }

    /// A plane filled with `value`; the all-background plane is `filled(size, 0.0)`.
    pub fn filled(size: FrameSize, value: f32) -> Self {
        Self {
            size,
            values: vec![value; size.pixel_count()],
        }
    }

    pub fn from_gray8(width: u32, height: u32, gray: &[u8]) -> MatteResult<Self> {
        let values = gray.iter().map(|&v| f32::from(v) / 255.0).collect();
        Self::new(width, height, values)
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[y as usize * self.size.width as usize + x as usize]
    }

    /// Bilinear sample with clamp-to-edge addressing.
    ///
    /// `(x, y)` are pixel-space coordinates where pixel `i` has its center at `i`.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        if self.size.is_empty() {
            return 0.0;
        }
        let max_x = (self.size.width - 1) as f32;
        let max_y = (self.size.height - 1) as f32;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.floor();
        let y0 = y.floor();
        let tx = x - x0;
        let ty = y - y0;
        let x0 = x0 as u32;
        let y0 = y0 as u32;
        let x1 = (x0 + 1).min(self.size.width - 1);
        let y1 = (y0 + 1).min(self.size.height - 1);

        let top = self.get(x0, y0) * (1.0 - tx) + self.get(x1, y0) * tx;
        let bottom = self.get(x0, y1) * (1.0 - tx) + self.get(x1, y1) * tx;
        top * (1.0 - ty) + bottom * ty
    }

    /// Sample at normalized texture coordinates (`0..1` covers the plane edge to edge).
    pub fn sample_uv(&self, u: f32, v: f32) -> f32 {
        self.sample(
            u * self.size.width as f32 - 0.5,
            v * self.size.height as f32 - 0.5,
        )
    }

    /// Quantize to 8-bit grayscale (clamped), e.g. for debug output.
    pub fn to_gray8(&self) -> Vec<u8> {
        self.values
            .iter()
            .map(|&v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }
}

/// Bilinear clamp-to-edge RGBA sample from a straight-alpha RGBA8 buffer, in `0..1` floats.
pub(crate) fn sample_rgba(data: &[u8], size: FrameSize, x: f32, y: f32) -> [f32; 4] {
    if size.is_empty() {
        return [0.0; 4];
    }
    let w = size.width as usize;
    let x = x.clamp(0.0, (size.width - 1) as f32);
    let y = y.clamp(0.0, (size.height - 1) as f32);
    let x0 = x.floor();
    let y0 = y.floor();
    let tx = x - x0;
    let ty = y - y0;
    let x0 = x0 as usize;
    let y0 = y0 as usize;
    let x1 = (x0 + 1).min(size.width as usize - 1);
    let y1 = (y0 + 1).min(size.height as usize - 1);

    let px = |xx: usize, yy: usize, c: usize| f32::from(data[(yy * w + xx) * 4 + c]) / 255.0;
    let mut out = [0.0f32; 4];
    for (c, o) in out.iter_mut().enumerate() {
        let top = px(x0, y0, c) * (1.0 - tx) + px(x1, y0, c) * tx;
        let bottom = px(x0, y1, c) * (1.0 - tx) + px(x1, y1, c) * tx;
        *o = top * (1.0 - ty) + bottom * ty;
    }
    out
}

pub(crate) fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
