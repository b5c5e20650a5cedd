/// RGBA color with components in [0, 1].
///
/// The attribute stream packs colors into a single f32 lane (RGBA8 bit cast)
/// so that one entity record stays a flat run of floats; shaders unpack the
/// bits on the GPU side.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    #[inline]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Packs into RGBA8 reinterpreted as an f32 attribute lane.
    #[inline]
    pub fn to_bits(self) -> f32 {
        let r = (self.r.clamp(0.0, 1.0) * 255.0) as u32;
        let g = (self.g.clamp(0.0, 1.0) * 255.0) as u32;
        let b = (self.b.clamp(0.0, 1.0) * 255.0) as u32;
        let a = (self.a.clamp(0.0, 1.0) * 255.0) as u32;
        f32::from_bits(r | (g << 8) | (b << 16) | (a << 24))
    }

    /// Inverse of [`Color::to_bits`], with RGBA8 quantization.
    #[inline]
    pub fn from_bits(bits: f32) -> Self {
        let v = bits.to_bits();
        Self {
            r: (v & 0xff) as f32 / 255.0,
            g: ((v >> 8) & 0xff) as f32 / 255.0,
            b: ((v >> 16) & 0xff) as f32 / 255.0,
            a: ((v >> 24) & 0xff) as f32 / 255.0,
        }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_round_trip_quantized() {
        let c = Color::rgba(0.25, 0.5, 0.75, 1.0);
        let back = Color::from_bits(c.to_bits());
        assert!((back.r - c.r).abs() < 1.0 / 255.0 + 1e-6);
        assert!((back.g - c.g).abs() < 1.0 / 255.0 + 1e-6);
        assert!((back.b - c.b).abs() < 1.0 / 255.0 + 1e-6);
        assert_eq!(back.a, 1.0);
    }

    #[test]
    fn bits_clamp_out_of_range() {
        let c = Color::rgba(-1.0, 2.0, 0.0, 1.0);
        let back = Color::from_bits(c.to_bits());
        assert_eq!(back.r, 0.0);
        assert_eq!(back.g, 1.0);
    }
}
