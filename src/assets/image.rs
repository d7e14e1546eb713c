//! CPU-side images: RGBA pixel buffers with rotate/flip transforms

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// 8-bit RGBA pixel
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const RED: Rgba = Rgba::rgb(255, 0, 0);
    pub const GREEN: Rgba = Rgba::rgb(0, 255, 0);
    pub const BLUE: Rgba = Rgba::rgb(0, 0, 255);
    pub const YELLOW: Rgba = Rgba::rgb(255, 255, 0);
    pub const MAGENTA: Rgba = Rgba::rgb(255, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Source-over blend of `self` onto `dst`
    pub fn over(self, dst: Rgba) -> Rgba {
        match self.a {
            0 => dst,
            255 => self,
            a => {
                let a = a as u32;
                let inv = 255 - a;
                let mix = |s: u8, d: u8| ((s as u32 * a + d as u32 * inv) / 255) as u8;
                Rgba::new(
                    mix(self.r, dst.r),
                    mix(self.g, dst.g),
                    mix(self.b, dst.b),
                    (a + dst.a as u32 * inv / 255).min(255) as u8,
                )
            }
        }
    }
}

/// A decoded image
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Image {
    /// Build from row-major pixels; the buffer is resized to fit if needed
    pub fn new(width: u32, height: u32, mut pixels: Vec<Rgba>) -> Self {
        pixels.resize((width * height) as usize, Rgba::TRANSPARENT);
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn solid(width: u32, height: u32, color: Rgba) -> Self {
        Self::new(width, height, vec![color; (width * height) as usize])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size as a float vector (bounding box size for actors)
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Rgba) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }

    /// Fill an axis-aligned block of pixels (clipped)
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba) {
        for py in y..(y + h).min(self.height) {
            for px in x..(x + w).min(self.width) {
                self.pixels[(py * self.width + px) as usize] = color;
            }
        }
    }

    /// Mirror horizontally and/or vertically
    pub fn flipped(&self, flip_x: bool, flip_y: bool) -> Image {
        let mut out = Vec::with_capacity(self.pixels.len());
        for y in 0..self.height {
            let sy = if flip_y { self.height - 1 - y } else { y };
            for x in 0..self.width {
                let sx = if flip_x { self.width - 1 - x } else { x };
                out.push(self.pixels[(sy * self.width + sx) as usize]);
            }
        }
        Image::new(self.width, self.height, out)
    }

    /// Rotate counter-clockwise (as seen on screen) by `degrees` around the center.
    ///
    /// The result grows to the rotated bounding box; uncovered pixels are transparent.
    /// Nearest-neighbour sampling.
    pub fn rotated(&self, degrees: f32) -> Image {
        let (s, c) = degrees.to_radians().sin_cos();
        let (w, h) = (self.width as f32, self.height as f32);
        let out_w = ((w * c.abs() + h * s.abs()) - 1e-3).ceil().max(1.0) as u32;
        let out_h = ((w * s.abs() + h * c.abs()) - 1e-3).ceil().max(1.0) as u32;

        let mut out = Image::solid(out_w, out_h, Rgba::TRANSPARENT);
        let (half_out_w, half_out_h) = (out_w as f32 / 2.0, out_h as f32 / 2.0);
        for oy in 0..out_h {
            for ox in 0..out_w {
                let dx = ox as f32 + 0.5 - half_out_w;
                let dy = oy as f32 + 0.5 - half_out_h;
                let sx = dx * c - dy * s + w / 2.0;
                let sy = dx * s + dy * c + h / 2.0;
                if sx >= 0.0 && sy >= 0.0 {
                    if let Some(p) = self.pixel(sx.floor() as u32, sy.floor() as u32) {
                        out.set_pixel(ox, oy, p);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_one() -> Image {
        Image::new(2, 1, vec![Rgba::RED, Rgba::BLUE])
    }

    #[test]
    fn test_flip_x_mirrors_columns() {
        let flipped = two_by_one().flipped(true, false);
        assert_eq!(flipped.pixel(0, 0), Some(Rgba::BLUE));
        assert_eq!(flipped.pixel(1, 0), Some(Rgba::RED));
    }

    #[test]
    fn test_rotate_quarter_turn_counter_clockwise() {
        let rotated = two_by_one().rotated(90.0);
        assert_eq!((rotated.width(), rotated.height()), (1, 2));
        // Right-hand pixel ends up on top
        assert_eq!(rotated.pixel(0, 0), Some(Rgba::BLUE));
        assert_eq!(rotated.pixel(0, 1), Some(Rgba::RED));
    }

    #[test]
    fn test_rotate_full_turn_keeps_size() {
        let img = Image::solid(32, 16, Rgba::WHITE);
        let rotated = img.rotated(360.0);
        assert_eq!((rotated.width(), rotated.height()), (32, 16));
    }

    #[test]
    fn test_rotate_diagonal_grows_bounds() {
        let img = Image::solid(32, 32, Rgba::WHITE);
        let rotated = img.rotated(45.0);
        assert!(rotated.width() > 32 && rotated.height() > 32);
        // Corners of the grown box are empty
        assert_eq!(rotated.pixel(0, 0), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_blend() {
        assert_eq!(Rgba::TRANSPARENT.over(Rgba::RED), Rgba::RED);
        assert_eq!(Rgba::BLUE.over(Rgba::RED), Rgba::BLUE);
        let half = Rgba::new(255, 255, 255, 128).over(Rgba::BLACK);
        assert!(half.r > 120 && half.r < 135);
    }
}
