//! Software compositing target

use crate::assets::{Image, Rgba};

use super::command::RenderBuffer;

/// RGBA framebuffer the render thread composites into
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::BLACK; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        (x < self.width && y < self.height).then(|| self.pixels[(y * self.width + x) as usize])
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    /// Alpha-over `image` with its top-left at `(x, y)`, clipped to the canvas
    pub fn blit(&mut self, image: &Image, x: i32, y: i32) {
        let (w, h) = (self.width as i32, self.height as i32);
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + image.width() as i32).min(w);
        let y1 = (y + image.height() as i32).min(h);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let src = image.pixels();
        let src_w = image.width() as i32;
        for dy in y0..y1 {
            let src_row = ((dy - y) * src_w) as usize;
            let dst_row = (dy * w) as usize;
            for dx in x0..x1 {
                let s = src[src_row + (dx - x) as usize];
                if s.a == 0 {
                    continue;
                }
                let d = &mut self.pixels[dst_row + dx as usize];
                *d = s.over(*d);
            }
        }
    }

    /// Black background, then every command in order
    pub fn composite(&mut self, buffer: &RenderBuffer) {
        self.clear(Rgba::BLACK);
        for cmd in buffer.commands() {
            let pos = cmd.rect.pos.round();
            self.blit(&cmd.image, pos.x as i32, pos.y as i32);
        }
    }

    /// Raw RGBA8 bytes, row-major
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}
