//! Procedurally generated assets - no external files needed!
//!
//! Block sprites, animation frames, the player, a box-glyph font and short
//! synthesized clips. Lets the game run headless and keeps tests hermetic.

use std::f32::consts::TAU;

use super::{AssetSource, Font, Image, Rgba, Sound};

const SAMPLE_RATE: u32 = 22_050;
const BLOCK_SIZE: u32 = 32;
const PLAYER_SIZE: u32 = 24;
/// Frames per effect animation ("t0".."t5", "x0".."x5")
pub const ANIM_FRAMES: u32 = 6;

#[derive(Debug, Clone, Default)]
pub struct ProceduralAssets;

impl ProceduralAssets {
    pub fn new() -> Self {
        Self
    }

    fn block_color(code: char) -> Option<Rgba> {
        Some(match code {
            'w' => Rgba::rgb(235, 235, 235),
            'l' => Rgba::rgb(70, 110, 220),
            'b' => Rgba::rgb(150, 100, 60),
            'y' => Rgba::rgb(240, 210, 40),
            'r' => Rgba::rgb(210, 40, 40),
            'm' => Rgba::rgb(130, 130, 140),
            't' => Rgba::rgb(30, 90, 50),
            'k' => Rgba::rgb(120, 30, 150),
            'p' => Rgba::rgb(230, 120, 180),
            _ => return None,
        })
    }

    /// 32x32 block with a darker border; the "2" variant blinks its eyes shut
    fn block(color: Rgba, gesture: bool) -> Image {
        let border = Rgba::rgb(color.r / 2, color.g / 2, color.b / 2);
        let mut img = Image::solid(BLOCK_SIZE, BLOCK_SIZE, border);
        img.fill_rect(2, 2, BLOCK_SIZE - 4, BLOCK_SIZE - 4, color);
        let eye_h = if gesture { 1 } else { 5 };
        img.fill_rect(9, 11, 4, eye_h, Rgba::BLACK);
        img.fill_rect(19, 11, 4, eye_h, Rgba::BLACK);
        img
    }

    /// The player faces right; its single eye makes mirroring visible
    fn player() -> Image {
        let mut img = Image::solid(PLAYER_SIZE, PLAYER_SIZE, Rgba::rgb(250, 150, 30));
        img.fill_rect(15, 6, 5, 5, Rgba::WHITE);
        img.fill_rect(17, 7, 2, 3, Rgba::BLACK);
        img
    }

    /// Effect frame `index` of animation `anim`: a ring that grows and fades
    fn effect_frame(anim: char, index: u32) -> Option<Image> {
        let base = match anim {
            't' => Rgba::rgb(255, 255, 255),
            'x' => Rgba::rgb(255, 120, 20),
            _ => return None,
        };
        if index >= ANIM_FRAMES {
            return None;
        }
        let size = 8 + index * 4;
        let alpha = 255 - (index * 35) as u8;
        let color = Rgba::new(base.r, base.g, base.b, alpha);
        let mut img = Image::solid(size, size, Rgba::TRANSPARENT);
        let r = size as f32 / 2.0;
        for y in 0..size {
            for x in 0..size {
                let d = ((x as f32 + 0.5 - r).powi(2) + (y as f32 + 0.5 - r).powi(2)).sqrt();
                if d <= r && d >= r - 2.5 {
                    img.set_pixel(x, y, color);
                }
            }
        }
        Some(img)
    }

    fn tone(name: &str, freq: f32, secs: f32) -> Sound {
        let n = (SAMPLE_RATE as f32 * secs) as usize;
        let samples = (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - t / secs;
                (t * freq * TAU).sin() * env
            })
            .collect();
        Sound {
            name: name.to_string(),
            sample_rate: SAMPLE_RATE,
            samples,
        }
    }
}

impl AssetSource for ProceduralAssets {
    fn image(&self, name: &str) -> Option<Image> {
        if name == "blocky" {
            return Some(Self::player());
        }
        if let Some(code) = name.strip_suffix("block2") {
            let mut chars = code.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => Self::block_color(c).map(|color| Self::block(color, true)),
                _ => None,
            };
        }
        if let Some(code) = name.strip_suffix("block") {
            let mut chars = code.chars();
            return match (chars.next(), chars.next()) {
                (Some(c), None) => Self::block_color(c).map(|color| Self::block(color, false)),
                _ => None,
            };
        }
        let mut chars = name.chars();
        let anim = chars.next()?;
        let index: u32 = chars.as_str().parse().ok()?;
        Self::effect_frame(anim, index)
    }

    fn sound(&self, name: &str) -> Option<Sound> {
        match name {
            "click" => Some(Self::tone(name, 1200.0, 0.03)),
            "xp" => Some(Self::tone(name, 90.0, 0.4)),
            "bell" => Some(Self::tone(name, 880.0, 0.8)),
            _ => None,
        }
    }

    fn font(&self, name: &str, size: u32) -> Option<Font> {
        (name == "type_writer.ttf" && size > 0).then(|| Font {
            name: name.to_string(),
            size,
        })
    }

    fn render_text(
        &self,
        font: &Font,
        text: &str,
        color: Rgba,
        background: Option<Rgba>,
    ) -> Image {
        let glyph_w = ((font.size as f32) * 0.6).ceil().max(2.0) as u32;
        let count = text.chars().count().max(1) as u32;
        let mut img = Image::solid(
            glyph_w * count,
            font.size,
            background.unwrap_or(Rgba::TRANSPARENT),
        );
        for (i, ch) in text.chars().enumerate() {
            if !ch.is_whitespace() {
                img.fill_rect(i as u32 * glyph_w, 1, glyph_w - 1, font.size.saturating_sub(2), color);
            }
        }
        img
    }
}
