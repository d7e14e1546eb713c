//! Asset lookup by name with caching
//!
//! Decoding lives behind [`AssetSource`]; this module only keys and caches.
//! Identical `(name, rotation, flip_x, flip_y)` requests share one handle.
//! A missing image is fatal, missing sounds and fonts degrade to `None`.

pub mod image;
pub mod procedural;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

pub use image::{Image, Rgba};
pub use procedural::ProceduralAssets;

use crate::error::{GameError, Result};

pub type ImageHandle = Arc<Image>;
pub type SoundHandle = Arc<Sound>;
pub type FontHandle = Arc<Font>;

/// A decoded sound clip (mono samples)
#[derive(Debug, Clone, PartialEq)]
pub struct Sound {
    pub name: String,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

/// A font face at a given pixel size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    pub name: String,
    pub size: u32,
}

/// Where raw assets come from (files, generators, test fixtures)
pub trait AssetSource: Send + Sync {
    fn image(&self, name: &str) -> Option<Image>;
    fn sound(&self, name: &str) -> Option<Sound>;
    fn font(&self, name: &str, size: u32) -> Option<Font>;
    /// Rasterize a line of text
    fn render_text(&self, font: &Font, text: &str, color: Rgba, background: Option<Rgba>)
    -> Image;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ImageKey {
    name: String,
    rotation: i32,
    flip_x: bool,
    flip_y: bool,
}

impl ImageKey {
    fn is_base(&self) -> bool {
        self.rotation == 0 && !self.flip_x && !self.flip_y
    }
}

/// Caching front-end over an [`AssetSource`]
pub struct Assets {
    source: Box<dyn AssetSource>,
    images: Mutex<HashMap<ImageKey, ImageHandle>>,
    sounds: Mutex<HashMap<String, Option<SoundHandle>>>,
    fonts: Mutex<HashMap<(String, u32), Option<FontHandle>>>,
}

impl Assets {
    pub fn new(source: impl AssetSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            images: Mutex::new(HashMap::new()),
            sounds: Mutex::new(HashMap::new()),
            fonts: Mutex::new(HashMap::new()),
        }
    }

    /// Plain image lookup
    pub fn image(&self, name: &str) -> Result<ImageHandle> {
        self.load_image(name, 0, false, false)
    }

    /// Image lookup with a counter-clockwise rotation (degrees) and mirroring.
    ///
    /// Transformed variants are derived from the cached base image.
    pub fn load_image(
        &self,
        name: &str,
        rotation: i32,
        flip_x: bool,
        flip_y: bool,
    ) -> Result<ImageHandle> {
        let key = ImageKey {
            name: name.to_string(),
            rotation: rotation.rem_euclid(360),
            flip_x,
            flip_y,
        };
        if let Some(handle) = self.images.lock().get(&key) {
            return Ok(Arc::clone(handle));
        }

        let image = if key.is_base() {
            self.source.image(name).ok_or_else(|| GameError::MissingImage {
                name: name.to_string(),
            })?
        } else {
            let base = self.image(name)?;
            let mut img = if key.rotation != 0 {
                base.rotated(key.rotation as f32)
            } else {
                (*base).clone()
            };
            if flip_x || flip_y {
                img = img.flipped(flip_x, flip_y);
            }
            img
        };

        log::debug!(
            "Loaded image {} (rot {}, flip {}/{})",
            name,
            key.rotation,
            flip_x,
            flip_y
        );
        let mut images = self.images.lock();
        Ok(Arc::clone(images.entry(key).or_insert_with(|| Arc::new(image))))
    }

    /// Sound lookup; `None` (logged once) when the source has no such sound
    pub fn load_sound(&self, name: &str) -> Option<SoundHandle> {
        let mut sounds = self.sounds.lock();
        sounds
            .entry(name.to_string())
            .or_insert_with(|| {
                let sound = self.source.sound(name).map(Arc::new);
                if sound.is_none() {
                    log::warn!("Cannot load sound: {}", name);
                }
                sound
            })
            .clone()
    }

    /// Font lookup; `None` (logged once) when unavailable
    pub fn load_font(&self, name: &str, size: u32) -> Option<FontHandle> {
        let mut fonts = self.fonts.lock();
        fonts
            .entry((name.to_string(), size))
            .or_insert_with(|| {
                let font = self.source.font(name, size).map(Arc::new);
                if font.is_none() {
                    log::warn!("Cannot load font: {} ({}px)", name, size);
                }
                font
            })
            .clone()
    }

    /// Render text with an optional font; no font means no text
    pub fn render_text(
        &self,
        font: Option<&FontHandle>,
        text: &str,
        color: Rgba,
        background: Option<Rgba>,
    ) -> Option<ImageHandle> {
        font.map(|f| Arc::new(self.source.render_text(f, text, color, background)))
    }

    /// Warm the sound cache before the loops start
    pub fn preload_sounds(&self, names: &[&str]) {
        for name in names {
            let _ = self.load_sound(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_requests_share_handle() {
        let assets = Assets::new(ProceduralAssets::new());
        let a = assets.load_image("wblock", 0, false, false).unwrap();
        let b = assets.image("wblock").unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let flipped = assets.load_image("blocky", 0, true, false).unwrap();
        let flipped_again = assets.load_image("blocky", 0, true, false).unwrap();
        assert!(Arc::ptr_eq(&flipped, &flipped_again));
        assert!(!Arc::ptr_eq(&flipped, &assets.image("blocky").unwrap()));
    }

    #[test]
    fn test_rotation_normalized() {
        let assets = Assets::new(ProceduralAssets::new());
        let a = assets.load_image("mblock", 450, false, false).unwrap();
        let b = assets.load_image("mblock", 90, false, false).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_missing_image_is_error() {
        let assets = Assets::new(ProceduralAssets::new());
        let err = assets.image("no_such_image").unwrap_err();
        assert!(matches!(err, GameError::MissingImage { .. }));
    }

    #[test]
    fn test_missing_sound_and_font_are_none() {
        let assets = Assets::new(ProceduralAssets::new());
        assert!(assets.load_sound("no_such_sound").is_none());
        assert!(assets.load_sound("click").is_some());
        assert!(assets.load_font("no_such_font.ttf", 10).is_none());
        assert!(assets.render_text(None, "P: 0", Rgba::YELLOW, None).is_none());
    }
}
