//! Visual themes
//!
//! A theme is the visual bundle a detected class label is substituted with:
//! a display name, an RGB color and a texture tag selecting the particle shape.
//! Each channel owns one [`ThemeRegistry`].

pub mod builtin;
pub mod registry;

use serde::{Deserialize, Serialize};

pub use registry::{ThemeRegistry, ThemeSpec};

/// Name used when a theme entry carries no usable display name
pub const UNKNOWN_NAME: &str = "Unknown";

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const WHITE: Rgb = Rgb([255, 255, 255]);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn r(&self) -> u8 {
        self.0[0]
    }

    pub fn g(&self) -> u8 {
        self.0[1]
    }

    pub fn b(&self) -> u8 {
        self.0[2]
    }

    /// Per-channel linear interpolation, `t` clamped to 0.0-1.0
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| -> u8 {
            let a = a as f32;
            let b = b as f32;
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb([
            mix(self.0[0], other.0[0]),
            mix(self.0[1], other.0[1]),
            mix(self.0[2], other.0[2]),
        ])
    }

    /// Scale every channel by `factor` (used for stroke shading)
    pub fn scaled(self, factor: f32) -> Rgb {
        let s = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Rgb([s(self.0[0]), s(self.0[1]), s(self.0[2])])
    }

    /// Color with alpha in 0.0-1.0 as normalized floats
    pub fn to_rgba_f32(self, alpha: f32) -> [f32; 4] {
        [
            self.0[0] as f32 / 255.0,
            self.0[1] as f32 / 255.0,
            self.0[2] as f32 / 255.0,
            alpha.clamp(0.0, 1.0),
        ]
    }
}

/// Particle texture, selecting the shape each particle is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureTag {
    #[default]
    Basic,
    Sharp,
    Creamy,
    Holey,
    Veiny,
    Herby,
    Stretchy,
    Granular,
    Wedge,
    Brie,
    SmoothSlice,
}

impl TextureTag {
    pub const ALL: [TextureTag; 11] = [
        TextureTag::Basic,
        TextureTag::Sharp,
        TextureTag::Creamy,
        TextureTag::Holey,
        TextureTag::Veiny,
        TextureTag::Herby,
        TextureTag::Stretchy,
        TextureTag::Granular,
        TextureTag::Wedge,
        TextureTag::Brie,
        TextureTag::SmoothSlice,
    ];

    /// Parse a texture name as written in theme tables
    pub fn parse(name: &str) -> Option<Self> {
        match crate::label::normalize(name).as_str() {
            "basic" => Some(TextureTag::Basic),
            "sharp" => Some(TextureTag::Sharp),
            "creamy" => Some(TextureTag::Creamy),
            "holey" => Some(TextureTag::Holey),
            "veiny" => Some(TextureTag::Veiny),
            "herby" => Some(TextureTag::Herby),
            "stretchy" => Some(TextureTag::Stretchy),
            "granular" => Some(TextureTag::Granular),
            "wedge" => Some(TextureTag::Wedge),
            "brie" => Some(TextureTag::Brie),
            "smoothslice" => Some(TextureTag::SmoothSlice),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextureTag::Basic => "basic",
            TextureTag::Sharp => "sharp",
            TextureTag::Creamy => "creamy",
            TextureTag::Holey => "holey",
            TextureTag::Veiny => "veiny",
            TextureTag::Herby => "herby",
            TextureTag::Stretchy => "stretchy",
            TextureTag::Granular => "granular",
            TextureTag::Wedge => "wedge",
            TextureTag::Brie => "brie",
            TextureTag::SmoothSlice => "smoothslice",
        }
    }
}

impl std::fmt::Display for TextureTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, immutable theme
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Registry key (normalized)
    pub key: String,
    /// Name shown to the user, e.g. "Cheddar"
    pub display_name: String,
    pub color: Rgb,
    pub texture: TextureTag,
}

impl Theme {
    pub fn new(key: impl Into<String>, display_name: impl Into<String>, color: Rgb, texture: TextureTag) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            color,
            texture,
        }
    }

    /// The fixed theme substituted when no valid entry exists
    pub fn placeholder() -> Self {
        Self::new("", UNKNOWN_NAME, Rgb::WHITE, TextureTag::Basic)
    }
}
