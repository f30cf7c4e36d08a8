//! Stroke colors: the device palette and per-layer overrides.
//!
//! A layer whose name contains a `#`-token (`"Notes #ff8800"`, `"#red"`)
//! is drawn in that color. Hex tokens are tried first, then CSS color names.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

/// An RGB color with optional alpha, channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha, multiplied into the computed stroke opacity
    pub a: f32,
}

impl Color {
    /// Opaque color from 8-bit channels.
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    /// Color from 8-bit channels including alpha.
    pub const fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    /// Black.
    pub const BLACK: Color = Color::rgb8(0, 0, 0);

    /// White, the canvas color erasers paint with.
    pub const WHITE: Color = Color::rgb8(255, 255, 255);

    /// Color every highlighter stroke is drawn with.
    pub const HIGHLIGHTER: Color = Color::rgb8(255, 255, 0);

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(code: &str) -> Option<Self> {
        let hex = code.strip_prefix('#').unwrap_or(code);
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Some(Self::rgba8(r, g, b, a))
    }

    /// Look up a CSS color name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        NAMED_COLORS.get(name.to_ascii_lowercase().as_str()).copied()
    }

    /// The RGB channels, ignoring alpha.
    pub fn components(&self) -> (f32, f32, f32) {
        (self.r, self.g, self.b)
    }
}

/// Device palette indexed by the stroke color id.
pub const DEFAULT_PALETTE: [Color; 8] = [
    Color::rgb8(0, 0, 0),       // black
    Color::rgb8(100, 100, 100), // grey
    Color::rgb8(255, 255, 255), // white
    Color::rgb8(255, 255, 0),   // yellow
    Color::rgb8(0, 255, 0),     // green
    Color::rgb8(255, 0, 255),   // pink
    Color::rgb8(50, 50, 255),   // blue
    Color::rgb8(255, 50, 50),   // red
];

/// Palette entry for a raw color id.
pub fn palette_color(color_id: u32) -> Option<Color> {
    DEFAULT_PALETTE.get(color_id as usize).copied()
}

static NAMED_COLORS: phf::Map<&'static str, Color> = phf::phf_map! {
    "aliceblue" => Color::rgb8(240, 248, 255),
    "aqua" => Color::rgb8(0, 255, 255),
    "aquamarine" => Color::rgb8(127, 255, 212),
    "azure" => Color::rgb8(240, 255, 255),
    "beige" => Color::rgb8(245, 245, 220),
    "black" => Color::rgb8(0, 0, 0),
    "blue" => Color::rgb8(0, 0, 255),
    "blueviolet" => Color::rgb8(138, 43, 226),
    "brown" => Color::rgb8(165, 42, 42),
    "cadetblue" => Color::rgb8(95, 158, 160),
    "chartreuse" => Color::rgb8(127, 255, 0),
    "chocolate" => Color::rgb8(210, 105, 30),
    "coral" => Color::rgb8(255, 127, 80),
    "cornflowerblue" => Color::rgb8(100, 149, 237),
    "crimson" => Color::rgb8(220, 20, 60),
    "cyan" => Color::rgb8(0, 255, 255),
    "darkblue" => Color::rgb8(0, 0, 139),
    "darkcyan" => Color::rgb8(0, 139, 139),
    "darkgoldenrod" => Color::rgb8(184, 134, 11),
    "darkgray" => Color::rgb8(169, 169, 169),
    "darkgreen" => Color::rgb8(0, 100, 0),
    "darkgrey" => Color::rgb8(169, 169, 169),
    "darkmagenta" => Color::rgb8(139, 0, 139),
    "darkolivegreen" => Color::rgb8(85, 107, 47),
    "darkorange" => Color::rgb8(255, 140, 0),
    "darkorchid" => Color::rgb8(153, 50, 204),
    "darkred" => Color::rgb8(139, 0, 0),
    "darksalmon" => Color::rgb8(233, 150, 122),
    "darkseagreen" => Color::rgb8(143, 188, 143),
    "darkslateblue" => Color::rgb8(72, 61, 139),
    "darkslategray" => Color::rgb8(47, 79, 79),
    "darkturquoise" => Color::rgb8(0, 206, 209),
    "darkviolet" => Color::rgb8(148, 0, 211),
    "deeppink" => Color::rgb8(255, 20, 147),
    "deepskyblue" => Color::rgb8(0, 191, 255),
    "dimgray" => Color::rgb8(105, 105, 105),
    "dodgerblue" => Color::rgb8(30, 144, 255),
    "firebrick" => Color::rgb8(178, 34, 34),
    "forestgreen" => Color::rgb8(34, 139, 34),
    "fuchsia" => Color::rgb8(255, 0, 255),
    "gold" => Color::rgb8(255, 215, 0),
    "goldenrod" => Color::rgb8(218, 165, 32),
    "gray" => Color::rgb8(128, 128, 128),
    "green" => Color::rgb8(0, 128, 0),
    "greenyellow" => Color::rgb8(173, 255, 47),
    "grey" => Color::rgb8(128, 128, 128),
    "hotpink" => Color::rgb8(255, 105, 180),
    "indianred" => Color::rgb8(205, 92, 92),
    "indigo" => Color::rgb8(75, 0, 130),
    "khaki" => Color::rgb8(240, 230, 140),
    "lavender" => Color::rgb8(230, 230, 250),
    "lawngreen" => Color::rgb8(124, 252, 0),
    "lightblue" => Color::rgb8(173, 216, 230),
    "lightcoral" => Color::rgb8(240, 128, 128),
    "lightgreen" => Color::rgb8(144, 238, 144),
    "lightgrey" => Color::rgb8(211, 211, 211),
    "lightpink" => Color::rgb8(255, 182, 193),
    "lightsalmon" => Color::rgb8(255, 160, 122),
    "lightseagreen" => Color::rgb8(32, 178, 170),
    "lightskyblue" => Color::rgb8(135, 206, 250),
    "lime" => Color::rgb8(0, 255, 0),
    "limegreen" => Color::rgb8(50, 205, 50),
    "magenta" => Color::rgb8(255, 0, 255),
    "maroon" => Color::rgb8(128, 0, 0),
    "mediumblue" => Color::rgb8(0, 0, 205),
    "mediumpurple" => Color::rgb8(147, 112, 219),
    "mediumseagreen" => Color::rgb8(60, 179, 113),
    "midnightblue" => Color::rgb8(25, 25, 112),
    "navy" => Color::rgb8(0, 0, 128),
    "olive" => Color::rgb8(128, 128, 0),
    "olivedrab" => Color::rgb8(107, 142, 35),
    "orange" => Color::rgb8(255, 165, 0),
    "orangered" => Color::rgb8(255, 69, 0),
    "orchid" => Color::rgb8(218, 112, 214),
    "palegreen" => Color::rgb8(152, 251, 152),
    "paleturquoise" => Color::rgb8(175, 238, 238),
    "palevioletred" => Color::rgb8(219, 112, 147),
    "peru" => Color::rgb8(205, 133, 63),
    "pink" => Color::rgb8(255, 192, 203),
    "plum" => Color::rgb8(221, 160, 221),
    "powderblue" => Color::rgb8(176, 224, 230),
    "purple" => Color::rgb8(128, 0, 128),
    "red" => Color::rgb8(255, 0, 0),
    "rosybrown" => Color::rgb8(188, 143, 143),
    "royalblue" => Color::rgb8(65, 105, 225),
    "saddlebrown" => Color::rgb8(139, 69, 19),
    "salmon" => Color::rgb8(250, 128, 114),
    "sandybrown" => Color::rgb8(244, 164, 96),
    "seagreen" => Color::rgb8(46, 139, 87),
    "sienna" => Color::rgb8(160, 82, 45),
    "silver" => Color::rgb8(192, 192, 192),
    "skyblue" => Color::rgb8(135, 206, 235),
    "slateblue" => Color::rgb8(106, 90, 205),
    "slategray" => Color::rgb8(112, 128, 144),
    "springgreen" => Color::rgb8(0, 255, 127),
    "steelblue" => Color::rgb8(70, 130, 180),
    "tan" => Color::rgb8(210, 180, 140),
    "teal" => Color::rgb8(0, 128, 128),
    "thistle" => Color::rgb8(216, 191, 216),
    "tomato" => Color::rgb8(255, 99, 71),
    "turquoise" => Color::rgb8(64, 224, 208),
    "violet" => Color::rgb8(238, 130, 238),
    "wheat" => Color::rgb8(245, 222, 179),
    "white" => Color::rgb8(255, 255, 255),
    "yellow" => Color::rgb8(255, 255, 0),
    "yellowgreen" => Color::rgb8(154, 205, 50),
};

lazy_static! {
    static ref LAYER_COLOR_TOKEN: Regex = Regex::new(r"#([^\s]+)").expect("valid regex");
}

/// Extract a color override from a layer name.
///
/// # Examples
///
/// ```
/// use rm_lines::color::{layer_color, Color};
///
/// assert_eq!(layer_color("Sketch #ff0000"), Some(Color::rgb8(255, 0, 0)));
/// assert_eq!(layer_color("Ideas #Navy"), Some(Color::rgb8(0, 0, 128)));
/// assert_eq!(layer_color("Layer 1"), None);
/// ```
pub fn layer_color(name: &str) -> Option<Color> {
    let token = LAYER_COLOR_TOKEN.find(name)?.as_str().to_lowercase();
    Color::from_hex(&token).or_else(|| Color::from_name(&token[1..]))
}

/// One entry of the `layers` array in `<page>-metadata.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct LayerEntry {
    /// User-visible layer name
    #[serde(default)]
    pub name: String,
}

/// Parsed `<page>-metadata.json` sidecar.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerMetadata {
    /// Layers in file order
    #[serde(default)]
    pub layers: Vec<LayerEntry>,
}

impl LayerMetadata {
    /// Parse the sidecar JSON.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Color override per layer index.
    pub fn layer_colors(&self) -> Vec<Option<Color>> {
        self.layers.iter().map(|l| layer_color(&l.name)).collect()
    }
}
