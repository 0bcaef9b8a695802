//! RGBA colors and color literal parsing.

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse a color literal: `#rgb`, `#rrggbb`, `#rrggbbaa` or a CSS color name.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.starts_with('#') {
            return parse_hex(text);
        }
        let lower = text.to_ascii_lowercase();
        CSS_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .and_then(|(_, hex)| parse_hex(hex))
    }
}

/// Linear color interpolation, `t` in 0..=1.
pub fn interpolate_color(color1: Color, color2: Color, t: f64) -> Color {
    let t = t.clamp(0.0, 1.0);
    let t_inv = 1.0 - t;
    let mix = |a: u8, b: u8| ((a as f64 * t_inv) + (b as f64 * t)).round() as u8;

    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
        mix(color1.a, color2.a),
    )
}

/// Parse hex color string (`#rgb`, `#rrggbb`, `#rrggbbaa`).
pub fn parse_hex(hex: &str) -> Option<Color> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);

    match hex.len() {
        3 => Some(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color::new(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

const CSS_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("silver", "#c0c0c0"),
    ("gray", "#808080"),
    ("grey", "#808080"),
    ("white", "#ffffff"),
    ("maroon", "#800000"),
    ("red", "#ff0000"),
    ("purple", "#800080"),
    ("fuchsia", "#ff00ff"),
    ("magenta", "#ff00ff"),
    ("green", "#008000"),
    ("lime", "#00ff00"),
    ("olive", "#808000"),
    ("yellow", "#ffff00"),
    ("navy", "#000080"),
    ("blue", "#0000ff"),
    ("teal", "#008080"),
    ("aqua", "#00ffff"),
    ("cyan", "#00ffff"),
    ("orange", "#ffa500"),
    ("brown", "#a52a2a"),
    ("pink", "#ffc0cb"),
    ("gold", "#ffd700"),
    ("beige", "#f5f5dc"),
    ("coral", "#ff7f50"),
    ("crimson", "#dc143c"),
    ("darkblue", "#00008b"),
    ("darkgreen", "#006400"),
    ("darkred", "#8b0000"),
    ("darkgray", "#a9a9a9"),
    ("darkgrey", "#a9a9a9"),
    ("lightblue", "#add8e6"),
    ("lightgreen", "#90ee90"),
    ("lightgray", "#d3d3d3"),
    ("lightgrey", "#d3d3d3"),
    ("indigo", "#4b0082"),
    ("ivory", "#fffff0"),
    ("khaki", "#f0e68c"),
    ("lavender", "#e6e6fa"),
    ("orchid", "#da70d6"),
    ("salmon", "#fa8072"),
    ("sienna", "#a0522d"),
    ("skyblue", "#87ceeb"),
    ("steelblue", "#4682b4"),
    ("tan", "#d2b48c"),
    ("tomato", "#ff6347"),
    ("turquoise", "#40e0d0"),
    ("violet", "#ee82ee"),
    ("wheat", "#f5deb3"),
    ("forestgreen", "#228b22"),
    ("seagreen", "#2e8b57"),
    ("royalblue", "#4169e1"),
    ("chocolate", "#d2691e"),
    ("firebrick", "#b22222"),
    ("goldenrod", "#daa520"),
];
