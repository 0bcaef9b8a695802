//! Named palettes and lookup tables.
//!
//! A palette is a list of colors indexed by position. Gradients are sampled
//! into [`LUT_SIZE`] entries; listed palettes keep exactly the colors given.

use crate::color::{interpolate_color, parse_hex, Color};

/// Entries in a sampled gradient.
pub const LUT_SIZE: usize = 256;

/// Palette used when the requested color source cannot be resolved.
pub const FALLBACK_PALETTE: &str = "Spectral";

/// Evenly spaced hex stops.
const VIRIDIS: &[&str] = &[
    "#440154", "#472d7b", "#3b528b", "#2c728e", "#21918c", "#28ae80", "#5ec962", "#addc30",
    "#fde725",
];
const MAGMA: &[&str] = &[
    "#000004", "#1c1044", "#4f127b", "#812581", "#b5367a", "#e55064", "#fb8761", "#fec287",
    "#fcfdbf",
];
const PLASMA: &[&str] = &[
    "#0d0887", "#4c02a1", "#7e03a8", "#a92395", "#cc4778", "#e56b5d", "#f89441", "#fdc328",
    "#f0f921",
];
const INFERNO: &[&str] = &[
    "#000004", "#1f0c48", "#550f6d", "#88226a", "#ba3655", "#e35933", "#f98e09", "#f9cb35",
    "#fcffa4",
];
const CIVIDIS: &[&str] = &[
    "#00224e", "#123570", "#3b496c", "#575d6d", "#707173", "#8a8779", "#a69d75", "#c4b56c",
    "#fee838",
];
const SPECTRAL: &[&str] = &[
    "#9e0142", "#d53e4f", "#f46d43", "#fdae61", "#fee08b", "#ffffbf", "#e6f598", "#abdda4",
    "#66c2a5", "#3288bd", "#5e4fa2",
];
const RDYLBU: &[&str] = &[
    "#a50026", "#d73027", "#f46d43", "#fdae61", "#fee090", "#ffffbf", "#e0f3f8", "#abd9e9",
    "#74add1", "#4575b4", "#313695",
];
const RDYLGN: &[&str] = &[
    "#a50026", "#d73027", "#f46d43", "#fdae61", "#fee08b", "#ffffbf", "#d9ef8b", "#a6d96a",
    "#66bd63", "#1a9850", "#006837",
];
const COOLWARM: &[&str] = &[
    "#3b4cc0", "#5977e3", "#7b9ff9", "#9ebeff", "#c0d4f5", "#dddcdc", "#f2cbb7", "#f7ac8e",
    "#ee8468", "#d65244", "#b40426",
];
const GREYS: &[&str] = &[
    "#ffffff", "#f0f0f0", "#d9d9d9", "#bdbdbd", "#969696", "#737373", "#525252", "#252525",
    "#000000",
];
const BLUES: &[&str] = &[
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c",
    "#08306b",
];
const GREENS: &[&str] = &[
    "#f7fcf5", "#e5f5e0", "#c7e9c0", "#a1d99b", "#74c476", "#41ab5d", "#238b45", "#006d2c",
    "#00441b",
];
const REDS: &[&str] = &[
    "#fff5f0", "#fee0d2", "#fcbba1", "#fc9272", "#fb6a4a", "#ef3b2c", "#cb181d", "#a50f15",
    "#67000d",
];

/// Stops at explicit positions.
const TERRAIN: &[(f64, &str)] = &[
    (0.0, "#333399"),
    (0.15, "#0099ff"),
    (0.25, "#00cc66"),
    (0.5, "#ffff99"),
    (0.75, "#805c54"),
    (1.0, "#ffffff"),
];
const JET: &[(f64, &str)] = &[
    (0.0, "#00007f"),
    (0.125, "#0000ff"),
    (0.375, "#00ffff"),
    (0.625, "#ffff00"),
    (0.875, "#ff0000"),
    (1.0, "#7f0000"),
];

/// Names of the built-in palettes (each also available with an `_r` suffix).
pub const PALETTE_NAMES: &[&str] = &[
    "viridis", "magma", "plasma", "inferno", "cividis", "Spectral", "RdYlBu", "RdYlGn",
    "coolwarm", "terrain", "jet", "Greys", "Blues", "Greens", "Reds",
];

fn even_stops(hex: &[&str]) -> Vec<(f64, Color)> {
    let last = (hex.len() - 1).max(1) as f64;
    hex.iter()
        .enumerate()
        .filter_map(|(i, h)| parse_hex(h).map(|c| (i as f64 / last, c)))
        .collect()
}

fn positioned_stops(stops: &[(f64, &str)]) -> Vec<(f64, Color)> {
    stops
        .iter()
        .filter_map(|(pos, h)| parse_hex(h).map(|c| (*pos, c)))
        .collect()
}

/// Gradient stops of a built-in palette. Names match case-insensitively;
/// a trailing `_r` reverses the palette.
pub fn named_stops(name: &str) -> Option<Vec<(f64, Color)>> {
    let (base, reversed) = match name.strip_suffix("_r") {
        Some(base) => (base, true),
        None => (name, false),
    };

    let stops = match base.to_ascii_lowercase().as_str() {
        "viridis" => even_stops(VIRIDIS),
        "magma" => even_stops(MAGMA),
        "plasma" => even_stops(PLASMA),
        "inferno" => even_stops(INFERNO),
        "cividis" => even_stops(CIVIDIS),
        "spectral" => even_stops(SPECTRAL),
        "rdylbu" => even_stops(RDYLBU),
        "rdylgn" => even_stops(RDYLGN),
        "coolwarm" => even_stops(COOLWARM),
        "greys" | "grays" => even_stops(GREYS),
        "blues" => even_stops(BLUES),
        "greens" => even_stops(GREENS),
        "reds" => even_stops(REDS),
        "terrain" => positioned_stops(TERRAIN),
        "jet" => positioned_stops(JET),
        _ => return None,
    };

    if reversed {
        Some(stops.into_iter().rev().map(|(pos, c)| (1.0 - pos, c)).collect())
    } else {
        Some(stops)
    }
}

/// Sample stops into `n` evenly spaced entries from 0 to 1 inclusive.
pub fn sample_gradient(stops: &[(f64, Color)], n: usize) -> Vec<Color> {
    if stops.is_empty() || n == 0 {
        return Vec::new();
    }
    let denom = (n - 1).max(1) as f64;
    (0..n)
        .map(|i| color_at(stops, i as f64 / denom))
        .collect()
}

fn color_at(stops: &[(f64, Color)], x: f64) -> Color {
    let (first_pos, first) = stops[0];
    if x <= first_pos {
        return first;
    }
    for pair in stops.windows(2) {
        let (p0, c0) = pair[0];
        let (p1, c1) = pair[1];
        if x <= p1 {
            let span = p1 - p0;
            let t = if span > 0.0 { (x - p0) / span } else { 1.0 };
            return interpolate_color(c0, c1, t);
        }
    }
    stops[stops.len() - 1].1
}

/// 256-entry lookup table of a built-in palette.
pub fn named_lut(name: &str) -> Option<Vec<Color>> {
    named_stops(name).map(|stops| sample_gradient(&stops, LUT_SIZE))
}

/// 256-entry gradient through evenly spaced colors.
pub fn gradient_lut(colors: &[Color]) -> Vec<Color> {
    let last = (colors.len().max(2) - 1) as f64;
    let stops: Vec<(f64, Color)> = colors
        .iter()
        .enumerate()
        .map(|(i, c)| (i as f64 / last, *c))
        .collect();
    sample_gradient(&stops, LUT_SIZE)
}

/// The fallback palette's lookup table.
pub fn fallback_lut() -> Vec<Color> {
    sample_gradient(&even_stops(SPECTRAL), LUT_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_named_palette_resolves() {
        for name in PALETTE_NAMES {
            let lut = named_lut(name).unwrap();
            assert_eq!(lut.len(), LUT_SIZE, "{}", name);
            let reversed = named_lut(&format!("{}_r", name)).unwrap();
            assert_eq!(lut[0], reversed[LUT_SIZE - 1], "{}", name);
            assert_eq!(lut[LUT_SIZE - 1], reversed[0], "{}", name);
        }
    }

    #[test]
    fn test_names_are_case_insensitive() {
        assert_eq!(named_lut("spectral"), named_lut("Spectral"));
        assert!(named_lut("not_a_palette").is_none());
    }

    #[test]
    fn test_gradient_endpoints() {
        let lut = gradient_lut(&[Color::rgb(0, 0, 0), Color::rgb(255, 255, 255)]);
        assert_eq!(lut[0], Color::rgb(0, 0, 0));
        assert_eq!(lut[255], Color::rgb(255, 255, 255));
        assert_eq!(lut[51], Color::rgb(51, 51, 51));
    }

    #[test]
    fn test_viridis_endpoints() {
        let lut = named_lut("viridis").unwrap();
        assert_eq!(lut[0], Color::rgb(0x44, 0x01, 0x54));
        assert_eq!(lut[255], Color::rgb(0xfd, 0xe7, 0x25));
    }
}
