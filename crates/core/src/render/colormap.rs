//! Colormaps for mapping normalised scalars to colours.

use plotters::style::RGBColor;

use crate::error::{Error, Result};

/// Moreland's diverging blue-red map.
const COOLWARM: [(f64, (u8, u8, u8)); 9] = [
    (0.0, (59, 76, 192)),
    (0.125, (98, 130, 234)),
    (0.25, (141, 176, 254)),
    (0.375, (184, 208, 249)),
    (0.5, (221, 221, 221)),
    (0.625, (245, 196, 173)),
    (0.75, (244, 154, 123)),
    (0.875, (222, 96, 77)),
    (1.0, (180, 4, 38)),
];

const VIRIDIS: [(f64, (u8, u8, u8)); 5] = [
    (0.0, (68, 1, 84)),
    (0.25, (59, 82, 139)),
    (0.5, (33, 145, 140)),
    (0.75, (94, 201, 98)),
    (1.0, (253, 231, 37)),
];

const JET: [(f64, (u8, u8, u8)); 6] = [
    (0.0, (0, 0, 128)),
    (0.125, (0, 0, 255)),
    (0.375, (0, 255, 255)),
    (0.625, (255, 255, 0)),
    (0.875, (255, 0, 0)),
    (1.0, (128, 0, 0)),
];

const GREYS: [(f64, (u8, u8, u8)); 2] = [(0.0, (255, 255, 255)), (1.0, (0, 0, 0))];

/// The default categorical cycle.
pub const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

pub const TAB_BLUE: RGBColor = TAB10[0];
pub const TAB_RED: RGBColor = TAB10[3];

/// Piecewise-linear colormap over `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Colormap {
    pub name: String,
    stops: Vec<(f64, RGBColor)>,
    reversed: bool,
    bad: RGBColor,
}

impl Colormap {
    pub fn from_stops(name: impl Into<String>, stops: Vec<(f64, RGBColor)>) -> Self {
        Self {
            name: name.into(),
            stops,
            reversed: false,
            bad: RGBColor(128, 128, 128),
        }
    }

    fn from_table(name: &str, table: &[(f64, (u8, u8, u8))]) -> Self {
        Self::from_stops(
            name,
            table
                .iter()
                .map(|&(t, (r, g, b))| (t, RGBColor(r, g, b)))
                .collect(),
        )
    }

    pub fn coolwarm() -> Self {
        Self::from_table("coolwarm", &COOLWARM)
    }

    pub fn viridis() -> Self {
        Self::from_table("viridis", &VIRIDIS)
    }

    pub fn jet() -> Self {
        Self::from_table("jet", &JET)
    }

    pub fn greys() -> Self {
        Self::from_table("greys", &GREYS)
    }

    pub fn reversed(mut self) -> Self {
        self.reversed = !self.reversed;
        self
    }

    /// Looks a colormap up by name; a `_r` suffix reverses it.
    pub fn by_name(name: &str) -> Result<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let (base, reversed) = match lower.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (lower.as_str(), false),
        };
        let cmap = match base {
            "coolwarm" => Self::coolwarm(),
            "viridis" => Self::viridis(),
            "jet" => Self::jet(),
            "greys" | "gray" | "grey" => Self::greys(),
            _ => return Err(Error::unknown("colormap", name)),
        };
        Ok(if reversed { cmap.reversed() } else { cmap })
    }

    /// Colour at `t`, clamped into `[0, 1]`; NaN gives the "bad" colour.
    pub fn sample(&self, t: f64) -> RGBColor {
        if t.is_nan() || self.stops.is_empty() {
            return self.bad;
        }
        let t = t.clamp(0.0, 1.0);
        let t = if self.reversed { 1.0 - t } else { t };

        let upper = self
            .stops
            .iter()
            .position(|&(pos, _)| pos >= t)
            .unwrap_or(self.stops.len() - 1);
        if upper == 0 {
            return self.stops[0].1;
        }
        let (p0, c0) = self.stops[upper - 1];
        let (p1, c1) = self.stops[upper];
        let f = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };
        lerp(c0, c1, f)
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Self::coolwarm()
    }
}

fn lerp(a: RGBColor, b: RGBColor, t: f64) -> RGBColor {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round().clamp(0.0, 255.0) as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Parses `#rrggbb` or a handful of single-letter and `tab:` colour names.
pub fn parse_color(spec: &str) -> Result<RGBColor> {
    let s = spec.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 6 {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
            if let (Ok(r), Ok(g), Ok(b)) = (channel(0), channel(2), channel(4)) {
                return Ok(RGBColor(r, g, b));
            }
        }
        return Err(Error::unknown("color", spec));
    }
    let color = match s.to_ascii_lowercase().as_str() {
        "k" | "black" => RGBColor(0, 0, 0),
        "w" | "white" => RGBColor(255, 255, 255),
        "r" | "red" => RGBColor(255, 0, 0),
        "g" | "green" => RGBColor(0, 128, 0),
        "b" | "blue" => RGBColor(0, 0, 255),
        "tab:blue" => TAB10[0],
        "tab:orange" => TAB10[1],
        "tab:green" => TAB10[2],
        "tab:red" => TAB10[3],
        "tab:purple" => TAB10[4],
        "tab:brown" => TAB10[5],
        "tab:pink" => TAB10[6],
        "tab:gray" | "tab:grey" => TAB10[7],
        "tab:olive" => TAB10[8],
        "tab:cyan" => TAB10[9],
        _ => return Err(Error::unknown("color", spec)),
    };
    Ok(color)
}
