use std::fmt;
use std::str::FromStr;

use image::Rgb;
use serde::{Deserialize, Serialize};

/// Diverging palettes available for rendering an index array
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ColorScaleKind {
    /// Red, yellow, green
    #[default]
    RdYlGn,
    /// Red, white, blue
    RdBu,
    /// Brown, white, blue-green
    BrBG,
}

// 11-class ColorBrewer palettes, low values first
const RD_YL_GN: [[u8; 3]; 11] = [
    [165, 0, 38],
    [215, 48, 39],
    [244, 109, 67],
    [253, 174, 97],
    [254, 224, 139],
    [255, 255, 191],
    [217, 239, 139],
    [166, 217, 106],
    [102, 189, 99],
    [26, 152, 80],
    [0, 104, 55],
];

const RD_BU: [[u8; 3]; 11] = [
    [103, 0, 31],
    [178, 24, 43],
    [214, 96, 77],
    [244, 165, 130],
    [253, 219, 199],
    [247, 247, 247],
    [209, 229, 240],
    [146, 197, 222],
    [67, 147, 195],
    [33, 102, 172],
    [5, 48, 97],
];

const BR_BG: [[u8; 3]; 11] = [
    [84, 48, 5],
    [140, 81, 10],
    [191, 129, 45],
    [223, 194, 125],
    [246, 232, 195],
    [245, 245, 245],
    [199, 234, 229],
    [128, 205, 193],
    [53, 151, 143],
    [1, 102, 94],
    [0, 60, 48],
];

impl ColorScaleKind {
    fn stops(self) -> &'static [[u8; 3]] {
        match self {
            ColorScaleKind::RdYlGn => &RD_YL_GN,
            ColorScaleKind::RdBu => &RD_BU,
            ColorScaleKind::BrBG => &BR_BG,
        }
    }
}

impl fmt::Display for ColorScaleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorScaleKind::RdYlGn => "RdYlGn",
            ColorScaleKind::RdBu => "RdBu",
            ColorScaleKind::BrBG => "BrBG",
        };
        f.write_str(name)
    }
}

impl FromStr for ColorScaleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rdylgn" => Ok(ColorScaleKind::RdYlGn),
            "rdbu" => Ok(ColorScaleKind::RdBu),
            "brbg" => Ok(ColorScaleKind::BrBG),
            other => Err(format!("unknown colour scale '{}'", other)),
        }
    }
}

/// A diverging palette stretched over a fixed value range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    pub kind: ColorScaleKind,
    pub vmin: f64,
    pub vmax: f64,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::new(ColorScaleKind::default(), 0.0, 1.0)
    }
}

impl ColorScale {
    pub fn new(kind: ColorScaleKind, vmin: f64, vmax: f64) -> Self {
        Self { kind, vmin, vmax }
    }

    /// Position of `value` inside `[vmin, vmax]`, clamped to `[0, 1]`.
    /// Non-finite values sit at the neutral midpoint.
    pub fn normalize(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.5;
        }
        let span = self.vmax - self.vmin;
        if span <= 0.0 {
            return 0.5;
        }
        ((value - self.vmin) / span).clamp(0.0, 1.0)
    }

    /// Colour for an index value
    pub fn map(&self, value: f64) -> Rgb<u8> {
        self.at(self.normalize(value))
    }

    /// Colour at relative position `t` in `[0, 1]` along the palette
    pub fn at(&self, t: f64) -> Rgb<u8> {
        let stops = self.kind.stops();
        let segments = (stops.len() - 1) as f64;
        let position = t.clamp(0.0, 1.0) * segments;
        let lower = (position.floor() as usize).min(stops.len() - 2);
        let frac = position - lower as f64;

        let a = stops[lower];
        let b = stops[lower + 1];
        let lerp = |i: usize| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * frac).round() as u8;

        Rgb([lerp(0), lerp(1), lerp(2)])
    }
}
