//! Color allocation for codes and blending for overlapping spans
//!
//! `color_of` is a pure function of the code string: a PRNG seeded from
//! the string drives hue/saturation/value in a bright band, so the same
//! code renders the same color across sessions and users without a
//! shared lookup table. An explicit codebook override always wins.
//!
//! `token_colors` composes the pre / text / post thirds of a token glyph
//! covered by multiple spans: the pre third excludes spans that start at
//! the token and the post third excludes spans that end there, which
//! paints a visible seam at span boundaries.

use serde::{Deserialize, Serialize};

use crate::models::{Codebook, SpanEntry};

/// An sRGB color
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const WHITE: Color = Color {
    r: 255,
    g: 255,
    b: 255,
};

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex form, e.g. "#c03a5f"
    pub fn css(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse "#rrggbb" (or "#rgb"); None on anything else
    pub fn parse(css: &str) -> Option<Self> {
        let hex = css.strip_prefix('#')?;
        match hex.len() {
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Self { r, g, b })
            }
            3 => {
                let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
                Some(Self {
                    r: r * 17,
                    g: g * 17,
                    b: b * 17,
                })
            }
            _ => None,
        }
    }

    /// Build from hue (degrees), saturation and value in [0, 1]
    pub fn from_hsv(hue: f64, saturation: f64, value: f64) -> Self {
        let h = (hue.rem_euclid(360.0)) / 60.0;
        let c = value * saturation;
        let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
        let (r1, g1, b1) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = value - c;
        Self {
            r: ((r1 + m) * 255.0).round() as u8,
            g: ((g1 + m) * 255.0).round() as u8,
            b: ((b1 + m) * 255.0).round() as u8,
        }
    }
}

/// FNV-1a hash of the code string, used as the PRNG seed
fn seed_from(code: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in code.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    // avoid the xorshift fixed point
    if hash == 0 {
        0x9e37_79b9_7f4a_7c15
    } else {
        hash
    }
}

/// Small xorshift PRNG over the seed; returns a value in [0, 1)
struct SeededRng(u64);

impl SeededRng {
    fn next(&mut self) -> f64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        (x >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Deterministic bright color for a code string
pub fn seeded_color(code: &str) -> Color {
    let mut rng = SeededRng(seed_from(code));
    let hue = rng.next() * 360.0;
    let saturation = 0.55 + rng.next() * 0.35;
    let value = 0.75 + rng.next() * 0.20;
    Color::from_hsv(hue, saturation, value)
}

/// Color for a code: codebook override if present, generated otherwise
pub fn color_of(variable: &str, value: &str, codebook: &Codebook) -> Color {
    codebook
        .color_override(variable, value)
        .and_then(Color::parse)
        .unwrap_or_else(|| seeded_color(value))
}

/// Component-wise mean of the given colors; white when none contribute
pub fn blend(colors: &[Color]) -> Color {
    if colors.is_empty() {
        return WHITE;
    }
    let n = colors.len() as u32;
    let sum = colors.iter().fold((0u32, 0u32, 0u32), |acc, c| {
        (acc.0 + c.r as u32, acc.1 + c.g as u32, acc.2 + c.b as u32)
    });
    Color {
        r: (sum.0 / n) as u8,
        g: (sum.1 / n) as u8,
        b: (sum.2 / n) as u8,
    }
}

/// Composed colors for the three thirds of one token glyph
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TokenColors {
    pub pre: Color,
    pub text: Color,
    pub post: Color,
    /// Every covering span starts at this token
    pub all_left: bool,
    /// Some (but not all) covering spans start here
    pub any_left: bool,
    /// Every covering span ends at this token
    pub all_right: bool,
    /// Some (but not all) covering spans end here
    pub any_right: bool,
}

/// Compose the visual color representation of a token covered by the
/// given (already codebook-filtered) entries.
pub fn token_colors(entries: &[&SpanEntry], codebook: &Codebook) -> TokenColors {
    let mut pre = Vec::new();
    let mut text = Vec::new();
    let mut post = Vec::new();
    let mut n_left = 0usize;
    let mut n_right = 0usize;

    for entry in entries {
        let color = color_of(&entry.variable, &entry.value, codebook);
        text.push(color);
        if entry.is_left_boundary() {
            n_left += 1;
        } else {
            pre.push(color);
        }
        if entry.is_right_boundary() {
            n_right += 1;
        } else {
            post.push(color);
        }
    }

    let n = entries.len();
    let all_left = n > 0 && n_left == n;
    let all_right = n > 0 && n_right == n;

    TokenColors {
        pre: if all_left { WHITE } else { blend(&pre) },
        text: blend(&text),
        post: if all_right { WHITE } else { blend(&post) },
        all_left,
        any_left: n_left > 0 && !all_left,
        all_right,
        any_right: n_right > 0 && !all_right,
    }
}
