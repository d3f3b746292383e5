//! CSS colour parsing for layer styles.
//!
//! Layer styles carry colours as the strings a browser canvas accepts. The
//! raster backend needs concrete channels, so every colour passes through
//! [`parse_color`]. Unknown syntax yields `None` and callers fall back to the
//! default for that style slot.

#[cfg(test)]
#[path = "color_test.rs"]
mod color_test;

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Same colour with alpha multiplied by `factor` (clamped to `0..=1`).
    #[must_use]
    pub fn with_alpha_factor(self, factor: f64) -> Rgba {
        let factor = factor.clamp(0.0, 1.0);
        Rgba { a: (f64::from(self.a) * factor).round() as u8, ..self }
    }

    /// Canonical lowercase `#rrggbb` (or `#rrggbbaa` when not opaque).
    #[must_use]
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` into channels.
#[must_use]
pub fn parse_hex(raw: &str) -> Option<Rgba> {
    let hex = raw.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => Some(Rgba::new(
            channel(&hex[0..1].repeat(2))?,
            channel(&hex[1..2].repeat(2))?,
            channel(&hex[2..3].repeat(2))?,
            255,
        )),
        6 => Some(Rgba::new(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?, 255)),
        8 => Some(Rgba::new(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
            channel(&hex[6..8])?,
        )),
        _ => None,
    }
}

/// Parse `rgb(r, g, b)` or `rgba(r, g, b, a)` with `a` in `0..=1`.
fn parse_functional(raw: &str) -> Option<Rgba> {
    let lower = raw.trim().to_ascii_lowercase();
    let (body, has_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
        (rest.strip_suffix(')')?, true)
    } else {
        (lower.strip_prefix("rgb(")?.strip_suffix(')')?, false)
    };
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != if has_alpha { 4 } else { 3 } {
        return None;
    }
    let channel = |s: &str| s.parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
    let alpha = if has_alpha {
        let a = parts[3].parse::<f64>().ok()?;
        (a.clamp(0.0, 1.0) * 255.0).round() as u8
    } else {
        255
    };
    Some(Rgba::new(channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, alpha))
}

fn parse_named(raw: &str) -> Option<Rgba> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "transparent" => Some(Rgba::TRANSPARENT),
        "black" => Some(Rgba::BLACK),
        "white" => Some(Rgba::WHITE),
        "red" => Some(Rgba::new(255, 0, 0, 255)),
        "green" => Some(Rgba::new(0, 128, 0, 255)),
        "blue" => Some(Rgba::new(0, 0, 255, 255)),
        "gray" | "grey" => Some(Rgba::new(128, 128, 128, 255)),
        _ => None,
    }
}

/// Parse any supported CSS colour string.
#[must_use]
pub fn parse_color(raw: &str) -> Option<Rgba> {
    parse_hex(raw)
        .or_else(|| parse_functional(raw))
        .or_else(|| parse_named(raw))
}

/// Parse `raw`, falling back to `fallback` when it is not a recognised colour.
#[must_use]
pub fn parse_color_or(raw: &str, fallback: Rgba) -> Rgba {
    parse_color(raw).unwrap_or(fallback)
}
