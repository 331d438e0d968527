//! Color conversion engine.
//!
//! Colors enter as hexadecimal strings and leave as renderings in every
//! supported [`FormatId`]. Everything here is pure: no state, no I/O.

mod conversion;
mod format;
mod gamut;
mod space;
mod string;

use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

pub use format::{FormatId, FormatSnapshot};
pub use space::ColorSpace;
pub use string::{normalize_hex, normalize_hue, parse_color, parse_css};

/// A color, given by three coordinates in a color space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    space: ColorSpace,
    coordinates: [f64; 3],
}

impl Color {
    pub fn new(space: ColorSpace, coordinates: [f64; 3]) -> Self {
        Self { space, coordinates }
    }

    pub fn space(&self) -> ColorSpace {
        self.space
    }

    pub fn coordinates(&self) -> &[f64; 3] {
        &self.coordinates
    }

    /// Convert this color to the given color space. The result may be out of
    /// gamut.
    #[must_use = "method returns a new color and does not mutate original value"]
    pub fn to(&self, space: ColorSpace) -> Self {
        Self::new(space, conversion::convert(self.space, space, &self.coordinates))
    }

    /// Determine whether this color can be shown on an sRGB display without
    /// clipping.
    pub fn is_displayable(&self) -> bool {
        gamut::in_gamut(ColorSpace::Srgb, self.to(ColorSpace::Srgb).coordinates())
    }

    /// Render this color as canonical `#rrggbb` hex, clamping channels.
    pub fn to_hex(&self) -> String {
        self.render(FormatId::Hex)
    }

    pub fn render(&self, format: FormatId) -> String {
        string::render(self, format)
    }
}

impl FromStr for Color {
    type Err = CoreError;

    /// Parse hex notation first, then the CSS functional notations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s).or_else(|_| parse_css(s))
    }
}

/// The result of mapping a color into the sRGB gamut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Displayable {
    /// Canonical hex identity of the mapped color.
    pub hex: String,
    /// Whether the original color lay outside the sRGB gamut.
    pub clipped: bool,
}

/// Render the color in the given format.
pub fn render_as(color: &Color, format: FormatId) -> String {
    color.render(format)
}

/// Render the hex color in every format.
pub fn get_all_formats(hex: &str) -> CoreResult<FormatSnapshot> {
    let color = parse_color(hex)?;
    Ok(snapshot_of(&color))
}

pub(crate) fn snapshot_of(color: &Color) -> FormatSnapshot {
    FormatSnapshot::from_fn(|format| color.render(format))
}

/// Map the color into the sRGB gamut.
///
/// In-gamut colors keep their coordinates. Out-of-gamut colors lose chroma at
/// constant Oklch lightness and hue until they fit, which keeps them
/// perceptually close to the original rather than clamping each channel.
pub fn map_to_displayable(color: &Color) -> Displayable {
    if color.is_displayable() {
        return Displayable {
            hex: color.to_hex(),
            clipped: false,
        };
    }

    let mapped = gamut::to_gamut(color.space, ColorSpace::Srgb, &color.coordinates);
    Displayable {
        hex: Color::new(ColorSpace::Srgb, mapped).to_hex(),
        clipped: true,
    }
}

/// Determine whether the hex color reads as light, i.e., wants dark text on
/// top. Unparseable colors are not light.
pub fn is_light_color(hex: &str) -> bool {
    let Ok(color) = parse_color(hex) else {
        return false;
    };
    let [r, g, b] = conversion::to_24bit(color.coordinates());
    let brightness = (r as f64 * 299.0 + g as f64 * 587.0 + b as f64 * 114.0) / 1000.0;
    brightness > 128.0
}
