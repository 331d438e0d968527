/// The color spaces the engine converts between.
///
/// sRGB is the identity space: every stored color is an sRGB hex string.
/// Display P3 shares sRGB's transfer function but has a wider gamut. Oklab and
/// Oklch are the perceptually uniform spaces used for gamut mapping. CIE Lab
/// and LCH use the D50 white point, as in CSS Color 4, so conversions to them
/// pass through a Bradford chromatic adaptation. XYZ with D65 is the hub every
/// other conversion goes through.
///
/// For the RGB spaces in-gamut coordinates range `0..=1`. Oklab/Oklch
/// lightness ranges `0..=1`, Lab/LCH lightness `0..=100`. The hue of the
/// polar spaces may be not-a-number, which marks an achromatic color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    Srgb,
    DisplayP3,
    Oklab,
    Oklch,
    Lab,
    Lch,
    Xyz,
    XyzD50,
}

impl ColorSpace {
    /// Determine whether this color space is RGB, i.e., has red, green, and
    /// blue coordinates bounded by `0..=1`.
    pub const fn is_rgb(&self) -> bool {
        matches!(self, Self::Srgb | Self::DisplayP3)
    }

    /// Determine whether this color space uses polar coordinates, with the
    /// hue as its third coordinate.
    pub const fn is_polar(&self) -> bool {
        matches!(self, Self::Oklch | Self::Lch)
    }

    /// Determine whether this color space has a bounded gamut.
    pub const fn is_bounded(&self) -> bool {
        self.is_rgb()
    }
}
