//! Conversions between the supported color spaces, with XYZ D65 as the hub.

use palette::chromatic_adaptation::AdaptInto;
use palette::convert::FromColorUnclamped;
use palette::encoding;
use palette::white_point::{D50, D65};

use super::ColorSpace;

/// Convert the given 24-bit RGB coordinates to floating point coordinates.
#[inline]
pub(crate) fn from_24bit(r: u8, g: u8, b: u8) -> [f64; 3] {
    [r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0]
}

/// Convert unit-range RGB coordinates to 24-bit representation, clamping each
/// channel to `0x00..=0xff` and rounding to the nearest integer.
pub(crate) fn to_24bit(coordinates: &[f64; 3]) -> [u8; 3] {
    let [r, g, b] = normalize(ColorSpace::Srgb, coordinates);
    let channel = |value: f64| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    [channel(r), channel(g), channel(b)]
}

/// Replace non-finite coordinates with zero. The hue of a polar color space
/// becomes not-a-number instead, since a missing hue marks an achromatic
/// color.
pub(crate) fn normalize(space: ColorSpace, coordinates: &[f64; 3]) -> [f64; 3] {
    let [c1, c2, c3] = *coordinates;
    let finite = |value: f64| if value.is_finite() { value } else { 0.0 };
    if space.is_polar() {
        [finite(c1), finite(c2), if c3.is_finite() { c3 } else { f64::NAN }]
    } else {
        [finite(c1), finite(c2), finite(c3)]
    }
}

// --------------------------------------------------------------------------------------------------------------------

type Srgb = palette::Srgb<f64>;
type LinearRgb = palette::LinSrgb<f64>;
type Hsl = palette::Hsl<encoding::Srgb, f64>;
type Oklab = palette::Oklab<f64>;
type Oklch = palette::Oklch<f64>;
type Lab = palette::Lab<D50, f64>;
type Lch = palette::Lch<D50, f64>;
type Xyz = palette::Xyz<D65, f64>;
type XyzD50 = palette::Xyz<D50, f64>;

/// Multiply the 3 by 3 matrix and 3-element vector with each other.
#[inline]
fn multiply(matrix: &[[f64; 3]; 3], vector: &[f64; 3]) -> [f64; 3] {
    let [row1, row2, row3] = matrix;

    [
        row1[0].mul_add(vector[0], row1[1].mul_add(vector[1], row1[2] * vector[2])),
        row2[0].mul_add(vector[0], row2[1].mul_add(vector[1], row2[2] * vector[2])),
        row3[0].mul_add(vector[0], row3[1].mul_add(vector[1], row3[2] * vector[2])),
    ]
}

// Display P3 shares the sRGB transfer curve but has wider primaries, which
// palette does not ship.

#[rustfmt::skip]
#[allow(clippy::excessive_precision)]
const LINEAR_DISPLAY_P3_TO_XYZ: [[f64; 3]; 3] = [
    [ 0.4865709486482162, 0.26566769316909306, 0.1982172852343625 ],
    [ 0.2289745640697488, 0.6917385218365064,  0.079286914093745  ],
    [ 0.0000000000000000, 0.04511338185890264, 1.043944368900976  ],
];

#[rustfmt::skip]
#[allow(clippy::excessive_precision)]
const XYZ_TO_LINEAR_DISPLAY_P3: [[f64; 3]; 3] = [
    [  2.493496911941425,   -0.9313836179191239,  -0.40271078445071684  ],
    [ -0.8294889695615747,   1.7626640603183463,   0.023624685841943577 ],
    [  0.03584583024378447, -0.07617238926804182,  0.9568845240076872   ],
];

fn display_p3_to_xyz(value: &[f64; 3]) -> Xyz {
    let linear: LinearRgb = Srgb::new(value[0], value[1], value[2]).into_linear();
    let [x, y, z] = multiply(
        &LINEAR_DISPLAY_P3_TO_XYZ,
        &[linear.red, linear.green, linear.blue],
    );
    Xyz::new(x, y, z)
}

fn xyz_to_display_p3(xyz: Xyz) -> [f64; 3] {
    let [r, g, b] = multiply(&XYZ_TO_LINEAR_DISPLAY_P3, &[xyz.x, xyz.y, xyz.z]);
    let encoded = Srgb::from_linear(LinearRgb::new(r, g, b));
    [encoded.red, encoded.green, encoded.blue]
}

// --------------------------------------------------------------------------------------------------------------------

/// Below this magnitude of both a and b, Oklab colors count as achromatic.
const OK_ACHROMATIC: f64 = 0.0002;
/// Below this magnitude of both a and b, Lab colors count as achromatic.
const LAB_ACHROMATIC: f64 = 0.02;

/// Convert Oklch coordinates to Oklab. A missing hue yields a gray.
pub(crate) fn oklch_to_oklab(value: &[f64; 3]) -> [f64; 3] {
    let oklab = to_oklab(value);
    [oklab.l, oklab.a, oklab.b]
}

fn to_oklab(value: &[f64; 3]) -> Oklab {
    let [l, chroma, hue] = *value;
    if hue.is_nan() {
        Oklab::new(l, 0.0, 0.0)
    } else {
        Oklab::from_color_unclamped(Oklch::new(l, chroma, hue))
    }
}

fn to_lab(value: &[f64; 3]) -> Lab {
    let [l, chroma, hue] = *value;
    if hue.is_nan() {
        Lab::new(l, 0.0, 0.0)
    } else {
        Lab::from_color_unclamped(Lch::new(l, chroma, hue))
    }
}

fn oklch_of(oklab: Oklab) -> [f64; 3] {
    if oklab.a.abs() < OK_ACHROMATIC && oklab.b.abs() < OK_ACHROMATIC {
        return [oklab.l, 0.0, f64::NAN];
    }
    let oklch = Oklch::from_color_unclamped(oklab);
    [oklch.l, oklch.chroma, oklch.hue.into_degrees().rem_euclid(360.0)]
}

fn lch_of(lab: Lab) -> [f64; 3] {
    if lab.a.abs() < LAB_ACHROMATIC && lab.b.abs() < LAB_ACHROMATIC {
        return [lab.l, 0.0, f64::NAN];
    }
    let lch = Lch::from_color_unclamped(lab);
    [lch.l, lch.chroma, lch.hue.into_degrees().rem_euclid(360.0)]
}

fn lab_of(xyz: Xyz) -> Lab {
    let d50: XyzD50 = xyz.adapt_into();
    Lab::from_color_unclamped(d50)
}

// --------------------------------------------------------------------------------------------------------------------

/// Convert coordinates in the given color space to XYZ D65. CIE Lab and LCH
/// are relative to D50 and adapted with the Bradford transform.
fn to_xyz(space: ColorSpace, value: &[f64; 3]) -> Xyz {
    let [c1, c2, c3] = *value;

    match space {
        ColorSpace::Srgb => Xyz::from_color_unclamped(Srgb::new(c1, c2, c3)),
        ColorSpace::DisplayP3 => display_p3_to_xyz(value),
        ColorSpace::Oklab => Xyz::from_color_unclamped(Oklab::new(c1, c2, c3)),
        ColorSpace::Oklch => Xyz::from_color_unclamped(to_oklab(value)),
        ColorSpace::Lab => XyzD50::from_color_unclamped(Lab::new(c1, c2, c3)).adapt_into(),
        ColorSpace::Lch => XyzD50::from_color_unclamped(to_lab(value)).adapt_into(),
        ColorSpace::Xyz => Xyz::new(c1, c2, c3),
        ColorSpace::XyzD50 => XyzD50::new(c1, c2, c3).adapt_into(),
    }
}

/// Convert XYZ D65 coordinates to the given color space.
fn from_xyz(space: ColorSpace, xyz: Xyz) -> [f64; 3] {
    match space {
        ColorSpace::Srgb => {
            let rgb = Srgb::from_color_unclamped(xyz);
            [rgb.red, rgb.green, rgb.blue]
        }
        ColorSpace::DisplayP3 => xyz_to_display_p3(xyz),
        ColorSpace::Oklab => {
            let oklab = Oklab::from_color_unclamped(xyz);
            [oklab.l, oklab.a, oklab.b]
        }
        ColorSpace::Oklch => oklch_of(Oklab::from_color_unclamped(xyz)),
        ColorSpace::Lab => {
            let lab = lab_of(xyz);
            [lab.l, lab.a, lab.b]
        }
        ColorSpace::Lch => lch_of(lab_of(xyz)),
        ColorSpace::Xyz => [xyz.x, xyz.y, xyz.z],
        ColorSpace::XyzD50 => {
            let d50: XyzD50 = xyz.adapt_into();
            [d50.x, d50.y, d50.z]
        }
    }
}

/// Convert the coordinates from one color space to another.
///
/// This function normalizes non-finite coordinates to zero and then converts
/// them to the targeted color space, which may be the same as the original
/// color space. Conversions between a Cartesian space and its polar form skip
/// the XYZ hub. This function does not check whether the result is in gamut.
pub(crate) fn convert(from_space: ColorSpace, to_space: ColorSpace, coordinates: &[f64; 3]) -> [f64; 3] {
    let coordinates = normalize(from_space, coordinates);
    if from_space == to_space {
        return coordinates;
    }

    let [c1, c2, c3] = coordinates;
    match (from_space, to_space) {
        (ColorSpace::Oklab, ColorSpace::Oklch) => oklch_of(Oklab::new(c1, c2, c3)),
        (ColorSpace::Oklch, ColorSpace::Oklab) => oklch_to_oklab(&coordinates),
        (ColorSpace::Lab, ColorSpace::Lch) => lch_of(Lab::new(c1, c2, c3)),
        (ColorSpace::Lch, ColorSpace::Lab) => {
            let lab = to_lab(&coordinates);
            [lab.l, lab.a, lab.b]
        }
        _ => from_xyz(to_space, to_xyz(from_space, &coordinates)),
    }
}

/// Convert sRGB coordinates to HSL, with hue in degrees and saturation and
/// lightness in `0..=1`. Achromatic colors have a not-a-number hue.
pub(crate) fn srgb_to_hsl(value: &[f64; 3]) -> [f64; 3] {
    let [r, g, b] = normalize(ColorSpace::Srgb, value);
    let hsl = Hsl::from_color_unclamped(Srgb::new(r, g, b));

    if hsl.saturation == 0.0 {
        return [f64::NAN, 0.0, hsl.lightness];
    }
    [
        hsl.hue.into_degrees().rem_euclid(360.0),
        hsl.saturation,
        hsl.lightness,
    ]
}

/// Convert HSL coordinates, with saturation and lightness in `0..=1`, to sRGB.
pub(crate) fn hsl_to_srgb(value: &[f64; 3]) -> [f64; 3] {
    let [h, s, l] = *value;
    let h = if h.is_finite() { h.rem_euclid(360.0) } else { 0.0 };
    let rgb = Srgb::from_color_unclamped(Hsl::new(h, s, l));
    [rgb.red, rgb.green, rgb.blue]
}
