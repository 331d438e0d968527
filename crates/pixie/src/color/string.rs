use super::conversion::{from_24bit, hsl_to_srgb, srgb_to_hsl, to_24bit};
use super::{Color, ColorSpace, FormatId};
use crate::error::{CoreError, CoreResult};

/// Lower-case the trimmed input and make sure it starts with `#`. This is
/// purely syntactic and does not check the digits.
pub fn normalize_hex(input: &str) -> String {
    let normalized = input.trim().to_lowercase();
    if normalized.starts_with('#') {
        normalized
    } else {
        format!("#{normalized}")
    }
}

/// Wrap a hue in degrees into `0..360`.
pub fn normalize_hue(value: f64) -> f64 {
    ((value % 360.0) + 360.0) % 360.0
}

/// Parse a 3 or 6 digit hexadecimal color, with or without the leading `#`.
pub fn parse_color(hex: &str) -> CoreResult<Color> {
    let [r, g, b] = parse_hashed(&normalize_hex(hex))
        .ok_or_else(|| CoreError::InvalidColorFormat(hex.to_string()))?;
    Ok(Color::new(ColorSpace::Srgb, from_24bit(r, g, b)))
}

fn parse_hashed(s: &str) -> Option<[u8; 3]> {
    let digits = s.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let factor = match digits.len() {
        3 => 1,
        6 => 2,
        _ => return None,
    };

    let coordinate = |index: usize| -> Option<u8> {
        let t = digits.get(factor * index..factor * (index + 1))?;
        let n = u8::from_str_radix(t, 16).ok()?;
        Some(if factor == 1 { 16 * n + n } else { n })
    };

    Some([coordinate(0)?, coordinate(1)?, coordinate(2)?])
}

// --------------------------------------------------------------------------------------------------------------------

/// How a CSS function's coordinates map onto color space coordinates.
#[derive(Clone, Copy)]
enum Function {
    Rgb,
    Hsl,
    Space(ColorSpace),
}

const FUNCTIONS: [(&str, Function); 8] = [
    ("rgb", Function::Rgb),
    ("hsl", Function::Hsl),
    ("oklch", Function::Space(ColorSpace::Oklch)),
    ("oklab", Function::Space(ColorSpace::Oklab)),
    ("lab", Function::Space(ColorSpace::Lab)),
    ("lch", Function::Space(ColorSpace::Lch)),
    ("color(display-p3", Function::Space(ColorSpace::DisplayP3)),
    ("color(srgb", Function::Space(ColorSpace::Srgb)),
];

/// The value `100%` stands for, per coordinate.
fn percent_scales(function: Function) -> [f64; 3] {
    use ColorSpace::*;
    match function {
        Function::Rgb => [255.0, 255.0, 255.0],
        Function::Hsl => [1.0, 100.0, 100.0],
        Function::Space(Oklab) => [1.0, 0.4, 0.4],
        Function::Space(Oklch) => [1.0, 0.4, 1.0],
        Function::Space(Lab) => [100.0, 125.0, 125.0],
        Function::Space(Lch) => [100.0, 150.0, 1.0],
        Function::Space(_) => [1.0, 1.0, 1.0],
    }
}

fn parse_coordinate(token: &str, scale: f64) -> Option<f64> {
    if token == "none" {
        return Some(f64::NAN);
    }

    let value = if let Some(percent) = token.strip_suffix('%') {
        percent.parse::<f64>().ok()? / 100.0 * scale
    } else {
        token.strip_suffix("deg").unwrap_or(token).parse::<f64>().ok()?
    };

    value.is_finite().then_some(value)
}

/// Parse the CSS functional notations this crate renders: `rgb()`, `hsl()`,
/// `oklch()`, `oklab()`, `lab()`, `lch()`, and `color()` with the
/// `display-p3` or `srgb` color space. Commas between coordinates are
/// accepted, alpha is not.
pub fn parse_css(input: &str) -> CoreResult<Color> {
    let invalid = || CoreError::InvalidColorFormat(input.to_string());
    let lowercase = input.trim().to_ascii_lowercase();
    let s = lowercase.as_str();

    let (function, rest) = FUNCTIONS
        .iter()
        .find_map(|(prefix, function)| s.strip_prefix(prefix).map(|rest| (*function, rest)))
        .ok_or_else(invalid)?;

    let body = match function {
        Function::Space(ColorSpace::DisplayP3 | ColorSpace::Srgb) => rest,
        _ => rest.trim_start().strip_prefix('(').ok_or_else(invalid)?,
    };
    let body = body.strip_suffix(')').ok_or_else(invalid)?;

    let scales = percent_scales(function);
    let mut tokens = body
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty());

    let mut coordinates = [0.0; 3];
    for (coordinate, scale) in coordinates.iter_mut().zip(scales) {
        let token = tokens.next().ok_or_else(invalid)?;
        *coordinate = parse_coordinate(token, scale).ok_or_else(invalid)?;
    }
    if tokens.next().is_some() {
        return Err(invalid());
    }

    Ok(match function {
        Function::Rgb => Color::new(
            ColorSpace::Srgb,
            coordinates.map(|c| if c.is_nan() { 0.0 } else { c / 255.0 }),
        ),
        Function::Hsl => {
            let [h, s, l] = coordinates;
            let scale = |value: f64| if value.is_nan() { 0.0 } else { value / 100.0 };
            Color::new(ColorSpace::Srgb, hsl_to_srgb(&[h, scale(s), scale(l)]))
        }
        Function::Space(space) => Color::new(space, coordinates),
    })
}

// --------------------------------------------------------------------------------------------------------------------

/// Round to the given number of significant digits, counting only the digits
/// of the integer part as significant when there are any. Small values keep
/// `precision` decimals. The result is never negative zero or not-a-number.
fn to_precision(value: f64, precision: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return 0.0;
    }

    let integer = value.trunc();
    let digits = if integer != 0.0 {
        integer.abs().log10().trunc() as i32 + 1
    } else {
        0
    };

    let shift = precision - digits;
    let rounded = if shift >= 0 {
        let multiplier = 10f64.powi(shift);
        (value * multiplier + 0.5).floor() / multiplier
    } else {
        let divisor = 10f64.powi(-shift);
        (value / divisor + 0.5).floor() * divisor
    };

    rounded + 0.0
}

fn number(value: f64, precision: i32) -> String {
    format!("{}", to_precision(value, precision))
}

fn hue(value: f64, chroma: f64, precision: i32) -> String {
    if value.is_nan() || chroma <= 0.0 {
        "none".to_string()
    } else {
        number(normalize_hue(to_precision(value, precision)), precision)
    }
}

fn hex(color: &Color) -> String {
    let [r, g, b] = to_24bit(color.to(ColorSpace::Srgb).coordinates());
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn rgb(color: &Color) -> String {
    let [r, g, b] = to_24bit(color.to(ColorSpace::Srgb).coordinates());
    format!("rgb({r}, {g}, {b})")
}

fn hsl(color: &Color) -> String {
    let srgb = color.to(ColorSpace::Srgb);
    let [h, s, l] = srgb_to_hsl(srgb.coordinates());

    let h = if h.is_nan() { 0.0 } else { h };
    let h = normalize_hue((normalize_hue(h) * 10.0).round() / 10.0);
    let s = s.clamp(0.0, 1.0) * 100.0 + 0.0;
    let l = l.clamp(0.0, 1.0) * 100.0 + 0.0;

    format!("hsl({h:.1} {s:.1}% {l:.1}%)")
}

/// Render lightness and two Cartesian coordinates.
fn cartesian(name: &str, color: &Color, space: ColorSpace, max: f64, precision: i32) -> String {
    let [l, a, b] = *color.to(space).coordinates();
    format!(
        "{name}({} {} {})",
        number(l.clamp(0.0, max), precision),
        number(a, precision),
        number(b, precision)
    )
}

/// Render lightness, chroma, and hue.
fn polar(name: &str, color: &Color, space: ColorSpace, max: f64, precision: i32) -> String {
    let [l, c, h] = *color.to(space).coordinates();
    let c = to_precision(c.max(0.0), precision);
    format!(
        "{name}({} {} {})",
        number(l.clamp(0.0, max), precision),
        c,
        hue(h, c, precision)
    )
}

fn display_p3(color: &Color) -> String {
    let [r, g, b] = *color.to(ColorSpace::DisplayP3).coordinates();
    format!(
        "color(display-p3 {} {} {})",
        number(r, 4),
        number(g, 4),
        number(b, 4)
    )
}

/// Render the color in the given format.
///
/// `hex` and `rgb` clamp channels into `0..=255`. `hsl` uses one decimal. The
/// Oklab family uses 4 significant digits and CIE Lab/LCH use 3, with each
/// space's native ranges. An achromatic hue renders as `none`.
pub(crate) fn render(color: &Color, format: FormatId) -> String {
    match format {
        FormatId::Hex => hex(color),
        FormatId::Rgb => rgb(color),
        FormatId::Hsl => hsl(color),
        FormatId::Oklch => polar("oklch", color, ColorSpace::Oklch, 1.0, 4),
        FormatId::Oklab => cartesian("oklab", color, ColorSpace::Oklab, 1.0, 4),
        FormatId::Lab => cartesian("lab", color, ColorSpace::Lab, 100.0, 3),
        FormatId::Lch => polar("lch", color, ColorSpace::Lch, 100.0, 3),
        FormatId::P3 => display_p3(color),
    }
}
