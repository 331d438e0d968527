use super::conversion::{convert, normalize, oklch_to_oklab};
use super::ColorSpace;

/// Tolerance for float noise when testing RGB coordinates against `0..=1`.
const GAMUT_EPSILON: f64 = 0.000075;
/// Just noticeable difference in Oklab.
const JND: f64 = 0.02;
const EPSILON: f64 = 0.0001;

/// Compute the Euclidean distance between two Oklab colors.
#[allow(non_snake_case)]
pub(crate) fn delta_e_ok(coordinates1: &[f64; 3], coordinates2: &[f64; 3]) -> f64 {
    let [L1, a1, b1] = coordinates1;
    let [L2, a2, b2] = coordinates2;

    let dL = L1 - L2;
    let da = a1 - a2;
    let db = b1 - b2;

    dL.mul_add(dL, da.mul_add(da, db * db)).sqrt()
}

/// Determine whether the coordinates are in gamut for their color space.
pub(crate) fn in_gamut(space: ColorSpace, coordinates: &[f64; 3]) -> bool {
    if space.is_rgb() {
        coordinates
            .iter()
            .all(|c| -GAMUT_EPSILON <= *c && *c <= 1.0 + GAMUT_EPSILON)
    } else {
        true
    }
}

/// Clip the coordinates to the gamut of their color space.
pub(crate) fn clip(space: ColorSpace, coordinates: &[f64; 3]) -> [f64; 3] {
    if space.is_rgb() {
        let [r, g, b] = coordinates;
        [r.clamp(0.0, 1.0), g.clamp(0.0, 1.0), b.clamp(0.0, 1.0)]
    } else {
        *coordinates
    }
}

/// Map color coordinates into the gamut of the target color space.
///
/// This implements the CSS Color 4 gamut mapping algorithm: a binary search in
/// Oklch for a color with less chroma, at the same lightness and hue, whose
/// clipped version lies within a just noticeable difference of it. Lightness
/// at or beyond the ends of its range maps straight to white or black.
pub(crate) fn to_gamut(
    from_space: ColorSpace,
    to_space: ColorSpace,
    coordinates: &[f64; 3],
) -> [f64; 3] {
    use ColorSpace::*;

    let coordinates = normalize(from_space, coordinates);
    let target = convert(from_space, to_space, &coordinates);
    if !to_space.is_bounded() {
        return target;
    }

    let origin_as_oklch = convert(from_space, Oklch, &coordinates);
    let l = origin_as_oklch[0];
    if 1.0 <= l {
        return clip(to_space, &convert(Oklch, to_space, &[1.0, 0.0, f64::NAN]));
    }
    if l <= 0.0 {
        return clip(to_space, &convert(Oklch, to_space, &[0.0, 0.0, f64::NAN]));
    }

    if in_gamut(to_space, &target) {
        return clip(to_space, &target);
    }

    let mut current_as_oklch = origin_as_oklch;
    let mut clipped_as_target = clip(to_space, &target);

    let difference = delta_e_ok(
        &convert(to_space, Oklab, &clipped_as_target),
        &oklch_to_oklab(&current_as_oklch),
    );
    if difference < JND {
        return clipped_as_target;
    }

    let mut min = 0.0;
    let mut max = origin_as_oklch[1];
    let mut min_in_gamut = true;

    while EPSILON < max - min {
        let chroma = (min + max) / 2.0;
        current_as_oklch = [current_as_oklch[0], chroma, current_as_oklch[2]];

        let current_as_target = convert(Oklch, to_space, &current_as_oklch);

        if min_in_gamut && in_gamut(to_space, &current_as_target) {
            min = chroma;
            continue;
        }

        clipped_as_target = clip(to_space, &current_as_target);

        let difference = delta_e_ok(
            &convert(to_space, Oklab, &clipped_as_target),
            &oklch_to_oklab(&current_as_oklch),
        );

        if difference < JND {
            if JND - difference < EPSILON {
                return clipped_as_target;
            }
            min_in_gamut = false;
            min = chroma;
        } else {
            max = chroma;
        }
    }

    clipped_as_target
}
