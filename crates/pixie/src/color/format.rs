use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Output format a picked color can be rendered in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FormatId {
    #[default]
    Hex,
    Rgb,
    Hsl,
    Oklch,
    Oklab,
    Lab,
    Lch,
    P3,
}

impl FormatId {
    /// Every format, in display order.
    pub const ALL: [FormatId; 8] = [
        FormatId::Hex,
        FormatId::Rgb,
        FormatId::Hsl,
        FormatId::Oklch,
        FormatId::Oklab,
        FormatId::Lab,
        FormatId::Lch,
        FormatId::P3,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            FormatId::Hex => "hex",
            FormatId::Rgb => "rgb",
            FormatId::Hsl => "hsl",
            FormatId::Oklch => "oklch",
            FormatId::Oklab => "oklab",
            FormatId::Lab => "lab",
            FormatId::Lch => "lch",
            FormatId::P3 => "p3",
        }
    }

    /// Human-readable label for menus and toasts.
    pub const fn label(&self) -> &'static str {
        match self {
            FormatId::Hex => "HEX",
            FormatId::Rgb => "RGB",
            FormatId::Hsl => "HSL",
            FormatId::Oklch => "OKLCH",
            FormatId::Oklab => "OKLab",
            FormatId::Lab => "Lab",
            FormatId::Lch => "LCH",
            FormatId::P3 => "Display-P3",
        }
    }

    /// Parse a persisted format id, yielding `None` for anything outside the
    /// current set.
    pub fn from_value(value: &serde_json::Value) -> Option<FormatId> {
        value.as_str().and_then(|raw| raw.parse().ok())
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatId::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| CoreError::InvalidColorFormat(format!("unknown format id {s}")))
    }
}

/// The rendering of one color in every [`FormatId`].
///
/// Each format is a required field, so a snapshot can never be partial.
/// Deserialization rejects snapshots with missing or extra keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatSnapshot {
    pub hex: String,
    pub rgb: String,
    pub hsl: String,
    pub oklch: String,
    pub oklab: String,
    pub lab: String,
    pub lch: String,
    pub p3: String,
}

impl FormatSnapshot {
    /// Build a snapshot by rendering every format with `render`.
    pub fn from_fn(mut render: impl FnMut(FormatId) -> String) -> Self {
        Self {
            hex: render(FormatId::Hex),
            rgb: render(FormatId::Rgb),
            hsl: render(FormatId::Hsl),
            oklch: render(FormatId::Oklch),
            oklab: render(FormatId::Oklab),
            lab: render(FormatId::Lab),
            lch: render(FormatId::Lch),
            p3: render(FormatId::P3),
        }
    }

    pub fn get(&self, format: FormatId) -> &str {
        match format {
            FormatId::Hex => &self.hex,
            FormatId::Rgb => &self.rgb,
            FormatId::Hsl => &self.hsl,
            FormatId::Oklch => &self.oklch,
            FormatId::Oklab => &self.oklab,
            FormatId::Lab => &self.lab,
            FormatId::Lch => &self.lch,
            FormatId::P3 => &self.p3,
        }
    }

    /// Iterate over `(format, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (FormatId, &str)> + '_ {
        FormatId::ALL.into_iter().map(move |format| (format, self.get(format)))
    }
}
