//! Named centers for the geographic filter.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Center used for a custom location until the user enters coordinates.
pub const CUSTOM_DEFAULT_CENTER: (f64, f64) = (13.6929, -89.2182);

/// A predefined search center, or a user-entered one.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum LocationPreset {
    #[default]
    CentroSanSalvador,
    SantaTecla,
    AntiguoCuscatlan,
    Soyapango,
    Mejicanos,
    Custom,
}

impl LocationPreset {
    /// Returns all variants in selector order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::CentroSanSalvador,
            Self::SantaTecla,
            Self::AntiguoCuscatlan,
            Self::Soyapango,
            Self::Mejicanos,
            Self::Custom,
        ]
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CentroSanSalvador => "Centro de San Salvador",
            Self::SantaTecla => "Santa Tecla",
            Self::AntiguoCuscatlan => "Antiguo Cuscatlán",
            Self::Soyapango => "Soyapango",
            Self::Mejicanos => "Mejicanos",
            Self::Custom => "Personalizado",
        }
    }

    /// Fixed `(lat, lon)` of a named preset; `None` for [`Self::Custom`].
    #[must_use]
    pub const fn coordinates(self) -> Option<(f64, f64)> {
        match self {
            Self::CentroSanSalvador => Some((13.6929, -89.2182)),
            Self::SantaTecla => Some((13.6769, -89.2797)),
            Self::AntiguoCuscatlan => Some((13.6647, -89.2539)),
            Self::Soyapango => Some((13.7102, -89.1397)),
            Self::Mejicanos => Some((13.7250, -89.2119)),
            Self::Custom => None,
        }
    }
}
