use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Production source a generation series is reported for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum GenerationKind {
    Solar,
    WindOnshore,
    WindOffshore,
}

/// Quantity being served, independent of whether it is measured or forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Load,
    Generation(GenerationKind),
}

impl Metric {
    pub fn all() -> Vec<Metric> {
        std::iter::once(Metric::Load)
            .chain(GenerationKind::iter().map(Metric::Generation))
            .collect()
    }

    /// Short name used for cache files and log fields (`load`, `solar`, ...).
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Load => "load",
            Metric::Generation(GenerationKind::Solar) => "solar",
            Metric::Generation(GenerationKind::WindOnshore) => "windOnshore",
            Metric::Generation(GenerationKind::WindOffshore) => "windOffshore",
        }
    }

    /// Path segment on the upstream gateway.
    pub fn upstream_path(&self) -> String {
        match self {
            Metric::Load => "load".to_string(),
            Metric::Generation(kind) => format!("generation/{kind}"),
        }
    }

    /// Cache database name for one horizon, e.g. `loadHistory` or `solarForecast`.
    pub fn store_name(&self, horizon: Horizon) -> String {
        let suffix = match horizon {
            Horizon::History => "History",
            Horizon::Forecast => "Forecast",
        };
        format!("{}{}", self.name(), suffix)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a range has already happened (measured) or not yet (forecast).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Horizon {
    History,
    Forecast,
}

/// European bidding zone / control area, by its short code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Region {
    AL,
    AT,
    BA,
    BE,
    BG,
    BY,
    CH,
    CZ,
    DE,
    DK,
    EE,
    ES,
    FI,
    FR,
    GB,
    GBNIR,
    GR,
    HR,
    HU,
    IE,
    IT,
    LT,
    LU,
    LV,
    ME,
    MK,
    MT,
    NL,
    NO,
    PL,
    PT,
    RO,
    RS,
    RU,
    RUKGD,
    SE,
    SI,
    SK,
    TR,
    UA,
    DEATLU,
}
