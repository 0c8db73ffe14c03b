//! Small closed enums shared by the client and the server.

use serde::{Deserialize, Serialize};

/// How the product listing is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    /// The other layout.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Grid => Self::List,
            Self::List => Self::Grid,
        }
    }
}

/// Why a product appears in a recommendation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationReason {
    /// Supplied by the server.
    Base,
    /// Viewed in the same browsing session as the focal product.
    CoViewed,
    /// Same category, ranked by popularity.
    Similar,
    /// Same category, boosted when close in price.
    Trending,
}

impl RecommendationReason {
    /// Label shown next to the recommendation.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Base => "recommended",
            Self::CoViewed => "co-viewed",
            Self::Similar => "similar",
            Self::Trending => "trending",
        }
    }
}

/// Boiler output class derived from the rated power in kilowatts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PowerLevel {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl PowerLevel {
    /// Classify a rated power string ("24", "35" ...).
    ///
    /// Up to 20 kW is low, up to 30 kW medium, anything above high.
    #[must_use]
    pub fn from_power(power: &str) -> Self {
        match power.trim().parse::<u32>() {
            Ok(kw) if kw <= 20 => Self::Low,
            Ok(kw) if kw <= 30 => Self::Medium,
            Ok(_) => Self::High,
            Err(_) => Self::Unknown,
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for PowerLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
