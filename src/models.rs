//! Data models for flocks, profiles and feed recommendations

use std::fmt;

use serde::{Deserialize, Serialize};

/// Defines a categorical flock attribute that parses from snake_case text and
/// never fails: unknown text is kept in an `Other` variant.
macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            /// Unrecognized value, kept verbatim
            Other(String),
        }

        impl $name {
            /// Parse a value, case-insensitively, accepting `-` or space for `_`
            pub fn parse(value: &str) -> Self {
                let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
                match normalized.as_str() {
                    $($text => Self::$variant,)+
                    _ => Self::Other(value.trim().to_string()),
                }
            }

            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $text,)+
                    Self::Other(raw) => raw,
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::parse(s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

categorical! {
    /// Chicken breed
    Breed {
        Leghorn => "leghorn",
        RhodeIsland => "rhode_island",
        Orpington => "orpington",
        Sussex => "sussex",
        PlymouthRock => "plymouth_rock",
        Brahma => "brahma",
    }
}

categorical! {
    /// Current flock health condition
    Health {
        Healthy => "healthy",
        Respiratory => "respiratory",
        Digestive => "digestive",
        Parasites => "parasites",
    }
}

categorical! {
    /// Housing system
    Environment {
        FreeRange => "free_range",
        Barn => "barn",
        Battery => "battery",
        Organic => "organic",
    }
}

categorical! {
    Season {
        Summer => "summer",
        Winter => "winter",
        Spring => "spring",
        Autumn => "autumn",
    }
}

categorical! {
    /// What the flock is kept for
    Purpose {
        Eggs => "eggs",
        Meat => "meat",
        Dual => "dual",
    }
}

categorical! {
    StressLevel {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

categorical! {
    /// Kind of feed being bought or mixed
    FeedType {
        Commercial => "commercial",
        Homemade => "homemade",
        Mixed => "mixed",
    }
}

categorical! {
    Vaccination {
        Vaccinated => "vaccinated",
        Partial => "partial",
        Unvaccinated => "unvaccinated",
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::Healthy
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::Barn
    }
}

impl Default for Season {
    fn default() -> Self {
        Self::Spring
    }
}

impl Default for Purpose {
    fn default() -> Self {
        Self::Eggs
    }
}

impl Default for StressLevel {
    fn default() -> Self {
        Self::Low
    }
}

impl Default for FeedType {
    fn default() -> Self {
        Self::Commercial
    }
}

impl Default for Vaccination {
    fn default() -> Self {
        Self::Unvaccinated
    }
}

pub const DEFAULT_LIGHT_HOURS: f64 = 16.0;

/// Validated flock parameters, the only input the engine accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlockParameters {
    pub breed: Breed,
    pub age_weeks: u32,
    pub weight_kg: f64,
    pub quantity: u32,
    #[serde(default)]
    pub health: Health,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub season: Season,
    #[serde(default)]
    pub purpose: Purpose,
    #[serde(default)]
    pub stress_level: StressLevel,
    #[serde(default)]
    pub feed_type: FeedType,
    #[serde(default = "default_light_hours")]
    pub light_hours: f64,
    #[serde(default)]
    pub molting: bool,
    #[serde(default)]
    pub vaccination: Vaccination,
}

fn default_light_hours() -> f64 {
    DEFAULT_LIGHT_HOURS
}

/// A named, saved set of flock parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub params: FlockParameters,
}

/// Listing row for saved profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub name: String,
    pub breed: Breed,
    pub age_weeks: u32,
    pub quantity: u32,
    pub updated_at: Option<String>,
}

/// Which amount/schedule policy the engine applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FeedPolicy {
    /// Age-band formula with breed factor (form submit path)
    #[default]
    Standard,
    /// Standard amount refined by environment, season, stress, light and molting
    Precise,
}

impl fmt::Display for FeedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Precise => f.write_str("precise"),
        }
    }
}

/// Feed price per kilogram by feed type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedPrices {
    pub commercial: f64,
    pub homemade: f64,
    pub mixed: f64,
}

impl Default for FeedPrices {
    fn default() -> Self {
        Self {
            commercial: 0.80,
            homemade: 0.50,
            mixed: 0.65,
        }
    }
}

impl FeedPrices {
    /// Unknown feed types are priced as commercial feed
    pub fn price_for(&self, feed_type: &FeedType) -> f64 {
        match feed_type {
            FeedType::Homemade => self.homemade,
            FeedType::Mixed => self.mixed,
            FeedType::Commercial | FeedType::Other(_) => self.commercial,
        }
    }
}

/// Nutrient composition, in percent of the ration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedAmounts {
    /// Grams per bird per day
    pub amount_per_chicken: f64,
    /// Kilograms per day for the whole flock
    pub total_amount_kg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterNeeds {
    pub per_bird_ml: f64,
    pub total_water_l: f64,
    /// Grams of water per gram of feed
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EggProduction {
    /// Eggs per day for the flock
    pub egg_production: f64,
    /// Percent of the flock laying per day
    pub laying_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedCosts {
    pub price_per_kg: f64,
    pub daily_cost: f64,
    pub monthly_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthProjection {
    /// Kilograms after four more weeks
    pub projected_weight: f64,
    /// Grams per day
    pub daily_gain: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedConversion {
    /// Kilograms of feed per egg
    pub feed_per_egg: f64,
    pub feed_efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EggQuality {
    pub egg_size_g: u32,
    pub yolk_color: String,
    pub shell_strength: String,
}

/// Full output of the recommendation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResult {
    pub policy: FeedPolicy,
    pub nutrition: Nutrition,
    pub amounts: FeedAmounts,
    pub feeding_times: Vec<String>,
    pub water: WaterNeeds,
    pub supplements: Vec<String>,
    pub eggs: Option<EggProduction>,
    pub costs: FeedCosts,
    pub growth: Option<GrowthProjection>,
    pub conversion: Option<FeedConversion>,
    pub egg_quality: Option<EggQuality>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_case_and_separators() {
        assert_eq!(Breed::parse("Rhode-Island"), Breed::RhodeIsland);
        assert_eq!(Environment::parse("free range"), Environment::FreeRange);
        assert_eq!(Season::parse(" WINTER "), Season::Winter);
    }

    #[test]
    fn unknown_values_are_kept_verbatim() {
        let breed = Breed::parse("Silkie");
        assert_eq!(breed, Breed::Other("Silkie".to_string()));
        assert_eq!(breed.to_string(), "Silkie");
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: FlockParameters = serde_json::from_str(
            r#"{"breed":"leghorn","ageWeeks":10,"weightKg":1.2,"quantity":50}"#,
        )
        .unwrap();
        assert_eq!(params.health, Health::Healthy);
        assert_eq!(params.feed_type, FeedType::Commercial);
        assert_eq!(params.light_hours, DEFAULT_LIGHT_HOURS);
        assert!(!params.molting);
    }

    #[test]
    fn unknown_feed_type_is_priced_as_commercial() {
        let prices = FeedPrices::default();
        assert_eq!(prices.price_for(&FeedType::parse("pellets")), 0.80);
        assert_eq!(prices.price_for(&FeedType::Mixed), 0.65);
    }
}
