//! Feed recommendation engine
//!
//! Maps validated flock parameters to nutrition, feed amounts, schedule,
//! water, supplements, egg, cost, growth and conversion figures. Every
//! function here is pure: no I/O, no clock, no randomness.
//!
//! Two amount/schedule policies share the rest of the pipeline:
//! [`FeedPolicy::Standard`] is the age-band formula with a breed factor, and
//! [`FeedPolicy::Precise`] refines that amount with environment, season,
//! stress, light and molting factors and spreads meals across the lit day.
//! They disagree for most inputs; [`compare_policies`] reports by how much.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{
    Breed, EggProduction, EggQuality, Environment, FeedAmounts, FeedConversion, FeedCosts,
    FeedPolicy, FeedPrices, FeedType, FlockParameters, GrowthProjection, Health, Nutrition,
    RecommendationResult, Season, StressLevel, WaterNeeds,
};

/// Grams of water per gram of feed
pub const DEFAULT_WATER_RATIO: f64 = 2.0;

/// Age (weeks) from which eggs, conversion and egg quality are reported
pub const LAYING_AGE_WEEKS: u32 = 18;

/// Age (weeks) below which a growth projection is reported
pub const GROWTH_CUTOFF_WEEKS: u32 = 20;

const PROJECTION_DAYS: f64 = 28.0;
const MIN_BASE_LAYING_RATE: f64 = 30.0;

/// Fully resolved engine settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    pub policy: FeedPolicy,
    pub water_ratio: f64,
    pub feed_prices: FeedPrices,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            policy: FeedPolicy::Standard,
            water_ratio: DEFAULT_WATER_RATIO,
            feed_prices: FeedPrices::default(),
        }
    }
}

/// Optional caller overrides layered over [`EngineOptions`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    pub water_ratio: Option<f64>,
    pub feed_prices: Option<FeedPrices>,
    pub policy: Option<FeedPolicy>,
}

impl EngineOptions {
    /// Apply overrides. Negative or non-finite numbers are ignored so the
    /// engine never produces NaN.
    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(ratio) = overrides.water_ratio.filter(|r| usable(*r)) {
            self.water_ratio = ratio;
        }
        if let Some(prices) = overrides.feed_prices {
            self.feed_prices = FeedPrices {
                commercial: usable_or(prices.commercial, self.feed_prices.commercial),
                homemade: usable_or(prices.homemade, self.feed_prices.homemade),
                mixed: usable_or(prices.mixed, self.feed_prices.mixed),
            };
        }
        if let Some(policy) = overrides.policy {
            self.policy = policy;
        }
        self
    }
}

fn usable(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn usable_or(value: f64, fallback: f64) -> f64 {
    if usable(value) { value } else { fallback }
}

/// Compute a recommendation with default settings plus `overrides`
pub fn compute_recommendation(params: &FlockParameters, overrides: &Overrides) -> RecommendationResult {
    compute_with_options(params, &EngineOptions::default().with_overrides(overrides))
}

/// Compute a recommendation with fully resolved settings
pub fn compute_with_options(params: &FlockParameters, options: &EngineOptions) -> RecommendationResult {
    let amount_per_chicken = round_to(feed_amount_grams(params, options.policy), 1);
    let total_amount_kg = round_to(amount_per_chicken * f64::from(params.quantity) / 1000.0, 1);
    let supplements = supplements(params);

    let eggs = egg_production(params);
    let conversion = eggs.map(|e| feed_conversion(amount_per_chicken, e.laying_rate));
    let egg_quality = eggs.map(|_| egg_quality(params, &supplements));

    RecommendationResult {
        policy: options.policy,
        nutrition: nutrition(params),
        amounts: FeedAmounts {
            amount_per_chicken,
            total_amount_kg,
        },
        feeding_times: feeding_times(params, options.policy),
        water: water_needs(amount_per_chicken, params.quantity, options.water_ratio),
        supplements,
        eggs,
        costs: feed_costs(total_amount_kg, &params.feed_type, &options.feed_prices),
        growth: growth_projection(params),
        conversion,
        egg_quality,
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Base nutrient composition for the age band, then breed and health deltas
pub fn nutrition(params: &FlockParameters) -> Nutrition {
    let mut n = match params.age_weeks {
        0..8 => Nutrition {
            protein: 20.0,
            carbs: 50.0,
            fats: 5.0,
            fiber: 3.0,
        },
        8..20 => Nutrition {
            protein: 18.0,
            carbs: 55.0,
            fats: 4.0,
            fiber: 4.0,
        },
        _ => Nutrition {
            protein: 16.0,
            carbs: 60.0,
            fats: 3.0,
            fiber: 5.0,
        },
    };

    match params.breed {
        Breed::RhodeIsland | Breed::Orpington => {
            n.protein += 1.0;
            n.fats += 0.5;
        }
        Breed::Leghorn => n.protein -= 1.0,
        _ => {}
    }

    match params.health {
        Health::Respiratory => n.protein += 1.0,
        Health::Digestive => n.fiber += 2.0,
        Health::Parasites => n.protein += 0.5,
        _ => {}
    }

    n
}

fn breed_factor(breed: &Breed) -> f64 {
    match breed {
        Breed::RhodeIsland | Breed::Orpington => 1.1,
        Breed::Leghorn => 0.9,
        _ => 1.0,
    }
}

/// Age-band grams per bird per day times the breed factor, unrounded
pub fn standard_feed_amount(params: &FlockParameters) -> f64 {
    let age = f64::from(params.age_weeks);
    let base = match params.age_weeks {
        0..8 => 30.0 + age * 5.0,
        8..20 => 70.0 + (age - 8.0) * 2.0,
        _ => 110.0 + params.weight_kg * 5.0,
    };
    base * breed_factor(&params.breed)
}

/// Standard amount refined by housing, season, stress, day length and molt, unrounded
pub fn precise_feed_amount(params: &FlockParameters) -> f64 {
    let environment = match params.environment {
        Environment::FreeRange => 1.10,
        Environment::Organic => 1.05,
        Environment::Battery => 0.95,
        _ => 1.0,
    };
    let season = match params.season {
        Season::Winter => 1.10,
        Season::Summer => 0.90,
        _ => 1.0,
    };
    let stress = match params.stress_level {
        StressLevel::High => 0.95,
        StressLevel::Medium => 0.98,
        _ => 1.0,
    };
    let light = if params.age_weeks >= LAYING_AGE_WEEKS {
        if params.light_hours < 14.0 {
            0.95
        } else if params.light_hours > 16.0 {
            1.05
        } else {
            1.0
        }
    } else {
        1.0
    };
    let molting = if params.molting { 0.85 } else { 1.0 };

    standard_feed_amount(params) * environment * season * stress * light * molting
}

fn feed_amount_grams(params: &FlockParameters, policy: FeedPolicy) -> f64 {
    match policy {
        FeedPolicy::Standard => standard_feed_amount(params),
        FeedPolicy::Precise => precise_feed_amount(params),
    }
}

/// Fixed schedule by age band
pub fn standard_feeding_times(params: &FlockParameters) -> Vec<String> {
    let times: &[&str] = match params.age_weeks {
        0..4 => &["07:00", "12:00", "17:00"],
        4..12 => &["07:30", "16:00"],
        _ if params.weight_kg > 2.0 => &["08:00", "15:00"],
        _ => &["08:00"],
    };
    times.iter().map(|t| t.to_string()).collect()
}

/// Same meal count as the standard schedule, spread across the lit day
pub fn optimal_feeding_times(params: &FlockParameters) -> Vec<String> {
    let meals = standard_feeding_times(params).len();
    let half_day = params.light_hours.clamp(0.0, 24.0) * 30.0;
    let first = 720.0 - half_day + 30.0;
    let last = 720.0 + half_day - 60.0;

    let mut times: Vec<String> = Vec::with_capacity(meals);
    for i in 0..meals {
        let minute = if meals == 1 || last <= first {
            first
        } else {
            first + (last - first) * i as f64 / (meals - 1) as f64
        };
        let time = format_minutes(minute);
        if !times.contains(&time) {
            times.push(time);
        }
    }
    times
}

fn format_minutes(minute: f64) -> String {
    let snapped = ((minute / 5.0).round() * 5.0).clamp(0.0, 1435.0) as u32;
    format!("{:02}:{:02}", snapped / 60, snapped % 60)
}

fn feeding_times(params: &FlockParameters, policy: FeedPolicy) -> Vec<String> {
    match policy {
        FeedPolicy::Standard => standard_feeding_times(params),
        FeedPolicy::Precise => optimal_feeding_times(params),
    }
}

pub fn water_needs(amount_per_chicken: f64, quantity: u32, ratio: f64) -> WaterNeeds {
    let per_bird = amount_per_chicken * ratio;
    WaterNeeds {
        per_bird_ml: round_to(per_bird, 1),
        total_water_l: round_to(per_bird * f64::from(quantity) / 1000.0, 1),
        ratio,
    }
}

/// Age and health driven supplements, in rule order without duplicates
pub fn supplements(params: &FlockParameters) -> Vec<String> {
    let mut list: Vec<&str> = Vec::new();
    if params.age_weeks < 8 {
        list.extend(["Vitamin D3", "Probiotics"]);
    }
    if params.age_weeks >= LAYING_AGE_WEEKS {
        list.extend(["Calcium 3–4%", "Fish oil 1%"]);
    }
    match params.health {
        Health::Respiratory => list.extend(["Vitamin C", "Garlic powder 0.5%"]),
        Health::Digestive => list.extend(["Probiotics", "Bentonite clay"]),
        _ => {}
    }

    let mut unique: Vec<String> = Vec::with_capacity(list.len());
    for item in list {
        if !unique.iter().any(|u| u == item) {
            unique.push(item.to_string());
        }
    }
    unique
}

/// Laying rate and daily eggs; `None` below laying age
pub fn egg_production(params: &FlockParameters) -> Option<EggProduction> {
    if params.age_weeks < LAYING_AGE_WEEKS {
        return None;
    }

    let weeks_past_onset = f64::from(params.age_weeks - LAYING_AGE_WEEKS);
    let mut rate = (80.0 - weeks_past_onset).max(MIN_BASE_LAYING_RATE);

    if params.breed == Breed::Leghorn {
        rate += 10.0;
    }
    if params.health != Health::Healthy {
        rate -= 10.0;
    }
    if params.environment == Environment::FreeRange {
        rate += 5.0;
    }
    if params.season == Season::Winter {
        rate -= 5.0;
    }
    if params.stress_level == StressLevel::High {
        rate -= 15.0;
    }
    let rate = rate.clamp(0.0, 100.0);

    Some(EggProduction {
        egg_production: round_to(f64::from(params.quantity) * rate / 100.0, 1),
        laying_rate: rate,
    })
}

pub fn feed_costs(total_amount_kg: f64, feed_type: &FeedType, prices: &FeedPrices) -> FeedCosts {
    costs_at_price(total_amount_kg, prices.price_for(feed_type))
}

/// Daily and 30-day cost, each rounded to cents
pub fn costs_at_price(total_amount_kg: f64, price_per_kg: f64) -> FeedCosts {
    let daily_cost = round_to(total_amount_kg * price_per_kg, 2);
    FeedCosts {
        price_per_kg,
        daily_cost,
        monthly_cost: round_to(daily_cost * 30.0, 2),
    }
}

/// Four-week weight projection; `None` from the growth cutoff on
pub fn growth_projection(params: &FlockParameters) -> Option<GrowthProjection> {
    if params.age_weeks >= GROWTH_CUTOFF_WEEKS {
        return None;
    }

    let mut daily_gain = if params.breed == Breed::Leghorn { 8.0 } else { 10.0 };
    if params.environment == Environment::FreeRange {
        daily_gain -= 1.0;
    }
    if params.stress_level == StressLevel::High {
        daily_gain -= 2.0;
    }

    Some(GrowthProjection {
        projected_weight: round_to(params.weight_kg + daily_gain * PROJECTION_DAYS / 1000.0, 2),
        daily_gain,
    })
}

/// Feed per egg (kg) and efficiency score; both zero when nothing is laid
pub fn feed_conversion(amount_per_chicken: f64, laying_rate: f64) -> FeedConversion {
    if laying_rate <= 0.0 {
        return FeedConversion {
            feed_per_egg: 0.0,
            feed_efficiency: 0.0,
        };
    }
    let grams_per_egg = amount_per_chicken / (laying_rate / 100.0);
    FeedConversion {
        feed_per_egg: round_to(grams_per_egg / 1000.0, 3),
        feed_efficiency: round_to(100.0 - grams_per_egg / 1.5 * 100.0, 1),
    }
}

pub fn egg_quality(params: &FlockParameters, supplements: &[String]) -> EggQuality {
    let egg_size_g = if params.breed == Breed::Leghorn { 60 } else { 65 };

    let free_range = params.environment == Environment::FreeRange;
    let yolk_color = if free_range && params.season == Season::Summer {
        "Very strong"
    } else if free_range {
        "Strong"
    } else if params.feed_type == FeedType::Homemade {
        "Medium to strong"
    } else {
        "Medium"
    };

    let shell_strength = if supplements.iter().any(|s| s.starts_with("Calcium")) {
        "Strong"
    } else {
        "Normal"
    };

    EggQuality {
        egg_size_g,
        yolk_color: yolk_color.to_string(),
        shell_strength: shell_strength.to_string(),
    }
}

/// Side-by-side view of the two policies for one flock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyComparison {
    pub standard_amount: f64,
    pub precise_amount: f64,
    pub delta_grams: f64,
    pub delta_percent: f64,
    pub standard_times: Vec<String>,
    pub precise_times: Vec<String>,
    pub diverges: bool,
}

pub fn compare_policies(params: &FlockParameters, options: &EngineOptions) -> PolicyComparison {
    let standard = compute_with_options(params, &EngineOptions { policy: FeedPolicy::Standard, ..*options });
    let precise = compute_with_options(params, &EngineOptions { policy: FeedPolicy::Precise, ..*options });

    let standard_amount = standard.amounts.amount_per_chicken;
    let precise_amount = precise.amounts.amount_per_chicken;
    let delta_grams = round_to(precise_amount - standard_amount, 1);
    let delta_percent = if standard_amount > 0.0 {
        round_to(delta_grams / standard_amount * 100.0, 1)
    } else {
        0.0
    };
    let diverges = delta_grams.abs() >= 0.1 || standard.feeding_times != precise.feeding_times;

    PolicyComparison {
        standard_amount,
        precise_amount,
        delta_grams,
        delta_percent,
        standard_times: standard.feeding_times,
        precise_times: precise.feeding_times,
        diverges,
    }
}

impl fmt::Display for RecommendationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Feed Recommendation ({}) ===", self.policy)?;
        writeln!(f)?;

        writeln!(f, "Nutrition:")?;
        writeln!(f, "  Protein: {:.1}%", self.nutrition.protein)?;
        writeln!(f, "  Carbs:   {:.1}%", self.nutrition.carbs)?;
        writeln!(f, "  Fats:    {:.1}%", self.nutrition.fats)?;
        writeln!(f, "  Fiber:   {:.1}%", self.nutrition.fiber)?;
        writeln!(f)?;

        writeln!(f, "Feed:")?;
        writeln!(f, "  Per bird: {:.1} g/day", self.amounts.amount_per_chicken)?;
        writeln!(f, "  Flock:    {:.1} kg/day", self.amounts.total_amount_kg)?;
        writeln!(f, "  Times:    {}", self.feeding_times.join(", "))?;
        writeln!(f)?;

        writeln!(f, "Water:")?;
        writeln!(f, "  Per bird: {:.1} ml/day", self.water.per_bird_ml)?;
        writeln!(f, "  Flock:    {:.1} L/day (ratio {})", self.water.total_water_l, self.water.ratio)?;
        writeln!(f)?;

        if !self.supplements.is_empty() {
            writeln!(f, "Supplements:")?;
            for s in &self.supplements {
                writeln!(f, "  {}", s)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Cost ({:.2}/kg):", self.costs.price_per_kg)?;
        writeln!(f, "  Daily:   {:.2}", self.costs.daily_cost)?;
        writeln!(f, "  Monthly: {:.2}", self.costs.monthly_cost)?;

        if let Some(eggs) = &self.eggs {
            writeln!(f)?;
            writeln!(f, "Eggs:")?;
            writeln!(f, "  Laying rate: {:.0}%", eggs.laying_rate)?;
            writeln!(f, "  Per day:     {:.1}", eggs.egg_production)?;
        }
        if let Some(conversion) = &self.conversion {
            writeln!(f, "  Feed/egg:    {:.3} kg", conversion.feed_per_egg)?;
            writeln!(f, "  Efficiency:  {:.1}", conversion.feed_efficiency)?;
        }
        if let Some(quality) = &self.egg_quality {
            writeln!(f, "  Egg size:    {} g", quality.egg_size_g)?;
            writeln!(f, "  Yolk color:  {}", quality.yolk_color)?;
            writeln!(f, "  Shell:       {}", quality.shell_strength)?;
        }

        if let Some(growth) = &self.growth {
            writeln!(f)?;
            writeln!(f, "Growth:")?;
            writeln!(f, "  Daily gain: {:.0} g", growth.daily_gain)?;
            writeln!(f, "  In 4 weeks: {:.2} kg", growth.projected_weight)?;
        }

        Ok(())
    }
}

impl fmt::Display for PolicyComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Policy Comparison ===")?;
        writeln!(f, "{:<10} {:>10} {}", "Policy", "g/bird", "Times")?;
        writeln!(f, "{}", "-".repeat(40))?;
        writeln!(f, "{:<10} {:>10.1} {}", "standard", self.standard_amount, self.standard_times.join(", "))?;
        writeln!(f, "{:<10} {:>10.1} {}", "precise", self.precise_amount, self.precise_times.join(", "))?;
        writeln!(f)?;
        write!(f, "Delta: {:+.1} g ({:+.1}%)", self.delta_grams, self.delta_percent)?;
        if self.diverges {
            write!(f, " - policies disagree")?;
        }
        writeln!(f)
    }
}
