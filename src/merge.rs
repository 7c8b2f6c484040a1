//! Merging remote calculations into local recommendations
//!
//! The Bedrock service returns its own figures for the same flock. A remote
//! value is only trusted when it is present and non-zero; otherwise the local
//! engine's number is used, and anything derived from it is recomputed.

use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::calculator::{costs_at_price, feed_conversion, round_to, water_needs};
use crate::models::{FlockParameters, Nutrition, RecommendationResult};

static TIME_OF_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("time pattern is valid"));

/// Figures returned by the Bedrock `/calculate-feed` endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteFeedCalculation {
    #[serde(alias = "amount_per_chicken")]
    pub amount_per_chicken: Option<f64>,
    #[serde(alias = "total_amount_kg", alias = "totalAmount")]
    pub total_amount_kg: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
    pub fiber: Option<f64>,
    #[serde(alias = "feeding_times")]
    pub feeding_times: Option<Vec<String>>,
    #[serde(alias = "total_water_l", alias = "totalWater")]
    pub total_water_l: Option<f64>,
    #[serde(alias = "daily_cost")]
    pub daily_cost: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSource {
    Remote,
    Local,
}

/// Where each merged field came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSources {
    pub amount_per_chicken: FieldSource,
    pub total_amount_kg: FieldSource,
    pub protein: FieldSource,
    pub carbs: FieldSource,
    pub fats: FieldSource,
    pub fiber: FieldSource,
    pub feeding_times: FieldSource,
    pub total_water_l: FieldSource,
    pub daily_cost: FieldSource,
}

impl MergeSources {
    pub fn remote_count(&self) -> usize {
        [
            self.amount_per_chicken,
            self.total_amount_kg,
            self.protein,
            self.carbs,
            self.fats,
            self.fiber,
            self.feeding_times,
            self.total_water_l,
            self.daily_cost,
        ]
        .iter()
        .filter(|s| **s == FieldSource::Remote)
        .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedRecommendation {
    pub result: RecommendationResult,
    pub sources: MergeSources,
    pub notes: Option<String>,
}

/// Present, finite and strictly positive
fn trusted(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn pick(remote: Option<f64>, local: f64) -> (f64, FieldSource) {
    match trusted(remote) {
        Some(v) => (v, FieldSource::Remote),
        None => (local, FieldSource::Local),
    }
}

fn valid_times(times: &Option<Vec<String>>) -> Option<Vec<String>> {
    let times = times.as_ref()?;
    if times.is_empty() {
        return None;
    }
    let trimmed: Vec<String> = times.iter().map(|t| t.trim().to_string()).collect();
    if trimmed.iter().all(|t| TIME_OF_DAY.is_match(t)) {
        Some(trimmed)
    } else {
        warn!("ignoring remote feeding times with malformed entries: {:?}", times);
        None
    }
}

/// Overlay trusted remote values on the local result
pub fn merge_remote(
    params: &FlockParameters,
    local: &RecommendationResult,
    remote: &RemoteFeedCalculation,
) -> MergedRecommendation {
    let mut result = local.clone();

    let (amount, amount_source) = pick(remote.amount_per_chicken, local.amounts.amount_per_chicken);
    let recomputed_total = round_to(amount * f64::from(params.quantity) / 1000.0, 1);
    let (total, total_source) = pick(remote.total_amount_kg, recomputed_total);
    result.amounts.amount_per_chicken = amount;
    result.amounts.total_amount_kg = total;
    result.conversion = result
        .eggs
        .map(|eggs| feed_conversion(amount, eggs.laying_rate));

    let (protein, protein_source) = pick(remote.protein, local.nutrition.protein);
    let (carbs, carbs_source) = pick(remote.carbs, local.nutrition.carbs);
    let (fats, fats_source) = pick(remote.fats, local.nutrition.fats);
    let (fiber, fiber_source) = pick(remote.fiber, local.nutrition.fiber);
    result.nutrition = Nutrition {
        protein,
        carbs,
        fats,
        fiber,
    };

    let times_source = match valid_times(&remote.feeding_times) {
        Some(times) => {
            result.feeding_times = times;
            FieldSource::Remote
        }
        None => FieldSource::Local,
    };

    let mut water = water_needs(amount, params.quantity, local.water.ratio);
    let (total_water, water_source) = pick(remote.total_water_l, water.total_water_l);
    water.total_water_l = total_water;
    result.water = water;

    let mut costs = costs_at_price(total, local.costs.price_per_kg);
    let (daily, cost_source) = pick(remote.daily_cost, costs.daily_cost);
    costs.daily_cost = round_to(daily, 2);
    costs.monthly_cost = round_to(costs.daily_cost * 30.0, 2);
    result.costs = costs;

    let sources = MergeSources {
        amount_per_chicken: amount_source,
        total_amount_kg: total_source,
        protein: protein_source,
        carbs: carbs_source,
        fats: fats_source,
        fiber: fiber_source,
        feeding_times: times_source,
        total_water_l: water_source,
        daily_cost: cost_source,
    };
    debug!("merged {} remote field(s) into local recommendation", sources.remote_count());

    MergedRecommendation {
        result,
        sources,
        notes: remote
            .notes
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{compute_recommendation, Overrides};
    use crate::validate::FlockInput;

    fn params() -> FlockParameters {
        FlockInput {
            breed: "leghorn".to_string(),
            age: 10.0,
            weight: 1.2,
            quantity: 50.0,
            ..Default::default()
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn empty_remote_keeps_local() {
        let params = params();
        let local = compute_recommendation(&params, &Overrides::default());
        let merged = merge_remote(&params, &local, &RemoteFeedCalculation::default());
        assert_eq!(merged.result, local);
        assert_eq!(merged.sources.remote_count(), 0);
        assert!(merged.notes.is_none());
    }

    #[test]
    fn zero_values_fall_back_to_local() {
        let params = params();
        let local = compute_recommendation(&params, &Overrides::default());
        let remote = RemoteFeedCalculation {
            amount_per_chicken: Some(0.0),
            protein: Some(0.0),
            daily_cost: Some(f64::NAN),
            notes: Some("   ".to_string()),
            ..Default::default()
        };
        let merged = merge_remote(&params, &local, &remote);
        assert_eq!(merged.result.amounts.amount_per_chicken, 66.6);
        assert_eq!(merged.sources.amount_per_chicken, FieldSource::Local);
        assert_eq!(merged.sources.protein, FieldSource::Local);
        assert_eq!(merged.sources.daily_cost, FieldSource::Local);
        assert!(merged.notes.is_none());
    }

    #[test]
    fn remote_amount_drives_derived_fields() {
        let params = params();
        let local = compute_recommendation(&params, &Overrides::default());
        let remote = RemoteFeedCalculation {
            amount_per_chicken: Some(80.0),
            protein: Some(19.5),
            notes: Some("Add crushed oyster shell".to_string()),
            ..Default::default()
        };
        let merged = merge_remote(&params, &local, &remote);

        assert_eq!(merged.sources.amount_per_chicken, FieldSource::Remote);
        assert_eq!(merged.sources.total_amount_kg, FieldSource::Local);
        assert_eq!(merged.result.amounts.total_amount_kg, 4.0);
        assert_eq!(merged.result.water.total_water_l, 8.0);
        assert_eq!(merged.result.costs.daily_cost, 3.2);
        assert_eq!(merged.result.costs.monthly_cost, 96.0);
        assert_eq!(merged.result.nutrition.protein, 19.5);
        assert_eq!(merged.result.nutrition.carbs, local.nutrition.carbs);
        assert_eq!(merged.notes.as_deref(), Some("Add crushed oyster shell"));
    }

    #[test]
    fn remote_amount_recomputes_layer_conversion() {
        let params = FlockInput {
            breed: "sussex".to_string(),
            age: 30.0,
            weight: 2.0,
            quantity: 10.0,
            ..Default::default()
        }
        .validate()
        .unwrap();
        let local = compute_recommendation(&params, &Overrides::default());
        let eggs = local.eggs.unwrap();
        let remote = RemoteFeedCalculation {
            amount_per_chicken: Some(200.0),
            ..Default::default()
        };
        let merged = merge_remote(&params, &local, &remote);

        let conversion = merged.result.conversion.unwrap();
        assert_eq!(conversion, feed_conversion(200.0, eggs.laying_rate));
        assert_eq!(conversion.feed_per_egg, 0.294);
        assert_eq!(conversion.feed_efficiency, -19507.8);
        assert_ne!(Some(conversion), local.conversion);
    }

    #[test]
    fn grower_merge_has_no_conversion() {
        let params = params();
        let local = compute_recommendation(&params, &Overrides::default());
        let remote = RemoteFeedCalculation {
            amount_per_chicken: Some(90.0),
            ..Default::default()
        };
        assert!(merge_remote(&params, &local, &remote).result.conversion.is_none());
    }

    #[test]
    fn malformed_times_are_rejected() {
        let params = params();
        let local = compute_recommendation(&params, &Overrides::default());
        let remote = RemoteFeedCalculation {
            feeding_times: Some(vec!["morning".to_string(), "17:00".to_string()]),
            ..Default::default()
        };
        let merged = merge_remote(&params, &local, &remote);
        assert_eq!(merged.result.feeding_times, local.feeding_times);
        assert_eq!(merged.sources.feeding_times, FieldSource::Local);

        let remote = RemoteFeedCalculation {
            feeding_times: Some(vec![" 06:30".to_string(), "18:15".to_string()]),
            ..Default::default()
        };
        let merged = merge_remote(&params, &local, &remote);
        assert_eq!(merged.result.feeding_times, vec!["06:30", "18:15"]);
        assert_eq!(merged.sources.feeding_times, FieldSource::Remote);
    }

    #[test]
    fn parses_snake_case_payload() {
        let remote: RemoteFeedCalculation = serde_json::from_str(
            r#"{"amount_per_chicken": 95.5, "totalAmount": 4.8, "feeding_times": ["07:00"], "extra": true}"#,
        )
        .unwrap();
        assert_eq!(remote.amount_per_chicken, Some(95.5));
        assert_eq!(remote.total_amount_kg, Some(4.8));
        assert_eq!(remote.feeding_times, Some(vec!["07:00".to_string()]));
    }
}
