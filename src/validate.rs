//! Boundary validation from loosely-typed input to `FlockParameters`
//!
//! Forms, CLI flags and JSON payloads all arrive as a `FlockInput`. Numbers
//! are checked here so the engine only ever sees in-range values; categorical
//! fields are never rejected, unknown text simply takes the default branch.

use serde::{Deserialize, Serialize};

use crate::error::{FlockError, Result, ValidationError};
use crate::models::{
    Breed, Environment, FeedType, FlockParameters, Health, Purpose, Season, StressLevel,
    Vaccination, DEFAULT_LIGHT_HOURS,
};

const MAX_AGE_WEEKS: f64 = 520.0;
const MAX_WEIGHT_KG: f64 = 15.0;
const MAX_QUANTITY: f64 = 1_000_000.0;

/// Unvalidated flock parameters as they come off a form or the command line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlockInput {
    pub breed: String,
    pub age: f64,
    pub weight: f64,
    pub quantity: f64,
    pub health: Option<String>,
    pub environment: Option<String>,
    pub season: Option<String>,
    #[serde(alias = "eggPurpose")]
    pub purpose: Option<String>,
    pub stress_level: Option<String>,
    pub feed_type: Option<String>,
    pub light_hours: Option<f64>,
    /// "yes"/"no" (or true/false)
    pub molting: Option<String>,
    pub vaccination: Option<String>,
}

impl FlockInput {
    /// Validate every field, collecting all problems rather than stopping at the first
    pub fn validate(&self) -> Result<FlockParameters> {
        let mut errors = Vec::new();

        if self.breed.trim().is_empty() {
            errors.push(ValidationError::new("breed", "must not be empty"));
        }

        let age_weeks = whole_number(&mut errors, "age", self.age, 0.0, MAX_AGE_WEEKS);

        if !self.weight.is_finite() || self.weight <= 0.0 {
            errors.push(ValidationError::new("weight", "must be a positive number of kilograms"));
        } else if self.weight > MAX_WEIGHT_KG {
            errors.push(ValidationError::new(
                "weight",
                format!("must not exceed {MAX_WEIGHT_KG} kg"),
            ));
        }

        let quantity = whole_number(&mut errors, "quantity", self.quantity, 1.0, MAX_QUANTITY);

        let light_hours = self.light_hours.unwrap_or(DEFAULT_LIGHT_HOURS);
        if !light_hours.is_finite() || !(0.0..=24.0).contains(&light_hours) {
            errors.push(ValidationError::new("lightHours", "must be between 0 and 24"));
        }

        let molting = match self.molting.as_deref().map(|m| m.trim().to_ascii_lowercase()) {
            None => false,
            Some(m) => match m.as_str() {
                "yes" | "true" | "y" | "1" => true,
                "no" | "false" | "n" | "0" | "" => false,
                _ => {
                    errors.push(ValidationError::new("molting", "must be yes or no"));
                    false
                }
            },
        };

        if !errors.is_empty() {
            return Err(FlockError::Validation(errors));
        }

        Ok(FlockParameters {
            breed: Breed::parse(&self.breed),
            age_weeks,
            weight_kg: self.weight,
            quantity,
            health: parse_or_default(&self.health, Health::parse),
            environment: parse_or_default(&self.environment, Environment::parse),
            season: parse_or_default(&self.season, Season::parse),
            purpose: parse_or_default(&self.purpose, Purpose::parse),
            stress_level: parse_or_default(&self.stress_level, StressLevel::parse),
            feed_type: parse_or_default(&self.feed_type, FeedType::parse),
            light_hours,
            molting,
            vaccination: parse_or_default(&self.vaccination, Vaccination::parse),
        })
    }
}

impl From<&FlockParameters> for FlockInput {
    fn from(params: &FlockParameters) -> Self {
        Self {
            breed: params.breed.to_string(),
            age: f64::from(params.age_weeks),
            weight: params.weight_kg,
            quantity: f64::from(params.quantity),
            health: Some(params.health.to_string()),
            environment: Some(params.environment.to_string()),
            season: Some(params.season.to_string()),
            purpose: Some(params.purpose.to_string()),
            stress_level: Some(params.stress_level.to_string()),
            feed_type: Some(params.feed_type.to_string()),
            light_hours: Some(params.light_hours),
            molting: Some(if params.molting { "yes" } else { "no" }.to_string()),
            vaccination: Some(params.vaccination.to_string()),
        }
    }
}

fn whole_number(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> u32 {
    if !value.is_finite() || value.fract() != 0.0 {
        errors.push(ValidationError::new(field, "must be a whole number"));
        return 0;
    }
    if value < min || value > max {
        errors.push(ValidationError::new(
            field,
            format!("must be between {min} and {max}"),
        ));
        return 0;
    }
    // Range checked above
    value as u32
}

fn parse_or_default<T: Default>(value: &Option<String>, parse: fn(&str) -> T) -> T {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => parse(text),
        _ => T::default(),
    }
}
