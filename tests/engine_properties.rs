//! Property tests for the recommendation engine

use flock_feed::calculator::{
    compute_recommendation, precise_feed_amount, round_to, standard_feed_amount, Overrides,
};
use flock_feed::models::{
    Breed, Environment, FeedPolicy, FeedPrices, FeedType, FlockParameters, Health, Purpose, Season,
    StressLevel, Vaccination,
};
use proptest::prelude::*;

fn breed() -> impl Strategy<Value = Breed> {
    prop_oneof![
        Just(Breed::Leghorn),
        Just(Breed::RhodeIsland),
        Just(Breed::Orpington),
        Just(Breed::Sussex),
        "[a-z]{3,8}".prop_map(|s| Breed::parse(&s)),
    ]
}

fn health() -> impl Strategy<Value = Health> {
    prop_oneof![
        Just(Health::Healthy),
        Just(Health::Respiratory),
        Just(Health::Digestive),
        Just(Health::Parasites),
        Just(Health::Other("other".to_string())),
    ]
}

fn flock() -> impl Strategy<Value = FlockParameters> {
    (
        breed(),
        0u32..120,
        0.0f64..8.0,
        1u32..5000,
        health(),
        prop_oneof![
            Just(Environment::FreeRange),
            Just(Environment::Barn),
            Just(Environment::Battery),
            Just(Environment::Organic),
        ],
        prop_oneof![
            Just(Season::Summer),
            Just(Season::Winter),
            Just(Season::Spring),
            Just(Season::Autumn),
        ],
        prop_oneof![Just(StressLevel::Low), Just(StressLevel::Medium), Just(StressLevel::High)],
        prop_oneof![Just(FeedType::Commercial), Just(FeedType::Homemade), Just(FeedType::Mixed)],
        0.0f64..=24.0,
        any::<bool>(),
    )
        .prop_map(
            |(breed, age_weeks, weight_kg, quantity, health, environment, season, stress_level, feed_type, light_hours, molting)| {
                FlockParameters {
                    breed,
                    age_weeks,
                    weight_kg,
                    quantity,
                    health,
                    environment,
                    season,
                    purpose: Purpose::Eggs,
                    stress_level,
                    feed_type,
                    light_hours,
                    molting,
                    vaccination: Vaccination::Vaccinated,
                }
            },
        )
}

fn policy() -> impl Strategy<Value = FeedPolicy> {
    prop_oneof![Just(FeedPolicy::Standard), Just(FeedPolicy::Precise)]
}

fn grams_per_bird(params: &FlockParameters, policy: FeedPolicy) -> f64 {
    let raw = match policy {
        FeedPolicy::Standard => standard_feed_amount(params),
        FeedPolicy::Precise => precise_feed_amount(params),
    };
    round_to(raw, 1)
}

fn overrides(policy: FeedPolicy) -> Overrides {
    Overrides {
        policy: Some(policy),
        ..Default::default()
    }
}

proptest! {
    #[test]
    fn same_input_same_output(params in flock(), policy in policy()) {
        let first = compute_recommendation(&params, &overrides(policy));
        let second = compute_recommendation(&params, &overrides(policy));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn total_amount_is_rounded_flock_total(params in flock(), policy in policy()) {
        let r = compute_recommendation(&params, &overrides(policy));
        let grams = grams_per_bird(&params, policy);
        prop_assert_eq!(r.amounts.amount_per_chicken, grams);
        let expected = round_to(grams * f64::from(params.quantity) / 1000.0, 1);
        prop_assert_eq!(r.amounts.total_amount_kg, expected);
    }

    #[test]
    fn optional_sections_follow_age(params in flock(), policy in policy()) {
        let r = compute_recommendation(&params, &overrides(policy));
        prop_assert_eq!(r.eggs.is_some(), params.age_weeks >= 18);
        prop_assert_eq!(r.growth.is_some(), params.age_weeks < 20);
        prop_assert_eq!(r.conversion.is_some(), r.eggs.is_some());
        prop_assert_eq!(r.egg_quality.is_some(), r.eggs.is_some());
    }

    #[test]
    fn monthly_cost_is_thirty_days(params in flock(), policy in policy()) {
        let r = compute_recommendation(&params, &overrides(policy));
        let total_kg = round_to(grams_per_bird(&params, policy) * f64::from(params.quantity) / 1000.0, 1);
        let price = FeedPrices::default().price_for(&params.feed_type);
        let daily = round_to(total_kg * price, 2);
        prop_assert_eq!(r.costs.price_per_kg, price);
        prop_assert_eq!(r.costs.daily_cost, daily);
        prop_assert_eq!(r.costs.monthly_cost, round_to(daily * 30.0, 2));
    }

    #[test]
    fn numbers_are_always_finite(params in flock(), policy in policy()) {
        let r = compute_recommendation(&params, &overrides(policy));
        let mut numbers = vec![
            r.nutrition.protein,
            r.nutrition.carbs,
            r.nutrition.fats,
            r.nutrition.fiber,
            r.amounts.amount_per_chicken,
            r.amounts.total_amount_kg,
            r.water.per_bird_ml,
            r.water.total_water_l,
            r.costs.daily_cost,
            r.costs.monthly_cost,
        ];
        if let Some(e) = r.eggs {
            numbers.extend([e.egg_production, e.laying_rate]);
        }
        if let Some(c) = r.conversion {
            numbers.extend([c.feed_per_egg, c.feed_efficiency]);
        }
        if let Some(g) = r.growth {
            numbers.extend([g.projected_weight, g.daily_gain]);
        }
        prop_assert!(numbers.iter().all(|n| n.is_finite()));
        prop_assert!(!r.feeding_times.is_empty());
    }

    #[test]
    fn rhode_island_eats_more_than_leghorn(mut params in flock(), policy in policy()) {
        params.breed = Breed::RhodeIsland;
        let heavy = compute_recommendation(&params, &overrides(policy));
        params.breed = Breed::Leghorn;
        let light = compute_recommendation(&params, &overrides(policy));
        prop_assert!(heavy.amounts.amount_per_chicken > light.amounts.amount_per_chicken);
    }
}
