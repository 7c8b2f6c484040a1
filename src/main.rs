//! Flock feed calculator
//!
//! Feed, water, cost and egg recommendations for a poultry flock.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, warn};

use flock_feed::calculator::{self, EngineOptions, PolicyComparison};
use flock_feed::config::AppConfig;
use flock_feed::merge::{self, FieldSource, MergedRecommendation};
use flock_feed::models::{FeedPolicy, FlockParameters, Profile};
use flock_feed::remote::BedrockClient;
use flock_feed::store::{ProfileStore, RemoteProfileStore, SqliteProfileStore};
use flock_feed::validate::FlockInput;

#[derive(Parser)]
#[command(name = "flock-feed", version)]
#[command(about = "Feed recommendation calculator for poultry flocks")]
struct Cli {
    /// Path to the config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the SQLite profile database
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the profile database
    Init,

    /// Calculate feed recommendations for a flock
    Calc {
        #[command(flatten)]
        flock: FlockArgs,

        #[command(flatten)]
        engine: EngineArgs,

        /// Merge figures from the Bedrock service, falling back to local values
        #[arg(long)]
        remote: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare the standard and precise feeding policies
    Compare {
        #[command(flatten)]
        flock: FlockArgs,

        #[command(flatten)]
        engine: EngineArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage saved flock profiles
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },

    /// Query the Bedrock service directly
    Remote {
        #[command(subcommand)]
        action: RemoteCommand,
    },

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ProfileCommand {
    /// Save (or replace) a profile
    Save {
        name: String,

        #[command(flatten)]
        flock: FlockArgs,
    },

    /// List saved profiles
    List {
        #[arg(long)]
        json: bool,
    },

    /// Show one profile's parameters
    Show {
        name: String,

        #[arg(long)]
        json: bool,
    },

    /// Delete a profile
    Delete { name: String },
}

#[derive(Subcommand)]
enum RemoteCommand {
    /// Remote feed calculation
    Calculate {
        #[command(flatten)]
        flock: FlockArgs,
    },

    /// Remote feed recommendation
    Recommend {
        #[command(flatten)]
        flock: FlockArgs,
    },

    /// Remote weekly recipe plan
    Recipes {
        #[command(flatten)]
        flock: FlockArgs,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the default config file path
    Path,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Flock parameters; values given here override a loaded profile
#[derive(Args, Debug, Default)]
struct FlockArgs {
    /// Start from a saved profile
    #[arg(short, long)]
    profile: Option<String>,

    /// Breed (leghorn, rhode_island, orpington, sussex, plymouth_rock, brahma, ...)
    #[arg(short, long)]
    breed: Option<String>,

    /// Age in weeks
    #[arg(short, long)]
    age: Option<f64>,

    /// Average weight in kg
    #[arg(short, long)]
    weight: Option<f64>,

    /// Number of birds
    #[arg(short, long)]
    quantity: Option<f64>,

    /// healthy, respiratory, digestive, parasites
    #[arg(long)]
    health: Option<String>,

    /// free_range, barn, battery, organic
    #[arg(long)]
    environment: Option<String>,

    /// summer, winter, spring, autumn
    #[arg(long)]
    season: Option<String>,

    /// eggs, meat, dual
    #[arg(long)]
    purpose: Option<String>,

    /// low, medium, high
    #[arg(long)]
    stress: Option<String>,

    /// commercial, homemade, mixed
    #[arg(long)]
    feed_type: Option<String>,

    /// Hours of light per day
    #[arg(long)]
    light_hours: Option<f64>,

    /// yes or no
    #[arg(long)]
    molting: Option<String>,

    /// vaccinated, partial, unvaccinated
    #[arg(long)]
    vaccination: Option<String>,
}

impl FlockArgs {
    fn overlay(&self, mut input: FlockInput) -> FlockInput {
        if let Some(breed) = &self.breed {
            input.breed = breed.clone();
        }
        if let Some(age) = self.age {
            input.age = age;
        }
        if let Some(weight) = self.weight {
            input.weight = weight;
        }
        if let Some(quantity) = self.quantity {
            input.quantity = quantity;
        }
        let text = [
            (&mut input.health, &self.health),
            (&mut input.environment, &self.environment),
            (&mut input.season, &self.season),
            (&mut input.purpose, &self.purpose),
            (&mut input.stress_level, &self.stress),
            (&mut input.feed_type, &self.feed_type),
            (&mut input.molting, &self.molting),
            (&mut input.vaccination, &self.vaccination),
        ];
        for (field, value) in text {
            if value.is_some() {
                *field = value.clone();
            }
        }
        if self.light_hours.is_some() {
            input.light_hours = self.light_hours;
        }
        input
    }

    /// Resolve to validated parameters, starting from `--profile` if given
    fn resolve(&self, store: Option<&dyn ProfileStore>) -> Result<FlockParameters> {
        let base = match (&self.profile, store) {
            (Some(name), Some(store)) => FlockInput::from(&store.load(name)?.params),
            (Some(_), None) => bail!("--profile needs a profile store"),
            (None, _) => {
                if self.breed.is_none() || self.age.is_none() || self.weight.is_none() || self.quantity.is_none() {
                    bail!("--breed, --age, --weight and --quantity are required unless --profile is given");
                }
                FlockInput::default()
            }
        };
        Ok(self.overlay(base).validate()?)
    }
}

/// Engine overrides layered over the config file
#[derive(Args, Debug, Default)]
struct EngineArgs {
    /// Amount/schedule policy
    #[arg(long, value_enum)]
    policy: Option<FeedPolicy>,

    /// Grams of water per gram of feed
    #[arg(long)]
    water_ratio: Option<f64>,

    /// Commercial feed price per kg
    #[arg(long)]
    price_commercial: Option<f64>,

    /// Homemade feed price per kg
    #[arg(long)]
    price_homemade: Option<f64>,

    /// Mixed feed price per kg
    #[arg(long)]
    price_mixed: Option<f64>,
}

impl EngineArgs {
    fn options(&self, config: &AppConfig) -> EngineOptions {
        let base = config.engine_options();
        let mut prices = base.feed_prices;
        prices.commercial = self.price_commercial.unwrap_or(prices.commercial);
        prices.homemade = self.price_homemade.unwrap_or(prices.homemade);
        prices.mixed = self.price_mixed.unwrap_or(prices.mixed);

        base.with_overrides(&calculator::Overrides {
            water_ratio: self.water_ratio,
            feed_prices: Some(prices),
            policy: self.policy,
        })
    }
}

fn open_store(cli: &Cli, config: &AppConfig) -> Result<Box<dyn ProfileStore>> {
    if config.storage.use_remote_profiles && cli.database.is_none() {
        let http = config.remote.crud_client()?;
        return Ok(Box::new(RemoteProfileStore::new(http)));
    }
    let path = cli.database.clone().unwrap_or_else(|| config.database_path());
    let store = SqliteProfileStore::open(&path)
        .with_context(|| format!("Failed to open profile database {}", path.display()))?;
    Ok(Box::new(store))
}

fn bedrock(config: &AppConfig) -> Result<BedrockClient> {
    Ok(BedrockClient::new(config.remote.bedrock_client()?))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_merged(merged: &MergedRecommendation) {
    println!("{}", merged.result);
    println!("Remote fields used: {}", merged.sources.remote_count());
    if merged.sources.amount_per_chicken == FieldSource::Local {
        println!("  (feed amount computed locally)");
    }
    if let Some(notes) = &merged.notes {
        println!();
        println!("Notes: {}", notes);
    }
}

fn warn_on_divergence(comparison: &PolicyComparison) {
    if comparison.diverges {
        warn!(
            "standard and precise policies disagree by {:+.1} g per bird",
            comparison.delta_grams
        );
    }
}

fn main() -> Result<()> {
    // RUST_LOG controls verbosity
    env_logger::init();

    let cli = Cli::parse();
    let config = match &cli.command {
        // The file may not exist yet
        Commands::Config {
            action: ConfigCommand::Init { .. },
        } => AppConfig::default(),
        _ => AppConfig::load(cli.config.as_deref())?,
    };

    match &cli.command {
        Commands::Init => {
            let path = cli.database.clone().unwrap_or_else(|| config.database_path());
            SqliteProfileStore::open(&path)
                .with_context(|| format!("Failed to open profile database {}", path.display()))?;
            println!("Database initialized at: {}", path.display());
        }

        Commands::Calc {
            flock,
            engine,
            remote,
            json,
        } => {
            let store = match flock.profile {
                Some(_) => Some(open_store(&cli, &config)?),
                None => None,
            };
            let params = flock.resolve(store.as_deref())?;
            let options = engine.options(&config);
            debug!(
                "computing {} recommendation for {} x {} at {} weeks",
                options.policy, params.quantity, params.breed, params.age_weeks
            );
            let local = calculator::compute_with_options(&params, &options);

            if *remote {
                let fetched = bedrock(&config)
                    .and_then(|client| client.calculate_feed(&params).map_err(Into::into));
                match fetched {
                    Ok(remote) => {
                        let merged = merge::merge_remote(&params, &local, &remote);
                        if *json {
                            print_json(&merged)?;
                        } else {
                            print_merged(&merged);
                        }
                        return Ok(());
                    }
                    Err(e) => warn!("remote calculation failed, using local result: {:#}", e),
                }
            }

            if *json {
                print_json(&local)?;
            } else {
                println!("{}", local);
            }
        }

        Commands::Compare {
            flock,
            engine,
            json,
        } => {
            let store = match flock.profile {
                Some(_) => Some(open_store(&cli, &config)?),
                None => None,
            };
            let params = flock.resolve(store.as_deref())?;
            debug!(
                "comparing policies for {} x {} at {} weeks",
                params.quantity, params.breed, params.age_weeks
            );
            let comparison = calculator::compare_policies(&params, &engine.options(&config));
            warn_on_divergence(&comparison);

            if *json {
                print_json(&comparison)?;
            } else {
                println!("{}", comparison);
            }
        }

        Commands::Profile { action } => {
            let store = open_store(&cli, &config)?;
            match action {
                ProfileCommand::Save { name, flock } => {
                    let existing = match store.load(name) {
                        Ok(profile) => Some(FlockInput::from(&profile.params)),
                        Err(flock_feed::FlockError::ProfileNotFound(_)) => None,
                        Err(e) => return Err(e.into()),
                    };
                    let params = match existing {
                        Some(base) => flock.overlay(base).validate()?,
                        None => flock.resolve(Some(store.as_ref()))?,
                    };
                    store.save(&Profile {
                        name: name.clone(),
                        params,
                    })?;
                    println!("Profile '{}' saved", name.trim());
                }

                ProfileCommand::List { json } => {
                    let profiles = store.list()?;
                    if *json {
                        print_json(&profiles)?;
                    } else if profiles.is_empty() {
                        println!("No profiles saved. Run 'profile save' first.");
                    } else {
                        println!("{:<24} {:<16} {:>6} {:>8}  {}", "Profile", "Breed", "Weeks", "Birds", "Updated");
                        println!("{}", "-".repeat(76));
                        for p in profiles {
                            println!(
                                "{:<24} {:<16} {:>6} {:>8}  {}",
                                p.name,
                                p.breed,
                                p.age_weeks,
                                p.quantity,
                                p.updated_at.unwrap_or_default()
                            );
                        }
                    }
                }

                ProfileCommand::Show { name, json } => {
                    let profile = store.load(name)?;
                    if *json {
                        print_json(&profile)?;
                    } else {
                        let p = &profile.params;
                        println!("Profile: {}", profile.name);
                        println!("  Breed:       {}", p.breed);
                        println!("  Age:         {} weeks", p.age_weeks);
                        println!("  Weight:      {} kg", p.weight_kg);
                        println!("  Birds:       {}", p.quantity);
                        println!("  Health:      {}", p.health);
                        println!("  Environment: {}", p.environment);
                        println!("  Season:      {}", p.season);
                        println!("  Purpose:     {}", p.purpose);
                        println!("  Stress:      {}", p.stress_level);
                        println!("  Feed type:   {}", p.feed_type);
                        println!("  Light:       {} h", p.light_hours);
                        println!("  Molting:     {}", if p.molting { "yes" } else { "no" });
                        println!("  Vaccination: {}", p.vaccination);
                    }
                }

                ProfileCommand::Delete { name } => {
                    store.delete(name)?;
                    println!("Profile '{}' deleted", name.trim());
                }
            }
        }

        Commands::Remote { action } => {
            let flock = match action {
                RemoteCommand::Calculate { flock }
                | RemoteCommand::Recommend { flock }
                | RemoteCommand::Recipes { flock } => flock,
            };
            let store = match flock.profile {
                Some(_) => Some(open_store(&cli, &config)?),
                None => None,
            };
            let params = flock.resolve(store.as_deref())?;
            let client = bedrock(&config)?;

            match action {
                RemoteCommand::Calculate { .. } => print_json(&client.calculate_feed(&params)?)?,
                RemoteCommand::Recommend { .. } => print_json(&client.recommend_feed(&params)?)?,
                RemoteCommand::Recipes { .. } => print_json(&client.weekly_recipes(&params)?)?,
            }
        }

        Commands::Config { action } => match action {
            ConfigCommand::Show => print!("{}", config.to_toml_string()?),
            ConfigCommand::Path => match AppConfig::default_path() {
                Some(path) => println!("{}", path.display()),
                None => bail!("No config directory available on this platform"),
            },
            ConfigCommand::Init { force } => {
                let path = match cli.config.clone().or_else(AppConfig::default_path) {
                    Some(path) => path,
                    None => bail!("No config directory available; pass --config"),
                };
                if path.exists() && !*force {
                    bail!("Config file {} already exists (use --force to overwrite)", path.display());
                }
                AppConfig::default().save(&path)?;
                println!("Config written to: {}", path.display());
            }
        },
    }

    Ok(())
}
