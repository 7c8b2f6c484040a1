//! Feed recommendations for poultry flocks
//!
//! The core is [`calculator`], a pure engine that turns validated
//! [`models::FlockParameters`] into a [`models::RecommendationResult`].
//! Around it sit boundary validation, profile storage (SQLite or the remote
//! CRUD API), the Bedrock client and the merge rule for its answers.
//!
//! ```
//! use flock_feed::calculator::{compute_recommendation, Overrides};
//! use flock_feed::validate::FlockInput;
//!
//! let params = FlockInput {
//!     breed: "leghorn".to_string(),
//!     age: 10.0,
//!     weight: 1.2,
//!     quantity: 50.0,
//!     ..Default::default()
//! }
//! .validate()
//! .unwrap();
//!
//! let result = compute_recommendation(&params, &Overrides::default());
//! assert_eq!(result.amounts.amount_per_chicken, 66.6);
//! assert!(result.eggs.is_none());
//! ```

pub mod calculator;
pub mod config;
pub mod db;
pub mod error;
pub mod merge;
pub mod models;
pub mod remote;
pub mod store;
pub mod validate;

pub use error::{FlockError, Result};
