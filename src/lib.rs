//! Allowance Engine library crate.
//!
//! Compares two ways of getting a car through work: taking the
//! employer's monthly cash allowance and financing a car privately, or
//! keeping the company car and paying tax on its imputed benefit.  The
//! calculation lives in [`engine::calculate_scenario`] and is a pure
//! function of a [`models::Scenario`].  The remaining modules cover
//! persistence, export and an HTTP surface via [`api::build_router`].

pub mod models;
pub mod amortization;
pub mod energy;
pub mod benefit;
pub mod engine;
pub mod suggest;
pub mod history;
pub mod export;
pub mod config;
pub mod error;
pub mod api;

pub use engine::{calculate_batch, calculate_scenario, calculate_scenario_with};
pub use error::{Error, Result};
pub use models::{BetterOption, CalculationResult, Powertrain, Scenario};
