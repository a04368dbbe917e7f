//! Monthly energy and fuel cost estimation.
//!
//! Electric cars are charged partly at home and partly on public
//! chargers, combustion cars burn fuel, and hybrids are modelled as a
//! fixed split of the two.  Missing consumption figures count as zero
//! consumption for that channel, so a partial scenario still produces a
//! cost rather than an error.

use crate::models::{Powertrain, Scenario};

/// Share of a hybrid's distance driven on electricity.  A simplifying
/// approximation; the remainder is driven on fuel.
pub const HYBRID_ELECTRIC_SHARE: f64 = 0.5;

/// Monthly energy or fuel spend for the scenario's powertrain.
pub fn monthly_energy(scenario: &Scenario) -> f64 {
    match scenario.powertrain {
        Powertrain::Electric => electric_cost(scenario, scenario.annual_km),
        Powertrain::Hybrid => {
            electric_cost(scenario, scenario.annual_km * HYBRID_ELECTRIC_SHARE)
                + fuel_cost(scenario, scenario.annual_km * (1.0 - HYBRID_ELECTRIC_SHARE))
        }
        Powertrain::Ice => fuel_cost(scenario, scenario.annual_km),
    }
}

/// Monthly charging cost for `km` driven per year on electricity.
fn electric_cost(scenario: &Scenario, km: f64) -> f64 {
    let kwh_year = km / 100.0 * scenario.kwh_per_100.unwrap_or(0.0);
    let home = kwh_year * scenario.home_charge_share * scenario.elec_home_price;
    let public = kwh_year * (1.0 - scenario.home_charge_share) * scenario.elec_public_price;
    (home + public) / 12.0
}

/// Monthly fuel cost for `km` driven per year on fuel.
fn fuel_cost(scenario: &Scenario, km: f64) -> f64 {
    let liters_year = match scenario.km_per_liter {
        Some(efficiency) if efficiency != 0.0 => km / efficiency,
        _ => 0.0,
    };
    liters_year * scenario.fuel_price / 12.0
}
