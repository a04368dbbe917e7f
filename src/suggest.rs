//! Advisory estimates for filling in a scenario.
//!
//! None of these feed the comparison engine.  They give the input layer
//! a sensible starting value for fields the user may not know offhand.

use crate::models::Powertrain;

/// Suggested monthly maintenance cost.
///
/// Based on powertrain and vehicle age, adjusted up for expensive cars
/// and down for cheap ones.  Rounded to a whole amount.
pub fn suggested_maintenance(
    powertrain: Powertrain,
    registration_year: i32,
    price: f64,
    current_year: i32,
) -> f64 {
    let age = current_year - registration_year;
    let (new, mid, old): (f64, f64, f64) = match powertrain {
        Powertrain::Electric => (400.0, 550.0, 800.0),
        Powertrain::Hybrid => (550.0, 750.0, 1000.0),
        Powertrain::Ice => (650.0, 900.0, 1250.0),
    };
    let mut maintenance = if age <= 3 {
        new
    } else if age <= 5 {
        mid
    } else {
        old
    };

    if price > 250_000.0 {
        maintenance *= 1.3;
    } else if price > 0.0 && price < 150_000.0 {
        maintenance *= 0.8;
    }

    maintenance.round()
}

/// Suggested social insurance rate for a marginal income tax rate.
pub fn suggested_national_insurance(tax_bracket: f64) -> f64 {
    if tax_bracket <= 0.14 {
        0.0004
    } else if tax_bracket <= 0.20 {
        0.035
    } else {
        0.07
    }
}

/// Suggested health tax rate for a marginal income tax rate.
pub fn suggested_health_tax(tax_bracket: f64) -> f64 {
    if tax_bracket <= 0.20 {
        0.031
    } else {
        0.05
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maintenance_by_age() {
        let p = 200_000.0;
        assert_eq!(suggested_maintenance(Powertrain::Electric, 2024, p, 2025), 400.0);
        assert_eq!(suggested_maintenance(Powertrain::Electric, 2021, p, 2025), 550.0);
        assert_eq!(suggested_maintenance(Powertrain::Electric, 2015, p, 2025), 800.0);
        assert_eq!(suggested_maintenance(Powertrain::Hybrid, 2022, p, 2025), 550.0);
        assert_eq!(suggested_maintenance(Powertrain::Hybrid, 2020, p, 2025), 750.0);
        assert_eq!(suggested_maintenance(Powertrain::Ice, 2025, p, 2025), 650.0);
        assert_eq!(suggested_maintenance(Powertrain::Ice, 2010, p, 2025), 1250.0);
    }

    #[test]
    fn test_maintenance_by_price() {
        assert_eq!(suggested_maintenance(Powertrain::Ice, 2025, 300_000.0, 2025), 845.0);
        assert_eq!(suggested_maintenance(Powertrain::Electric, 2025, 100_000.0, 2025), 320.0);
        // Unknown price leaves the base untouched
        assert_eq!(suggested_maintenance(Powertrain::Hybrid, 2025, 0.0, 2025), 550.0);
    }

    #[test]
    fn test_contribution_rates() {
        assert_eq!(suggested_national_insurance(0.10), 0.0004);
        assert_eq!(suggested_national_insurance(0.20), 0.035);
        assert_eq!(suggested_national_insurance(0.47), 0.07);
        assert_eq!(suggested_health_tax(0.14), 0.031);
        assert_eq!(suggested_health_tax(0.31), 0.05);
    }
}
