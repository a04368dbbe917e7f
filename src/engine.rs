//! Comparison engine.
//!
//! The `engine` module turns a [`Scenario`] into a [`CalculationResult`]
//! by composing the loan payment, energy cost and statutory benefit
//! calculations into two cost models: owning the car privately on the
//! employer's allowance, or keeping the company car and paying tax on
//! its imputed benefit.
//!
//! Every function here is total.  Nonsensical input (a zero horizon, a
//! negative price) is not rejected; it flows through the arithmetic and
//! may surface as `NaN` or infinity in the result.  Batches are spread
//! over threads with [`rayon`] since each scenario is independent.

use crate::amortization::monthly_payment;
use crate::benefit::{BenefitCalculator, BenefitSchedule};
use crate::energy::monthly_energy;
use crate::models::{
    BetterOption, CalculationResult, CompanyCarResult, ComparisonResult, Scenario,
};
use rayon::prelude::*;
use tracing::debug;

/// Runs the comparison under the default benefit schedule.
pub fn calculate_scenario(scenario: &Scenario) -> CalculationResult {
    calculate_scenario_with(scenario, &BenefitSchedule::default())
}

/// Runs the comparison using `benefit` for the company car's statutory
/// taxable value.  A manual override on the scenario bypasses `benefit`.
pub fn calculate_scenario_with(
    scenario: &Scenario,
    benefit: &dyn BenefitCalculator,
) -> CalculationResult {
    // Personal car on the allowance
    let monthly_payment = monthly_payment(scenario.apr, scenario.finance_years, scenario.price);
    let monthly_energy = monthly_energy(scenario);
    let monthly_total =
        monthly_payment + monthly_energy + scenario.monthly_maint + scenario.monthly_insurance;
    let residual_value = scenario.price * (scenario.residual_pct / 100.0);
    let total_months = scenario.total_months();

    let total_tax_rate = scenario.total_tax_rate();
    let monthly_allowance_net = scenario.employer_allowance * (1.0 - total_tax_rate);
    let total_allowance_net = monthly_allowance_net * total_months;
    let net_benefit = total_allowance_net - monthly_total * total_months + residual_value;

    // Company car
    let monthly_taxable_value = scenario.company_car_taxable_value.unwrap_or_else(|| {
        benefit.monthly_taxable_value(scenario.price, scenario.year, scenario.powertrain)
    });
    let monthly_tax_cost = monthly_taxable_value * total_tax_rate;
    let total_tax_cost = monthly_tax_cost * total_months;
    let company_net_cost = -total_tax_cost;

    let difference = net_benefit - company_net_cost;
    let better_option = if difference > 0.0 {
        BetterOption::Personal
    } else {
        BetterOption::Company
    };
    let monthly_difference = difference / total_months;

    debug!(
        name = %scenario.name,
        tax_year = benefit.tax_year(),
        difference,
        ?better_option,
        "calculated scenario"
    );

    CalculationResult {
        monthly_payment,
        monthly_energy,
        monthly_total,
        residual_value,
        net_benefit,
        total_months,
        monthly_allowance_net,
        total_allowance_net,
        company_car: CompanyCarResult {
            monthly_taxable_value,
            monthly_tax_cost,
            total_tax_cost,
            net_cost: company_net_cost,
        },
        comparison: ComparisonResult {
            difference,
            better_option,
            monthly_difference,
        },
    }
}

/// Runs many comparisons in parallel.  Results keep the input order.
pub fn calculate_batch(
    scenarios: &[Scenario],
    benefit: &dyn BenefitCalculator,
) -> Vec<CalculationResult> {
    scenarios
        .par_iter()
        .map(|scenario| calculate_scenario_with(scenario, benefit))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Powertrain;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn untaxed_electric() -> Scenario {
        Scenario {
            name: "EV".into(),
            year: 2025,
            powertrain: Powertrain::Electric,
            price: 200_000.0,
            tax_bracket: 0.0,
            national_insurance: 0.0,
            health_tax: 0.0,
            ..Scenario::default()
        }
    }

    #[test]
    fn test_statutory_value_flows_through() {
        let result = calculate_scenario(&untaxed_electric());
        assert_abs_diff_eq!(result.company_car.monthly_taxable_value, 3610.0, epsilon = 1e-9);
        // No tax, so keeping the company car costs nothing
        assert_eq!(result.company_car.monthly_tax_cost, 0.0);
        assert_eq!(result.company_car.net_cost, 0.0);
    }

    #[test]
    fn test_default_scenario_breakdown() {
        let scenario = Scenario { year: 2025, ..Scenario::default() };
        let result = calculate_scenario(&scenario);

        assert_abs_diff_eq!(result.monthly_payment, 3774.2467, epsilon = 1e-3);
        assert_abs_diff_eq!(result.monthly_energy, 175.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.monthly_total, 3774.2467 + 175.0 + 800.0, epsilon = 1e-3);
        assert_abs_diff_eq!(result.residual_value, 80_000.0, epsilon = 1e-9);
        assert_eq!(result.total_months, 36.0);
        // 3000 * (1 - 0.59)
        assert_abs_diff_eq!(result.monthly_allowance_net, 1230.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.total_allowance_net, 44_280.0, epsilon = 1e-6);
        assert_abs_diff_eq!(
            result.net_benefit,
            44_280.0 - result.monthly_total * 36.0 + 80_000.0,
            epsilon = 1e-6
        );
        // 3610 * 0.59
        assert_abs_diff_eq!(result.company_car.monthly_tax_cost, 2129.9, epsilon = 1e-6);
        assert_abs_diff_eq!(result.company_car.total_tax_cost, 76_676.4, epsilon = 1e-6);
        assert_eq!(result.company_car.net_cost, -result.company_car.total_tax_cost);
    }

    #[test]
    fn test_override_replaces_statutory_value() {
        let scenario = Scenario {
            company_car_taxable_value: Some(2_750.0),
            ..Scenario::default()
        };
        let result = calculate_scenario(&scenario);
        assert_eq!(result.company_car.monthly_taxable_value, 2_750.0);

        let zero = Scenario {
            company_car_taxable_value: Some(0.0),
            ..Scenario::default()
        };
        assert_eq!(calculate_scenario(&zero).company_car.monthly_taxable_value, 0.0);
    }

    #[test]
    fn test_company_net_cost_is_never_positive() {
        for powertrain in [Powertrain::Electric, Powertrain::Hybrid, Powertrain::Ice] {
            for price in [10_000.0, 150_000.0, 900_000.0] {
                let scenario = Scenario { powertrain, price, ..Scenario::default() };
                assert!(calculate_scenario(&scenario).company_car.net_cost <= 0.0);
            }
        }
    }

    #[test]
    fn test_decision_consistency() {
        let scenarios = [
            Scenario::default(),
            Scenario { employer_allowance: 12_000.0, ..Scenario::default() },
            Scenario { employer_allowance: 0.0, ..Scenario::default() },
            Scenario { powertrain: Powertrain::Ice, finance_years: 0, ..Scenario::default() },
            Scenario { horizon_years: 7, residual_pct: 20.0, ..Scenario::default() },
        ];
        for scenario in &scenarios {
            let result = calculate_scenario(scenario);
            let comparison = &result.comparison;
            assert_eq!(
                comparison.better_option == BetterOption::Personal,
                comparison.difference > 0.0
            );
            assert_relative_eq!(
                comparison.difference,
                comparison.monthly_difference * result.total_months,
                max_relative = 1e-12
            );
            assert_abs_diff_eq!(
                comparison.difference,
                result.net_benefit - result.company_car.net_cost,
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_generous_allowance_favours_personal() {
        let scenario = Scenario { employer_allowance: 20_000.0, ..Scenario::default() };
        assert_eq!(calculate_scenario(&scenario).comparison.better_option, BetterOption::Personal);
    }

    #[test]
    fn test_no_allowance_favours_company() {
        let scenario = Scenario { employer_allowance: 0.0, ..Scenario::default() };
        assert_eq!(calculate_scenario(&scenario).comparison.better_option, BetterOption::Company);
    }

    #[test]
    fn test_tie_goes_to_company() {
        // Nothing received, nothing spent, nothing taxed
        let scenario = Scenario {
            price: 0.0,
            annual_km: 0.0,
            monthly_maint: 0.0,
            monthly_insurance: 0.0,
            employer_allowance: 0.0,
            company_car_taxable_value: Some(0.0),
            ..Scenario::default()
        };
        let result = calculate_scenario(&scenario);
        assert_eq!(result.comparison.difference, 0.0);
        assert_eq!(result.comparison.better_option, BetterOption::Company);
    }

    #[test]
    fn test_zero_horizon_is_not_rejected() {
        let scenario = Scenario { horizon_years: 0, ..Scenario::default() };
        let result = calculate_scenario(&scenario);
        assert_eq!(result.total_months, 0.0);
        assert!(!result.comparison.monthly_difference.is_finite());
    }

    #[test]
    fn test_schedule_is_pluggable() {
        let schedule = BenefitSchedule {
            tax_year: "2030".into(),
            monthly_rate: 0.03,
            ..BenefitSchedule::default()
        };
        let scenario = Scenario { powertrain: Powertrain::Ice, price: 100_000.0, ..Scenario::default() };
        let result = calculate_scenario_with(&scenario, &schedule);
        assert_abs_diff_eq!(result.company_car.monthly_taxable_value, 3000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_batch_keeps_order() {
        let scenarios: Vec<Scenario> = (1..=8)
            .map(|i| Scenario {
                name: format!("car {i}"),
                price: 50_000.0 * f64::from(i),
                ..Scenario::default()
            })
            .collect();
        let schedule = BenefitSchedule::default();
        let batch = calculate_batch(&scenarios, &schedule);
        assert_eq!(batch.len(), scenarios.len());
        for (scenario, result) in scenarios.iter().zip(&batch) {
            assert_eq!(result, &calculate_scenario_with(scenario, &schedule));
        }
    }
}
