//! Data models for the Allowance Engine.
//!
//! The `models` module defines the serialisable input and output
//! records of a comparison run.  A [`Scenario`] describes one vehicle,
//! its financing and running costs and the employee's tax position; a
//! [`CalculationResult`] is everything the engine derives from it.  Both
//! derive `Serialize` and `Deserialize` with camelCase field names so
//! they can be persisted as history, exported, or sent over HTTP.

use crate::error::{Error, Result};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Drivetrain category of a vehicle.  Selects which energy cost branch
/// and which statutory deduction applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Powertrain {
    /// Battery electric, charged at home or on public chargers.
    Electric,
    /// Hybrid running partly on electricity and partly on fuel.
    Hybrid,
    /// Internal combustion engine.
    Ice,
}

impl fmt::Display for Powertrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Powertrain::Electric => "electric",
            Powertrain::Hybrid => "hybrid",
            Powertrain::Ice => "ice",
        };
        f.write_str(name)
    }
}

/// Input to the comparison engine.
///
/// Rates are fractions (`0.05` is 5%) except `residual_pct`, which is a
/// percentage of the purchase price.  The engine does not validate any
/// of these values; that is the job of whoever collects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Display label.  Has no effect on the calculation.
    pub name: String,
    /// Registration year of the vehicle.  Informational only; the
    /// statutory benefit accepts it but does not use it.
    pub year: i32,
    pub powertrain: Powertrain,
    /// Purchase price of the vehicle.
    pub price: f64,
    /// Financing term in whole years.  Zero means a cash purchase.
    pub finance_years: u32,
    /// Annual percentage rate of the loan.
    pub apr: f64,
    /// Distance driven per year.
    pub annual_km: f64,
    /// Electricity consumption per 100 distance units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kwh_per_100: Option<f64>,
    /// Fuel efficiency, distance per volume unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub km_per_liter: Option<f64>,
    pub elec_home_price: f64,
    pub elec_public_price: f64,
    /// Fraction of charging done at home, between 0 and 1.
    pub home_charge_share: f64,
    pub fuel_price: f64,
    pub monthly_maint: f64,
    pub monthly_insurance: f64,
    /// Resale value at the end of the horizon, as a percentage of price.
    pub residual_pct: f64,
    /// Gross monthly cash allowance offered by the employer.
    pub employer_allowance: f64,
    /// Length of the comparison in whole years.
    pub horizon_years: u32,
    /// Marginal income tax rate.
    pub tax_bracket: f64,
    /// Social insurance contribution rate.
    pub national_insurance: f64,
    pub health_tax: f64,
    /// Manual monthly taxable value of the company car.  Replaces the
    /// statutory value entirely when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_car_taxable_value: Option<f64>,
}

impl Scenario {
    /// Income tax, social insurance and health tax added together.
    pub fn total_tax_rate(&self) -> f64 {
        self.tax_bracket + self.national_insurance + self.health_tax
    }

    /// Number of months in the comparison horizon.
    pub fn total_months(&self) -> f64 {
        f64::from(self.horizon_years) * 12.0
    }

    /// Checks the scenario at the input boundary.
    ///
    /// The engine accepts anything; this rejects the inputs that would
    /// make the comparison undefined: a zero horizon, non-finite numbers
    /// and a home charging share outside `0..=1`.
    pub fn validate(&self) -> Result<()> {
        if self.horizon_years == 0 {
            return Err(Error::InvalidScenario {
                field: "horizonYears",
                reason: "must be at least one year",
            });
        }
        if !(0.0..=1.0).contains(&self.home_charge_share) {
            return Err(Error::InvalidScenario {
                field: "homeChargeShare",
                reason: "must be between 0 and 1",
            });
        }
        let numbers = [
            ("price", Some(self.price)),
            ("apr", Some(self.apr)),
            ("annualKm", Some(self.annual_km)),
            ("kwhPer100", self.kwh_per_100),
            ("kmPerLiter", self.km_per_liter),
            ("elecHomePrice", Some(self.elec_home_price)),
            ("elecPublicPrice", Some(self.elec_public_price)),
            ("fuelPrice", Some(self.fuel_price)),
            ("monthlyMaint", Some(self.monthly_maint)),
            ("monthlyInsurance", Some(self.monthly_insurance)),
            ("residualPct", Some(self.residual_pct)),
            ("employerAllowance", Some(self.employer_allowance)),
            ("taxBracket", Some(self.tax_bracket)),
            ("nationalInsurance", Some(self.national_insurance)),
            ("healthTax", Some(self.health_tax)),
            ("companyCarTaxableValue", self.company_car_taxable_value),
        ];
        for (field, value) in numbers {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(Error::InvalidScenario { field, reason: "must be a finite number" });
            }
        }
        Ok(())
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: "My car".to_string(),
            year: Utc::now().year(),
            powertrain: Powertrain::Electric,
            price: 200_000.0,
            finance_years: 5,
            apr: 0.05,
            annual_km: 20_000.0,
            kwh_per_100: Some(15.0),
            km_per_liter: Some(15.0),
            elec_home_price: 0.5,
            elec_public_price: 1.5,
            home_charge_share: 0.8,
            fuel_price: 7.0,
            monthly_maint: 500.0,
            monthly_insurance: 300.0,
            residual_pct: 40.0,
            employer_allowance: 3_000.0,
            horizon_years: 3,
            tax_bracket: 0.47,
            national_insurance: 0.07,
            health_tax: 0.05,
            company_car_taxable_value: None,
        }
    }
}

/// Which of the two options comes out ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetterOption {
    /// Take the allowance and own the car privately.
    Personal,
    /// Keep the employer-provided car.
    Company,
}

/// Cost of keeping the company car over the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyCarResult {
    /// Monthly taxable benefit, either the override or the statutory value.
    pub monthly_taxable_value: f64,
    /// Tax actually paid per month on the taxable benefit.
    pub monthly_tax_cost: f64,
    pub total_tax_cost: f64,
    /// Net position of the company car option.  Costs are negative.
    pub net_cost: f64,
}

/// Head-to-head summary of the two options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    /// Personal net benefit minus company net cost.  Positive favours
    /// the personal option.
    pub difference: f64,
    pub better_option: BetterOption,
    pub monthly_difference: f64,
}

/// Output of the comparison engine.  The top-level fields describe the
/// personal (allowance) option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub monthly_payment: f64,
    pub monthly_energy: f64,
    /// Loan payment, energy, maintenance and insurance per month.
    pub monthly_total: f64,
    pub residual_value: f64,
    /// Net allowance received minus everything spent, plus resale value.
    pub net_benefit: f64,
    pub total_months: f64,
    /// Allowance per month after income tax and contributions.
    pub monthly_allowance_net: f64,
    pub total_allowance_net: f64,
    pub company_car: CompanyCarResult,
    pub comparison: ComparisonResult,
}

impl CalculationResult {
    /// Name of the first field that is `NaN` or infinite, if any.
    ///
    /// Finite inputs can still divide by zero inside the annuity formula
    /// (an APR of -2400% makes the discount factor exactly one), and
    /// JSON has no encoding for such values.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        [
            ("monthlyPayment", self.monthly_payment),
            ("monthlyEnergy", self.monthly_energy),
            ("monthlyTotal", self.monthly_total),
            ("residualValue", self.residual_value),
            ("netBenefit", self.net_benefit),
            ("totalMonths", self.total_months),
            ("monthlyAllowanceNet", self.monthly_allowance_net),
            ("totalAllowanceNet", self.total_allowance_net),
            ("companyCar.monthlyTaxableValue", self.company_car.monthly_taxable_value),
            ("companyCar.monthlyTaxCost", self.company_car.monthly_tax_cost),
            ("companyCar.totalTaxCost", self.company_car.total_tax_cost),
            ("companyCar.netCost", self.company_car.net_cost),
            ("comparison.difference", self.comparison.difference),
            ("comparison.monthlyDifference", self.comparison.monthly_difference),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(field, _)| field)
    }

    pub fn is_finite(&self) -> bool {
        self.non_finite_field().is_none()
    }

    /// Passes the result through when every field is finite.
    pub fn ensure_finite(self) -> Result<Self> {
        match self.non_finite_field() {
            Some(field) => Err(Error::UndefinedResult(field)),
            None => Ok(self),
        }
    }
}
