//! Statutory taxable benefit of a company car.
//!
//! The tax authority imputes a monthly taxable value for private use of
//! an employer-provided car: a fixed percentage of the (capped) list
//! price, reduced by a flat deduction for electric and hybrid cars.  The
//! figures change from one tax year to the next, so they live in a
//! [`BenefitSchedule`] rather than in the formula.  Schedules can be
//! stored as JSON files and loaded with [`load_schedules_from_dir`].
//!
//! The [`BenefitCalculator`] trait is the seam for jurisdictions whose
//! rules do not fit the price-percentage shape.

use crate::error::{Error, Result};
use crate::models::Powertrain;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// One tax year's company car benefit parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenefitSchedule {
    /// Label of the tax year, e.g. `"2025"`.  Used to pick a schedule.
    pub tax_year: String,
    /// Prices above this ceiling are treated as equal to it.
    pub price_cap: f64,
    /// Fraction of the capped price taxed per month.
    pub monthly_rate: f64,
    /// Monthly deduction for electric cars.
    pub electric_deduction: f64,
    /// Monthly deduction for hybrid cars.
    pub hybrid_deduction: f64,
}

impl Default for BenefitSchedule {
    /// The 2025 schedule.
    fn default() -> Self {
        Self {
            tax_year: "2025".to_string(),
            price_cap: 583_100.0,
            monthly_rate: 0.0248,
            electric_deduction: 1_350.0,
            hybrid_deduction: 560.0,
        }
    }
}

impl BenefitSchedule {
    /// Monthly taxable value for a car of the given price and powertrain.
    ///
    /// `year` is the registration year.  It is accepted so callers pass
    /// the whole vehicle description, but the schedule does not vary by
    /// vehicle age.
    pub fn taxable_benefit(&self, price: f64, _year: i32, powertrain: Powertrain) -> f64 {
        let base = price.min(self.price_cap) * self.monthly_rate;
        match powertrain {
            Powertrain::Electric => (base - self.electric_deduction).max(0.0),
            Powertrain::Hybrid => (base - self.hybrid_deduction).max(0.0),
            Powertrain::Ice => base,
        }
    }
}

/// Computes the monthly taxable value of a company car.
///
/// Implementations must be thread-safe (`Send + Sync`) because batch
/// calculations and the HTTP server share one calculator across threads.
pub trait BenefitCalculator: Send + Sync {
    /// Tax year the calculator applies to.
    fn tax_year(&self) -> &str;
    /// Monthly taxable value for the described vehicle.
    fn monthly_taxable_value(&self, price: f64, year: i32, powertrain: Powertrain) -> f64;
}

impl BenefitCalculator for BenefitSchedule {
    fn tax_year(&self) -> &str {
        &self.tax_year
    }

    fn monthly_taxable_value(&self, price: f64, year: i32, powertrain: Powertrain) -> f64 {
        self.taxable_benefit(price, year, powertrain)
    }
}

/// Statutory monthly taxable value under the default schedule.
pub fn taxable_benefit(price: f64, year: i32, powertrain: Powertrain) -> f64 {
    BenefitSchedule::default().taxable_benefit(price, year, powertrain)
}

/// Load all benefit schedules from a directory.
///
/// Every `.json` file is parsed as a [`BenefitSchedule`].  Files that do
/// not parse are logged and skipped.  A missing directory yields an
/// empty list.
pub fn load_schedules_from_dir(path: &Path) -> Result<Vec<BenefitSchedule>> {
    let mut schedules = Vec::new();
    if !path.is_dir() {
        debug!(?path, "schedule directory not found");
        return Ok(schedules);
    }
    let io_err = |source| Error::Io { path: path.to_path_buf(), source };
    for entry in std::fs::read_dir(path).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file = entry.path();
        if !file.is_file() || file.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        let data = std::fs::read_to_string(&file).map_err(|source| Error::Io {
            path: file.clone(),
            source,
        })?;
        match serde_json::from_str::<BenefitSchedule>(&data) {
            Ok(schedule) => {
                debug!(?file, tax_year = %schedule.tax_year, "loaded benefit schedule");
                schedules.push(schedule);
            }
            Err(err) => warn!(?file, %err, "failed to parse benefit schedule"),
        }
    }
    Ok(schedules)
}

/// Pick the active schedule.
///
/// With an explicit `tax_year` the matching schedule is returned or an
/// error raised.  Otherwise the latest tax year wins.  The built-in
/// default takes part in the selection when no schedule was loaded.
pub fn select_schedule(
    mut schedules: Vec<BenefitSchedule>,
    tax_year: Option<&str>,
) -> Result<BenefitSchedule> {
    if schedules.is_empty() {
        schedules.push(BenefitSchedule::default());
    }
    match tax_year {
        Some(year) => schedules
            .into_iter()
            .find(|s| s.tax_year == year)
            .ok_or_else(|| Error::UnknownTaxYear(year.to_string())),
        None => Ok(schedules
            .into_iter()
            .max_by(|a, b| a.tax_year.cmp(&b.tax_year))
            .unwrap_or_default()),
    }
}
