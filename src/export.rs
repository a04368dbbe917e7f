//! Export of a finished calculation.
//!
//! Spreadsheet and document renderers want flat rows, so [`flatten`]
//! turns a scenario and its result into dotted keys mapped to scalar
//! JSON values.  [`ExportDocument`] is the nested form written to a
//! downloadable JSON file.

use crate::models::{CalculationResult, Scenario};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A scenario together with its result, as written to an export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub scenario: Scenario,
    pub calculation: CalculationResult,
}

/// Flat key/value view of a scenario and its result.
///
/// Keys are prefixed `scenario.` and `result.`; nested records add
/// further segments, e.g. `result.companyCar.netCost`.  Absent optional
/// inputs are omitted.  Keys come out sorted.
pub fn flatten(scenario: &Scenario, result: &CalculationResult) -> Map<String, Value> {
    let mut rows = Map::new();
    flatten_into(&mut rows, "scenario", json_value(scenario));
    flatten_into(&mut rows, "result", json_value(result));
    rows
}

fn json_value<T: Serialize>(value: &T) -> Value {
    // Models contain only strings, numbers and enums, which always serialise.
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn flatten_into(rows: &mut Map<String, Value>, prefix: &str, value: Value) {
    match value {
        Value::Object(fields) => {
            for (key, field) in fields {
                flatten_into(rows, &format!("{prefix}.{key}"), field);
            }
        }
        scalar => {
            rows.insert(prefix.to_string(), scalar);
        }
    }
}

/// Name of the export file for a scenario calculated on `date`.
pub fn export_file_name(name: &str, date: NaiveDate) -> String {
    format!("car-calculation-{}-{}.json", name, date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calculate_scenario;
    use serde_json::json;

    #[test]
    fn test_flatten_keys() {
        let scenario = Scenario::default();
        let result = calculate_scenario(&scenario);
        let rows = flatten(&scenario, &result);

        assert_eq!(rows["scenario.price"], json!(200_000.0));
        assert_eq!(rows["scenario.powertrain"], json!("electric"));
        assert_eq!(rows["result.companyCar.netCost"], json!(result.company_car.net_cost));
        assert_eq!(rows["result.comparison.betterOption"], json!("personal"));
        assert!(!rows.contains_key("scenario.companyCarTaxableValue"));
        assert!(rows.values().all(|v| !v.is_object() && !v.is_array()));
    }

    #[test]
    fn test_flatten_is_lossless() {
        let scenario = Scenario { company_car_taxable_value: Some(1234.5), ..Scenario::default() };
        let result = calculate_scenario(&scenario);
        let rows = flatten(&scenario, &result);

        assert_eq!(rows["scenario.companyCarTaxableValue"], json!(1234.5));
        assert_eq!(rows["result.monthlyPayment"].as_f64(), Some(result.monthly_payment));
        assert_eq!(
            rows["result.comparison.monthlyDifference"].as_f64(),
            Some(result.comparison.monthly_difference)
        );
        // 22 scenario fields plus 8 top-level, 4 company car and 3 comparison results
        assert_eq!(rows.len(), 22 + 8 + 4 + 3);
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(export_file_name("Model 3", date), "car-calculation-Model 3-2025-03-07.json");
    }
}
