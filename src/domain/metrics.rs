//! Build metrics: total cost, system power draw and PSU sizing.
//!
//! This is the only deterministic arithmetic in the advisor. The model calls
//! it as a tool with whatever parts it has picked so far.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::{
    index_path, join_path, ValidationErrors, Validator, Violation, ViolationKind,
};

/// Draw from motherboard, RAM, fans and USB devices not itemized per part.
pub const SYSTEM_OVERHEAD_WATTS: i64 = 50;

/// Largest draw, in either direction, accepted for a single part.
pub const MAX_COMPONENT_WATTAGE: i64 = 100_000;

/// PSU headroom factor of 1.2, kept as an exact ratio.
const HEADROOM_NUMERATOR: i128 = 12;
const HEADROOM_DENOMINATOR: i128 = 10;

/// One part as seen by the calculator. Absent numbers count as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentMetricsInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub wattage: Option<i64>,
}

impl ComponentMetricsInput {
    pub fn new(name: impl Into<String>, price: f64, wattage: i64) -> Self {
        Self {
            name: Some(name.into()),
            price: Some(price),
            wattage: Some(wattage),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsStatus {
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub status: MetricsStatus,
    pub total_cost: f64,
    pub calculated_total_wattage: i64,
    pub recommended_psu_wattage_min: i64,
}

/// Aggregate cost and wattage for a set of parts.
///
/// Negative prices and wattages pass through the arithmetic unchanged.
/// Wattage sums are carried in `i128` and saturate at the `i64` bounds.
pub fn compute_metrics(components: &[ComponentMetricsInput]) -> MetricsReport {
    let mut total_cost = 0.0_f64;
    let mut base_wattage = 0_i128;

    for component in components {
        total_cost += component.price.unwrap_or(0.0);
        base_wattage = base_wattage.saturating_add(i128::from(component.wattage.unwrap_or(0)));
    }

    let total_wattage = base_wattage.saturating_add(i128::from(SYSTEM_OVERHEAD_WATTS));
    let psu_minimum = total_wattage.saturating_mul(HEADROOM_NUMERATOR) / HEADROOM_DENOMINATOR;

    MetricsReport {
        status: MetricsStatus::Success,
        total_cost: round_cents(total_cost),
        calculated_total_wattage: saturate_i64(total_wattage),
        recommended_psu_wattage_min: saturate_i64(psu_minimum),
    }
}

fn saturate_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Round half to even on the float's exact binary value, so 2.675 (stored as
/// 2.67499...) becomes 2.67.
fn round_cents(value: f64) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp(2))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

/// Parse the raw `components` list handed over by the model or an HTTP client.
///
/// Missing, null or empty-string numbers default to zero. Numeric strings are
/// accepted. Anything else numeric-looking fails with a type mismatch naming
/// the offending path, and a wattage beyond [`MAX_COMPONENT_WATTAGE`] is a
/// constraint violation. Every bad field is reported.
pub fn parse_components(payload: &Value) -> Result<Vec<ComponentMetricsInput>, ValidationErrors> {
    let mut v = Validator::new();
    let mut parsed = Vec::new();

    let items: &[Value] = match payload.get("components") {
        Some(Value::Array(items)) => items.as_slice(),
        // The tool is also called with nothing picked yet.
        None | Some(Value::Null) => &[],
        Some(other) => {
            return Err(ValidationErrors::single(Violation::type_mismatch(
                "components",
                "array",
                other,
            )))
        }
    };

    for (i, item) in items.iter().enumerate() {
        let path = index_path("components", i);
        let Some(record) = v.object(item, &path) else {
            continue;
        };

        let name = match record.get("name") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        let price_path = join_path(&path, "price");
        let price = match coerce_number(record.get("price")) {
            Ok(price) => price,
            Err(found) => {
                v.push(Violation::type_mismatch(price_path, "number", found));
                None
            }
        };

        let wattage_path = join_path(&path, "wattage");
        let wattage = match coerce_number(record.get("wattage")) {
            Ok(Some(w)) if w.abs() > MAX_COMPONENT_WATTAGE as f64 => {
                v.push(Violation::new(
                    wattage_path,
                    ViolationKind::Constraint,
                    format!(
                        "must be between -{MAX_COMPONENT_WATTAGE} and {MAX_COMPONENT_WATTAGE} watts"
                    ),
                ));
                None
            }
            // In range, so the cast cannot saturate.
            Ok(wattage) => wattage.map(|w| w.trunc() as i64),
            Err(found) => {
                v.push(Violation::type_mismatch(wattage_path, "integer", found));
                None
            }
        };

        parsed.push(ComponentMetricsInput {
            name,
            price,
            wattage,
        });
    }

    v.into_result().map(|()| parsed)
}

fn coerce_number(value: Option<&Value>) -> Result<Option<f64>, &Value> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(found @ Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            match s.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Some(n)),
                _ => Err(found),
            }
        }
        Some(found) => Err(found),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_build_has_only_overhead() {
        let report = compute_metrics(&[]);
        assert_eq!(report.status, MetricsStatus::Success);
        assert_eq!(report.total_cost, 0.0);
        assert_eq!(report.calculated_total_wattage, 50);
        assert_eq!(report.recommended_psu_wattage_min, 60);
    }

    #[test]
    fn sums_cost_and_wattage_with_headroom() {
        let report = compute_metrics(&[
            ComponentMetricsInput::new("cpu", 300.0, 125),
            ComponentMetricsInput::new("mobo", 200.0, 0),
        ]);
        assert_eq!(report.total_cost, 500.0);
        assert_eq!(report.calculated_total_wattage, 175);
        assert_eq!(report.recommended_psu_wattage_min, 210);
    }

    #[test]
    fn headroom_truncates() {
        // 13 + 50 = 63, 63 * 1.2 = 75.6
        let report = compute_metrics(&[ComponentMetricsInput::new("fan", 0.0, 13)]);
        assert_eq!(report.recommended_psu_wattage_min, 75);
    }

    #[test]
    fn repeated_calls_agree() {
        let parts = vec![
            ComponentMetricsInput::new("gpu", 2999.99, 220),
            ComponentMetricsInput::new("cpu", 1699.01, 120),
        ];
        assert_eq!(compute_metrics(&parts), compute_metrics(&parts));
    }

    #[test]
    fn total_cost_is_rounded_to_cents() {
        let report = compute_metrics(&[
            ComponentMetricsInput::new("a", 0.1, 0),
            ComponentMetricsInput::new("b", 0.2, 0),
        ]);
        assert_eq!(report.total_cost, 0.3);

        let report = compute_metrics(&[ComponentMetricsInput::new("c", 19.999, 0)]);
        assert_eq!(report.total_cost, 20.0);

        // Binary values just under the midpoint round down.
        for (price, expected) in [(2.675, 2.67), (0.015, 0.01), (0.285, 0.28)] {
            let report = compute_metrics(&[ComponentMetricsInput::new("d", price, 0)]);
            assert_eq!(report.total_cost, expected, "{price}");
        }
    }

    #[test]
    fn oversized_wattage_is_a_constraint_violation() {
        let errors = parse_components(&json!({
            "components": [
                { "name": "gpu", "price": 1, "wattage": 1e18 },
                { "name": "psu", "price": 1, "wattage": "-1e300" },
                { "name": "cpu", "price": 1, "wattage": 100000 }
            ]
        }))
        .unwrap_err();

        assert_eq!(errors.violations.len(), 2);
        assert_eq!(errors.find("components[0].wattage").unwrap().kind, ViolationKind::Constraint);
        assert_eq!(errors.find("components[1].wattage").unwrap().kind, ViolationKind::Constraint);
        assert!(errors.find("components[2].wattage").is_none());
    }

    #[test]
    fn extreme_wattage_saturates_instead_of_overflowing() {
        let report = compute_metrics(&[
            ComponentMetricsInput::new("a", 1.0, i64::MAX),
            ComponentMetricsInput::new("b", 1.0, i64::MAX),
        ]);
        assert_eq!(report.calculated_total_wattage, i64::MAX);
        assert_eq!(report.recommended_psu_wattage_min, i64::MAX);

        let report = compute_metrics(&[ComponentMetricsInput::new("c", 0.0, i64::MIN)]);
        assert_eq!(report.calculated_total_wattage, i64::MIN + 50);
        assert_eq!(report.recommended_psu_wattage_min, i64::MIN);
    }

    #[test]
    fn negative_values_pass_through() {
        let report = compute_metrics(&[ComponentMetricsInput::new("rebate", -50.0, -10)]);
        assert_eq!(report.total_cost, -50.0);
        assert_eq!(report.calculated_total_wattage, 40);
        assert_eq!(report.recommended_psu_wattage_min, 48);
    }

    #[test]
    fn missing_wattage_behaves_like_zero() {
        let parsed = parse_components(&json!({ "components": [{ "price": 100 }] })).unwrap();
        let explicit = parse_components(&json!({ "components": [{ "price": 100, "wattage": 0 }] }))
            .unwrap();
        assert_eq!(
            compute_metrics(&parsed),
            compute_metrics(&explicit),
        );
    }

    #[test]
    fn null_price_behaves_like_zero() {
        let parsed =
            parse_components(&json!({ "components": [{ "price": null, "wattage": 200 }] })).unwrap();
        let report = compute_metrics(&parsed);
        assert_eq!(report.total_cost, 0.0);
        assert_eq!(report.calculated_total_wattage, 250);
        assert_eq!(report.recommended_psu_wattage_min, 300);
    }

    #[test]
    fn numeric_strings_and_fractional_wattage_are_coerced() {
        let parsed = parse_components(&json!({
            "components": [
                { "name": "cpu", "price": "300.50", "wattage": "125" },
                { "name": "gpu", "price": 199.5, "wattage": 219.9 },
                { "name": "case", "price": "", "wattage": "" }
            ]
        }))
        .unwrap();
        assert_eq!(parsed[0].price, Some(300.5));
        assert_eq!(parsed[1].wattage, Some(219));
        assert_eq!(parsed[2], ComponentMetricsInput { name: Some("case".into()), price: None, wattage: None });

        let report = compute_metrics(&parsed);
        assert_eq!(report.total_cost, 500.0);
        assert_eq!(report.calculated_total_wattage, 394);
    }

    #[test]
    fn garbage_values_fail_with_paths() {
        let errors = parse_components(&json!({
            "components": [
                { "name": "cpu", "price": "cheap", "wattage": 65 },
                { "name": "gpu", "price": 10, "wattage": true },
                "psu"
            ]
        }))
        .unwrap_err();

        assert_eq!(errors.violations.len(), 3);
        assert_eq!(errors.find("components[0].price").unwrap().kind, ViolationKind::TypeMismatch);
        assert_eq!(errors.find("components[1].wattage").unwrap().kind, ViolationKind::TypeMismatch);
        assert_eq!(errors.find("components[2]").unwrap().kind, ViolationKind::TypeMismatch);
    }

    #[test]
    fn missing_component_list_is_an_empty_build() {
        let parsed = parse_components(&json!({})).unwrap();
        assert!(parsed.is_empty());

        let errors = parse_components(&json!({ "components": "cpu" })).unwrap_err();
        assert_eq!(errors.violations[0].path, "components");
    }

    #[test]
    fn report_serializes_flat() {
        let value = serde_json::to_value(compute_metrics(&[])).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "success",
                "total_cost": 0.0,
                "calculated_total_wattage": 50,
                "recommended_psu_wattage_min": 60
            })
        );
    }
}
