//! User-supplied build constraints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::{Field, Rule, ValidationErrors, Validator};

pub const DEFAULT_CURRENCY: &str = "MYR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub budget_cap: f64,
    #[serde(default = "default_currency")]
    pub currency: Option<String>,
    /// e.g. "strict", "moderate", "flexible"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flexibility: Option<String>,
}

impl Financials {
    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRequirements {
    pub primary_use: Vec<String>,
    #[serde(default = "default_resolution")]
    pub target_resolution: Option<String>,
    #[serde(default = "default_form_factor")]
    pub form_factor_target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lighting_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_theme: Option<String>,
    #[serde(default = "default_platform")]
    pub cpu_preferred_platform: Option<String>,
}

/// One user turn's worth of build constraints. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub financials: Financials,
    pub build_requirements: BuildRequirements,
    pub component_preferences: ComponentPreferences,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_prompt: Option<String>,
}

fn default_currency() -> Option<String> {
    Some(DEFAULT_CURRENCY.to_string())
}

fn default_resolution() -> Option<String> {
    Some("Unknown".to_string())
}

fn default_form_factor() -> Option<String> {
    Some("ATX".to_string())
}

fn default_platform() -> Option<String> {
    Some("Any".to_string())
}

const FINANCIALS: &[Field] = &[
    Field::required("budget_cap", Rule::PositiveNumber),
    Field::optional("currency", Rule::CurrencyCode),
    Field::optional("flexibility", Rule::String),
];

const BUILD_REQUIREMENTS: &[Field] = &[
    Field::required("primary_use", Rule::NonEmptyStringList),
    Field::optional("target_resolution", Rule::String),
    Field::optional("form_factor_target", Rule::String),
];

const COMPONENT_PREFERENCES: &[Field] = &[
    Field::optional("lighting_style", Rule::String),
    Field::optional("color_theme", Rule::String),
    Field::optional("cpu_preferred_platform", Rule::String),
];

/// Validate a raw payload against the build request shape.
pub fn validate_build_request(payload: &Value) -> Result<BuildRequest, ValidationErrors> {
    let mut v = Validator::new();

    if let Some(root) = v.object(payload, "") {
        if let Some((obj, path)) = v.child_object(root, "", "financials", true) {
            v.fields(obj, &path, FINANCIALS);
        }
        if let Some((obj, path)) = v.child_object(root, "", "build_requirements", true) {
            v.fields(obj, &path, BUILD_REQUIREMENTS);
        }
        if let Some((obj, path)) = v.child_object(root, "", "component_preferences", true) {
            v.fields(obj, &path, COMPONENT_PREFERENCES);
        }
        v.check(
            root.get("user_prompt"),
            "user_prompt",
            &Field::optional("user_prompt", Rule::String),
        );
    }

    v.finish(payload)
}

/// Chat text that is a JSON object is taken as a structured build request.
///
/// Returns `Ok(None)` for free text, so only structured input is validated.
pub fn parse_message_text(text: &str) -> Result<Option<BuildRequest>, ValidationErrors> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(payload @ Value::Object(_)) => validate_build_request(&payload).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ViolationKind;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "financials": { "budget_cap": 5000, "currency": "MYR", "flexibility": "moderate" },
            "build_requirements": { "primary_use": ["gaming", "streaming"], "target_resolution": "1440p" },
            "component_preferences": { "lighting_style": "RGB", "color_theme": "White" },
            "user_prompt": "Quiet case please"
        })
    }

    #[test]
    fn accepts_a_complete_request_and_applies_defaults() {
        let request = validate_build_request(&valid_payload()).unwrap();
        assert_eq!(request.financials.budget_cap, 5000.0);
        assert_eq!(request.build_requirements.primary_use, vec!["gaming", "streaming"]);
        assert_eq!(request.build_requirements.form_factor_target.as_deref(), Some("ATX"));
        assert_eq!(
            request.component_preferences.cpu_preferred_platform.as_deref(),
            Some("Any")
        );
        assert_eq!(request.user_prompt.as_deref(), Some("Quiet case please"));
    }

    #[test]
    fn missing_currency_defaults_to_myr() {
        let payload = json!({
            "financials": { "budget_cap": 3000 },
            "build_requirements": { "primary_use": ["office"] },
            "component_preferences": {}
        });
        let request = validate_build_request(&payload).unwrap();
        assert_eq!(request.financials.currency(), "MYR");
    }

    #[test]
    fn null_currency_still_reads_as_default() {
        let payload = json!({
            "financials": { "budget_cap": 3000, "currency": null },
            "build_requirements": { "primary_use": ["office"] },
            "component_preferences": {}
        });
        let request = validate_build_request(&payload).unwrap();
        assert_eq!(request.financials.currency, None);
        assert_eq!(request.financials.currency(), "MYR");
    }

    #[test]
    fn budget_cap_must_be_positive() {
        let mut payload = valid_payload();
        payload["financials"]["budget_cap"] = json!(0);
        let errors = validate_build_request(&payload).unwrap_err();
        let violation = errors.find("financials.budget_cap").unwrap();
        assert_eq!(violation.kind, ViolationKind::Constraint);
    }

    #[test]
    fn reports_all_violations_at_once() {
        let payload = json!({
            "financials": { "budget_cap": "lots", "currency": "RINGGIT" },
            "build_requirements": { "primary_use": [] },
            "user_prompt": 42
        });
        let errors = validate_build_request(&payload).unwrap_err();
        let paths: Vec<&str> = errors.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "financials.budget_cap",
                "financials.currency",
                "build_requirements.primary_use",
                "component_preferences",
                "user_prompt",
            ]
        );
        assert_eq!(
            errors.find("component_preferences").unwrap().kind,
            ViolationKind::Missing
        );
    }

    #[test]
    fn non_object_payload_is_a_type_mismatch() {
        let errors = validate_build_request(&json!(["gaming"])).unwrap_err();
        assert_eq!(errors.violations[0].path, "$");
        assert_eq!(errors.violations[0].kind, ViolationKind::TypeMismatch);
    }

    #[test]
    fn free_text_messages_are_not_structured() {
        assert_eq!(parse_message_text("4000 MYR gaming rig please").unwrap(), None);
        assert_eq!(parse_message_text("[1, 2]").unwrap(), None);
    }

    #[test]
    fn json_messages_are_validated() {
        let text = valid_payload().to_string();
        assert!(parse_message_text(&text).unwrap().is_some());

        let err = parse_message_text(r#"{"financials": {"budget_cap": 0}}"#).unwrap_err();
        assert!(err.find("financials.budget_cap").is_some());
        assert!(err.find("build_requirements").is_some());
    }
}
