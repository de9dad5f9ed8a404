//! Structural validation of raw JSON payloads.
//!
//! Payloads coming from clients or from the model are walked field by field
//! before they are deserialized, so that every offending field is reported
//! with its path instead of stopping at the first serde error.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Category of a single violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Missing,
    TypeMismatch,
    EnumConstraint,
    Constraint,
}

/// One offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn type_mismatch(path: impl Into<String>, expected: &str, found: &Value) -> Self {
        Self::new(
            path,
            ViolationKind::TypeMismatch,
            format!("expected {expected}, found {}", type_name(found)),
        )
    }
}

/// Every violation found in a payload. Never empty when returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{} schema violation(s): {}", .violations.len(), describe(.violations))]
pub struct ValidationErrors {
    pub violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn single(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    pub fn find(&self, path: &str) -> Option<&Violation> {
        self.violations.iter().find(|v| v.path == path)
    }
}

fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.path, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Shape expected for a single field.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
    String,
    Number,
    NonNegativeNumber,
    PositiveNumber,
    Integer,
    StringList,
    NonEmptyStringList,
    CurrencyCode,
    OneOf(&'static [&'static str]),
    Object,
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub rule: Rule,
    pub required: bool,
}

impl Field {
    pub const fn required(name: &'static str, rule: Rule) -> Self {
        Self {
            name,
            rule,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, rule: Rule) -> Self {
        Self {
            name,
            rule,
            required: false,
        }
    }
}

pub fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

pub fn index_path(parent: &str, index: usize) -> String {
    format!("{parent}[{index}]")
}

pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Accumulates violations while walking a payload.
#[derive(Debug, Default)]
pub struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Require `value` to be a JSON object.
    pub fn object<'a>(&mut self, value: &'a Value, path: &str) -> Option<&'a Map<String, Value>> {
        match value.as_object() {
            Some(map) => Some(map),
            None => {
                let path = if path.is_empty() { "$" } else { path };
                self.push(Violation::type_mismatch(path, "object", value));
                None
            }
        }
    }

    /// Look up a nested object. Null counts as absent.
    pub fn child_object<'a>(
        &mut self,
        parent: &'a Map<String, Value>,
        parent_path: &str,
        key: &str,
        required: bool,
    ) -> Option<(&'a Map<String, Value>, String)> {
        let path = join_path(parent_path, key);
        match parent.get(key) {
            None | Some(Value::Null) => {
                if required {
                    self.push(Violation::new(
                        path,
                        ViolationKind::Missing,
                        "field is required",
                    ));
                }
                None
            }
            Some(value) => self.object(value, &path).map(|map| (map, path)),
        }
    }

    pub fn fields(&mut self, object: &Map<String, Value>, parent_path: &str, fields: &[Field]) {
        for field in fields {
            self.check(object.get(field.name), &join_path(parent_path, field.name), field);
        }
    }

    pub fn check(&mut self, value: Option<&Value>, path: &str, field: &Field) {
        let value = match value {
            None | Some(Value::Null) => {
                if field.required {
                    self.push(Violation::new(path, ViolationKind::Missing, "field is required"));
                }
                return;
            }
            Some(value) => value,
        };

        match field.rule {
            Rule::String => {
                if !value.is_string() {
                    self.push(Violation::type_mismatch(path, "string", value));
                }
            }
            Rule::Number => {
                if !value.is_number() {
                    self.push(Violation::type_mismatch(path, "number", value));
                }
            }
            Rule::NonNegativeNumber => match value.as_f64() {
                Some(n) if n >= 0.0 => {}
                Some(_) => self.push(Violation::new(
                    path,
                    ViolationKind::Constraint,
                    "must be greater than or equal to 0",
                )),
                None => self.push(Violation::type_mismatch(path, "number", value)),
            },
            Rule::PositiveNumber => match value.as_f64() {
                Some(n) if n > 0.0 => {}
                Some(_) => self.push(Violation::new(
                    path,
                    ViolationKind::Constraint,
                    "must be greater than 0",
                )),
                None => self.push(Violation::type_mismatch(path, "number", value)),
            },
            Rule::Integer => {
                if value.as_i64().is_none() {
                    self.push(Violation::type_mismatch(path, "integer", value));
                }
            }
            Rule::StringList | Rule::NonEmptyStringList => match value.as_array() {
                Some(items) => {
                    if items.is_empty() && matches!(field.rule, Rule::NonEmptyStringList) {
                        self.push(Violation::new(
                            path,
                            ViolationKind::Constraint,
                            "must contain at least one entry",
                        ));
                    }
                    for (i, item) in items.iter().enumerate() {
                        if !item.is_string() {
                            self.push(Violation::type_mismatch(index_path(path, i), "string", item));
                        }
                    }
                }
                None => self.push(Violation::type_mismatch(path, "array of strings", value)),
            },
            Rule::CurrencyCode => match value.as_str() {
                Some(code) if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {}
                Some(code) => self.push(Violation::new(
                    path,
                    ViolationKind::Constraint,
                    format!("expected a three-letter currency code, found \"{code}\""),
                )),
                None => self.push(Violation::type_mismatch(path, "string", value)),
            },
            Rule::OneOf(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => {}
                Some(s) => self.push(Violation::new(
                    path,
                    ViolationKind::EnumConstraint,
                    format!("expected one of {}, found \"{s}\"", allowed.join(", ")),
                )),
                None => self.push(Violation::type_mismatch(path, "string", value)),
            },
            Rule::Object => {
                if !value.is_object() {
                    self.push(Violation::type_mismatch(path, "object", value));
                }
            }
        }
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                violations: self.violations,
            })
        }
    }

    /// Deserialize `value` into `T` if nothing was flagged.
    pub fn finish<T: DeserializeOwned>(self, value: &Value) -> Result<T, ValidationErrors> {
        self.into_result()?;

        serde_json::from_value(value.clone()).map_err(|e| {
            ValidationErrors::single(Violation::new("$", ViolationKind::TypeMismatch, e.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn collects_every_violation() {
        let payload = json!({ "name": 3, "tags": ["a", 1], "mode": "fast" });
        let object = payload.as_object().unwrap();

        let mut validator = Validator::new();
        validator.fields(
            object,
            "root",
            &[
                Field::required("name", Rule::String),
                Field::required("tags", Rule::StringList),
                Field::optional("mode", Rule::OneOf(&["slow", "steady"])),
                Field::required("size", Rule::Integer),
            ],
        );

        let errors = validator.finish::<Value>(&payload).unwrap_err();
        assert_eq!(errors.violations.len(), 4);
        assert_eq!(errors.find("root.name").unwrap().kind, ViolationKind::TypeMismatch);
        assert_eq!(errors.find("root.tags[1]").unwrap().kind, ViolationKind::TypeMismatch);
        assert_eq!(errors.find("root.mode").unwrap().kind, ViolationKind::EnumConstraint);
        assert_eq!(errors.find("root.size").unwrap().kind, ViolationKind::Missing);
    }

    #[test]
    fn null_optional_is_absent_but_null_required_is_missing() {
        let payload = json!({ "a": null, "b": null });
        let mut validator = Validator::new();
        validator.fields(
            payload.as_object().unwrap(),
            "",
            &[Field::optional("a", Rule::String), Field::required("b", Rule::String)],
        );
        let errors = validator.finish::<Value>(&payload).unwrap_err();
        assert_eq!(errors.violations.len(), 1);
        assert_eq!(errors.violations[0].path, "b");
        assert_eq!(errors.violations[0].kind, ViolationKind::Missing);
    }

    #[test]
    fn integer_rule_rejects_fractions_and_strings() {
        let mut validator = Validator::new();
        let field = Field::required("w", Rule::Integer);
        validator.check(Some(&json!(125)), "w", &field);
        assert!(validator.is_clean());
        validator.check(Some(&json!(12.5)), "w", &field);
        validator.check(Some(&json!("125")), "w", &field);
        let errors = validator.finish::<Value>(&json!({})).unwrap_err();
        assert_eq!(errors.violations.len(), 2);
    }

    #[test]
    fn display_lists_paths() {
        let errors = ValidationErrors::single(Violation::new(
            "financials.budget_cap",
            ViolationKind::Constraint,
            "must be greater than 0",
        ));
        assert_eq!(
            errors.to_string(),
            "1 schema violation(s): financials.budget_cap: must be greater than 0"
        );
    }
}
