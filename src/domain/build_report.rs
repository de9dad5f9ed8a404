//! The finished build report the advisor hands back at the end of a turn.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::build_request::DEFAULT_CURRENCY;
use crate::validation::{Field, Rule, ValidationErrors, Validator};

/// A selected part. `S` is the slot-specific spec sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component<S> {
    pub model_name: String,
    pub price: f64,
    pub vendor_url: String,
    pub specs: S,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuSpecs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_boost_clock: Option<String>,
    pub tdp_watts: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuSpecs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chipset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_mm: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_width: Option<f64>,
    pub tgp_watts: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormFactor {
    #[serde(rename = "ATX")]
    Atx,
    #[serde(rename = "mATX")]
    MicroAtx,
    #[serde(rename = "ITX")]
    Itx,
}

impl FormFactor {
    pub const ALLOWED: &'static [&'static str] = &["ATX", "mATX", "ITX"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotherboardSpecs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_factor: Option<FormFactor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rear_io_ports: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_headers: Option<Vec<String>>,
    pub max_power_draw_watts: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modularity {
    Full,
    Semi,
    Non,
}

impl Modularity {
    pub const ALLOWED: &'static [&'static str] = &["Full", "Semi", "Non"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PsuSpecs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wattage: Option<i64>,
    /// Efficiency rating, e.g. "80+ Gold".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modular: Option<Modularity>,
}

/// Loosely typed spec value for slots without a fixed spec sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
    List(Vec<SpecValue>),
    Map(BTreeMap<String, SpecValue>),
}

/// Open key/value spec sheet (RAM, storage). Only its presence is checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpenSpecs(pub BTreeMap<String, SpecValue>);

impl OpenSpecs {
    pub fn get(&self, key: &str) -> Option<&SpecValue> {
        self.0.get(key)
    }
}

pub type CpuComponent = Component<CpuSpecs>;
pub type GpuComponent = Component<GpuSpecs>;
pub type MotherboardComponent = Component<MotherboardSpecs>;
pub type PsuComponent = Component<PsuSpecs>;
pub type GenericComponent = Component<OpenSpecs>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_estimated_cost: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: Option<String>,
}

impl ReportMeta {
    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildComponents {
    pub cpu: CpuComponent,
    pub motherboard: MotherboardComponent,
    pub ram: GenericComponent,
    pub storage: GenericComponent,
    /// Absent when the build relies on integrated graphics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpu: Option<GpuComponent>,
    pub psu: PsuComponent,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceEstimates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_total_wattage: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gaming_1440p_fps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workstation_score: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    pub report_meta: ReportMeta,
    pub components: BuildComponents,
    pub performance_estimates: PerformanceEstimates,
}

fn default_currency() -> Option<String> {
    Some(DEFAULT_CURRENCY.to_string())
}

// =============================================================================
// Validation rules
// =============================================================================

const REPORT_META: &[Field] = &[
    Field::optional("build_id", Rule::String),
    Field::optional("generated_at", Rule::String),
    Field::optional("total_estimated_cost", Rule::Number),
    Field::optional("currency", Rule::String),
];

const COMPONENT_BASE: &[Field] = &[
    Field::required("model_name", Rule::String),
    Field::required("price", Rule::NonNegativeNumber),
    Field::required("vendor_url", Rule::String),
];

const CPU_SPECS: &[Field] = &[
    Field::optional("socket", Rule::String),
    Field::optional("core_count", Rule::String),
    Field::optional("base_boost_clock", Rule::String),
    Field::required("tdp_watts", Rule::Integer),
];

const GPU_SPECS: &[Field] = &[
    Field::optional("chipset", Rule::String),
    Field::optional("vram", Rule::String),
    Field::optional("length_mm", Rule::Integer),
    Field::optional("slot_width", Rule::Number),
    Field::required("tgp_watts", Rule::Integer),
];

const MOTHERBOARD_SPECS: &[Field] = &[
    Field::optional("form_factor", Rule::OneOf(FormFactor::ALLOWED)),
    Field::optional("socket", Rule::String),
    Field::optional("rear_io_ports", Rule::StringList),
    Field::optional("internal_headers", Rule::StringList),
    Field::required("max_power_draw_watts", Rule::Integer),
];

const PSU_SPECS: &[Field] = &[
    Field::optional("wattage", Rule::Integer),
    Field::optional("rating", Rule::String),
    Field::optional("modular", Rule::OneOf(Modularity::ALLOWED)),
];

const PERFORMANCE_ESTIMATES: &[Field] = &[
    Field::optional("calculated_total_wattage", Rule::Integer),
    Field::optional("gaming_1440p_fps", Rule::String),
    Field::optional("workstation_score", Rule::String),
];

/// Spec sheet shape per slot: strict fields or an open map.
#[derive(Debug, Clone, Copy)]
enum SpecShape {
    Strict(&'static [Field]),
    Open,
}

const SLOTS: &[(&str, bool, SpecShape)] = &[
    ("cpu", true, SpecShape::Strict(CPU_SPECS)),
    ("motherboard", true, SpecShape::Strict(MOTHERBOARD_SPECS)),
    ("ram", true, SpecShape::Open),
    ("storage", true, SpecShape::Open),
    ("gpu", false, SpecShape::Strict(GPU_SPECS)),
    ("psu", true, SpecShape::Strict(PSU_SPECS)),
];

/// Validate a raw payload against the build report shape.
pub fn validate_build_report(payload: &Value) -> Result<BuildReport, ValidationErrors> {
    let mut v = Validator::new();

    if let Some(root) = v.object(payload, "") {
        if let Some((obj, path)) = v.child_object(root, "", "report_meta", true) {
            v.fields(obj, &path, REPORT_META);
        }

        if let Some((components, components_path)) = v.child_object(root, "", "components", true) {
            for (slot, required, shape) in SLOTS {
                let Some((component, path)) =
                    v.child_object(components, &components_path, slot, *required)
                else {
                    continue;
                };
                v.fields(component, &path, COMPONENT_BASE);
                if let Some((specs, specs_path)) = v.child_object(component, &path, "specs", true) {
                    if let SpecShape::Strict(fields) = shape {
                        v.fields(specs, &specs_path, fields);
                    }
                }
            }
        }

        if let Some((obj, path)) = v.child_object(root, "", "performance_estimates", true) {
            v.fields(obj, &path, PERFORMANCE_ESTIMATES);
        }
    }

    v.finish(payload)
}

impl BuildReport {
    /// Parse a report out of model output text, tolerating a surrounding
    /// markdown code fence.
    pub fn from_model_text(text: &str) -> Result<Self, ValidationErrors> {
        let body = strip_code_fence(text);
        let payload: Value = serde_json::from_str(body).map_err(|e| {
            ValidationErrors::single(crate::validation::Violation::new(
                "$",
                crate::validation::ViolationKind::TypeMismatch,
                format!("output is not valid JSON: {e}"),
            ))
        })?;
        validate_build_report(&payload)
    }
}

/// Pull the body out of the first ``` fenced block, wherever it starts.
///
/// A language tag right after the opening fence (```json) is skipped, on the
/// same line or not. Text with no fence comes back trimmed.
pub fn strip_code_fence(text: &str) -> &str {
    const FENCE: &str = "```";

    let trimmed = text.trim();
    let Some(start) = trimmed.find(FENCE) else {
        return trimmed;
    };
    let rest = &trimmed[start + FENCE.len()..];
    let tag_len = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    let rest = &rest[tag_len..];
    match rest.find(FENCE) {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}
