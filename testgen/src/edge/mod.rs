//! Boundary-value generation

use crate::crud::valid_body;
use crate::errors::BAD_REQUEST;
use crate::request::base_request;
use crate::synth::{bounded_string, integer_range, DataSynthesizer};
use flowgen_analyzer::{EndpointInfo, JsonSchema, NumericConstraints, SchemaKind, StringConstraints};
use flowgen_core::FlowStep;
use serde_json::{Map, Number, Value};

/// A boundary value for one property and whether the API should accept it
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCase {
    pub field: String,
    pub label: String,
    pub value: Value,
    pub valid: bool,
}

/// Generates boundary steps for explicitly bounded body properties
pub struct EdgeCaseGenerator<'a> {
    auth_header: Option<&'a str>,
}

impl<'a> EdgeCaseGenerator<'a> {
    pub fn new() -> Self {
        Self { auth_header: None }
    }

    pub fn with_auth(auth_header: Option<&'a str>) -> Self {
        Self { auth_header }
    }

    /// Steps for every bounded property; valid boundaries expect the
    /// endpoint's success status, invalid ones 400.
    pub fn generate_edge_cases(
        &self,
        endpoint: &EndpointInfo,
        synth: &mut DataSynthesizer,
    ) -> Vec<FlowStep> {
        let Some(shape) = endpoint.request_schema.as_ref().and_then(JsonSchema::as_object) else {
            return Vec::new();
        };
        let Some(Value::Object(base)) = valid_body(endpoint, synth) else {
            return Vec::new();
        };

        let cases: Vec<BoundaryCase> = shape
            .properties
            .iter()
            .flat_map(|(name, prop)| boundary_cases(name, prop, &base))
            .collect();

        cases
            .into_iter()
            .map(|case| {
                let mut body: Map<String, Value> = base.clone();
                body.insert(case.field.clone(), case.value);
                let request = base_request(endpoint, synth, self.auth_header)
                    .with_body(Value::Object(body));
                let status = if case.valid {
                    endpoint.success_status()
                } else {
                    BAD_REQUEST
                };
                FlowStep::new(
                    format!("{} - {} {}", endpoint.operation_id, case.field, case.label),
                    request,
                    status,
                )
            })
            .collect()
    }
}

impl Default for EdgeCaseGenerator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Boundary cases for one property; empty when it declares no bounds.
pub fn boundary_cases(name: &str, schema: &JsonSchema, base: &Map<String, Value>) -> Vec<BoundaryCase> {
    match &schema.kind {
        SchemaKind::String(c) => string_cases(name, schema, c, base.get(name)),
        SchemaKind::Integer(c) => {
            let (lo, hi) = integer_range(c);
            numeric_cases(name, c, |bound| {
                let v = if bound == Bound::Min { lo } else { hi };
                Some(Value::Number(Number::from(v)))
            })
        }
        SchemaKind::Number(c) => numeric_cases(name, c, |bound| {
            let v = if bound == Bound::Min { c.minimum } else { c.maximum };
            v.and_then(Number::from_f64).map(Value::Number)
        }),
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Min,
    Max,
}

fn numeric_cases(
    name: &str,
    c: &NumericConstraints,
    value_for: impl Fn(Bound) -> Option<Value>,
) -> Vec<BoundaryCase> {
    let mut cases = Vec::new();
    if let (Some(min), Some(value)) = (c.minimum, value_for(Bound::Min)) {
        cases.push(BoundaryCase {
            field: name.to_string(),
            label: format!("at minimum ({})", min),
            value,
            valid: true,
        });
    }
    if let (Some(max), Some(value)) = (c.maximum, value_for(Bound::Max)) {
        cases.push(BoundaryCase {
            field: name.to_string(),
            label: format!("at maximum ({})", max),
            value,
            valid: true,
        });
    }
    cases
}

/// Length boundaries that keep every other declared constraint intact. An
/// enum only offers its own members, so a bound no member sits on has no
/// valid case and exceeding maxLength is left to the enum check.
fn string_cases(
    name: &str,
    schema: &JsonSchema,
    c: &StringConstraints,
    seed: Option<&Value>,
) -> Vec<BoundaryCase> {
    let seed = seed.and_then(Value::as_str).unwrap_or_default();
    let sized = |len: usize| -> Option<Value> {
        if schema.enum_values.is_empty() {
            bounded_string(c, seed, len).map(Value::String)
        } else {
            schema
                .enum_values
                .iter()
                .find(|v| v.as_str().is_some_and(|s| s.chars().count() == len))
                .cloned()
        }
    };
    let case = |label: String, value: Value, valid: bool| BoundaryCase {
        field: name.to_string(),
        label,
        value,
        valid,
    };

    let mut cases = Vec::new();
    if let Some(max) = c.max_length {
        if let Some(value) = sized(max) {
            cases.push(case(format!("at maxLength ({})", max), value, true));
        }
        if schema.enum_values.is_empty() {
            if let Some(value) = sized(max + 1) {
                cases.push(case(format!("exceeds maxLength ({})", max + 1), value, false));
            }
        }
    }
    if let Some(min) = c.min_length {
        if let Some(value) = sized(min) {
            cases.push(case(format!("at minLength ({})", min), value, true));
        }
    }
    cases
}
