//! Negative-case generation with single fault injection
//!
//! Every step breaks exactly one thing (one missing field, one corrupted
//! property, or missing credentials) so its expected status is unambiguous.

use crate::crud::valid_body;
use crate::request::base_request;
use crate::synth::DataSynthesizer;
use flowgen_analyzer::{EndpointInfo, JsonSchema};
use flowgen_core::FlowStep;
use serde_json::{Map, Value};
use tracing::debug;

pub const BAD_REQUEST: u16 = 400;
pub const UNAUTHORIZED: u16 = 401;

/// Which negative generators run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCaseToggles {
    pub missing_fields: bool,
    pub formats: bool,
    pub auth: bool,
}

impl Default for ErrorCaseToggles {
    fn default() -> Self {
        Self {
            missing_fields: true,
            formats: true,
            auth: true,
        }
    }
}

/// Generates steps that the API must reject
pub struct ErrorCaseGenerator<'a> {
    auth_header: Option<&'a str>,
    toggles: ErrorCaseToggles,
}

impl<'a> ErrorCaseGenerator<'a> {
    pub fn new(toggles: ErrorCaseToggles) -> Self {
        Self {
            auth_header: None,
            toggles,
        }
    }

    pub fn with_auth(mut self, auth_header: Option<&'a str>) -> Self {
        self.auth_header = auth_header;
        self
    }

    /// Run the enabled generators: missing fields, then formats, then auth.
    pub fn generate(&self, endpoint: &EndpointInfo, synth: &mut DataSynthesizer) -> Vec<FlowStep> {
        let mut steps = Vec::new();
        if self.toggles.missing_fields {
            steps.extend(self.generate_missing_field_cases(endpoint, synth));
        }
        if self.toggles.formats {
            steps.extend(self.generate_format_validation_cases(endpoint, synth));
        }
        if self.toggles.auth {
            steps.extend(self.generate_auth_error_cases(endpoint, synth));
        }
        steps
    }

    /// One step per required body field, omitting exactly that field.
    pub fn generate_missing_field_cases(
        &self,
        endpoint: &EndpointInfo,
        synth: &mut DataSynthesizer,
    ) -> Vec<FlowStep> {
        let Some((shape_required, base)) = self.object_body(endpoint, synth) else {
            return Vec::new();
        };

        shape_required
            .into_iter()
            .map(|field| {
                let mut body = base.clone();
                body.remove(&field);
                let request = base_request(endpoint, synth, self.auth_header)
                    .with_body(Value::Object(body));
                FlowStep::new(
                    format!(
                        "{} - missing required field '{}'",
                        endpoint.operation_id, field
                    ),
                    request,
                    BAD_REQUEST,
                )
            })
            .collect()
    }

    /// One step per body property that has a violable constraint.
    pub fn generate_format_validation_cases(
        &self,
        endpoint: &EndpointInfo,
        synth: &mut DataSynthesizer,
    ) -> Vec<FlowStep> {
        let Some(shape) = endpoint.request_schema.as_ref().and_then(JsonSchema::as_object) else {
            return Vec::new();
        };
        let Some((_, base)) = self.object_body(endpoint, synth) else {
            return Vec::new();
        };

        let mut steps = Vec::new();
        for (name, prop) in &shape.properties {
            let Some(violation) = synth.synthesize_invalid(prop) else {
                debug!(
                    operation_id = %endpoint.operation_id,
                    field = %name,
                    "no violable constraint, skipping field"
                );
                continue;
            };
            let mut body = base.clone();
            body.insert(name.clone(), violation.value);
            let request = base_request(endpoint, synth, self.auth_header)
                .with_body(Value::Object(body));
            steps.push(FlowStep::new(
                format!(
                    "{} - invalid {} ({})",
                    endpoint.operation_id, name, violation.constraint
                ),
                request,
                BAD_REQUEST,
            ));
        }
        steps
    }

    /// A single unauthenticated request when the endpoint declares security.
    pub fn generate_auth_error_cases(
        &self,
        endpoint: &EndpointInfo,
        synth: &mut DataSynthesizer,
    ) -> Vec<FlowStep> {
        if !endpoint.requires_auth() {
            return Vec::new();
        }
        let mut request = base_request(endpoint, synth, None);
        if let Some(body) = valid_body(endpoint, synth) {
            request = request.with_body(body);
        }
        vec![FlowStep::new(
            format!("{} - unauthorized", endpoint.operation_id),
            request,
            UNAUTHORIZED,
        )]
    }

    /// Required field names and a valid object body, when the body is an object.
    fn object_body(
        &self,
        endpoint: &EndpointInfo,
        synth: &mut DataSynthesizer,
    ) -> Option<(Vec<String>, Map<String, Value>)> {
        let shape = endpoint.request_schema.as_ref()?.as_object()?;
        match valid_body(endpoint, synth)? {
            Value::Object(body) => Some((shape.required.clone(), body)),
            _ => None,
        }
    }
}
