//! Request skeletons shared by every generator.

use crate::synth::DataSynthesizer;
use flowgen_analyzer::{path_segments, EndpointInfo, ParameterLocation, PathSegment};
use flowgen_core::StepRequest;
use serde_json::Value;

pub(crate) const AUTH_HEADER: &str = "Authorization";

/// Render a JSON scalar the way it appears inside a URL.
pub(crate) fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Fill `{param}` placeholders with concrete values and append required
/// query parameters. `bound` supplies values (or `{{var}}` references) for
/// specific path parameters and wins over synthesized ones.
pub(crate) fn concrete_path(
    endpoint: &EndpointInfo,
    synth: &mut DataSynthesizer,
    bound: &dyn Fn(&str) -> Option<String>,
) -> String {
    let mut path = String::new();
    for segment in path_segments(&endpoint.path) {
        path.push('/');
        match segment {
            PathSegment::Literal(lit) => path.push_str(lit),
            PathSegment::Param(name) => {
                let value = bound(name).unwrap_or_else(|| {
                    match endpoint.parameter(name, ParameterLocation::Path) {
                        Some(param) => plain_text(&synth.parameter_value(param)),
                        None => plain_text(&synth.identifier()),
                    }
                });
                path.push_str(&value);
            }
        }
    }
    if path.is_empty() {
        path.push('/');
    }

    let query: Vec<String> = endpoint
        .query_parameters()
        .filter(|p| p.required)
        .map(|p| format!("{}={}", p.name, plain_text(&synth.parameter_value(p))))
        .collect();
    if !query.is_empty() {
        path.push('?');
        path.push_str(&query.join("&"));
    }
    path
}

/// Request with a concrete path and, for secured endpoints, the auth header.
pub(crate) fn base_request(
    endpoint: &EndpointInfo,
    synth: &mut DataSynthesizer,
    auth: Option<&str>,
) -> StepRequest {
    let request = StepRequest::new(endpoint.method, concrete_path(endpoint, synth, &|_| None));
    with_auth(request, endpoint, auth)
}

pub(crate) fn with_auth(request: StepRequest, endpoint: &EndpointInfo, auth: Option<&str>) -> StepRequest {
    match auth {
        Some(header) if endpoint.requires_auth() => request.with_header(AUTH_HEADER, header),
        _ => request,
    }
}
