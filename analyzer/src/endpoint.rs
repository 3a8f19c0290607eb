//! Endpoint metadata extracted from one OpenAPI operation.

use crate::JsonSchema;
use flowgen_core::HttpMethod;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One security requirement object: scheme name -> scopes.
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// Where a parameter is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

/// A declared operation parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: JsonSchema,
    pub example: Option<Value>,
}

/// Immutable snapshot of one (path, method) operation.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointInfo {
    pub path: String,
    pub method: HttpMethod,
    pub operation_id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub request_schema: Option<JsonSchema>,
    pub request_body_required: bool,
    /// Response schema per declared status key (`"201"`, `"4XX"`, `"default"`).
    pub responses: BTreeMap<String, Option<JsonSchema>>,
    pub security: Vec<SecurityRequirement>,
    pub parameters: Vec<Parameter>,
    /// Request body example, keyed by field name.
    pub examples: Map<String, Value>,
}

impl EndpointInfo {
    /// Minimal endpoint with no schemas; used to build fixtures.
    pub fn new(method: HttpMethod, path: impl Into<String>, operation_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            operation_id: operation_id.into(),
            summary: None,
            description: None,
            tags: Vec::new(),
            request_schema: None,
            request_body_required: false,
            responses: BTreeMap::new(),
            security: Vec::new(),
            parameters: Vec::new(),
            examples: Map::new(),
        }
    }

    /// `"METHOD /path"`, the form endpoint filters use.
    pub fn key(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Numeric status codes declared in `responses`, ascending.
    pub fn declared_statuses(&self) -> Vec<u16> {
        self.responses
            .keys()
            .filter_map(|k| k.parse::<u16>().ok())
            .collect()
    }

    /// Lowest declared 2xx status, else the method's conventional default.
    pub fn success_status(&self) -> u16 {
        self.declared_statuses()
            .into_iter()
            .find(|s| (200..300).contains(s))
            .unwrap_or_else(|| self.method.default_success_status())
    }

    /// Whether `status` is covered by an explicit code, a range key or `default`.
    pub fn declares_status(&self, status: u16) -> bool {
        let range_key = format!("{}XX", status / 100);
        self.responses.keys().any(|k| {
            k.parse::<u16>().ok() == Some(status)
                || k.eq_ignore_ascii_case(&range_key)
                || k == "default"
        })
    }

    /// Schema of the first declared 2xx response that has one.
    pub fn success_response_schema(&self) -> Option<&JsonSchema> {
        self.responses
            .iter()
            .filter(|(k, _)| k.starts_with('2'))
            .find_map(|(_, s)| s.as_ref())
    }

    pub fn requires_auth(&self) -> bool {
        !self.security.is_empty()
    }

    pub fn path_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Path)
    }

    pub fn query_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(|p| p.location == ParameterLocation::Query)
    }

    pub fn parameter(&self, name: &str, location: ParameterLocation) -> Option<&Parameter> {
        self.parameters
            .iter()
            .find(|p| p.name == name && p.location == location)
    }
}

/// One `/`-separated piece of a path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment<'a> {
    Literal(&'a str),
    Param(&'a str),
}

/// Split a path template like `/users/{id}` into segments.
pub fn path_segments(path: &str) -> Vec<PathSegment<'_>> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            match s.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')) {
                Some(name) if !name.starts_with('{') => PathSegment::Param(name),
                _ => PathSegment::Literal(s),
            }
        })
        .collect()
}

/// Names of `{param}` placeholders in a path template, in order.
pub fn path_template_params(path: &str) -> Vec<&str> {
    path_segments(path)
        .into_iter()
        .filter_map(|s| match s {
            PathSegment::Param(name) => Some(name),
            PathSegment::Literal(_) => None,
        })
        .collect()
}
