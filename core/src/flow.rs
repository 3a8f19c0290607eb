//! The flow artifact: an ordered list of request/expectation steps.

use crate::{GenResult, HttpMethod};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Default base URL when the document declares no servers.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// An executable test scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub steps: Vec<FlowStep>,
}

impl FlowDefinition {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            version: "1.0.0".to_string(),
            base_url: base_url.into(),
            steps: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Parse a flow previously written as JSON.
    pub fn from_json(text: &str) -> GenResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// One request plus what the response must look like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStep {
    pub name: String,
    pub request: StepRequest,
    pub expectations: Expectations,
    /// Variable name -> response path (e.g. `userId` -> `$.id`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<BTreeMap<String, String>>,
}

impl FlowStep {
    pub fn new(name: impl Into<String>, request: StepRequest, status: u16) -> Self {
        Self {
            name: name.into(),
            request,
            expectations: Expectations { status },
            capture: None,
        }
    }

    pub fn with_capture(mut self, var: impl Into<String>, path: impl Into<String>) -> Self {
        self.capture
            .get_or_insert_with(BTreeMap::new)
            .insert(var.into(), path.into());
        self
    }

    /// Variables this step captures, in name order.
    pub fn captured_vars(&self) -> impl Iterator<Item = &str> {
        self.capture.iter().flat_map(|c| c.keys().map(String::as_str))
    }
}

/// The HTTP request half of a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRequest {
    pub method: HttpMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

impl StepRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|h| {
            h.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }
}

/// Response expectations for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectations {
    pub status: u16,
}
