//! Spec analysis - extracts endpoints from a dereferenced OpenAPI document

use crate::{EndpointInfo, JsonSchema, Parameter, ParameterLocation, SecurityRequirement};
use flowgen_core::{GenError, GenResult, HttpMethod, DEFAULT_BASE_URL};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Response property names that conventionally carry a bearer token.
const TOKEN_FIELDS: &[&str] = &[
    "token",
    "accessToken",
    "access_token",
    "jwt",
    "idToken",
    "id_token",
    "authToken",
];

/// Fragments of an operationId or path that suggest a login endpoint.
const AUTH_HINTS: &[&str] = &["login", "signin", "sign-in", "sign_in", "auth", "token", "session"];

/// Operation that was present in the document but could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedOperation {
    pub path: String,
    pub method: HttpMethod,
    pub reason: String,
}

/// Everything extracted from the `paths` object.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub endpoints: Vec<EndpointInfo>,
    pub skipped: Vec<SkippedOperation>,
}

/// The endpoint used to obtain credentials for secured operations.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthFlow {
    pub operation_id: String,
    pub endpoint: EndpointInfo,
    /// Required fields of the login request body.
    pub credential_fields: Vec<String>,
    /// Response property holding the token; dotted for nested objects.
    pub token_field: String,
}

/// Reads endpoint metadata out of a dereferenced OpenAPI document.
///
/// `$ref` resolution and structural validation are done by whoever loaded
/// the document; this type only reads it.
pub struct SpecAnalyzer<'a> {
    spec: &'a Value,
}

impl<'a> SpecAnalyzer<'a> {
    pub fn new(spec: &'a Value) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &'a Value {
        self.spec
    }

    /// Reject input that is not an OpenAPI document at all.
    ///
    /// A document with an empty `paths` object passes; it simply yields no
    /// endpoints.
    pub fn check_document(&self) -> GenResult<()> {
        if !self.spec.is_object() {
            return Err(GenError::InvalidSpec("document is not a JSON object".to_string()));
        }
        match self.spec.get("paths") {
            Some(Value::Object(_)) => Ok(()),
            Some(_) => Err(GenError::InvalidSpec("`paths` is not an object".to_string())),
            None => Err(GenError::InvalidSpec("missing `paths` object".to_string())),
        }
    }

    /// API title from `info.title`.
    pub fn title(&self) -> &'a str {
        self.spec
            .pointer("/info/title")
            .and_then(Value::as_str)
            .unwrap_or("API")
    }

    /// API version from `info.version`.
    pub fn version(&self) -> &'a str {
        self.spec
            .pointer("/info/version")
            .and_then(Value::as_str)
            .unwrap_or("1.0.0")
    }

    /// `servers[0].url`, falling back to the local default.
    pub fn base_url(&self) -> String {
        self.spec
            .pointer("/servers/0/url")
            .and_then(Value::as_str)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .to_string()
    }

    /// Endpoints with a non-empty operationId, in document order.
    pub fn extract_endpoints(&self) -> Vec<EndpointInfo> {
        self.extract().endpoints
    }

    /// Walk every path x method, keeping operations that have an operationId.
    pub fn extract(&self) -> Extraction {
        let mut extraction = Extraction::default();
        let Some(paths) = self.spec.get("paths").and_then(Value::as_object) else {
            return extraction;
        };

        let global_security = self.spec.get("security").map(parse_security);

        for (path, item) in paths {
            let Some(item) = item.as_object() else {
                continue;
            };
            let shared_params = item
                .get("parameters")
                .map(parse_parameters)
                .unwrap_or_default();

            for method in HttpMethod::ALL {
                let Some(op) = item.get(method.path_item_key()).and_then(Value::as_object) else {
                    continue;
                };

                let operation_id = op
                    .get("operationId")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .unwrap_or_default();
                if operation_id.is_empty() {
                    warn!(%method, path = %path, "skipping operation without operationId");
                    extraction.skipped.push(SkippedOperation {
                        path: path.clone(),
                        method,
                        reason: "missing operationId".to_string(),
                    });
                    continue;
                }

                let endpoint = self.build_endpoint(
                    path,
                    method,
                    operation_id,
                    op,
                    &shared_params,
                    global_security.as_ref(),
                );
                debug!(
                    operation_id = %endpoint.operation_id,
                    key = %endpoint.key(),
                    "extracted endpoint"
                );
                extraction.endpoints.push(endpoint);
            }
        }

        extraction
    }

    fn build_endpoint(
        &self,
        path: &str,
        method: HttpMethod,
        operation_id: &str,
        op: &Map<String, Value>,
        shared_params: &[Parameter],
        global_security: Option<&Vec<SecurityRequirement>>,
    ) -> EndpointInfo {
        let mut endpoint = EndpointInfo::new(method, path, operation_id);
        endpoint.summary = op.get("summary").and_then(Value::as_str).map(str::to_string);
        endpoint.description = op
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);
        endpoint.tags = op
            .get("tags")
            .and_then(Value::as_array)
            .map(|t| t.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        // Operation-level parameters override path-level ones with the same name + location
        let own_params = op.get("parameters").map(parse_parameters).unwrap_or_default();
        let mut parameters: Vec<Parameter> = shared_params
            .iter()
            .filter(|shared| {
                !own_params
                    .iter()
                    .any(|p| p.name == shared.name && p.location == shared.location)
            })
            .cloned()
            .collect();
        parameters.extend(own_params);
        endpoint.parameters = parameters;

        if let Some(body) = op.get("requestBody").and_then(Value::as_object) {
            endpoint.request_body_required = body
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if let Some(media) = body
                .get("content")
                .and_then(Value::as_object)
                .and_then(json_media_type)
            {
                endpoint.request_schema = media.get("schema").map(JsonSchema::from_value);
                endpoint.examples = media_example(media);
            }
        }

        if let Some(responses) = op.get("responses").and_then(Value::as_object) {
            endpoint.responses = responses
                .iter()
                .map(|(status, response)| {
                    let schema = response
                        .get("content")
                        .and_then(Value::as_object)
                        .and_then(json_media_type)
                        .and_then(|media| media.get("schema"))
                        .map(JsonSchema::from_value);
                    (status.clone(), schema)
                })
                .collect::<BTreeMap<_, _>>();
        }

        endpoint.security = match op.get("security") {
            Some(security) => parse_security(security),
            None => global_security.cloned().unwrap_or_default(),
        };

        endpoint
    }

    /// Locate the endpoint that most plausibly issues credentials.
    ///
    /// Candidates are operations whose operationId or path mentions a login
    /// hint; POST operations win over others, then document order.
    pub fn authentication_flow(&self) -> Option<AuthFlow> {
        let endpoints = self.extract_endpoints();
        let is_candidate = |ep: &EndpointInfo| {
            let op_id = ep.operation_id.to_lowercase();
            let path = ep.path.to_lowercase();
            if op_id.contains("logout") || path.contains("logout") || op_id.contains("refresh") {
                return false;
            }
            AUTH_HINTS
                .iter()
                .any(|hint| op_id.contains(hint) || path.contains(hint))
        };

        let endpoint = endpoints
            .iter()
            .filter(|ep| is_candidate(ep))
            .min_by_key(|ep| ep.method != HttpMethod::Post)?
            .clone();

        let credential_fields = endpoint
            .request_schema
            .as_ref()
            .and_then(JsonSchema::as_object)
            .map(|shape| shape.required.clone())
            .unwrap_or_default();
        let token_field = endpoint
            .success_response_schema()
            .and_then(find_token_field)
            .unwrap_or_else(|| "token".to_string());

        debug!(
            operation_id = %endpoint.operation_id,
            token_field = %token_field,
            "located authentication endpoint"
        );

        Some(AuthFlow {
            operation_id: endpoint.operation_id.clone(),
            endpoint,
            credential_fields,
            token_field,
        })
    }
}

/// Pick the JSON media type out of a `content` map.
fn json_media_type(content: &Map<String, Value>) -> Option<&Map<String, Value>> {
    content
        .get("application/json")
        .or_else(|| {
            content
                .iter()
                .find(|(k, _)| k.contains("json"))
                .map(|(_, v)| v)
        })
        .or_else(|| content.values().next())
        .and_then(Value::as_object)
}

/// Body example from `example` or the first entry of `examples`.
fn media_example(media: &Map<String, Value>) -> Map<String, Value> {
    let example = media.get("example").or_else(|| {
        media
            .get("examples")
            .and_then(Value::as_object)
            .and_then(|examples| examples.values().next())
            .and_then(|named| named.get("value"))
    });
    example
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn parse_parameters(value: &Value) -> Vec<Parameter> {
    let Some(list) = value.as_array() else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|param| {
            let name = param.get("name")?.as_str()?.to_string();
            let location = ParameterLocation::parse(param.get("in")?.as_str()?)?;
            let required = location == ParameterLocation::Path
                || param.get("required").and_then(Value::as_bool).unwrap_or(false);
            Some(Parameter {
                name,
                location,
                required,
                schema: param
                    .get("schema")
                    .map(JsonSchema::from_value)
                    .unwrap_or_default(),
                example: param.get("example").cloned(),
            })
        })
        .collect()
}

fn parse_security(value: &Value) -> Vec<SecurityRequirement> {
    let Some(list) = value.as_array() else {
        return Vec::new();
    };
    list.iter()
        .filter_map(Value::as_object)
        .filter(|req| !req.is_empty())
        .map(|req| {
            req.iter()
                .map(|(scheme, scopes)| {
                    let scopes = scopes
                        .as_array()
                        .map(|s| s.iter().filter_map(Value::as_str).map(str::to_string).collect())
                        .unwrap_or_default();
                    (scheme.clone(), scopes)
                })
                .collect()
        })
        .collect()
}

fn find_token_field(schema: &JsonSchema) -> Option<String> {
    let shape = schema.as_object()?;
    if let Some(name) = TOKEN_FIELDS.iter().find(|f| shape.property(f).is_some()) {
        return Some(name.to_string());
    }
    // Common envelope: { "data": { "token": ... } }
    shape.properties.iter().find_map(|(name, prop)| {
        let inner = prop.as_object()?;
        TOKEN_FIELDS
            .iter()
            .find(|f| inner.property(f).is_some())
            .map(|f| format!("{}.{}", name, f))
    })
}
