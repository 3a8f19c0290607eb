//! Success-case generation

use crate::request::base_request;
use crate::synth::DataSynthesizer;
use flowgen_analyzer::EndpointInfo;
use flowgen_core::FlowStep;
use serde_json::Value;

/// Generates the happy-path step for an endpoint
pub struct CrudGenerator<'a> {
    auth_header: Option<&'a str>,
}

impl<'a> CrudGenerator<'a> {
    pub fn new() -> Self {
        Self { auth_header: None }
    }

    /// Attach this `Authorization` value to steps for secured endpoints.
    pub fn with_auth(auth_header: Option<&'a str>) -> Self {
        Self { auth_header }
    }

    /// Exactly one step expecting the endpoint's success status.
    pub fn generate_success_cases(
        &self,
        endpoint: &EndpointInfo,
        synth: &mut DataSynthesizer,
    ) -> Vec<FlowStep> {
        let mut request = base_request(endpoint, synth, self.auth_header);
        if let Some(body) = valid_body(endpoint, synth) {
            request = request.with_body(body);
        }

        vec![FlowStep::new(
            format!("{} - success", endpoint.operation_id),
            request,
            endpoint.success_status(),
        )]
    }
}

impl Default for CrudGenerator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// A schema-valid request body, for methods that send one.
pub(crate) fn valid_body(endpoint: &EndpointInfo, synth: &mut DataSynthesizer) -> Option<Value> {
    if !endpoint.method.has_body() {
        return None;
    }
    let examples = (!endpoint.examples.is_empty()).then_some(&endpoint.examples);
    match &endpoint.request_schema {
        Some(schema) => Some(synth.synthesize(schema, examples)),
        None => examples.map(|e| Value::Object(e.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgen_analyzer::JsonSchema;
    use flowgen_core::HttpMethod;
    use serde_json::json;

    fn create_user() -> EndpointInfo {
        let mut ep = EndpointInfo::new(HttpMethod::Post, "/users", "createUser");
        ep.request_schema = Some(JsonSchema::from_value(&json!({
            "type": "object",
            "required": ["email", "age"],
            "properties": {
                "email": {"type": "string", "format": "email"},
                "age": {"type": "integer", "minimum": 18, "maximum": 99}
            }
        })));
        ep.responses.insert("201".into(), None);
        ep.responses.insert("400".into(), None);
        ep
    }

    #[test]
    fn test_single_step_with_declared_status_and_body() {
        let mut synth = DataSynthesizer::new(42);
        let steps = CrudGenerator::new().generate_success_cases(&create_user(), &mut synth);

        assert_eq!(steps.len(), 1);
        let step = &steps[0];
        assert_eq!(step.name, "createUser - success");
        assert_eq!(step.expectations.status, 201);
        assert_eq!(step.request.method, HttpMethod::Post);
        let body = step.request.body.as_ref().unwrap();
        assert!(body["email"].as_str().unwrap().contains('@'));
        let age = body["age"].as_i64().unwrap();
        assert!((18..=99).contains(&age));
    }

    #[test]
    fn test_get_has_no_body_and_default_status() {
        let mut ep = EndpointInfo::new(HttpMethod::Get, "/users/{id}", "getUser");
        ep.request_schema = Some(JsonSchema::from_value(&json!({"type": "object"})));
        let mut synth = DataSynthesizer::new(42);
        let steps = CrudGenerator::new().generate_success_cases(&ep, &mut synth);

        assert_eq!(steps[0].expectations.status, 200);
        assert!(steps[0].request.body.is_none());
        assert!(!steps[0].request.path.contains('{'));
    }

    #[test]
    fn test_delete_default_status() {
        let ep = EndpointInfo::new(HttpMethod::Delete, "/users/{id}", "deleteUser");
        let mut synth = DataSynthesizer::new(42);
        let steps = CrudGenerator::new().generate_success_cases(&ep, &mut synth);
        assert_eq!(steps[0].expectations.status, 204);
    }

    #[test]
    fn test_auth_header_only_for_secured_endpoints() {
        let mut secured = create_user();
        secured
            .security
            .push([("bearer".to_string(), Vec::new())].into_iter().collect());
        let open = create_user();
        let mut synth = DataSynthesizer::new(42);
        let generator = CrudGenerator::with_auth(Some("Bearer {{authToken}}"));

        let steps = generator.generate_success_cases(&secured, &mut synth);
        assert_eq!(steps[0].request.header("Authorization"), Some("Bearer {{authToken}}"));
        let steps = generator.generate_success_cases(&open, &mut synth);
        assert!(steps[0].request.headers.is_none());
    }

    #[test]
    fn test_caller_examples_used_for_body() {
        let mut ep = create_user();
        ep.examples.insert("email".into(), json!("jane@example.com"));
        let mut synth = DataSynthesizer::new(1);
        let steps = CrudGenerator::new().generate_success_cases(&ep, &mut synth);
        assert_eq!(steps[0].request.body.as_ref().unwrap()["email"], json!("jane@example.com"));
    }
}
