//! Suite assembly - runs the generators over the selected endpoints

use crate::config::GenerationOptions;
use crate::crud::{valid_body, CrudGenerator};
use crate::deps::DependencyResolver;
use crate::edge::EdgeCaseGenerator;
use crate::errors::{ErrorCaseGenerator, ErrorCaseToggles};
use crate::request::concrete_path;
use crate::synth::DataSynthesizer;
use crate::types::{GeneratedSuite, SkippedSummary, StepArena, StepCategory, TestSuiteSummary};
use flowgen_analyzer::{AuthFlow, EndpointInfo, Extraction, SpecAnalyzer};
use flowgen_core::{var_ref, FlowDefinition, FlowStep, GenError, GenResult, StepRequest};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Variable the login step captures the token into.
pub const AUTH_TOKEN_VAR: &str = "authToken";

/// Builds a complete flow from one OpenAPI document
pub struct TestSuiteGenerator<'a> {
    analyzer: SpecAnalyzer<'a>,
}

impl<'a> TestSuiteGenerator<'a> {
    pub fn new(spec: &'a Value) -> Self {
        Self {
            analyzer: SpecAnalyzer::new(spec),
        }
    }

    /// Generate the suite for `options`.
    ///
    /// Steps are grouped per endpoint (success, error, edge) in document
    /// order, preceded by the login step when auth wiring applies and
    /// followed by the chained flow when requested. Fails only when the
    /// options are invalid or nothing is left to test.
    pub fn generate(&self, options: &GenerationOptions) -> GenResult<GeneratedSuite> {
        options.validate()?;
        self.analyzer.check_document()?;

        let Extraction { endpoints, skipped } = self.analyzer.extract();
        if endpoints.is_empty() {
            return Err(GenError::NoEndpoints);
        }

        let mut warnings = Vec::new();
        let selected = select_endpoints(endpoints, &options.endpoints, &mut warnings)?;
        let mut synth = DataSynthesizer::new(options.seed);
        let mut arena = StepArena::new();

        // 1. Authentication wiring
        let auth_header = if options.include_auth_tests && selected.iter().any(EndpointInfo::requires_auth) {
            match self.analyzer.authentication_flow() {
                Some(auth) => {
                    arena.push(StepCategory::Setup, login_step(&auth, &mut synth));
                    Some(format!("Bearer {}", var_ref(AUTH_TOKEN_VAR)))
                }
                None => {
                    let message =
                        "secured endpoints found but no login endpoint; requests carry no credentials"
                            .to_string();
                    warn!("{}", message);
                    warnings.push(message);
                    None
                }
            }
        } else {
            None
        };
        let auth = auth_header.as_deref();

        // 2. Per-endpoint steps
        let crud = CrudGenerator::with_auth(auth);
        let errors = ErrorCaseGenerator::new(ErrorCaseToggles {
            missing_fields: options.include_missing_field_cases,
            formats: options.include_format_cases,
            auth: options.include_auth_tests,
        })
        .with_auth(auth);
        let edges = EdgeCaseGenerator::with_auth(auth);

        for endpoint in &selected {
            let before = arena.len();
            if options.include_success_cases {
                arena.extend(StepCategory::Success, crud.generate_success_cases(endpoint, &mut synth));
            }
            if options.include_error_cases {
                arena.extend(StepCategory::Error, errors.generate(endpoint, &mut synth));
            }
            if options.include_edge_cases {
                arena.extend(StepCategory::Edge, edges.generate_edge_cases(endpoint, &mut synth));
            }
            debug!(endpoint = %endpoint.key(), steps = arena.len() - before, "generated endpoint steps");
        }

        // 3. Chained flow
        if options.generate_flows {
            match DependencyResolver::with_auth(auth).resolve_execution_order(&selected, &mut synth) {
                Ok(steps) => arena.extend(StepCategory::Flow, steps),
                Err(e) if e.is_configuration_error() => {
                    warn!(error = %e, "skipping chained flow");
                    warnings.push(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        let summary = TestSuiteSummary {
            total_tests: arena.len(),
            success_tests: arena.count(StepCategory::Success),
            error_tests: arena.count(StepCategory::Error),
            edge_tests: arena.count(StepCategory::Edge),
            flow_tests: arena.count(StepCategory::Flow),
            endpoints: selected.iter().map(EndpointInfo::key).collect(),
            skipped: skipped.iter().map(SkippedSummary::from).collect(),
            warnings,
        };

        let title = self.analyzer.title();
        let mut flow = FlowDefinition::new(format!("{} test suite", title), self.analyzer.base_url())
            .with_description(format!(
                "Generated tests for {} endpoint(s) of {}",
                selected.len(),
                title
            ))
            .with_version(self.analyzer.version());
        flow.steps = arena.into_steps();

        info!(
            total = summary.total_tests,
            success = summary.success_tests,
            error = summary.error_tests,
            edge = summary.edge_tests,
            flow = summary.flow_tests,
            endpoints = summary.endpoints.len(),
            "generated test suite"
        );

        Ok(GeneratedSuite { flow, summary })
    }
}

/// Keep endpoints matching any filter; no filters keeps everything.
fn select_endpoints(
    endpoints: Vec<EndpointInfo>,
    filters: &[String],
    warnings: &mut Vec<String>,
) -> GenResult<Vec<EndpointInfo>> {
    if filters.is_empty() {
        return Ok(endpoints);
    }

    for filter in filters {
        if !endpoints.iter().any(|ep| matches_filter(ep, filter)) {
            let message = format!("endpoint filter '{}' matched no endpoints", filter);
            warn!("{}", message);
            warnings.push(message);
        }
    }

    let selected: Vec<EndpointInfo> = endpoints
        .into_iter()
        .filter(|ep| filters.iter().any(|f| matches_filter(ep, f)))
        .collect();
    if selected.is_empty() {
        return Err(GenError::UnsatisfiableFilter {
            filters: filters.to_vec(),
        });
    }
    Ok(selected)
}

/// operationId, `"METHOD /path"` (method case-insensitive) or bare `/path`.
pub fn matches_filter(endpoint: &EndpointInfo, filter: &str) -> bool {
    let filter = filter.trim();
    if filter == endpoint.operation_id {
        return true;
    }
    if filter.starts_with('/') {
        return filter == endpoint.path;
    }
    match filter.split_once(char::is_whitespace) {
        Some((method, path)) => {
            method.eq_ignore_ascii_case(endpoint.method.as_str()) && path.trim() == endpoint.path
        }
        None => false,
    }
}

fn login_step(auth: &AuthFlow, synth: &mut DataSynthesizer) -> FlowStep {
    let endpoint = &auth.endpoint;
    let mut request = StepRequest::new(endpoint.method, concrete_path(endpoint, synth, &|_| None));
    if let Some(body) = valid_body(endpoint, synth) {
        request = request.with_body(body);
    }
    FlowStep::new(
        format!("{} - login", auth.operation_id),
        request,
        endpoint.success_status(),
    )
    .with_capture(AUTH_TOKEN_VAR, format!("$.{}", auth.token_field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgen_core::HttpMethod;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn petstore() -> Value {
        json!({
            "openapi": "3.0.0",
            "info": {"title": "Pets", "version": "2.1.0"},
            "servers": [{"url": "https://pets.example.com/v1"}],
            "security": [{"bearer": []}],
            "paths": {
                "/auth/login": {
                    "post": {
                        "operationId": "login",
                        "security": [],
                        "requestBody": {"content": {"application/json": {"schema": {
                            "type": "object",
                            "required": ["username", "password"],
                            "properties": {
                                "username": {"type": "string"},
                                "password": {"type": "string", "format": "password"}
                            }
                        }}}},
                        "responses": {"200": {"content": {"application/json": {"schema": {
                            "type": "object", "properties": {"accessToken": {"type": "string"}}
                        }}}}}
                    }
                },
                "/pets": {
                    "get": {"operationId": "listPets", "responses": {"200": {}}},
                    "post": {
                        "operationId": "createPet",
                        "requestBody": {"required": true, "content": {"application/json": {"schema": {
                            "type": "object",
                            "required": ["name"],
                            "properties": {
                                "name": {"type": "string", "maxLength": 20},
                                "kind": {"type": "string", "enum": ["cat", "dog"]}
                            }
                        }}}},
                        "responses": {"201": {}, "400": {}}
                    }
                },
                "/pets/{petId}": {
                    "get": {"operationId": "getPet", "responses": {"200": {}, "404": {}}},
                    "delete": {"operationId": "deletePet", "responses": {"204": {}}}
                },
                "/health": {
                    "get": {"responses": {"200": {}}}
                }
            }
        })
    }

    #[test]
    fn test_flow_metadata_and_summary() {
        let spec = petstore();
        let suite = TestSuiteGenerator::new(&spec)
            .generate(&GenerationOptions::new())
            .unwrap();

        assert_eq!(suite.flow.name, "Pets test suite");
        assert_eq!(suite.flow.base_url, "https://pets.example.com/v1");
        assert_eq!(suite.flow.version, "2.1.0");
        assert_eq!(suite.summary.total_tests, suite.flow.steps.len());
        assert_eq!(suite.summary.success_tests, 5);
        assert_eq!(suite.summary.skipped.len(), 1);
        assert_eq!(suite.summary.skipped[0].path, "/health");
        assert_eq!(
            suite.summary.endpoints,
            vec![
                "POST /auth/login",
                "GET /pets",
                "POST /pets",
                "GET /pets/{petId}",
                "DELETE /pets/{petId}"
            ]
        );
    }

    #[test]
    fn test_login_step_leads_and_secured_steps_carry_token() {
        let spec = petstore();
        let suite = TestSuiteGenerator::new(&spec)
            .generate(&GenerationOptions::new())
            .unwrap();
        let steps = &suite.flow.steps;

        assert_eq!(steps[0].name, "login - login");
        assert_eq!(
            steps[0].capture.as_ref().unwrap().get(AUTH_TOKEN_VAR),
            Some(&"$.accessToken".to_string())
        );

        let list = steps.iter().find(|s| s.name == "listPets - success").unwrap();
        assert_eq!(list.request.header("authorization"), Some("Bearer {{authToken}}"));

        let unauthorized = steps
            .iter()
            .find(|s| s.name == "listPets - unauthorized")
            .unwrap();
        assert_eq!(unauthorized.expectations.status, 401);
        assert_eq!(unauthorized.request.header("Authorization"), None);

        // the login endpoint opted out of security
        let login = steps.iter().find(|s| s.name == "login - success").unwrap();
        assert_eq!(login.request.header("Authorization"), None);
        assert!(!steps.iter().any(|s| s.name == "login - unauthorized"));
    }

    #[test]
    fn test_steps_grouped_per_endpoint() {
        let spec = petstore();
        let options = GenerationOptions::new()
            .with_auth_tests(false)
            .with_edge_cases(true)
            .with_endpoint("createPet")
            .with_endpoint("GET /pets/{petId}");
        let suite = TestSuiteGenerator::new(&spec).generate(&options).unwrap();
        let names: Vec<&str> = suite.flow.steps.iter().map(|s| s.name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "createPet - success",
                "createPet - missing required field 'name'",
                "createPet - invalid name (maxLength 20)",
                "createPet - invalid kind (enum)",
                "createPet - name at maxLength (20)",
                "createPet - name exceeds maxLength (21)",
                "getPet - success",
            ]
        );
        assert_eq!(suite.summary.edge_tests, 2);
        assert_eq!(suite.summary.error_tests, 3);
    }

    #[test]
    fn test_filter_semantics() {
        let spec = petstore();
        let extraction = SpecAnalyzer::new(&spec).extract();
        let by_id = |id: &str| {
            extraction
                .endpoints
                .iter()
                .find(|e| e.operation_id == id)
                .unwrap()
                .clone()
        };

        assert!(matches_filter(&by_id("getPet"), "getPet"));
        assert!(matches_filter(&by_id("getPet"), "get /pets/{petId}"));
        assert!(matches_filter(&by_id("deletePet"), "/pets/{petId}"));
        assert!(!matches_filter(&by_id("deletePet"), "GET /pets/{petId}"));
        assert!(!matches_filter(&by_id("getPet"), "/pets"));

        let options = GenerationOptions::success_only().with_endpoint("/pets/{petId}");
        let suite = TestSuiteGenerator::new(&spec).generate(&options).unwrap();
        assert_eq!(suite.summary.endpoints, vec!["GET /pets/{petId}", "DELETE /pets/{petId}"]);
    }

    #[test]
    fn test_partially_unmatched_filters_warn() {
        let spec = petstore();
        let options = GenerationOptions::success_only()
            .with_endpoint("listPets")
            .with_endpoint("nope");
        let suite = TestSuiteGenerator::new(&spec).generate(&options).unwrap();
        assert_eq!(suite.summary.total_tests, 1);
        assert_eq!(
            suite.summary.warnings,
            vec!["endpoint filter 'nope' matched no endpoints".to_string()]
        );
    }

    #[test]
    fn test_unsatisfiable_filter_is_an_error() {
        let spec = petstore();
        let options = GenerationOptions::new().with_endpoint("PATCH /pets");
        let err = TestSuiteGenerator::new(&spec).generate(&options).unwrap_err();
        assert!(matches!(err, GenError::UnsatisfiableFilter { .. }));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_no_endpoints_and_invalid_options() {
        let spec = json!({"openapi": "3.0.0", "paths": {"/x": {"get": {"responses": {}}}}});
        let err = TestSuiteGenerator::new(&spec)
            .generate(&GenerationOptions::new())
            .unwrap_err();
        assert!(matches!(err, GenError::NoEndpoints));

        let spec = petstore();
        let options = GenerationOptions::success_only().with_success_cases(false);
        let err = TestSuiteGenerator::new(&spec).generate(&options).unwrap_err();
        assert!(matches!(err, GenError::InvalidOptions(_)));

        let spec = json!({"swagger": "2.0"});
        let err = TestSuiteGenerator::new(&spec)
            .generate(&GenerationOptions::new())
            .unwrap_err();
        assert!(matches!(err, GenError::InvalidSpec(_)));
    }

    #[test]
    fn test_chained_flow_appended_after_endpoint_steps() {
        let spec = petstore();
        let options = GenerationOptions::success_only().with_flows(true);
        let suite = TestSuiteGenerator::new(&spec).generate(&options).unwrap();
        let flow_names: Vec<&str> = suite
            .flow
            .steps
            .iter()
            .skip(suite.summary.success_tests)
            .map(|s| s.name.as_str())
            .collect();

        assert_eq!(
            flow_names,
            vec![
                "flow: login",
                "flow: listPets",
                "flow: createPet",
                "flow: getPet",
                "flow: deletePet"
            ]
        );
        let get = &suite.flow.steps[suite.summary.success_tests + 3];
        assert_eq!(get.request.method, HttpMethod::Get);
        assert_eq!(get.request.path, "/pets/{{petId}}");
    }

    #[test]
    fn test_dependency_cycle_becomes_warning() {
        let spec = json!({
            "paths": {
                "/users": {"post": {
                    "operationId": "createUser",
                    "requestBody": {"content": {"application/json": {"schema": {
                        "type": "object", "required": ["orderId"],
                        "properties": {"orderId": {"type": "string"}}
                    }}}},
                    "responses": {"201": {}}
                }},
                "/orders": {"post": {
                    "operationId": "createOrder",
                    "requestBody": {"content": {"application/json": {"schema": {
                        "type": "object", "required": ["userId"],
                        "properties": {"userId": {"type": "string"}}
                    }}}},
                    "responses": {"201": {}}
                }}
            }
        });
        let options = GenerationOptions::success_only().with_flows(true);
        let suite = TestSuiteGenerator::new(&spec).generate(&options).unwrap();

        assert_eq!(suite.summary.flow_tests, 0);
        assert_eq!(suite.summary.success_tests, 2);
        assert_eq!(suite.summary.warnings.len(), 1);
        assert!(suite.summary.warnings[0].contains("createUser"));
    }
}
