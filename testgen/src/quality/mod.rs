//! Structural auditing of flows against an OpenAPI document
//!
//! Works on any `FlowDefinition`, generated or hand-written. The report is
//! read-only; fix suggestions describe edits without applying them.

use flowgen_analyzer::{path_segments, EndpointInfo, PathSegment, SpecAnalyzer};
use flowgen_core::{referenced_vars, referenced_vars_in_value, rename_var, FlowDefinition, FlowStep, HttpMethod};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(s)
    }
}

/// Kinds of problem the checker detects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    EmptyFlow,
    MissingBaseUrl,
    EmptyStepName,
    DuplicateStepName,
    InvalidPath,
    UndefinedVariable,
    VariableUsedBeforeCapture,
    UnknownEndpoint,
    UndeclaredStatus,
    MissingRequestBody,
    UnexpectedRequestBody,
    MissingAuthHeader,
    UnusedCapture,
}

impl IssueType {
    pub fn severity(&self) -> Severity {
        match self {
            IssueType::EmptyFlow
            | IssueType::EmptyStepName
            | IssueType::InvalidPath
            | IssueType::UndefinedVariable
            | IssueType::VariableUsedBeforeCapture
            | IssueType::MissingRequestBody => Severity::Error,
            IssueType::MissingBaseUrl
            | IssueType::DuplicateStepName
            | IssueType::UnknownEndpoint
            | IssueType::UndeclaredStatus
            | IssueType::UnexpectedRequestBody
            | IssueType::MissingAuthHeader => Severity::Warning,
            IssueType::UnusedCapture => Severity::Info,
        }
    }

    /// Points deducted from the score per occurrence.
    pub fn weight(&self) -> u32 {
        match self {
            IssueType::EmptyFlow => 100,
            IssueType::UndefinedVariable | IssueType::VariableUsedBeforeCapture => 25,
            IssueType::EmptyStepName | IssueType::InvalidPath | IssueType::MissingRequestBody => 20,
            IssueType::MissingBaseUrl
            | IssueType::DuplicateStepName
            | IssueType::UnknownEndpoint
            | IssueType::UndeclaredStatus
            | IssueType::MissingAuthHeader => 10,
            IssueType::UnexpectedRequestBody => 5,
            IssueType::UnusedCapture => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::EmptyFlow => "empty_flow",
            IssueType::MissingBaseUrl => "missing_base_url",
            IssueType::EmptyStepName => "empty_step_name",
            IssueType::DuplicateStepName => "duplicate_step_name",
            IssueType::InvalidPath => "invalid_path",
            IssueType::UndefinedVariable => "undefined_variable",
            IssueType::VariableUsedBeforeCapture => "variable_used_before_capture",
            IssueType::UnknownEndpoint => "unknown_endpoint",
            IssueType::UndeclaredStatus => "undeclared_status",
            IssueType::MissingRequestBody => "missing_request_body",
            IssueType::UnexpectedRequestBody => "unexpected_request_body",
            IssueType::MissingAuthHeader => "missing_auth_header",
            IssueType::UnusedCapture => "unused_capture",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityIssue {
    pub severity: Severity,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    /// Field path inside the flow, e.g. `steps[2].request.path`
    pub location: String,
    pub message: String,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    /// Variable or header the issue is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub issues: Vec<QualityIssue>,
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
    pub total_issues: usize,
    /// 100 minus the summed issue weights, clipped to 0..=100
    pub score: u32,
}

impl QualityReport {
    fn from_issues(issues: Vec<QualityIssue>) -> Self {
        let count = |sev: Severity| issues.iter().filter(|i| i.severity == sev).count();
        let penalty: u32 = issues.iter().map(|i| i.issue_type.weight()).sum();
        Self {
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
            infos: count(Severity::Info),
            total_issues: issues.len(),
            score: MAX_SCORE.saturating_sub(penalty),
            issues,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn issues_of(&self, issue_type: IssueType) -> impl Iterator<Item = &QualityIssue> {
        self.issues.iter().filter(move |i| i.issue_type == issue_type)
    }
}

/// A proposed edit for one issue
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixSuggestion {
    pub step_index: Option<usize>,
    pub field_path: String,
    pub current_value: Value,
    pub suggested_value: Value,
    pub reason: String,
}

/// Audits one flow against one OpenAPI document
pub struct FlowQualityChecker<'a> {
    flow: &'a FlowDefinition,
    endpoints: Vec<EndpointInfo>,
    spec_base_url: String,
}

impl<'a> FlowQualityChecker<'a> {
    pub fn new(flow: &'a FlowDefinition, spec: &Value) -> Self {
        let analyzer = SpecAnalyzer::new(spec);
        Self {
            flow,
            endpoints: analyzer.extract_endpoints(),
            spec_base_url: analyzer.base_url(),
        }
    }

    /// Run every check and score the result.
    pub fn check(&self) -> QualityReport {
        let mut issues = Vec::new();

        if self.flow.steps.is_empty() {
            issues.push(issue(
                IssueType::EmptyFlow,
                "steps",
                "Flow has no steps".to_string(),
                "Generate at least one step for the operations under test",
                None,
            ));
        }
        if self.flow.base_url.trim().is_empty() {
            issues.push(issue(
                IssueType::MissingBaseUrl,
                "baseUrl",
                "Flow has no baseUrl".to_string(),
                format!("Set baseUrl to {}", self.spec_base_url),
                None,
            ));
        }

        self.check_names(&mut issues);
        self.check_variables(&mut issues);
        for (idx, step) in self.flow.steps.iter().enumerate() {
            self.check_step(idx, step, &mut issues);
        }

        let report = QualityReport::from_issues(issues);
        info!(
            steps = self.flow.steps.len(),
            errors = report.errors,
            warnings = report.warnings,
            infos = report.infos,
            score = report.score,
            "audited flow"
        );
        report
    }

    fn check_names(&self, issues: &mut Vec<QualityIssue>) {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (idx, step) in self.flow.steps.iter().enumerate() {
            let location = format!("steps[{}].name", idx);
            if step.name.trim().is_empty() {
                issues.push(issue(
                    IssueType::EmptyStepName,
                    location,
                    format!("Step {} has no name", idx),
                    "Name the step after the request it makes",
                    Some(idx),
                ));
                continue;
            }
            if let Some(first) = seen.get(step.name.as_str()) {
                issues.push(issue(
                    IssueType::DuplicateStepName,
                    location,
                    format!("Step name '{}' is already used by step {}", step.name, first),
                    "Give every step a unique name",
                    Some(idx),
                ));
            } else {
                seen.insert(&step.name, idx);
            }
        }
    }

    /// Every `{{var}}` must be captured by an earlier step, and every
    /// capture should be used by a later one.
    fn check_variables(&self, issues: &mut Vec<QualityIssue>) {
        let mut first_capture: HashMap<&str, usize> = HashMap::new();
        for (idx, step) in self.flow.steps.iter().enumerate() {
            for var in step.captured_vars() {
                first_capture.entry(var).or_insert(idx);
            }
        }

        let mut used: HashSet<String> = HashSet::new();
        for (idx, step) in self.flow.steps.iter().enumerate() {
            for (field, vars) in step_references(step) {
                for var in vars {
                    let location = format!("steps[{}].request.{}", idx, field);
                    match first_capture.get(var.as_str()) {
                        Some(&at) if at < idx => {}
                        Some(&at) => {
                            let mut found = issue(
                                IssueType::VariableUsedBeforeCapture,
                                location,
                                format!("Variable '{}' is used before step {} captures it", var, at),
                                format!("Move this step after step {}", at),
                                Some(idx),
                            );
                            found.subject = Some(var.clone());
                            issues.push(found);
                        }
                        None => {
                            let mut found = issue(
                                IssueType::UndefinedVariable,
                                location,
                                format!("Variable '{}' is never captured", var),
                                format!("Capture '{}' in an earlier step or replace the reference", var),
                                Some(idx),
                            );
                            found.subject = Some(var.clone());
                            issues.push(found);
                        }
                    }
                    used.insert(var);
                }
            }
        }

        for (idx, step) in self.flow.steps.iter().enumerate() {
            for var in step.captured_vars() {
                if first_capture.get(var) == Some(&idx) && !used.contains(var) {
                    let mut found = issue(
                        IssueType::UnusedCapture,
                        format!("steps[{}].capture.{}", idx, var),
                        format!("Captured variable '{}' is never used", var),
                        "Remove the capture or reference it in a later step",
                        Some(idx),
                    );
                    found.subject = Some(var.to_string());
                    issues.push(found);
                }
            }
        }
    }

    fn check_step(&self, idx: usize, step: &FlowStep, issues: &mut Vec<QualityIssue>) {
        let request = &step.request;
        let status = step.expectations.status;

        let Some(path) = request_path(&request.path, &self.spec_base_url) else {
            issues.push(issue(
                IssueType::InvalidPath,
                format!("steps[{}].request.path", idx),
                format!("Path '{}' is neither absolute nor rooted at '/'", request.path),
                "Start the path with '/'",
                Some(idx),
            ));
            return;
        };

        if request.body.is_some() && matches!(request.method, HttpMethod::Get | HttpMethod::Delete) {
            issues.push(issue(
                IssueType::UnexpectedRequestBody,
                format!("steps[{}].request.body", idx),
                format!("{} request carries a body", request.method),
                "Drop the body; servers commonly ignore or reject it",
                Some(idx),
            ));
        }

        let Some(endpoint) = self.find_endpoint(request.method, path) else {
            issues.push(issue(
                IssueType::UnknownEndpoint,
                format!("steps[{}].request", idx),
                format!("No operation matches {} {}", request.method, path),
                "Check the method and path against the API document",
                Some(idx),
            ));
            return;
        };
        debug!(step = idx, operation_id = %endpoint.operation_id, "matched step to operation");

        if !endpoint.declares_status(status) {
            issues.push(issue(
                IssueType::UndeclaredStatus,
                format!("steps[{}].expectations.status", idx),
                format!(
                    "Status {} is not declared for {} (declared: {})",
                    status,
                    endpoint.operation_id,
                    endpoint
                        .declared_statuses()
                        .iter()
                        .map(u16::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
                format!("Expect {} or declare {} in the API document", suggested_status(endpoint, status), status),
                Some(idx),
            ));
        }

        let expects_success = (200..300).contains(&status);
        if expects_success && endpoint.request_body_required && request.body.is_none() {
            issues.push(issue(
                IssueType::MissingRequestBody,
                format!("steps[{}].request.body", idx),
                format!("{} requires a request body", endpoint.operation_id),
                "Add a body matching the request schema",
                Some(idx),
            ));
        }

        if endpoint.requires_auth() && status != 401 && request.header("Authorization").is_none() {
            let mut found = issue(
                IssueType::MissingAuthHeader,
                format!("steps[{}].request.headers.Authorization", idx),
                format!("{} is secured but the step sends no credentials", endpoint.operation_id),
                "Add an Authorization header or expect 401",
                Some(idx),
            );
            found.subject = Some("Authorization".to_string());
            issues.push(found);
        }
    }

    fn find_endpoint(&self, method: HttpMethod, path: &str) -> Option<&EndpointInfo> {
        self.endpoints
            .iter()
            .find(|ep| ep.method == method && path_matches(&ep.path, path))
    }

    /// Propose edits for the issues that have a mechanical fix.
    pub fn generate_fix_suggestions(&self, report: &QualityReport) -> Vec<FixSuggestion> {
        report
            .issues
            .iter()
            .filter_map(|found| self.suggest(found))
            .collect()
    }

    fn suggest(&self, found: &QualityIssue) -> Option<FixSuggestion> {
        let idx = found.step_index;
        let step = idx.and_then(|i| self.flow.steps.get(i));
        let fix = |current: Value, suggested: Value, reason: String| FixSuggestion {
            step_index: idx,
            field_path: found.location.clone(),
            current_value: current,
            suggested_value: suggested,
            reason,
        };

        match found.issue_type {
            IssueType::MissingBaseUrl => Some(fix(
                json!(self.flow.base_url),
                json!(self.spec_base_url),
                "First server URL declared by the API document".to_string(),
            )),
            IssueType::EmptyStepName => {
                let step = step?;
                Some(fix(
                    json!(step.name),
                    json!(format!("{} {}", step.request.method, step.request.path)),
                    "Derived from the request line".to_string(),
                ))
            }
            IssueType::DuplicateStepName => {
                let step = step?;
                Some(fix(
                    json!(step.name),
                    json!(format!("{} (step {})", step.name, idx?)),
                    "Step names must be unique".to_string(),
                ))
            }
            IssueType::InvalidPath => {
                let step = step?;
                Some(fix(
                    json!(step.request.path),
                    json!(format!("/{}", step.request.path.trim_start_matches('/'))),
                    "Request paths are rooted at the base URL".to_string(),
                ))
            }
            IssueType::UndeclaredStatus => {
                let step = step?;
                let path = request_path(&step.request.path, &self.spec_base_url)?;
                let endpoint = self.find_endpoint(step.request.method, path)?;
                let suggested = suggested_status(endpoint, step.expectations.status);
                Some(fix(
                    json!(step.expectations.status),
                    json!(suggested),
                    format!("{} declares {}", endpoint.operation_id, suggested),
                ))
            }
            IssueType::UnexpectedRequestBody => {
                let step = step?;
                Some(fix(
                    step.request.body.clone().unwrap_or(Value::Null),
                    Value::Null,
                    format!("{} requests do not send a body", step.request.method),
                ))
            }
            IssueType::MissingAuthHeader => {
                let token = self
                    .flow
                    .steps
                    .iter()
                    .take(idx?)
                    .flat_map(FlowStep::captured_vars)
                    .find(|v| v.to_lowercase().contains("token"))
                    .map(|v| format!("Bearer {{{{{}}}}}", v))
                    .unwrap_or_else(|| "Bearer <token>".to_string());
                Some(fix(
                    Value::Null,
                    json!(token),
                    "The operation declares a security requirement".to_string(),
                ))
            }
            IssueType::UndefinedVariable => {
                let step = step?;
                let var = found.subject.as_deref()?;
                let replacement = self.closest_capture(var, idx?)?;
                let (current, suggested) = rename_in_field(step, &found.location, var, &replacement)?;
                Some(fix(
                    current,
                    suggested,
                    format!("'{}' is captured earlier and looks like the intended variable", replacement),
                ))
            }
            IssueType::VariableUsedBeforeCapture => {
                let var = found.subject.as_deref()?;
                let at = self
                    .flow
                    .steps
                    .iter()
                    .position(|s| s.captured_vars().any(|v| v == var))?;
                Some(FixSuggestion {
                    step_index: idx,
                    field_path: format!("steps[{}]", idx?),
                    current_value: json!(idx?),
                    suggested_value: json!(at + 1),
                    reason: format!("Step {} captures '{}'", at, var),
                })
            }
            IssueType::EmptyFlow
            | IssueType::UnknownEndpoint
            | IssueType::MissingRequestBody
            | IssueType::UnusedCapture => None,
        }
    }

    /// A variable captured before `before` whose name matches `var` loosely.
    fn closest_capture(&self, var: &str, before: usize) -> Option<String> {
        let wanted = normalize_var(var);
        self.flow
            .steps
            .iter()
            .take(before)
            .flat_map(FlowStep::captured_vars)
            .find(|candidate| {
                let candidate = normalize_var(candidate);
                candidate == wanted || candidate.ends_with(&wanted) || wanted.ends_with(&candidate)
            })
            .map(str::to_string)
    }
}

fn issue(
    issue_type: IssueType,
    location: impl Into<String>,
    message: String,
    suggestion: impl Into<String>,
    step_index: Option<usize>,
) -> QualityIssue {
    QualityIssue {
        severity: issue_type.severity(),
        issue_type,
        location: location.into(),
        message,
        suggestion: suggestion.into(),
        step_index,
        subject: None,
    }
}

/// Variable references per request field, keyed by the field's path.
fn step_references(step: &FlowStep) -> Vec<(String, Vec<String>)> {
    let request = &step.request;
    let mut refs = vec![("path".to_string(), referenced_vars(&request.path))];
    if let Some(headers) = &request.headers {
        for (name, value) in headers {
            refs.push((format!("headers.{}", name), referenced_vars(value)));
        }
    }
    if let Some(body) = &request.body {
        refs.push(("body".to_string(), referenced_vars_in_value(body)));
    }
    refs
}

/// The field named by `location`, before and after renaming `from` to `to`.
fn rename_in_field(step: &FlowStep, location: &str, from: &str, to: &str) -> Option<(Value, Value)> {
    let field = location.split_once(".request.")?.1;
    let request = &step.request;
    if field == "path" {
        return Some((json!(request.path), json!(rename_var(&request.path, from, to))));
    }
    if field == "body" {
        let body = request.body.as_ref()?;
        let renamed = serde_json::from_str(&rename_var(&body.to_string(), from, to)).ok()?;
        return Some((body.clone(), renamed));
    }
    let header = field.strip_prefix("headers.")?;
    let value = request.header(header)?;
    Some((json!(value), json!(rename_var(value, from, to))))
}

fn normalize_var(var: &str) -> String {
    var.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

/// Path portion of a request path or absolute URL, without the query.
/// An absolute URL under `base_url` loses that prefix. `None` when the path
/// is neither.
fn request_path<'p>(raw: &'p str, base_url: &str) -> Option<&'p str> {
    let base = base_url.trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        if let Some(rest) = raw.strip_prefix(base) {
            if rest.is_empty() || rest.starts_with(&['?', '#'][..]) {
                return Some("/");
            }
            if rest.starts_with('/') {
                return Some(rest.split(&['?', '#'][..]).next().unwrap_or(rest));
            }
        }
    }
    let path = if let Some(rest) = raw
        .strip_prefix("https://")
        .or_else(|| raw.strip_prefix("http://"))
    {
        rest.find('/').map(|at| &rest[at..]).unwrap_or("/")
    } else if raw.starts_with('/') {
        raw
    } else {
        return None;
    };
    Some(path.split(&['?', '#'][..]).next().unwrap_or(path))
}

/// Whether a concrete path (possibly holding `{{var}}` references) fits a
/// template like `/users/{id}`.
fn path_matches(template: &str, path: &str) -> bool {
    let expected = path_segments(template);
    let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    expected.len() == actual.len()
        && expected.iter().zip(&actual).all(|(seg, got)| match seg {
            PathSegment::Literal(lit) => lit == got,
            PathSegment::Param(_) => true,
        })
}

/// The declared status closest in meaning to `status`.
fn suggested_status(endpoint: &EndpointInfo, status: u16) -> u16 {
    let class = status / 100;
    endpoint
        .declared_statuses()
        .into_iter()
        .find(|s| s / 100 == class)
        .unwrap_or_else(|| endpoint.success_status())
}
