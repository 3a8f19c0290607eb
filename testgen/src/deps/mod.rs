//! Dependency resolution - producer/consumer ordering across endpoints
//!
//! A `POST` on a collection path (`/users`) produces an identifier that item
//! paths below it (`/users/{id}`) or required body fields named after it
//! (`userId`) consume. The resolver orders producers before consumers,
//! captures each consumed identifier from the producer's response and
//! substitutes `{{var}}` references into the consumers.

use crate::crud::valid_body;
use crate::request::{concrete_path, with_auth};
use crate::synth::DataSynthesizer;
use flowgen_analyzer::{path_segments, EndpointInfo, JsonSchema, PathSegment};
use flowgen_core::{var_ref, FlowStep, GenError, GenResult, HttpMethod, StepRequest};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};
use tracing::{debug, warn};

/// Response properties that conventionally carry a created resource's id.
const ID_FIELDS: &[&str] = &["id", "_id", "uuid"];

/// How a consumer uses the resource a producer made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Consumer creates a child resource under it
    Creates,
    /// Consumer reads it
    Requires,
    /// Consumer updates it
    Modifies,
    /// Consumer deletes it
    Deletes,
}

impl EdgeKind {
    fn for_method(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Post => EdgeKind::Creates,
            HttpMethod::Put | HttpMethod::Patch => EdgeKind::Modifies,
            HttpMethod::Delete => EdgeKind::Deletes,
            _ => EdgeKind::Requires,
        }
    }
}

/// `from` must run before `to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    pub from: usize,
    pub to: usize,
    pub kind: EdgeKind,
    /// Identifier produced by `from` and consumed by `to`
    pub variable: Option<String>,
}

/// What a producer endpoint yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub variable: String,
    /// Response path the identifier is captured from
    pub capture_path: String,
}

/// Per-node substitutions and productions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeBindings {
    /// Path parameter -> variable
    pub path_params: BTreeMap<String, String>,
    /// Body field -> variable
    pub body_fields: BTreeMap<String, String>,
    pub produces: Option<Production>,
}

/// Graph over endpoints keyed by operationId
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<DependencyEdge>,
    edge_set: HashSet<(usize, usize)>,
    bindings: Vec<NodeBindings>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its index; existing operationIds are reused.
    pub fn add_node(&mut self, operation_id: impl Into<String>) -> usize {
        let operation_id = operation_id.into();
        if let Some(&idx) = self.index.get(&operation_id) {
            return idx;
        }
        let idx = self.nodes.len();
        self.index.insert(operation_id.clone(), idx);
        self.nodes.push(operation_id);
        self.bindings.push(NodeBindings::default());
        idx
    }

    /// Add an edge between two known operations. Self-loops and duplicate
    /// (from, to) pairs are ignored; returns whether the edge was added.
    pub fn add_edge(
        &mut self,
        from: &str,
        to: &str,
        kind: EdgeKind,
        variable: Option<String>,
    ) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&from), Some(&to)) => self.link(from, to, kind, variable),
            _ => false,
        }
    }

    fn link(&mut self, from: usize, to: usize, kind: EdgeKind, variable: Option<String>) -> bool {
        if from == to || !self.edge_set.insert((from, to)) {
            return false;
        }
        self.edges.push(DependencyEdge {
            from,
            to,
            kind,
            variable,
        });
        true
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn operation_id(&self, idx: usize) -> Option<&str> {
        self.nodes.get(idx).map(String::as_str)
    }

    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub fn bindings(&self, idx: usize) -> Option<&NodeBindings> {
        self.bindings.get(idx)
    }

    /// Whether any downstream node consumes the variable `idx` produces.
    pub fn is_consumed(&self, idx: usize) -> bool {
        self.edges
            .iter()
            .any(|e| e.from == idx && e.variable.is_some())
    }

    /// Infer producer/consumer edges between endpoints. Node `i` is `endpoints[i]`.
    pub fn build(endpoints: &[EndpointInfo]) -> Self {
        let mut graph = Self::new();
        for endpoint in endpoints {
            graph.add_node(endpoint.operation_id.clone());
        }

        // Producers: POST on a collection path
        let mut producers: HashMap<String, usize> = HashMap::new();
        let mut used_vars: HashSet<String> = HashSet::new();
        for (idx, endpoint) in endpoints.iter().enumerate() {
            if endpoint.method != HttpMethod::Post {
                continue;
            }
            let segments = path_segments(&endpoint.path);
            let Some(PathSegment::Literal(collection)) = segments.last() else {
                continue;
            };
            let key = resource_key(&segments);
            if producers.contains_key(&key) {
                continue;
            }
            let mut variable = format!("{}Id", camel_case(&singularize(collection)));
            let mut suffix = 2;
            while used_vars.contains(&variable) {
                variable = format!("{}Id{}", camel_case(&singularize(collection)), suffix);
                suffix += 1;
            }
            used_vars.insert(variable.clone());
            graph.bindings[idx].produces = Some(Production {
                capture_path: capture_path(endpoint, &variable),
                variable,
            });
            producers.insert(key, idx);
        }

        let produced: HashMap<String, usize> = producers
            .values()
            .filter_map(|&idx| {
                graph.bindings[idx]
                    .produces
                    .as_ref()
                    .map(|p| (p.variable.clone(), idx))
            })
            .collect();

        for (idx, endpoint) in endpoints.iter().enumerate() {
            let kind = EdgeKind::for_method(endpoint.method);

            // Path consumers: `{param}` right after a produced collection
            let segments = path_segments(&endpoint.path);
            for (pos, segment) in segments.iter().enumerate() {
                let PathSegment::Param(param) = segment else {
                    continue;
                };
                let Some(&producer) = producers.get(&resource_key(&segments[..pos])) else {
                    continue;
                };
                if producer == idx {
                    continue;
                }
                let Some(variable) = graph.produced_var(producer) else {
                    continue;
                };
                graph.link(producer, idx, kind, Some(variable.clone()));
                graph.bindings[idx]
                    .path_params
                    .insert(param.to_string(), variable);
            }

            // Body consumers: required field named after a produced identifier
            let required = endpoint
                .request_schema
                .as_ref()
                .and_then(JsonSchema::as_object)
                .map(|shape| shape.required.clone())
                .unwrap_or_default();
            for field in required {
                let Some(&producer) = produced.get(&field) else {
                    continue;
                };
                if producer == idx {
                    continue;
                }
                graph.link(producer, idx, EdgeKind::Requires, Some(field.clone()));
                graph.bindings[idx].body_fields.insert(field.clone(), field);
            }
        }

        // A resource is deleted only after everything else that uses it
        let deletes: Vec<(usize, usize, String)> = graph
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Deletes)
            .filter_map(|e| e.variable.clone().map(|v| (e.from, e.to, v)))
            .collect();
        for (producer, deleter, variable) in deletes {
            let users: Vec<usize> = graph
                .edges
                .iter()
                .filter(|e| {
                    e.from == producer
                        && e.to != deleter
                        && e.kind != EdgeKind::Deletes
                        && e.variable.as_deref() == Some(variable.as_str())
                })
                .map(|e| e.to)
                .collect();
            for user in users {
                graph.link(user, deleter, EdgeKind::Deletes, None);
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edges.len(),
            "built dependency graph"
        );
        graph
    }

    fn produced_var(&self, idx: usize) -> Option<String> {
        self.bindings[idx]
            .produces
            .as_ref()
            .map(|p| p.variable.clone())
    }

    /// Stable topological order: producers first, ties broken by node index.
    ///
    /// A cycle is a configuration error naming the operations on it.
    pub fn execution_order(&self) -> GenResult<Vec<usize>> {
        let n = self.nodes.len();
        let mut in_degree = vec![0usize; n];
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
        for edge in &self.edges {
            in_degree[edge.to] += 1;
            successors[edge.from].push(edge.to);
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..n)
            .filter(|&i| in_degree[i] == 0)
            .map(Reverse)
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(idx)) = ready.pop() {
            order.push(idx);
            for &next in &successors[idx] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() == n {
            return Ok(order);
        }

        let operations = self.find_cycle(&in_degree);
        warn!(cycle = ?operations, "dependency cycle detected");
        Err(GenError::DependencyCycle { operations })
    }

    /// Walk predecessors among the unresolved nodes until one repeats.
    fn find_cycle(&self, in_degree: &[usize]) -> Vec<String> {
        let stuck = |i: usize| in_degree[i] > 0;
        let Some(start) = (0..self.nodes.len()).find(|&i| stuck(i)) else {
            return Vec::new();
        };

        let mut path = vec![start];
        let mut seen: HashMap<usize, usize> = HashMap::from([(start, 0)]);
        let mut current = start;
        loop {
            let Some(prev) = self
                .edges
                .iter()
                .filter(|e| e.to == current && stuck(e.from))
                .map(|e| e.from)
                .min()
            else {
                break;
            };
            if let Some(&pos) = seen.get(&prev) {
                let mut cycle: Vec<usize> = path[pos..].to_vec();
                cycle.reverse();
                cycle.push(cycle[0]);
                return cycle.iter().map(|&i| self.nodes[i].clone()).collect();
            }
            seen.insert(prev, path.len());
            path.push(prev);
            current = prev;
        }

        (0..self.nodes.len())
            .filter(|&i| stuck(i))
            .map(|i| self.nodes[i].clone())
            .collect()
    }
}

/// Orders endpoints into a chained flow
pub struct DependencyResolver<'a> {
    auth_header: Option<&'a str>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new() -> Self {
        Self { auth_header: None }
    }

    pub fn with_auth(auth_header: Option<&'a str>) -> Self {
        Self { auth_header }
    }

    /// One step per endpoint, producers before consumers, with captures on
    /// producers whose identifier is used downstream and `{{var}}`
    /// references in consumers.
    pub fn resolve_execution_order(
        &self,
        endpoints: &[EndpointInfo],
        synth: &mut DataSynthesizer,
    ) -> GenResult<Vec<FlowStep>> {
        let graph = DependencyGraph::build(endpoints);
        let order = graph.execution_order()?;

        let mut steps = Vec::with_capacity(order.len());
        for idx in order {
            let endpoint = &endpoints[idx];
            let bindings = graph.bindings(idx).cloned().unwrap_or_default();

            let path = concrete_path(endpoint, synth, &|param| {
                bindings.path_params.get(param).map(|var| var_ref(var))
            });
            let mut request = with_auth(
                StepRequest::new(endpoint.method, path),
                endpoint,
                self.auth_header,
            );

            if let Some(mut body) = valid_body(endpoint, synth) {
                if let Value::Object(fields) = &mut body {
                    for (field, var) in &bindings.body_fields {
                        fields.insert(field.clone(), Value::String(var_ref(var)));
                    }
                }
                request = request.with_body(body);
            }

            let mut step = FlowStep::new(
                format!("flow: {}", endpoint.operation_id),
                request,
                endpoint.success_status(),
            );
            if let Some(production) = bindings.produces.as_ref().filter(|_| graph.is_consumed(idx)) {
                step = step.with_capture(&production.variable, &production.capture_path);
            }
            steps.push(step);
        }

        Ok(steps)
    }
}

impl Default for DependencyResolver<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn resource_key(segments: &[PathSegment<'_>]) -> String {
    segments
        .iter()
        .map(|s| match s {
            PathSegment::Literal(lit) => lit.to_lowercase(),
            PathSegment::Param(_) => "{}".to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Where the created id lives in the producer's success response.
fn capture_path(endpoint: &EndpointInfo, variable: &str) -> String {
    let field = endpoint
        .success_response_schema()
        .and_then(JsonSchema::as_object)
        .and_then(|shape| {
            std::iter::once(variable)
                .chain(ID_FIELDS.iter().copied())
                .find(|f| shape.property(f).is_some())
        })
        .unwrap_or("id");
    format!("$.{}", field)
}

fn singularize(word: &str) -> String {
    let lower = word.to_lowercase();
    if let Some(stem) = lower.strip_suffix("ies") {
        format!("{}y", stem)
    } else if lower.ends_with("sses") || lower.ends_with("uses") || lower.ends_with("xes") {
        lower[..lower.len() - 2].to_string()
    } else if lower.ends_with('s') && !lower.ends_with("ss") {
        lower[..lower.len() - 1].to_string()
    } else {
        lower
    }
}

fn camel_case(word: &str) -> String {
    let mut out = String::new();
    for (i, part) in word
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|p| !p.is_empty())
        .enumerate()
    {
        if i == 0 {
            out.push_str(part);
        } else {
            let mut chars = part.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn post(path: &str, id: &str, required: &[&str]) -> EndpointInfo {
        let mut ep = EndpointInfo::new(HttpMethod::Post, path, id);
        let props: serde_json::Map<String, Value> = required
            .iter()
            .map(|f| (f.to_string(), json!({"type": "string"})))
            .collect();
        ep.request_schema = Some(JsonSchema::from_value(&json!({
            "type": "object", "required": required, "properties": props
        })));
        ep.responses.insert("201".into(), None);
        ep
    }

    #[test]
    fn test_naming_helpers() {
        assert_eq!(singularize("users"), "user");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("status"), "statu");
        assert_eq!(singularize("news"), "new");
        assert_eq!(camel_case("blog-post"), "blogPost");
    }

    #[test]
    fn test_producer_before_consumer_regardless_of_input_order() {
        let endpoints = vec![
            EndpointInfo::new(HttpMethod::Get, "/users/{id}", "getUser"),
            post("/users", "createUser", &["email"]),
        ];
        let mut synth = DataSynthesizer::new(1);
        let steps = DependencyResolver::new()
            .resolve_execution_order(&endpoints, &mut synth)
            .unwrap();

        assert_eq!(steps[0].name, "flow: createUser");
        assert_eq!(
            steps[0].capture.as_ref().unwrap().get("userId"),
            Some(&"$.id".to_string())
        );
        assert_eq!(steps[1].name, "flow: getUser");
        assert_eq!(steps[1].request.path, "/users/{{userId}}");
        assert!(steps[1].capture.is_none());
    }

    #[test]
    fn test_delete_runs_after_other_consumers() {
        let endpoints = vec![
            EndpointInfo::new(HttpMethod::Delete, "/users/{id}", "deleteUser"),
            EndpointInfo::new(HttpMethod::Put, "/users/{id}", "updateUser"),
            post("/users", "createUser", &[]),
            EndpointInfo::new(HttpMethod::Get, "/users/{id}", "getUser"),
        ];
        let graph = DependencyGraph::build(&endpoints);
        let order: Vec<&str> = graph
            .execution_order()
            .unwrap()
            .into_iter()
            .map(|i| graph.operation_id(i).unwrap())
            .collect();
        assert_eq!(order, vec!["createUser", "updateUser", "getUser", "deleteUser"]);
    }

    #[test]
    fn test_nested_resources_and_body_fields() {
        let endpoints = vec![
            post("/orders", "createOrder", &["userId"]),
            EndpointInfo::new(HttpMethod::Get, "/users/{userId}/posts/{postId}", "getPost"),
            post("/users/{userId}/posts", "createPost", &["title"]),
            post("/users", "createUser", &["email"]),
        ];
        let mut synth = DataSynthesizer::new(1);
        let steps = DependencyResolver::new()
            .resolve_execution_order(&endpoints, &mut synth)
            .unwrap();
        let names: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["flow: createUser", "flow: createOrder", "flow: createPost", "flow: getPost"]
        );
        assert_eq!(steps[1].request.body.as_ref().unwrap()["userId"], json!("{{userId}}"));
        assert_eq!(steps[2].request.path, "/users/{{userId}}/posts");
        assert_eq!(steps[3].request.path, "/users/{{userId}}/posts/{{postId}}");
        // createOrder's id is never consumed
        assert!(steps[1].capture.is_none());
    }

    #[test]
    fn test_body_field_cycle_is_a_configuration_error() {
        let endpoints = vec![
            post("/users", "createUser", &["orderId"]),
            post("/orders", "createOrder", &["userId"]),
        ];
        let mut synth = DataSynthesizer::new(1);
        let err = DependencyResolver::new()
            .resolve_execution_order(&endpoints, &mut synth)
            .unwrap_err();
        match err {
            GenError::DependencyCycle { operations } => {
                assert!(operations.contains(&"createUser".to_string()));
                assert!(operations.contains(&"createOrder".to_string()));
                assert_eq!(operations.first(), operations.last());
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_manual_graph_cycle_reports_only_cycle_members() {
        let mut graph = DependencyGraph::new();
        for id in ["a", "b", "c", "d"] {
            graph.add_node(id);
        }
        assert!(graph.add_edge("a", "b", EdgeKind::Requires, None));
        assert!(graph.add_edge("b", "c", EdgeKind::Requires, None));
        assert!(graph.add_edge("c", "b", EdgeKind::Requires, None));
        assert!(graph.add_edge("c", "d", EdgeKind::Requires, None));
        assert!(!graph.add_edge("a", "a", EdgeKind::Requires, None));
        assert!(!graph.add_edge("a", "zzz", EdgeKind::Requires, None));

        match graph.execution_order() {
            Err(GenError::DependencyCycle { operations }) => {
                assert_eq!(operations, vec!["c", "b", "c"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_stable_order_without_edges() {
        let endpoints = vec![
            EndpointInfo::new(HttpMethod::Get, "/health", "health"),
            EndpointInfo::new(HttpMethod::Get, "/version", "version"),
        ];
        let graph = DependencyGraph::build(&endpoints);
        assert_eq!(graph.execution_order().unwrap(), vec![0, 1]);
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_capture_path_prefers_declared_id_field() {
        let mut ep = post("/users", "createUser", &[]);
        ep.responses.insert(
            "201".into(),
            Some(JsonSchema::from_value(&json!({
                "type": "object", "properties": {"_id": {"type": "string"}}
            }))),
        );
        assert_eq!(capture_path(&ep, "userId"), "$._id");
    }
}
