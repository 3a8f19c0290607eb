//! Step bookkeeping and summary types

use flowgen_analyzer::SkippedOperation;
use flowgen_core::{FlowDefinition, FlowStep};
use serde::Serialize;

/// Which generator produced a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepCategory {
    /// Login step that captures the auth token
    Setup,
    Success,
    Error,
    Edge,
    /// Part of the dependency-ordered chained flow
    Flow,
}

impl StepCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepCategory::Setup => "setup",
            StepCategory::Success => "success",
            StepCategory::Error => "error",
            StepCategory::Edge => "edge",
            StepCategory::Flow => "flow",
        }
    }
}

/// Steps of a suite under assembly, addressed by position.
///
/// Steps are appended once and never mutated; the arena index is the
/// step's position in the final flow.
#[derive(Debug, Clone, Default)]
pub struct StepArena {
    steps: Vec<FlowStep>,
    categories: Vec<StepCategory>,
}

impl StepArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step and return its index.
    pub fn push(&mut self, category: StepCategory, step: FlowStep) -> usize {
        let idx = self.steps.len();
        self.steps.push(step);
        self.categories.push(category);
        idx
    }

    pub fn extend(&mut self, category: StepCategory, steps: impl IntoIterator<Item = FlowStep>) {
        for step in steps {
            self.push(category, step);
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn category(&self, idx: usize) -> Option<StepCategory> {
        self.categories.get(idx).copied()
    }

    pub fn count(&self, category: StepCategory) -> usize {
        self.categories.iter().filter(|c| **c == category).count()
    }

    pub fn into_steps(self) -> Vec<FlowStep> {
        self.steps
    }
}

/// Counts derived from one generation call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuiteSummary {
    /// Every step in the flow, setup and chained-flow steps included
    pub total_tests: usize,
    pub success_tests: usize,
    pub error_tests: usize,
    pub edge_tests: usize,
    pub flow_tests: usize,
    /// `"METHOD /path"` of each selected endpoint
    pub endpoints: Vec<String>,
    /// Operations dropped from the document (partial coverage)
    pub skipped: Vec<SkippedSummary>,
    /// Non-fatal problems met during generation
    pub warnings: Vec<String>,
}

/// Serializable form of a skipped operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSummary {
    pub method: String,
    pub path: String,
    pub reason: String,
}

impl From<&SkippedOperation> for SkippedSummary {
    fn from(op: &SkippedOperation) -> Self {
        Self {
            method: op.method.to_string(),
            path: op.path.clone(),
            reason: op.reason.clone(),
        }
    }
}

/// A generated flow plus its summary
#[derive(Debug, Clone)]
pub struct GeneratedSuite {
    pub flow: FlowDefinition,
    pub summary: TestSuiteSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgen_core::{HttpMethod, StepRequest};

    fn step(name: &str) -> FlowStep {
        FlowStep::new(name, StepRequest::new(HttpMethod::Get, "/x"), 200)
    }

    #[test]
    fn test_arena_indices_and_counts() {
        let mut arena = StepArena::new();
        assert_eq!(arena.push(StepCategory::Success, step("a")), 0);
        assert_eq!(arena.push(StepCategory::Error, step("b")), 1);
        arena.extend(StepCategory::Error, vec![step("c"), step("d")]);

        assert_eq!(arena.len(), 4);
        assert_eq!(arena.count(StepCategory::Error), 3);
        assert_eq!(arena.category(0), Some(StepCategory::Success));
        assert_eq!(arena.category(9), None);
        let names: Vec<String> = arena.into_steps().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }
}
