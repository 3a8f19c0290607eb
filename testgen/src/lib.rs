//! Test-suite planning for OpenAPI contracts
//!
//! This crate turns an analyzed OpenAPI document into an executable flow:
//! - Synthesizes valid and single-fault invalid request data from schemas
//! - Emits success, negative and boundary steps per endpoint
//! - Orders endpoints into a chained flow by producer/consumer dependencies
//! - Audits any flow against the API document and scores it

pub mod config;
pub mod crud;
pub mod deps;
pub mod edge;
pub mod errors;
pub mod quality;
pub mod report;
mod request;
pub mod suite;
pub mod synth;
pub mod types;

pub use config::GenerationOptions;
pub use crud::CrudGenerator;
pub use deps::{DependencyGraph, DependencyResolver, EdgeKind};
pub use edge::EdgeCaseGenerator;
pub use errors::{ErrorCaseGenerator, ErrorCaseToggles};
pub use quality::{FixSuggestion, FlowQualityChecker, IssueType, QualityIssue, QualityReport, Severity};
pub use report::ReportGenerator;
pub use suite::TestSuiteGenerator;
pub use synth::{DataSynthesizer, ViolatedConstraint, Violation};
pub use types::*;

pub use flowgen_analyzer::SpecAnalyzer;
pub use flowgen_core::{FlowDefinition, FlowStep, GenError, GenResult};
