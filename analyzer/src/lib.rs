//! flowgen Analyzer
//!
//! Reads a dereferenced OpenAPI document and extracts typed endpoint metadata:
//! request/response schemas as an explicit JSON Schema union, parameters,
//! security requirements and the authentication endpoint.

mod analyzer;
mod endpoint;
mod schema;

pub use analyzer::{AuthFlow, Extraction, SkippedOperation, SpecAnalyzer};
pub use endpoint::*;
pub use schema::*;
