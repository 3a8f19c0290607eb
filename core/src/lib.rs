//! flowgen core types
//!
//! This crate provides the artifact types shared by every flowgen component:
//! - The flow model (FlowDefinition, FlowStep, StepRequest, Expectations)
//! - HTTP methods and their conventional success statuses
//! - `{{name}}` variable references used by captures and substitutions
//! - Common error types

mod error;
mod flow;
mod method;
mod vars;

pub use error::*;
pub use flow::*;
pub use method::*;
pub use vars::*;
