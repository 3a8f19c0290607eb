//! Configuration for test generation

use flowgen_core::{GenError, GenResult};
use serde::Deserialize;

/// Options controlling which test steps are generated
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    /// One success step per endpoint
    pub include_success_cases: bool,
    /// Negative steps (missing fields, invalid formats, auth)
    pub include_error_cases: bool,
    /// Boundary-value steps for bounded properties
    pub include_edge_cases: bool,
    /// Login wiring and the 401 step for secured endpoints
    pub include_auth_tests: bool,
    /// Missing-required-field steps (part of error cases)
    pub include_missing_field_cases: bool,
    /// Invalid-format steps (part of error cases)
    pub include_format_cases: bool,
    /// Append a dependency-ordered chained flow
    pub generate_flows: bool,
    /// Filters: operationId, `"METHOD /path"` or bare `/path`; empty selects all
    pub endpoints: Vec<String>,
    /// Random seed for free-form values
    pub seed: u64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            include_success_cases: true,
            include_error_cases: true,
            include_edge_cases: false,
            include_auth_tests: true,
            include_missing_field_cases: true,
            include_format_cases: true,
            generate_flows: false,
            endpoints: Vec::new(),
            seed: 42,
        }
    }
}

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the per-endpoint success steps.
    pub fn success_only() -> Self {
        Self {
            include_success_cases: true,
            include_error_cases: false,
            include_edge_cases: false,
            include_auth_tests: false,
            generate_flows: false,
            ..Self::default()
        }
    }

    /// Every generator enabled.
    pub fn all() -> Self {
        Self {
            include_edge_cases: true,
            generate_flows: true,
            ..Self::default()
        }
    }

    pub fn with_success_cases(mut self, enabled: bool) -> Self {
        self.include_success_cases = enabled;
        self
    }

    pub fn with_error_cases(mut self, enabled: bool) -> Self {
        self.include_error_cases = enabled;
        self
    }

    pub fn with_edge_cases(mut self, enabled: bool) -> Self {
        self.include_edge_cases = enabled;
        self
    }

    pub fn with_auth_tests(mut self, enabled: bool) -> Self {
        self.include_auth_tests = enabled;
        self
    }

    pub fn with_missing_field_cases(mut self, enabled: bool) -> Self {
        self.include_missing_field_cases = enabled;
        self
    }

    pub fn with_format_cases(mut self, enabled: bool) -> Self {
        self.include_format_cases = enabled;
        self
    }

    pub fn with_flows(mut self, enabled: bool) -> Self {
        self.generate_flows = enabled;
        self
    }

    pub fn with_endpoint(mut self, filter: impl Into<String>) -> Self {
        self.endpoints.push(filter.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Parse options from JSON; absent fields take their defaults.
    pub fn from_json(text: &str) -> GenResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reject options that cannot produce a meaningful suite.
    pub fn validate(&self) -> GenResult<()> {
        if self.endpoints.iter().any(|f| f.trim().is_empty()) {
            return Err(GenError::InvalidOptions(
                "endpoint filters must not be blank".to_string(),
            ));
        }
        let any_generator = self.include_success_cases
            || self.include_error_cases
            || self.include_edge_cases
            || self.generate_flows;
        if !any_generator {
            return Err(GenError::InvalidOptions(
                "all generators are disabled".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(GenerationOptions::default().validate().is_ok());
        assert!(GenerationOptions::all().validate().is_ok());
        assert!(GenerationOptions::success_only().validate().is_ok());
    }

    #[test]
    fn test_rejects_blank_filter() {
        let options = GenerationOptions::new().with_endpoint("  ");
        assert!(matches!(options.validate(), Err(GenError::InvalidOptions(_))));
    }

    #[test]
    fn test_rejects_all_disabled() {
        let options = GenerationOptions::new()
            .with_success_cases(false)
            .with_error_cases(false);
        assert!(matches!(options.validate(), Err(GenError::InvalidOptions(_))));
    }

    #[test]
    fn test_deserialize_camel_case_with_defaults() {
        let options = GenerationOptions::from_json(
            r#"{"includeEdgeCases": true, "endpoints": ["createUser"], "seed": 7}"#,
        )
        .unwrap();
        assert!(options.include_edge_cases);
        assert!(options.include_success_cases);
        assert_eq!(options.endpoints, vec!["createUser"]);
        assert_eq!(options.seed, 7);

        let err = GenerationOptions::from_json(r#"{"seed": "seven"}"#).unwrap_err();
        assert!(matches!(err, GenError::Json(_)));
    }
}
