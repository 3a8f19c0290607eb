//! Data synthesis - schema-valid and single-fault-invalid values

mod format;

use flowgen_analyzer::{
    ArrayConstraints, JsonSchema, NumericConstraints, ObjectShape, Parameter, SchemaKind,
    StringConstraints,
};
use format::{fake_for_format, fit_length, format_hint_for_name, CHECKABLE_FORMATS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex_lite::Regex;
use serde_json::{Map, Number, Value};
use std::fmt;
use tracing::debug;

/// Nesting depth after which synthesis returns minimal values.
const MAX_DEPTH: usize = 8;

/// Strings tried, in order, when a `pattern` must be satisfied.
const PATTERN_CANDIDATES: &[&str] = &[
    "abc",
    "ABC",
    "Abc123",
    "abc123",
    "123",
    "1",
    "a",
    "A1",
    "abc-123",
    "ABC-123",
    "abc_123",
    "2024-01-15",
    "user@example.com",
    "+15551234567",
    "https://example.com",
];

/// Strings tried, in order, when a `pattern` must be violated.
const PATTERN_MISMATCHES: &[&str] = &["!!invalid!!", "#", " ", "0", "a", "ZZZ", "~~~~~~~~"];

/// The single constraint an invalid value breaks.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolatedConstraint {
    Type { expected: &'static str },
    Enum,
    Format(String),
    Pattern(String),
    MaxLength(usize),
    MinLength(usize),
    Maximum(f64),
    Minimum(f64),
}

impl fmt::Display for ViolatedConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolatedConstraint::Type { expected } => write!(f, "type {}", expected),
            ViolatedConstraint::Enum => write!(f, "enum"),
            ViolatedConstraint::Format(format) => write!(f, "format {}", format),
            ViolatedConstraint::Pattern(pattern) => write!(f, "pattern {}", pattern),
            ViolatedConstraint::MaxLength(n) => write!(f, "maxLength {}", n),
            ViolatedConstraint::MinLength(n) => write!(f, "minLength {}", n),
            ViolatedConstraint::Maximum(n) => write!(f, "maximum {}", n),
            ViolatedConstraint::Minimum(n) => write!(f, "minimum {}", n),
        }
    }
}

/// A value that breaks exactly one declared constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub value: Value,
    pub constraint: ViolatedConstraint,
}

/// Produces request data from JSON Schemas.
///
/// Free-form values come from a seeded RNG, so the same seed and schema
/// sequence always yields the same values.
pub struct DataSynthesizer {
    rng: StdRng,
}

impl DataSynthesizer {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Synthesize a schema-valid value.
    ///
    /// `examples` maps top-level object property names to caller-supplied
    /// values; they take precedence over anything the schema declares.
    pub fn synthesize(&mut self, schema: &JsonSchema, examples: Option<&Map<String, Value>>) -> Value {
        match (&schema.kind, examples) {
            (SchemaKind::Object(shape), Some(examples)) if declared_value(schema).is_none() => {
                self.object_value(shape, Some(examples), 0)
            }
            _ => self.value_at(schema, None, 0),
        }
    }

    /// Synthesize a value for a named property, consulting `examples` first.
    pub fn synthesize_field(
        &mut self,
        name: &str,
        schema: &JsonSchema,
        examples: Option<&Map<String, Value>>,
    ) -> Value {
        if let Some(example) = examples.and_then(|e| e.get(name)) {
            return example.clone();
        }
        self.value_at(schema, Some(name), 0)
    }

    /// Concrete value for a path/query parameter.
    pub fn parameter_value(&mut self, param: &Parameter) -> Value {
        match &param.example {
            Some(example) => example.clone(),
            None if matches!(param.schema.kind, SchemaKind::Unknown) => self.identifier(),
            None => self.value_at(&param.schema, Some(&param.name), 0),
        }
    }

    /// A plausible resource identifier for untyped path parameters.
    pub fn identifier(&mut self) -> Value {
        Value::Number(Number::from(self.rng.gen_range(1u32..1000)))
    }

    fn value_at(&mut self, schema: &JsonSchema, name: Option<&str>, depth: usize) -> Value {
        if let Some(value) = declared_value(schema) {
            return value.clone();
        }
        if depth > MAX_DEPTH {
            debug!(depth, "schema nesting too deep, using minimal value");
            return minimal_value(schema);
        }

        match &schema.kind {
            SchemaKind::String(c) => Value::String(self.string_value(c, name)),
            SchemaKind::Integer(c) => Value::Number(Number::from(self.integer_value(c))),
            SchemaKind::Number(c) => Number::from_f64(self.number_value(c))
                .map(Value::Number)
                .unwrap_or_else(|| Value::Number(Number::from(0))),
            SchemaKind::Boolean => Value::Bool(self.rng.gen_bool(0.5)),
            SchemaKind::Array(c) => self.array_value(c, depth),
            SchemaKind::Object(shape) => self.object_value(shape, None, depth),
            SchemaKind::Unknown => {
                debug!(field = name.unwrap_or("<root>"), "untyped schema, using null");
                Value::Null
            }
        }
    }

    fn string_value(&mut self, c: &StringConstraints, name: Option<&str>) -> String {
        let format = c
            .format
            .as_deref()
            .or_else(|| name.and_then(format_hint_for_name));
        let base = format
            .and_then(|f| fake_for_format(f, &mut self.rng))
            .unwrap_or_else(|| self.word());

        let base = match c.pattern.as_deref().and_then(compile_pattern) {
            Some(re) if !re.is_match(&base) => {
                let found = PATTERN_CANDIDATES
                    .iter()
                    .find(|candidate| re.is_match(candidate) && length_ok(candidate, c));
                match found {
                    Some(candidate) => candidate.to_string(),
                    None => {
                        debug!(pattern = ?c.pattern, "no candidate satisfies pattern");
                        base
                    }
                }
            }
            _ => base,
        };

        let len = base.chars().count();
        let min = c.min_length.unwrap_or(0);
        let max = c.max_length.unwrap_or(usize::MAX).max(min);
        if len < min || len > max {
            fit_length(&base, len.clamp(min, max), format)
        } else {
            base
        }
    }

    fn word(&mut self) -> String {
        let len = self.rng.gen_range(5..11);
        (0..len)
            .map(|_| self.rng.gen_range(b'a'..=b'z') as char)
            .collect()
    }

    fn integer_value(&mut self, c: &NumericConstraints) -> i64 {
        let (lo, hi) = integer_range(c);
        if lo >= hi {
            return lo;
        }
        self.rng.gen_range(lo..=hi)
    }

    fn number_value(&mut self, c: &NumericConstraints) -> f64 {
        let (lo, hi) = match (c.minimum, c.maximum) {
            (Some(lo), Some(hi)) => (lo, hi.max(lo)),
            (Some(lo), None) => (lo, lo + 100.0),
            (None, Some(hi)) => (hi - 100.0, hi),
            (None, None) => (1.0, 100.0),
        };
        if lo >= hi {
            return lo;
        }
        if !(hi - lo).is_finite() {
            return lo / 2.0 + hi / 2.0;
        }
        let raw: f64 = self.rng.gen_range(lo..=hi);
        ((raw * 100.0).round() / 100.0).clamp(lo, hi)
    }

    fn array_value(&mut self, c: &ArrayConstraints, depth: usize) -> Value {
        let count = c.min_items.unwrap_or(1).max(1).min(c.max_items.unwrap_or(usize::MAX));
        let Some(items) = c.items.as_deref() else {
            return Value::Array(Vec::new());
        };
        Value::Array(
            (0..count)
                .map(|_| self.value_at(items, None, depth + 1))
                .collect(),
        )
    }

    fn object_value(
        &mut self,
        shape: &ObjectShape,
        examples: Option<&Map<String, Value>>,
        depth: usize,
    ) -> Value {
        let mut out = Map::new();
        for (name, prop) in &shape.properties {
            let value = match examples.and_then(|e| e.get(name)) {
                Some(example) => example.clone(),
                None => self.value_at(prop, Some(name), depth + 1),
            };
            out.insert(name.clone(), value);
        }
        for name in &shape.required {
            if !out.contains_key(name) {
                let value = examples
                    .and_then(|e| e.get(name))
                    .cloned()
                    .unwrap_or_else(|| Value::String("sample".to_string()));
                out.insert(name.clone(), value);
            }
        }
        if out.is_empty() {
            debug!("object schema without properties, using empty object");
        }
        Value::Object(out)
    }

    /// Produce a value that violates exactly one declared constraint.
    ///
    /// Returns `None` when the schema declares nothing that can be violated;
    /// such fields have no negative case.
    pub fn synthesize_invalid(&mut self, schema: &JsonSchema) -> Option<Violation> {
        if !schema.enum_values.is_empty() {
            if let Some(value) = outside_enum(schema) {
                return Some(Violation {
                    value,
                    constraint: ViolatedConstraint::Enum,
                });
            }
        }

        match &schema.kind {
            SchemaKind::String(c) => Some(self.invalid_string(c)),
            SchemaKind::Integer(c) => Some(invalid_integer(c)),
            SchemaKind::Number(c) => Some(invalid_number(c)),
            SchemaKind::Boolean => Some(wrong_type("boolean", "not-a-boolean")),
            SchemaKind::Array(_) => Some(wrong_type("array", "not-an-array")),
            SchemaKind::Object(_) => Some(wrong_type("object", "not-an-object")),
            SchemaKind::Unknown => None,
        }
    }

    fn invalid_string(&mut self, c: &StringConstraints) -> Violation {
        let pattern = c.pattern.as_deref().and_then(compile_pattern);

        if let Some(format) = c.format.as_deref() {
            if CHECKABLE_FORMATS.contains(&format) {
                let min = c.min_length.unwrap_or(0);
                let max = c.max_length.unwrap_or(usize::MAX).max(min);
                let candidate = "x".repeat(12usize.clamp(min.max(1), max.max(1)));
                let fits = length_ok(&candidate, c)
                    && pattern.as_ref().map_or(true, |re| re.is_match(&candidate));
                if fits {
                    return Violation {
                        value: Value::String(candidate),
                        constraint: ViolatedConstraint::Format(format.to_string()),
                    };
                }
            }
        }

        if let (Some(re), Some(source)) = (&pattern, &c.pattern) {
            let found = PATTERN_MISMATCHES
                .iter()
                .find(|candidate| !re.is_match(candidate) && length_ok(candidate, c));
            if let Some(candidate) = found {
                return Violation {
                    value: Value::String(candidate.to_string()),
                    constraint: ViolatedConstraint::Pattern(source.clone()),
                };
            }
        }

        if let Some(max) = c.max_length {
            let valid = self.string_value(c, None);
            return Violation {
                value: Value::String(fit_length(&valid, max + 1, c.format.as_deref())),
                constraint: ViolatedConstraint::MaxLength(max),
            };
        }

        if let Some(min) = c.min_length.filter(|m| *m > 0) {
            let valid = self.string_value(c, None);
            return Violation {
                value: Value::String(fit_length(&valid, min - 1, c.format.as_deref())),
                constraint: ViolatedConstraint::MinLength(min),
            };
        }

        Violation {
            value: Value::Number(Number::from(12345)),
            constraint: ViolatedConstraint::Type { expected: "string" },
        }
    }
}

/// Example, then enum, then default - each only if consistent with the enum.
fn declared_value(schema: &JsonSchema) -> Option<&Value> {
    let in_enum = |v: &&Value| schema.enum_values.is_empty() || schema.enum_values.contains(v);
    schema
        .examples
        .iter()
        .find(in_enum)
        .or_else(|| schema.enum_values.first())
        .or_else(|| schema.default.as_ref().filter(in_enum))
}

fn minimal_value(schema: &JsonSchema) -> Value {
    match &schema.kind {
        SchemaKind::String(_) => Value::String(String::new()),
        SchemaKind::Integer(_) | SchemaKind::Number(_) => Value::Number(Number::from(0)),
        SchemaKind::Boolean => Value::Bool(false),
        SchemaKind::Array(_) => Value::Array(Vec::new()),
        SchemaKind::Object(_) => Value::Object(Map::new()),
        SchemaKind::Unknown => Value::Null,
    }
}

/// A string of exactly `len` characters derived from `seed`.
fn sized_string(seed: &str, len: usize, format: Option<&str>) -> String {
    let seed = if seed.is_empty() { "a" } else { seed };
    fit_length(seed, len, format)
}

/// A string of exactly `len` characters that also satisfies the declared
/// pattern. Pattern candidates are repeated to length when the seed does not
/// match; formatted strings only try the seed. `None` when nothing fits.
pub(crate) fn bounded_string(c: &StringConstraints, seed: &str, len: usize) -> Option<String> {
    let sized = sized_string(seed, len, c.format.as_deref());
    let Some(re) = c.pattern.as_deref().and_then(compile_pattern) else {
        return Some(sized);
    };
    if re.is_match(&sized) {
        return Some(sized);
    }
    if c.format.is_some() {
        return None;
    }
    PATTERN_CANDIDATES
        .iter()
        .map(|candidate| candidate.chars().cycle().take(len).collect::<String>())
        .find(|candidate| re.is_match(candidate))
}

/// Inclusive integer range honouring fractional bounds.
pub(crate) fn integer_range(c: &NumericConstraints) -> (i64, i64) {
    let lo = c.minimum.map(|m| m.ceil() as i64);
    let hi = c.maximum.map(|m| m.floor() as i64);
    match (lo, hi) {
        (Some(lo), Some(hi)) => (lo, hi.max(lo)),
        (Some(lo), None) => (lo, lo.saturating_add(100)),
        (None, Some(hi)) => (hi.saturating_sub(100), hi),
        (None, None) => (1, 100),
    }
}

fn invalid_integer(c: &NumericConstraints) -> Violation {
    let above = c.maximum.and_then(|max| {
        (max.floor() as i64)
            .checked_add(1)
            .map(|v| (v, ViolatedConstraint::Maximum(max)))
    });
    let below = || {
        c.minimum.and_then(|min| {
            (min.ceil() as i64)
                .checked_sub(1)
                .map(|v| (v, ViolatedConstraint::Minimum(min)))
        })
    };
    match above.or_else(below) {
        Some((value, constraint)) => Violation {
            value: Value::Number(Number::from(value)),
            constraint,
        },
        None => wrong_type("integer", "not-a-number"),
    }
}

fn invalid_number(c: &NumericConstraints) -> Violation {
    // past f64's integer precision `max + 1.0 == max`, which is no violation
    let out_of_range = c
        .maximum
        .and_then(|max| {
            Some(max + 1.0)
                .filter(|v| *v > max)
                .and_then(Number::from_f64)
                .map(|n| (n, ViolatedConstraint::Maximum(max)))
        })
        .or_else(|| {
            c.minimum.and_then(|min| {
                Some(min - 1.0)
                    .filter(|v| *v < min)
                    .and_then(Number::from_f64)
                    .map(|n| (n, ViolatedConstraint::Minimum(min)))
            })
        });
    match out_of_range {
        Some((value, constraint)) => Violation {
            value: Value::Number(value),
            constraint,
        },
        None => wrong_type("number", "not-a-number"),
    }
}

fn wrong_type(expected: &'static str, value: &str) -> Violation {
    Violation {
        value: Value::String(value.to_string()),
        constraint: ViolatedConstraint::Type { expected },
    }
}

/// A value of the enum's own type that is not a member.
fn outside_enum(schema: &JsonSchema) -> Option<Value> {
    match &schema.kind {
        SchemaKind::Integer(_) | SchemaKind::Number(_) => {
            let max = schema
                .enum_values
                .iter()
                .filter_map(Value::as_i64)
                .max()
                .unwrap_or(0);
            Some(Value::Number(Number::from(max.saturating_add(1))))
        }
        SchemaKind::String(_) | SchemaKind::Unknown => {
            let mut candidate = "invalid_enum_value".to_string();
            while schema.enum_values.contains(&Value::String(candidate.clone())) {
                candidate.push('_');
            }
            Some(Value::String(candidate))
        }
        _ => None,
    }
}

fn compile_pattern(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            debug!(pattern, error = %err, "ignoring unparseable pattern");
            None
        }
    }
}

fn length_ok(candidate: &str, c: &StringConstraints) -> bool {
    let len = candidate.chars().count();
    c.min_length.map_or(true, |min| len >= min) && c.max_length.map_or(true, |max| len <= max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> JsonSchema {
        JsonSchema::from_value(&value)
    }

    #[test]
    fn test_enum_member_always_returned() {
        let s = schema(json!({"type": "string", "enum": ["red", "green"]}));
        for seed in 0..20 {
            let value = DataSynthesizer::new(seed).synthesize(&s, None);
            assert_eq!(value, json!("red"));
        }
    }

    #[test]
    fn test_example_outside_enum_is_ignored() {
        let s = schema(json!({"type": "string", "enum": ["a", "b"], "example": "zzz"}));
        assert_eq!(DataSynthesizer::new(1).synthesize(&s, None), json!("a"));
    }

    #[test]
    fn test_precedence_caller_example_then_schema_example_then_default() {
        let s = schema(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "example": "schema-example"},
                "role": {"type": "string", "default": "member"},
                "nick": {"type": "string", "example": "n"}
            }
        }));
        let mut examples = Map::new();
        examples.insert("name".into(), json!("caller-example"));

        let value = DataSynthesizer::new(3).synthesize(&s, Some(&examples));
        assert_eq!(value["name"], json!("caller-example"));
        assert_eq!(value["role"], json!("member"));
        assert_eq!(value["nick"], json!("n"));
    }

    #[test]
    fn test_integer_within_bounds() {
        let s = schema(json!({"type": "integer", "minimum": 18, "maximum": 21}));
        let mut synth = DataSynthesizer::new(9);
        for _ in 0..50 {
            let v = synth.synthesize(&s, None).as_i64().unwrap();
            assert!((18..=21).contains(&v), "{} out of range", v);
        }
    }

    #[test]
    fn test_number_within_bounds() {
        let s = schema(json!({"type": "number", "minimum": 0.5, "maximum": 0.75}));
        let mut synth = DataSynthesizer::new(9);
        for _ in 0..50 {
            let v = synth.synthesize(&s, None).as_f64().unwrap();
            assert!((0.5..=0.75).contains(&v), "{} out of range", v);
        }
    }

    #[test]
    fn test_string_lengths_respected() {
        let s = schema(json!({"type": "string", "minLength": 20, "maxLength": 25}));
        let v = DataSynthesizer::new(2).synthesize(&s, None);
        let len = v.as_str().unwrap().len();
        assert!((20..=25).contains(&len));
    }

    #[test]
    fn test_email_format_and_name_hint() {
        let s = schema(json!({"type": "object", "properties": {
            "contact": {"type": "string", "format": "email"},
            "workEmail": {"type": "string"}
        }}));
        let v = DataSynthesizer::new(5).synthesize(&s, None);
        assert!(v["contact"].as_str().unwrap().contains('@'));
        assert!(v["workEmail"].as_str().unwrap().contains('@'));
    }

    #[test]
    fn test_pattern_satisfied() {
        let s = schema(json!({"type": "string", "pattern": "^[A-Z]{3}-[0-9]{3}$"}));
        let v = DataSynthesizer::new(5).synthesize(&s, None);
        assert_eq!(v, json!("ABC-123"));
    }

    #[test]
    fn test_object_includes_required_without_properties() {
        let s = schema(json!({"type": "object", "required": ["token"]}));
        let v = DataSynthesizer::new(5).synthesize(&s, None);
        assert_eq!(v, json!({"token": "sample"}));
    }

    #[test]
    fn test_empty_object_and_untyped_fallbacks() {
        let mut synth = DataSynthesizer::new(5);
        assert_eq!(synth.synthesize(&schema(json!({"type": "object"})), None), json!({}));
        assert_eq!(synth.synthesize(&schema(json!({})), None), Value::Null);
    }

    #[test]
    fn test_array_single_item() {
        let s = schema(json!({"type": "array", "items": {"type": "string", "enum": ["x"]}}));
        assert_eq!(DataSynthesizer::new(5).synthesize(&s, None), json!(["x"]));
    }

    #[test]
    fn test_same_seed_same_values() {
        let s = schema(json!({"type": "object", "properties": {
            "a": {"type": "string"}, "b": {"type": "integer"}, "c": {"type": "string", "format": "uuid"}
        }}));
        let first = DataSynthesizer::new(11).synthesize(&s, None);
        let second = DataSynthesizer::new(11).synthesize(&s, None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_format() {
        let s = schema(json!({"type": "string", "format": "email"}));
        let violation = DataSynthesizer::new(1).synthesize_invalid(&s).unwrap();
        assert_eq!(violation.constraint, ViolatedConstraint::Format("email".into()));
        assert!(!violation.value.as_str().unwrap().contains('@'));
    }

    #[test]
    fn test_invalid_max_length_is_one_over() {
        let s = schema(json!({"type": "string", "maxLength": 8}));
        let violation = DataSynthesizer::new(1).synthesize_invalid(&s).unwrap();
        assert_eq!(violation.constraint, ViolatedConstraint::MaxLength(8));
        assert_eq!(violation.value.as_str().unwrap().len(), 9);
    }

    #[test]
    fn test_invalid_pattern_respects_lengths() {
        let s = schema(json!({"type": "string", "pattern": "^[a-z]+$", "minLength": 1, "maxLength": 5}));
        let violation = DataSynthesizer::new(1).synthesize_invalid(&s).unwrap();
        assert!(matches!(violation.constraint, ViolatedConstraint::Pattern(_)));
        assert_eq!(violation.value, json!("#"));
    }

    #[test]
    fn test_invalid_integer_bounds() {
        let s = schema(json!({"type": "integer", "minimum": 1, "maximum": 10}));
        let violation = DataSynthesizer::new(1).synthesize_invalid(&s).unwrap();
        assert_eq!(violation.value, json!(11));

        let s = schema(json!({"type": "integer", "minimum": 1}));
        assert_eq!(DataSynthesizer::new(1).synthesize_invalid(&s).unwrap().value, json!(0));
    }

    #[test]
    fn test_invalid_wrong_type_and_enum() {
        let mut synth = DataSynthesizer::new(1);
        let violation = synth.synthesize_invalid(&schema(json!({"type": "boolean"}))).unwrap();
        assert_eq!(violation.constraint, ViolatedConstraint::Type { expected: "boolean" });

        let violation = synth
            .synthesize_invalid(&schema(json!({"type": "string", "enum": ["a"]})))
            .unwrap();
        assert_eq!(violation.constraint, ViolatedConstraint::Enum);
        assert_eq!(violation.value, json!("invalid_enum_value"));
    }

    #[test]
    fn test_extreme_integer_bounds_do_not_overflow() {
        let mut synth = DataSynthesizer::new(1);
        let s = schema(json!({
            "type": "integer", "format": "int64", "minimum": 1, "maximum": i64::MAX
        }));
        let violation = synth.synthesize_invalid(&s).unwrap();
        assert_eq!(violation.constraint, ViolatedConstraint::Minimum(1.0));
        assert_eq!(violation.value, json!(0));
        assert!(synth.synthesize(&s, None).as_i64().unwrap() >= 1);

        let s = schema(json!({
            "type": "integer", "minimum": i64::MIN, "maximum": i64::MAX
        }));
        let violation = synth.synthesize_invalid(&s).unwrap();
        assert_eq!(violation.constraint, ViolatedConstraint::Type { expected: "integer" });
        assert!(synth.synthesize(&s, None).is_i64());
    }

    #[test]
    fn test_huge_number_range_stays_finite() {
        let mut synth = DataSynthesizer::new(1);
        let s = schema(json!({"type": "number", "minimum": -1.7e308, "maximum": 1.7e308}));
        let v = synth.synthesize(&s, None).as_f64().unwrap();
        assert!((-1.7e308..=1.7e308).contains(&v));

        let s = schema(json!({"type": "number", "maximum": 1e300}));
        let violation = synth.synthesize_invalid(&s).unwrap();
        assert_eq!(violation.constraint, ViolatedConstraint::Type { expected: "number" });
    }

    #[test]
    fn test_format_violation_skipped_when_length_cannot_fit() {
        let s = schema(json!({"type": "string", "format": "email", "maxLength": 0}));
        let violation = DataSynthesizer::new(1).synthesize_invalid(&s).unwrap();
        assert_eq!(violation.constraint, ViolatedConstraint::MaxLength(0));
        assert_eq!(violation.value.as_str().unwrap().chars().count(), 1);
    }

    #[test]
    fn test_bounded_string_honours_pattern() {
        let c = StringConstraints {
            pattern: Some("^[A-Z]+$".into()),
            max_length: Some(6),
            ..StringConstraints::default()
        };
        assert_eq!(bounded_string(&c, "ABC", 6), Some("ABCABC".to_string()));
        assert_eq!(bounded_string(&c, "abc", 1), Some("A".to_string()));

        let digits = StringConstraints {
            pattern: Some("^[0-9]{3}$".into()),
            ..StringConstraints::default()
        };
        assert_eq!(bounded_string(&digits, "", 4), None);
        assert_eq!(bounded_string(&StringConstraints::default(), "ab", 4), Some("abaa".to_string()));
    }

    #[test]
    fn test_invalid_unconstrained_is_none() {
        assert!(DataSynthesizer::new(1).synthesize_invalid(&schema(json!({}))).is_none());
    }
}
