//! Typed JSON Schema.
//!
//! Schemas are parsed once into a tagged union over `type`, each variant
//! carrying only the constraints that apply to it.

use serde_json::{Map, Value};

/// A parsed JSON Schema node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JsonSchema {
    pub kind: SchemaKind,
    /// Allowed values; empty when the schema declares no `enum`.
    pub enum_values: Vec<Value>,
    /// `example` followed by the members of `examples`.
    pub examples: Vec<Value>,
    pub default: Option<Value>,
    pub nullable: bool,
}

/// The `type` of a schema and its type-specific constraints.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SchemaKind {
    String(StringConstraints),
    Integer(NumericConstraints),
    Number(NumericConstraints),
    Boolean,
    Array(ArrayConstraints),
    Object(ObjectShape),
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringConstraints {
    pub format: Option<String>,
    pub pattern: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumericConstraints {
    pub format: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArrayConstraints {
    pub items: Option<Box<JsonSchema>>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    /// Properties in document order.
    pub properties: Vec<(String, JsonSchema)>,
    pub required: Vec<String>,
}

impl ObjectShape {
    pub fn property(&self, name: &str) -> Option<&JsonSchema> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    fn merge(&mut self, other: ObjectShape) {
        for (name, schema) in other.properties {
            if self.property(&name).is_none() {
                self.properties.push((name, schema));
            }
        }
        for name in other.required {
            if !self.is_required(&name) {
                self.required.push(name);
            }
        }
    }
}

impl JsonSchema {
    pub fn of_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Parse a dereferenced schema object. Anything that is not a JSON
    /// object parses as an unconstrained `Unknown` schema.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let (type_name, mut nullable) = declared_type(obj);
        nullable |= obj.get("nullable").and_then(Value::as_bool).unwrap_or(false);

        let enum_values: Vec<Value> = obj
            .get("enum")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter(|v| !v.is_null()).cloned().collect())
            .unwrap_or_default();

        let mut examples = Vec::new();
        if let Some(example) = obj.get("example") {
            examples.push(example.clone());
        }
        if let Some(list) = obj.get("examples").and_then(Value::as_array) {
            examples.extend(list.iter().cloned());
        }

        let type_name = type_name.or_else(|| infer_type(obj, &enum_values));
        let kind = match type_name.as_deref() {
            Some("string") => SchemaKind::String(StringConstraints {
                format: str_field(obj, "format"),
                pattern: str_field(obj, "pattern"),
                min_length: usize_field(obj, "minLength"),
                max_length: usize_field(obj, "maxLength"),
            }),
            Some("integer") => SchemaKind::Integer(numeric_constraints(obj)),
            Some("number") => SchemaKind::Number(numeric_constraints(obj)),
            Some("boolean") => SchemaKind::Boolean,
            Some("array") => SchemaKind::Array(ArrayConstraints {
                items: obj
                    .get("items")
                    .map(|items| Box::new(JsonSchema::from_value(items))),
                min_items: usize_field(obj, "minItems"),
                max_items: usize_field(obj, "maxItems"),
            }),
            Some("object") => SchemaKind::Object(object_shape(obj)),
            _ => SchemaKind::Unknown,
        };

        let mut schema = Self {
            kind,
            enum_values,
            examples,
            default: obj.get("default").cloned(),
            nullable,
        };

        if let Some(parts) = obj.get("allOf").and_then(Value::as_array) {
            for part in parts {
                schema.absorb(JsonSchema::from_value(part));
            }
        }

        schema
    }

    /// Merge an `allOf` member into this schema.
    fn absorb(&mut self, other: JsonSchema) {
        if self.kind == SchemaKind::Unknown {
            self.kind = other.kind;
        } else if let (SchemaKind::Object(shape), SchemaKind::Object(other_shape)) =
            (&mut self.kind, other.kind)
        {
            shape.merge(other_shape);
        }
        if self.enum_values.is_empty() {
            self.enum_values = other.enum_values;
        }
        if self.default.is_none() {
            self.default = other.default;
        }
        self.examples.extend(other.examples);
        self.nullable |= other.nullable;
    }

    /// The declared JSON type name, for messages.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            SchemaKind::String(_) => "string",
            SchemaKind::Integer(_) => "integer",
            SchemaKind::Number(_) => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array(_) => "array",
            SchemaKind::Object(_) => "object",
            SchemaKind::Unknown => "unknown",
        }
    }

    pub fn as_object(&self) -> Option<&ObjectShape> {
        match &self.kind {
            SchemaKind::Object(shape) => Some(shape),
            _ => None,
        }
    }

    /// Whether this schema has an explicit length or numeric bound.
    pub fn has_bounds(&self) -> bool {
        match &self.kind {
            SchemaKind::String(c) => c.min_length.is_some() || c.max_length.is_some(),
            SchemaKind::Integer(c) | SchemaKind::Number(c) => {
                c.minimum.is_some() || c.maximum.is_some()
            }
            _ => false,
        }
    }
}

fn declared_type(obj: &Map<String, Value>) -> (Option<String>, bool) {
    match obj.get("type") {
        Some(Value::String(t)) => (Some(t.clone()), t == "null"),
        Some(Value::Array(types)) => {
            let names: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
            let nullable = names.contains(&"null");
            let first = names.into_iter().find(|t| *t != "null").map(str::to_string);
            (first, nullable)
        }
        _ => (None, false),
    }
}

fn infer_type(obj: &Map<String, Value>, enum_values: &[Value]) -> Option<String> {
    if obj.contains_key("properties") {
        return Some("object".to_string());
    }
    if obj.contains_key("items") {
        return Some("array".to_string());
    }
    if obj.contains_key("allOf") {
        return None;
    }
    let inferred = match enum_values.first()? {
        Value::String(_) => "string",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        _ => return None,
    };
    Some(inferred.to_string())
}

fn object_shape(obj: &Map<String, Value>) -> ObjectShape {
    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, schema)| (name.clone(), JsonSchema::from_value(schema)))
                .collect()
        })
        .unwrap_or_default();
    let required = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    ObjectShape {
        properties,
        required,
    }
}

fn numeric_constraints(obj: &Map<String, Value>) -> NumericConstraints {
    NumericConstraints {
        format: str_field(obj, "format"),
        minimum: obj.get("minimum").and_then(Value::as_f64),
        maximum: obj.get("maximum").and_then(Value::as_f64),
    }
}

fn str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn usize_field(obj: &Map<String, Value>, key: &str) -> Option<usize> {
    obj.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_object_with_constraints() {
        let schema = JsonSchema::from_value(&json!({
            "type": "object",
            "required": ["email"],
            "properties": {
                "email": {"type": "string", "format": "email", "maxLength": 64},
                "age": {"type": "integer", "minimum": 18, "maximum": 99}
            }
        }));

        let shape = schema.as_object().unwrap();
        assert_eq!(shape.required, vec!["email"]);
        assert_eq!(shape.properties[0].0, "email");
        assert_eq!(
            shape.property("email").unwrap().kind,
            SchemaKind::String(StringConstraints {
                format: Some("email".into()),
                pattern: None,
                min_length: None,
                max_length: Some(64),
            })
        );
        match &shape.property("age").unwrap().kind {
            SchemaKind::Integer(c) => {
                assert_eq!(c.minimum, Some(18.0));
                assert_eq!(c.maximum, Some(99.0));
            }
            other => panic!("expected integer, got {:?}", other),
        }
    }

    #[test]
    fn test_type_array_with_null() {
        let schema = JsonSchema::from_value(&json!({"type": ["null", "string"]}));
        assert_eq!(schema.type_name(), "string");
        assert!(schema.nullable);
    }

    #[test]
    fn test_infer_kind_without_type() {
        assert_eq!(
            JsonSchema::from_value(&json!({"properties": {"a": {}}})).type_name(),
            "object"
        );
        assert_eq!(JsonSchema::from_value(&json!({"items": {}})).type_name(), "array");
        assert_eq!(
            JsonSchema::from_value(&json!({"enum": [1, 2]})).type_name(),
            "integer"
        );
        assert_eq!(JsonSchema::from_value(&json!({})).type_name(), "unknown");
    }

    #[test]
    fn test_all_of_merges_objects() {
        let schema = JsonSchema::from_value(&json!({
            "allOf": [
                {"type": "object", "required": ["id"], "properties": {"id": {"type": "integer"}}},
                {"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}}
            ]
        }));
        let shape = schema.as_object().unwrap();
        assert_eq!(shape.required, vec!["id", "name"]);
        assert_eq!(shape.properties.len(), 2);
    }

    #[test]
    fn test_examples_collected_in_order() {
        let schema = JsonSchema::from_value(&json!({
            "type": "string", "example": "a", "examples": ["b", "c"], "default": "d"
        }));
        assert_eq!(schema.examples, vec![json!("a"), json!("b"), json!("c")]);
        assert_eq!(schema.default, Some(json!("d")));
    }

    #[test]
    fn test_enum_values_drop_null() {
        let schema = JsonSchema::from_value(&json!({"enum": ["a", null, "b"], "nullable": true}));
        assert_eq!(schema.enum_values, vec![json!("a"), json!("b")]);
        assert_eq!(schema.type_name(), "string");
        assert!(schema.nullable);
    }

    #[test]
    fn test_has_bounds() {
        assert!(JsonSchema::from_value(&json!({"type": "string", "minLength": 1})).has_bounds());
        assert!(JsonSchema::from_value(&json!({"type": "number", "maximum": 5})).has_bounds());
        assert!(!JsonSchema::from_value(&json!({"type": "string", "format": "email"})).has_bounds());
    }
}
