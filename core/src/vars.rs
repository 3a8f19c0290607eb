//! `{{name}}` variable references.
//!
//! A step captures a value from its response under a variable name; later
//! steps reference it as `{{name}}` in their path, headers or body strings.

use regex_lite::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}\}").expect("valid regex"))
}

/// Render a reference to a captured variable.
pub fn var_ref(name: &str) -> String {
    format!("{{{{{}}}}}", name)
}

/// Variable names referenced in a string, in order of appearance.
pub fn referenced_vars(text: &str) -> Vec<String> {
    reference_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Variable names referenced anywhere inside a JSON value (strings only, keys excluded).
pub fn referenced_vars_in_value(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_value_refs(value, &mut out);
    out
}

fn collect_value_refs(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.extend(referenced_vars(s)),
        Value::Array(items) => items.iter().for_each(|v| collect_value_refs(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_value_refs(v, out)),
        _ => {}
    }
}

/// Replace every `{{from}}` reference in `text` with `{{to}}`.
pub fn rename_var(text: &str, from: &str, to: &str) -> String {
    reference_regex()
        .replace_all(text, |caps: &regex_lite::Captures<'_>| {
            if &caps[1] == from {
                var_ref(to)
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_var_ref_format() {
        assert_eq!(var_ref("userId"), "{{userId}}");
    }

    #[test]
    fn test_referenced_vars() {
        let refs = referenced_vars("/users/{{userId}}/posts/{{ postId }}?q={id}");
        assert_eq!(refs, vec!["userId", "postId"]);
    }

    #[test]
    fn test_referenced_vars_in_value() {
        let body = json!({"owner": "{{userId}}", "tags": ["{{tag}}", "plain"], "n": 3});
        assert_eq!(referenced_vars_in_value(&body), vec!["userId", "tag"]);
    }

    #[test]
    fn test_rename_var() {
        assert_eq!(
            rename_var("/a/{{userid}}/b/{{other}}", "userid", "userId"),
            "/a/{{userId}}/b/{{other}}"
        );
    }
}
