//! Semi-structured values shared by every configuration source.
//!
//! All decoded input (YAML, TOML, JSON, CLI overrides, environment, system
//! facts) is converted into [`Node`] before it reaches the merge engine, so
//! merging only ever has to deal with a closed set of variants.

use serde_yaml::Value as YamlValue;

/// A scalar, mapping or sequence value.
pub type Node = serde_json::Value;

/// A string-keyed mapping of [`Node`]s.
pub type Mapping = serde_json::Map<String, Node>;

/// Converts a decoded YAML value into a [`Node`].
///
/// Mapping keys that are not strings are stringified, tags are dropped in
/// favour of the tagged value, and numbers keep their integer-ness when they
/// have one.
pub fn from_yaml(value: YamlValue) -> Node {
    match value {
        YamlValue::Null => Node::Null,
        YamlValue::Bool(b) => Node::Bool(b),
        YamlValue::Number(n) => yaml_number(&n),
        YamlValue::String(s) => Node::String(s),
        YamlValue::Sequence(items) => Node::Array(items.into_iter().map(from_yaml).collect()),
        YamlValue::Mapping(map) => {
            let mut mapping = Mapping::with_capacity(map.len());
            for (key, value) in map {
                mapping.insert(yaml_key(key), from_yaml(value));
            }
            Node::Object(mapping)
        }
        YamlValue::Tagged(tagged) => from_yaml(tagged.value),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Node {
    if let Some(i) = n.as_i64() {
        Node::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Node::Number(u.into())
    } else {
        n.as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Node::Number)
            .unwrap_or(Node::Null)
    }
}

fn yaml_key(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Null => "null".to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Tagged(tagged) => yaml_key(tagged.value),
        complex => serde_yaml::to_string(&complex)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Converts a decoded TOML value into a [`Node`].
///
/// Datetimes become their RFC 3339 string form.
pub fn from_toml(value: toml::Value) -> Node {
    match value {
        toml::Value::String(s) => Node::String(s),
        toml::Value::Integer(i) => Node::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Node::Number)
            .unwrap_or(Node::Null),
        toml::Value::Boolean(b) => Node::Bool(b),
        toml::Value::Datetime(dt) => Node::String(dt.to_string()),
        toml::Value::Array(items) => Node::Array(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Node::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, from_toml(value)))
                .collect(),
        ),
    }
}

/// Renders a scalar as the string a process argument or environment value
/// would carry. Returns `None` for mappings and sequences.
pub fn scalar_to_string(node: &Node) -> Option<String> {
    match node {
        Node::Null => Some(String::new()),
        Node::Bool(b) => Some(b.to_string()),
        Node::Number(n) => Some(n.to_string()),
        Node::String(s) => Some(s.clone()),
        Node::Array(_) | Node::Object(_) => None,
    }
}

/// Wraps `value` in a single-key mapping.
pub fn nested(key: &str, value: impl Into<Node>) -> Mapping {
    let mut mapping = Mapping::new();
    mapping.insert(key.to_string(), value.into());
    mapping
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_yaml_conversion() {
        let yaml: YamlValue = serde_yaml::from_str(
            "name: web\nport: 8080\nratio: 0.5\nenabled: true\nnothing: ~\ntags: [a, b]\n",
        )
        .unwrap();
        assert_eq!(
            from_yaml(yaml),
            json!({
                "name": "web",
                "port": 8080,
                "ratio": 0.5,
                "enabled": true,
                "nothing": null,
                "tags": ["a", "b"],
            })
        );
    }

    #[test]
    fn test_yaml_non_string_keys() {
        let yaml: YamlValue = serde_yaml::from_str("1: one\ntrue: yes\nnested:\n  2: two\n").unwrap();
        assert_eq!(
            from_yaml(yaml),
            json!({"1": "one", "true": "yes", "nested": {"2": "two"}})
        );
    }

    #[test]
    fn test_yaml_tags_are_dropped() {
        let yaml: YamlValue = serde_yaml::from_str("value: !custom hello\n").unwrap();
        assert_eq!(from_yaml(yaml), json!({"value": "hello"}));
    }

    #[test]
    fn test_toml_conversion() {
        let value: toml::Value = toml::from_str(
            "name = \"db\"\nport = 5432\nwhen = 1979-05-27T07:32:00Z\n[pool]\nsizes = [1, 2]\n",
        )
        .unwrap();
        assert_eq!(
            from_toml(value),
            json!({
                "name": "db",
                "port": 5432,
                "when": "1979-05-27T07:32:00Z",
                "pool": {"sizes": [1, 2]},
            })
        );
    }

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(scalar_to_string(&json!("x")).as_deref(), Some("x"));
        assert_eq!(scalar_to_string(&json!(80)).as_deref(), Some("80"));
        assert_eq!(scalar_to_string(&json!(false)).as_deref(), Some("false"));
        assert_eq!(scalar_to_string(&json!(null)).as_deref(), Some(""));
        assert_eq!(scalar_to_string(&json!([1])), None);
        assert_eq!(scalar_to_string(&json!({"a": 1})), None);
    }
}
