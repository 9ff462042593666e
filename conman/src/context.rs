//! Template rendering context and command-line override accumulators.
//!
//! The [`Context`] is the single merged mapping every template is rendered
//! against. It only changes through [`Context::update`], which deep-merges
//! an overlay with [`ArrayPolicy::Replace`].

use crate::{
    merge::{self, ArrayPolicy, MergeError},
    node::{Mapping, Node},
};

/// The accumulated template context.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context(Mapping);

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `values` into the context, preferring `values` on conflicts.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::DepthExceeded`] if the trees nest too deeply.
    pub fn update(&mut self, values: Mapping) -> Result<(), MergeError> {
        merge::merge(&mut self.0, values, ArrayPolicy::Replace)
    }

    /// Returns the context as a mapping.
    pub fn as_map(&self) -> &Mapping {
        &self.0
    }

    /// Looks up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.0.get(key)
    }

    /// Consumes the context, returning the root node.
    pub fn into_node(self) -> Node {
        Node::Object(self.0)
    }
}

impl From<Context> for Mapping {
    fn from(ctx: Context) -> Self {
        ctx.0
    }
}

/// Values supplied with `-var` and `-json` on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    vars: Mapping,
    json: Mapping,
}

impl Overrides {
    /// Creates an empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flat `name`/`value` pair. A later value for the same name wins.
    pub fn add_var(&mut self, name: &str, value: &str) -> Result<(), MergeError> {
        merge::merge(
            &mut self.vars,
            crate::node::nested(name, value),
            ArrayPolicy::Replace,
        )
    }

    /// Adds a JSON object. Repeated documents are deep-merged and their
    /// sequences appended.
    pub fn add_json(&mut self, document: Mapping) -> Result<(), MergeError> {
        merge::merge(&mut self.json, document, ArrayPolicy::Append)
    }

    /// The accumulated `-var` values.
    pub fn vars(&self) -> &Mapping {
        &self.vars
    }

    /// The accumulated `-json` values.
    pub fn json(&self) -> &Mapping {
        &self.json
    }
}

/// Splits a `name=value` override on the first `=`. A missing `=` yields an
/// empty value.
pub fn parse_var(raw: &str) -> (String, String) {
    let (name, value) = raw.split_once('=').unwrap_or((raw, ""));
    (name.to_string(), value.to_string())
}

/// Parses a JSON object override.
///
/// # Errors
///
/// Fails if `raw` is not valid JSON or is not an object.
pub fn parse_json_object(raw: &str) -> Result<Mapping, String> {
    match serde_json::from_str::<Node>(raw) {
        Ok(Node::Object(map)) => Ok(map),
        Ok(other) => Err(format!("expected a JSON object, found `{other}`")),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Node) -> Mapping {
        match value {
            Node::Object(m) => m,
            other => panic!("not a mapping: {other}"),
        }
    }

    #[test]
    fn test_empty_context() {
        let ctx = Context::new();
        assert!(ctx.as_map().is_empty());
    }

    #[test]
    fn test_single_update() {
        let mut ctx = Context::new();
        ctx.update(map(json!({"a": "aye", "b": "bee"}))).unwrap();
        assert_eq!(ctx.into_node(), json!({"a": "aye", "b": "bee"}));
    }

    #[test]
    fn test_overwrite() {
        let mut ctx = Context::new();
        ctx.update(map(json!({"a": "aye", "b": "bee"}))).unwrap();
        ctx.update(map(json!({"a": "eh"}))).unwrap();
        assert_eq!(ctx.into_node(), json!({"a": "eh", "b": "bee"}));
    }

    #[test]
    fn test_sequences_are_replaced() {
        let mut ctx = Context::new();
        ctx.update(map(json!({"a": ["aye", "eh"], "b": "bee", "c": "see"})))
            .unwrap();
        ctx.update(map(json!({"a": ["ah"], "c": ["see", "sea"]}))).unwrap();
        assert_eq!(
            ctx.into_node(),
            json!({"a": ["ah"], "b": "bee", "c": ["see", "sea"]})
        );
    }

    #[test]
    fn test_vars_accumulate() {
        let mut overrides = Overrides::new();
        overrides.add_var("a", "aye").unwrap();
        overrides.add_var("b", "bee").unwrap();
        overrides.add_var("a", "eh").unwrap();
        assert_eq!(Node::Object(overrides.vars().clone()), json!({"a": "eh", "b": "bee"}));
    }

    #[test]
    fn test_json_accumulates() {
        let mut overrides = Overrides::new();
        overrides.add_json(map(json!({"a": "aye"}))).unwrap();
        overrides.add_json(map(json!({"b": "bee"}))).unwrap();
        assert_eq!(Node::Object(overrides.json().clone()), json!({"a": "aye", "b": "bee"}));
    }

    #[test]
    fn test_json_appends_sequences() {
        let mut overrides = Overrides::new();
        overrides
            .add_json(map(json!({"hosts": ["a"], "db": {"port": 1}})))
            .unwrap();
        overrides
            .add_json(map(json!({"hosts": ["b"], "db": {"name": "x"}})))
            .unwrap();
        assert_eq!(
            Node::Object(overrides.json().clone()),
            json!({"hosts": ["a", "b"], "db": {"port": 1, "name": "x"}})
        );
    }

    #[test]
    fn test_parse_var() {
        assert_eq!(parse_var("a=aye"), ("a".to_string(), "aye".to_string()));
        assert_eq!(parse_var("a"), ("a".to_string(), String::new()));
        assert_eq!(parse_var("a=b=c"), ("a".to_string(), "b=c".to_string()));
    }

    #[test]
    fn test_parse_json_object() {
        let map = parse_json_object(r#"{"a":"aye","b":"bee"}"#).unwrap();
        assert_eq!(Node::Object(map), json!({"a": "aye", "b": "bee"}));

        assert!(parse_json_object(r#"{a":"aye","b":"bee"}"#).is_err());
        assert!(parse_json_object("[1, 2]").is_err());
        assert!(parse_json_object("\"text\"").is_err());
    }
}
