//! Helper filters available to every template.
//!
//! The registry is built once, up front, and handed to
//! [`Renderer::new`](super::Renderer::new); it is never modified afterwards.
//! Case conversion, `replace`, `split`, `join` and `trim` come with the
//! template engine and are not registered here.

use std::collections::HashMap;

use tera::{Tera, Value};
use url::Url;

/// Signature of a template filter.
pub type FilterFn = fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>;

/// An immutable set of named template filters.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    filters: Vec<(&'static str, FilterFn)>,
}

impl FunctionRegistry {
    /// A registry with no extra filters.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The address, URL and JSON helpers.
    pub fn builtin() -> Self {
        Self::empty()
            .with_filter("addr_host", addr_host)
            .with_filter("addr_port", addr_port)
            .with_filter("url_scheme", url_scheme)
            .with_filter("url_username", url_username)
            .with_filter("url_password", url_password)
            .with_filter("url_host", url_host)
            .with_filter("url_path", url_path)
            .with_filter("url_raw_query", url_raw_query)
            .with_filter("url_query", url_query)
            .with_filter("url_fragment", url_fragment)
            .with_filter("json", json)
    }

    /// Adds a filter. A later filter with the same name replaces the earlier.
    pub fn with_filter(mut self, name: &'static str, filter: FilterFn) -> Self {
        self.filters.retain(|(n, _)| *n != name);
        self.filters.push((name, filter));
        self
    }

    /// Names of the registered filters.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.filters.iter().map(|(name, _)| *name)
    }

    pub(super) fn install(&self, tera: &mut Tera) {
        for (name, filter) in &self.filters {
            tera.register_filter(name, *filter);
        }
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

fn input<'a>(value: &'a Value, filter: &str) -> tera::Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| tera::Error::msg(format!("filter `{filter}` expects a string input")))
}

/// `host:port` -> `host`.
fn addr_host(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let addr = input(value, "addr_host")?;
    let host = addr.split_once(':').map_or(addr, |(host, _)| host);
    Ok(Value::String(host.to_string()))
}

/// `host:port` -> `port`, or an empty string without a port.
fn addr_port(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let addr = input(value, "addr_port")?;
    let port = addr.split_once(':').map_or("", |(_, port)| port);
    Ok(Value::String(port.to_string()))
}

/// Applies `part` to the parsed URL; unparseable input yields an empty string.
fn url_part(value: &Value, filter: &str, part: impl FnOnce(&Url) -> String) -> tera::Result<Value> {
    let raw = input(value, filter)?;
    let out = Url::parse(raw).map(|url| part(&url)).unwrap_or_default();
    Ok(Value::String(out))
}

fn url_scheme(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    url_part(value, "url_scheme", |url| url.scheme().to_string())
}

fn url_username(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    url_part(value, "url_username", |url| url.username().to_string())
}

fn url_password(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    url_part(value, "url_password", |url| {
        url.password().unwrap_or_default().to_string()
    })
}

/// Host including the port, when one is given explicitly.
fn url_host(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    url_part(value, "url_host", |url| {
        let host = url.host_str().unwrap_or_default();
        match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    })
}

fn url_path(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    url_part(value, "url_path", |url| url.path().to_string())
}

fn url_raw_query(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    url_part(value, "url_raw_query", |url| {
        url.query().unwrap_or_default().to_string()
    })
}

fn url_fragment(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    url_part(value, "url_fragment", |url| {
        url.fragment().unwrap_or_default().to_string()
    })
}

/// First value of the query parameter given as `name`.
fn url_query(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let name = args
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg("filter `url_query` expects a `name` argument"))?;
    url_part(value, "url_query", |url| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default()
    })
}

/// Parses the input as JSON and indexes it by the optional `path` argument,
/// a list of object keys and array positions.
fn json(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = input(value, "json")?;
    let mut current: Value = serde_json::from_str(raw)
        .map_err(|e| tera::Error::chain("filter `json` could not parse its input", e))?;

    let path = match args.get("path") {
        None => return Ok(current),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    };

    for index in path {
        current = match (current, &index) {
            (Value::Object(mut map), Value::String(key)) => map.remove(key).unwrap_or(Value::Null),
            (Value::Array(mut items), Value::Number(n)) => {
                let position = n
                    .as_u64()
                    .and_then(|i| usize::try_from(i).ok())
                    .filter(|i| *i < items.len())
                    .ok_or_else(|| tera::Error::msg(format!("index out of range: {n}")))?;
                items.swap_remove(position)
            }
            (Value::Array(_), other) => {
                return Err(tera::Error::msg(format!(
                    "cannot index an array with `{other}`"
                )));
            }
            (Value::Object(_), other) => {
                return Err(tera::Error::msg(format!(
                    "cannot index an object with `{other}`"
                )));
            }
            (Value::Null, _) => return Err(tera::Error::msg("index of null value")),
            (scalar, _) => {
                return Err(tera::Error::msg(format!("can't index item `{scalar}`")));
            }
        };
    }
    Ok(current)
}
