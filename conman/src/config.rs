//! Declarative configuration file.
//!
//! # Configuration File Format
//!
//! ```yaml
//! context:
//!   greeting: Hello
//! templates:
//!   /etc/app/app.conf: /usr/share/app/app.conf.tmpl
//! env:
//!   - APP_GREETING={{ greeting }}
//! exec:
//!   - /usr/bin/app
//!   - --listen={{ sys.address }}:8080
//! ```
//!
//! YAML is the default format. Files ending in `.json` or `.toml` are read
//! as JSON or TOML instead; every format is decoded into [`Node`] first and
//! shaped into [`Config`] afterwards.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Deserializer, de::Error as _};
use thiserror::Error;

use crate::node::{self, Mapping, Node};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "/etc/conman.yml";

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {format} config")]
    Parse {
        format: Format,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid config structure")]
    Shape(#[from] serde_json::Error),

    #[error("no exec args")]
    MissingExec,
}

/// Supported configuration formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
    Toml,
}

impl Format {
    /// Picks the format from the file extension, defaulting to YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()).unwrap_or("") {
            "json" => Format::Json,
            "toml" => Format::Toml,
            _ => Format::Yaml,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Format::Yaml => "YAML",
            Format::Json => "JSON",
            Format::Toml => "TOML",
        };
        f.write_str(name)
    }
}

/// The configuration of a single entrypoint run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Static template context.
    #[serde(deserialize_with = "null_as_default")]
    pub context: Mapping,
    /// Destination path template mapped to source path template.
    #[serde(deserialize_with = "null_as_default")]
    pub templates: BTreeMap<String, String>,
    /// `NAME=VALUE` templates added to the process environment.
    #[serde(deserialize_with = "string_list")]
    pub env: Vec<String>,
    /// Argument templates; the first one is the program to exec.
    #[serde(deserialize_with = "string_list")]
    pub exec: Vec<String>,
}

impl Config {
    /// Parses configuration `data` in the given format.
    ///
    /// # Errors
    ///
    /// Fails when the data is not valid for `format` or does not have the
    /// expected structure.
    pub fn load(data: &str, format: Format) -> Result<Self, ConfigError> {
        let parse_err = |source: Box<dyn std::error::Error + Send + Sync>| ConfigError::Parse {
            format,
            source,
        };
        let root = match format {
            Format::Yaml => {
                let value: serde_yaml::Value =
                    serde_yaml::from_str(data).map_err(|e| parse_err(Box::new(e)))?;
                node::from_yaml(value)
            }
            Format::Json => serde_json::from_str(data).map_err(|e| parse_err(Box::new(e)))?,
            Format::Toml => {
                let value: toml::Table = toml::from_str(data).map_err(|e| parse_err(Box::new(e)))?;
                node::from_toml(toml::Value::Table(value))
            }
        };
        Self::from_node(root)
    }

    /// Reads and parses the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(&data, Format::from_path(path))
    }

    /// Shapes a decoded document into a [`Config`]. An empty document yields
    /// the default configuration.
    pub fn from_node(root: Node) -> Result<Self, ConfigError> {
        if root.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(root)?)
    }

    /// Checks that the configuration can be run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingExec`] when `exec` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exec.is_empty() {
            return Err(ConfigError::MissingExec);
        }
        Ok(())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = Option::<Vec<Node>>::deserialize(deserializer)?.unwrap_or_default();
    items
        .iter()
        .map(|item| {
            node::scalar_to_string(item)
                .ok_or_else(|| D::Error::custom(format!("expected a string, found `{item}`")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    const YAML: &str = r#"
context:
  greeting: Hello
  ports: [80, 443]
templates:
  /etc/app.conf: /tmpl/app.conf
env:
  - GREETING={{ greeting }}
exec:
  - /bin/app
  - --port
  - 8080
"#;

    #[test]
    fn test_load_yaml() {
        let config = Config::load(YAML, Format::Yaml).unwrap();
        assert_eq!(
            Node::Object(config.context.clone()),
            json!({"greeting": "Hello", "ports": [80, 443]})
        );
        assert_eq!(config.templates["/etc/app.conf"], "/tmpl/app.conf");
        assert_eq!(config.env, vec!["GREETING={{ greeting }}"]);
        assert_eq!(config.exec, vec!["/bin/app", "--port", "8080"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_json() {
        let config = Config::load(
            r#"{"context": {"a": 1}, "exec": ["/bin/true"]}"#,
            Format::Json,
        )
        .unwrap();
        assert_eq!(Node::Object(config.context), json!({"a": 1}));
        assert!(config.templates.is_empty());
        assert!(config.env.is_empty());
        assert_eq!(config.exec, vec!["/bin/true"]);
    }

    #[test]
    fn test_load_toml() {
        let config = Config::load(
            "exec = [\"/bin/true\"]\nenv = [\"A=1\"]\n[context.db]\nport = 5432\n",
            Format::Toml,
        )
        .unwrap();
        assert_eq!(Node::Object(config.context), json!({"db": {"port": 5432}}));
        assert_eq!(config.env, vec!["A=1"]);
    }

    #[test]
    fn test_null_sections() {
        let config = Config::load("context:\ntemplates:\nenv:\nexec:\n", Format::Yaml).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_null_document() {
        let config = Config::load("~\n", Format::Yaml).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_missing_exec() {
        let config = Config::load("context: {a: 1}\n", Format::Yaml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::MissingExec)));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::load("exec: [unclosed\n", Format::Yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: Format::Yaml, .. }));
    }

    #[test]
    fn test_nested_exec_entry_rejected() {
        let err = Config::load("exec:\n  - [a, b]\n", Format::Yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Shape(_)));
    }

    #[test]
    fn test_context_must_be_mapping() {
        let err = Config::load("context: [1, 2]\n", Format::Yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Shape(_)));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("/etc/conman.yml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("conman.yaml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("conman.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("conman.toml")), Format::Toml);
        assert_eq!(Format::from_path(Path::new("conman")), Format::Yaml);
    }

    #[test]
    fn test_read_file() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        file.write_all(YAML.as_bytes()).unwrap();
        let config = Config::read(file.path()).unwrap();
        assert_eq!(config.exec[0], "/bin/app");
    }

    #[test]
    fn test_read_missing_file() {
        let err = Config::read("/nonexistent/conman.yml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
