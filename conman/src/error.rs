//! Top-level error type of an entrypoint run.

use std::path::PathBuf;

use thiserror::Error;

use crate::{config::ConfigError, merge::MergeError, system::SystemError, template::TemplateError};

/// Any failure that ends a run.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(ConfigError),

    /// There is no program to run, either because `exec` is empty or because
    /// its first entry rendered to an empty string.
    #[error("no exec args")]
    MissingExec,

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to gather system facts")]
    System(#[from] SystemError),

    #[error(transparent)]
    MergeDepth(#[from] MergeError),

    #[error("failed to exec '{program}'")]
    Exec {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingExec => Error::MissingExec,
            other => Error::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_exec_is_lifted() {
        let err: Error = ConfigError::MissingExec.into();
        assert!(matches!(err, Error::MissingExec));
        assert_eq!(err.to_string(), "no exec args");
    }

    #[test]
    fn test_config_error_is_transparent() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = ConfigError::Read {
            path: PathBuf::from("/etc/conman.yml"),
            source,
        }
        .into();
        assert_eq!(err.to_string(), "failed to read config file '/etc/conman.yml'");
    }
}
