//! # conman
//!
//! A configuration manager for container entrypoints.
//!
//! `conman` loads a declarative configuration, builds a template context from
//! the process environment, host network facts and command line overrides,
//! renders configuration files and arguments through it, and finally replaces
//! itself with the container's main process.
//!
//! ## Modules
//!
//! - [`merge`] - Depth-bounded deep merge of semi-structured data
//! - [`context`] - The template context and command line overrides
//! - [`accumulate`] - Ordered assembly of the context
//! - [`environ`] - Environment variable table
//! - [`template`] - Template rendering and helper filters
//! - [`system`] - Host and network facts
//! - [`config`] - Configuration file loading
//! - [`ctx`] - Run orchestration
//! - [`cli`] - Command line arguments
//!
//! ## Example
//!
//! ```rust,no_run
//! use conman::{ctx::AppContext, environ::Environ, system::HostSystem, template::Renderer};
//!
//! # fn main() -> Result<(), conman::error::Error> {
//! let mut app = AppContext::load("/etc/conman.yml", Renderer::default())?;
//! let mut environ = Environ::new();
//! environ.load_process();
//! let plan = app.prepare(&Default::default(), environ, &HostSystem::default())?;
//! Err(plan.exec())
//! # }
//! ```

#![cfg(unix)]

/// Ordered assembly of the template context.
pub mod accumulate;

/// Command line arguments.
pub mod cli;

/// Configuration file loading.
///
/// Supports YAML, JSON and TOML files, selected by extension.
pub mod config;

/// Template context and command line override accumulators.
pub mod context;

/// Application context and run orchestration.
pub mod ctx;

/// Environment variable table.
pub mod environ;

/// Top-level error type.
pub mod error;

/// Depth-bounded deep merge.
pub mod merge;

/// Semi-structured value model shared by every input format.
pub mod node;

/// Host and network facts.
pub mod system;

/// Template rendering facade.
///
/// Wraps the template engine with a fixed set of helper filters.
pub mod template;

/// Process launch helpers.
pub mod utils;

#[macro_use]
extern crate log;
