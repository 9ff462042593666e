//! Command line arguments.
//!
//! Long options are also accepted with a single dash (`-config`, `-var`,
//! `-json`); [`normalize_args`] rewrites them before parsing.

use std::{ffi::OsString, path::PathBuf};

use clap::Parser;

use crate::{
    config::DEFAULT_CONFIG_FILE,
    context::{self, Overrides},
    merge::MergeError,
    node::Mapping,
};

/// Render configuration templates and exec the container process.
#[derive(Parser, Debug, Clone)]
#[command(name = "conman")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Load configuration from this file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Add a value to the context, formatted as `name=value`
    #[arg(short, long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Merge a JSON object into the context
    #[arg(short, long, value_name = "OBJECT", value_parser = context::parse_json_object)]
    pub json: Vec<Mapping>,
}

impl Cli {
    /// Folds the `--var` and `--json` arguments, in order, into [`Overrides`].
    ///
    /// # Errors
    ///
    /// Fails only if a JSON object nests too deeply to be merged.
    pub fn overrides(&self) -> Result<Overrides, MergeError> {
        let mut overrides = Overrides::new();
        for (name, value) in &self.vars {
            overrides.add_var(name, value)?;
        }
        for document in &self.json {
            overrides.add_json(document.clone())?;
        }
        Ok(overrides)
    }
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    Ok(context::parse_var(raw))
}

const SINGLE_DASH_LONG: &[&str] = &["config", "var", "json"];

/// Rewrites `-config`, `-var` and `-json` (with or without `=value`) to
/// their double-dash form. Everything after a bare `--` is left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    for arg in args.into_iter().map(Into::into) {
        if passthrough {
            out.push(arg);
            continue;
        }
        let rewritten = arg.to_str().and_then(|s| {
            let flag = s.strip_prefix('-').filter(|rest| !rest.starts_with('-'))?;
            let name = flag.split_once('=').map_or(flag, |(name, _)| name);
            SINGLE_DASH_LONG
                .contains(&name)
                .then(|| OsString::from(format!("-{s}")))
        });
        if arg == "--" {
            passthrough = true;
        }
        out.push(rewritten.unwrap_or(arg));
    }
    out
}
