//! Ordered assembly of the template context.
//!
//! Later sources override earlier ones:
//!
//! 1. the config `context` section
//! 2. the process environment, under `env`
//! 3. the config `context` section again
//! 4. system facts, under `sys`
//! 5. `-var` overrides
//! 6. `-json` overrides
//! 7. the config `env` entries, rendered through the context so far and
//!    loaded into the environment, after which `env` is refreshed
//!
//! Step 3 puts config values back on top of anything step 2 added with the
//! same top-level name (a config key called `env`, for instance).

use crate::{
    config::Config,
    context::{Context, Overrides},
    environ::Environ,
    error::Error,
    node::{Mapping, nested},
    system::SystemProvider,
    template::Renderer,
};

/// The result of [`accumulate`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prepared {
    /// Context every template is rendered against.
    pub context: Context,
    /// Environment of the target process.
    pub environ: Environ,
}

/// Builds the final context and environment.
///
/// `environ` holds the starting environment, normally the one of the current
/// process.
///
/// # Errors
///
/// Fails if the system facts cannot be gathered, an `env` entry does not
/// render, or any merge nests too deeply.
pub fn accumulate<P>(
    config: &Config,
    overrides: &Overrides,
    mut environ: Environ,
    system: &P,
    renderer: &mut Renderer,
) -> Result<Prepared, Error>
where
    P: SystemProvider + ?Sized,
{
    let mut context = Context::new();

    context.update(config.context.clone())?;
    debug!("context: applied config context");

    context.update(env_overlay(&environ))?;
    debug!("context: applied {} environment variables", environ.len());

    context.update(config.context.clone())?;

    let facts = system.facts()?;
    context.update(nested("sys", facts.to_mapping()))?;
    debug!("context: applied system facts for {}", facts.hostname);

    context.update(overrides.vars().clone())?;
    context.update(overrides.json().clone())?;
    debug!("context: applied command line overrides");

    let rendered = config
        .env
        .iter()
        .map(|entry| renderer.render_string(entry, &context))
        .collect::<Result<Vec<_>, _>>()?;
    environ.load(&rendered);
    context.update(env_overlay(&environ))?;
    debug!("context: rendered {} env entries", rendered.len());

    Ok(Prepared { context, environ })
}

fn env_overlay(environ: &Environ) -> Mapping {
    nested("env", environ.context())
}
