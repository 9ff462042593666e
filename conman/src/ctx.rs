//! Application context and run orchestration.
//!
//! [`AppContext`] holds the loaded configuration and the template renderer.
//! [`AppContext::prepare`] does all the work that can fail before the target
//! program is started: it accumulates the context, renders the exec
//! arguments and writes the file templates. The resulting [`Plan`] is then
//! exec'd.

use std::path::{Path, PathBuf};

use crate::{
    accumulate::{Prepared, accumulate},
    config::Config,
    context::Overrides,
    environ::Environ,
    error::Error,
    system::SystemProvider,
    template::Renderer,
    utils::Command,
};

/// The main application context.
#[derive(Debug, Clone)]
pub struct AppContext {
    /// The configuration being run.
    pub config: Config,
    /// Renderer for every template of the run.
    pub renderer: Renderer,
}

impl AppContext {
    /// Wraps an already loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingExec`] when the configuration has no `exec`.
    pub fn new(config: Config, renderer: Renderer) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self { config, renderer })
    }

    /// Reads the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, or has no `exec`.
    pub fn load(path: impl AsRef<Path>, renderer: Renderer) -> Result<Self, Error> {
        let path = path.as_ref();
        info!("using config file {}", path.display());
        Self::new(Config::read(path)?, renderer)
    }

    /// Builds the context, renders the exec arguments and writes every file
    /// template.
    ///
    /// Templates are written in the order of their destination path.
    ///
    /// # Errors
    ///
    /// Any failure along the way is returned as is. Templates written before
    /// the failure are left in place.
    pub fn prepare<P>(
        &mut self,
        overrides: &Overrides,
        environ: Environ,
        system: &P,
    ) -> Result<Plan, Error>
    where
        P: SystemProvider + ?Sized,
    {
        let prepared = accumulate(&self.config, overrides, environ, system, &mut self.renderer)?;

        let args = self
            .config
            .exec
            .iter()
            .map(|arg| self.renderer.render_string(arg, &prepared.context))
            .collect::<Result<Vec<_>, _>>()?;
        if args.first().is_none_or(|program| program.is_empty()) {
            return Err(Error::MissingExec);
        }

        for (dest, src) in &self.config.templates {
            let dest = PathBuf::from(self.renderer.render_string(dest, &prepared.context)?);
            let src = PathBuf::from(self.renderer.render_string(src, &prepared.context)?);
            self.renderer.render_to_file(&src, &dest, &prepared.context)?;
        }

        Ok(Plan { prepared, args })
    }
}

/// Everything needed to start the target program.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Final context and environment.
    pub prepared: Prepared,
    /// Rendered exec arguments; the first one is the program.
    pub args: Vec<String>,
}

impl Plan {
    /// Builds the command for the target program.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingExec`] when there are no arguments.
    pub fn command(&self) -> Result<Command, Error> {
        let (program, args) = self.args.split_first().ok_or(Error::MissingExec)?;
        let mut cmd = Command::new(program, &self.prepared.environ);
        cmd.args(args);
        Ok(cmd)
    }

    /// Replaces the current process with the target program.
    ///
    /// Only returns on failure.
    pub fn exec(&self) -> Error {
        let mut cmd = match self.command() {
            Ok(cmd) => cmd,
            Err(e) => return e,
        };
        let source = cmd.exec();
        Error::Exec {
            program: cmd.program().to_path_buf(),
            source,
        }
    }
}
