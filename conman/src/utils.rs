//! Process launch helpers.
//!
//! [`Command`] wraps `std::process::Command` for the one thing an entrypoint
//! does with it: replace the current process with the target program, running
//! in exactly the environment that was computed for it.

use std::{
    ffi::OsStr,
    ops::{Deref, DerefMut},
    os::unix::process::CommandExt,
    path::{Path, PathBuf},
};

use crate::environ::Environ;

/// A command that runs in a fully specified environment.
pub struct Command {
    inner: std::process::Command,
    program: PathBuf,
}

impl Deref for Command {
    type Target = std::process::Command;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for Command {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl Command {
    /// Creates a command for `program` with `environ` as its whole
    /// environment.
    ///
    /// `program` is passed through unchanged and becomes the target's
    /// `argv[0]`. A name without a `/` is searched on the `PATH` of
    /// `environ` when the command is exec'd.
    pub fn new<S>(program: S, environ: &Environ) -> Command
    where
        S: AsRef<OsStr>,
    {
        let program = PathBuf::from(program.as_ref());
        let mut cmd = std::process::Command::new(&program);
        cmd.env_clear();
        cmd.envs(environ.iter());

        Self {
            inner: cmd,
            program,
        }
    }

    /// The program that will be run.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Returns the command line as a single string.
    pub fn cmd_line(&self) -> String {
        let mut cmd_str = self.program.to_string_lossy().to_string();

        for arg in self.get_args() {
            cmd_str += " ";
            cmd_str += arg.to_string_lossy().as_ref();
        }

        cmd_str
    }

    /// Logs the command line at debug level.
    pub fn print_cmd(&self) {
        debug!("exec: {}", self.cmd_line());
    }

    /// Replaces the current process with the command.
    ///
    /// Only returns if the exec failed.
    pub fn exec(&mut self) -> std::io::Error {
        self.print_cmd();
        CommandExt::exec(&mut self.inner)
    }
}
