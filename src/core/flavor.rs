//! Flavor runners execute an app the way the current platform requires.
//!
//! Only the local (host) flavor lives here. Device flavors implement
//! [`FlavorRunner`] elsewhere and are handed to the step the same way.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::{command, shell};

/// Outcome of a flavored command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunnerOutput {
    pub exit_code: i32,
    pub success: bool,
}

impl RunnerOutput {
    pub fn from_exit_code(exit_code: i32) -> Self {
        Self {
            exit_code,
            success: exit_code == 0,
        }
    }
}

pub trait FlavorRunner {
    /// Run `app` with `args`. Errors mean the command could not be run at all;
    /// a non-zero exit is reported through [`RunnerOutput`].
    fn run_flavored_cmd(&self, app: &str, args: &[String]) -> Result<RunnerOutput>;
}

/// Runs apps straight out of the build output directory on the host.
#[derive(Debug, Clone)]
pub struct LocalFlavor {
    out_dir: PathBuf,
    configuration: String,
}

impl LocalFlavor {
    pub fn new(out_dir: impl Into<PathBuf>, configuration: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            configuration: configuration.into(),
        }
    }

    /// `<out_dir>/<configuration>/<app>`
    pub fn app_path(&self, app: &str) -> PathBuf {
        self.out_dir.join(&self.configuration).join(app)
    }
}

impl FlavorRunner for LocalFlavor {
    fn run_flavored_cmd(&self, app: &str, args: &[String]) -> Result<RunnerOutput> {
        let program = self.app_path(app);
        ensure_exists(&program, app)?;

        log_status!(
            "flavor",
            "{}",
            shell::render_command(&program.to_string_lossy(), args)
        );

        let exit_code = command::run_passthrough(&program, args, app)?;
        if exit_code != 0 {
            log_status!("flavor", "{} exited with code {}", app, exit_code);
        }

        Ok(RunnerOutput::from_exit_code(exit_code))
    }
}

fn ensure_exists(program: &Path, app: &str) -> Result<()> {
    if program.is_file() {
        return Ok(());
    }

    let err = Error::internal_io(
        format!("Executable not found: {}", program.display()),
        Some(format!("run {}", app)),
    )
    .with_hint(format!("Build the '{}' target before running this step", app));
    Err(err)
}
