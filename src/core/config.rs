//! Step configuration: a JSON file layered under command-line overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::flavor::LocalFlavor;
use crate::git::GitCommitTimestamp;
use crate::paths;
use crate::step::{DeviceDirs, RunBench};
use crate::utils::io;

pub const DEFAULT_CONFIGURATION: &str = "Release";

/// Raw step settings as they appear in config.json or on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StepConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub got_revision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perf_data_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_perf_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_dir: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bench_args: Vec<String>,
}

impl StepConfig {
    /// Load a config file. The file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = io::read_file(path, &format!("read {}", path.display()))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))
    }

    /// Load `path` if given, otherwise the default config file when present.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        // No HOME/APPDATA means no default file, not a failure.
        Self::load_with_default(path, paths::config_json().ok())
    }

    fn load_with_default(path: Option<&Path>, default_path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(&expand_path(&path.to_string_lossy()));
        }

        match default_path {
            Some(default_path) if default_path.exists() => {
                log_status!("config", "Using {}", default_path.display());
                Self::load(&default_path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Layer `overrides` on top of `self`, field by field.
    ///
    /// `bench_args` accumulate: file arguments first, then overrides.
    pub fn merge(self, overrides: StepConfig) -> Self {
        let mut bench_args = self.bench_args;
        bench_args.extend(overrides.bench_args);

        Self {
            builder_name: overrides.builder_name.or(self.builder_name),
            got_revision: overrides.got_revision.or(self.got_revision),
            perf_data_dir: overrides.perf_data_dir.or(self.perf_data_dir),
            resource_dir: overrides.resource_dir.or(self.resource_dir),
            device_perf_dir: overrides.device_perf_dir.or(self.device_perf_dir),
            out_dir: overrides.out_dir.or(self.out_dir),
            configuration: overrides.configuration.or(self.configuration),
            repo_dir: overrides.repo_dir.or(self.repo_dir),
            bench_args,
        }
    }

    /// Validate required fields and apply defaults.
    pub fn resolve(self) -> Result<StepSettings> {
        let mut missing = Vec::new();
        if self.builder_name.is_none() {
            missing.push("builder_name".to_string());
        }
        if self.got_revision.is_none() {
            missing.push("got_revision".to_string());
        }
        if self.resource_dir.is_none() {
            missing.push("resource_dir".to_string());
        }
        if !missing.is_empty() {
            return Err(Error::validation_missing_argument(missing)
                .with_hint("Pass the missing values as flags or set them in config.json"));
        }

        let builder_name = non_empty("builder_name", self.builder_name.unwrap_or_default())?;
        let got_revision = non_empty("got_revision", self.got_revision.unwrap_or_default())?;
        let resource_dir = self.resource_dir.unwrap_or_default();

        let perf_data_dir = self
            .perf_data_dir
            .filter(|dir| !dir.is_empty())
            .map(|dir| expand_path(&dir));
        let device_perf_dir = match self.device_perf_dir {
            Some(dir) => dir,
            None => perf_data_dir
                .as_ref()
                .map(|dir| dir.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };

        Ok(StepSettings {
            builder_name,
            got_revision,
            device_dirs: DeviceDirs::new(resource_dir, device_perf_dir),
            perf_data_dir,
            out_dir: self.out_dir.map(|dir| expand_path(&dir)),
            configuration: self
                .configuration
                .unwrap_or_else(|| DEFAULT_CONFIGURATION.to_string()),
            repo_dir: expand_path(self.repo_dir.as_deref().unwrap_or(".")),
            bench_args: self.bench_args,
        })
    }
}

/// Validated settings for one step invocation.
#[derive(Debug, Clone)]
pub struct StepSettings {
    pub builder_name: String,
    pub got_revision: String,
    pub device_dirs: DeviceDirs,
    pub perf_data_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub configuration: String,
    pub repo_dir: PathBuf,
    pub bench_args: Vec<String>,
}

impl StepSettings {
    pub fn run_bench(&self) -> RunBench {
        RunBench::new(
            self.builder_name.clone(),
            self.got_revision.clone(),
            self.device_dirs.clone(),
        )
        .perf_data_dir(self.perf_data_dir.clone())
        .bench_args(&self.bench_args)
    }

    pub fn commit_timestamps(&self) -> GitCommitTimestamp {
        GitCommitTimestamp::new(self.repo_dir.clone())
    }

    /// Host flavor for this build. Needs `out_dir`.
    pub fn local_flavor(&self) -> Result<LocalFlavor> {
        let out_dir = self
            .out_dir
            .clone()
            .ok_or_else(|| Error::validation_missing_argument(vec!["out_dir".to_string()]))?;
        Ok(LocalFlavor::new(out_dir, self.configuration.clone()))
    }
}

fn non_empty(key: &str, value: String) -> Result<String> {
    if value.trim().is_empty() {
        return Err(Error::config_invalid_value(
            key,
            Some(value),
            "must not be empty",
        ));
    }
    Ok(value)
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}
