use std::path::PathBuf;

use clap::Args;

use bench_step::config::{StepConfig, StepSettings};

pub type CmdResult<T> = bench_step::Result<(T, i32)>;

/// Step settings shared by `run` and `plan`.
///
/// Flags override values from the config file. Everything after `--` is
/// passed to bench verbatim.
#[derive(Args, Default, Debug)]
pub struct StepArgs {
    /// Step config file (defaults to ~/.config/bench-step/config.json when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Builder name used to select per-device overrides
    #[arg(long)]
    pub builder_name: Option<String>,

    /// Revision being benchmarked
    #[arg(long)]
    pub got_revision: Option<String>,

    /// Host perf data directory; when set, bench writes log and JSON results
    #[arg(long, value_name = "DIR")]
    pub perf_data_dir: Option<String>,

    /// Resource directory on the device
    #[arg(long, value_name = "DIR")]
    pub resource_dir: Option<String>,

    /// Perf directory on the device (defaults to --perf-data-dir)
    #[arg(long, value_name = "DIR")]
    pub device_perf_dir: Option<String>,

    /// Build output directory containing <configuration>/bench
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<String>,

    /// Build configuration (Debug, Release, ...)
    #[arg(long)]
    pub configuration: Option<String>,

    /// Checkout used to look up the commit timestamp
    #[arg(long, value_name = "DIR")]
    pub repo_dir: Option<String>,

    /// Additional arguments for bench (after --)
    #[arg(last = true, allow_hyphen_values = true)]
    pub bench_args: Vec<String>,
}

impl StepArgs {
    /// Merge the config file with these flags and validate the result.
    pub fn resolve(self) -> bench_step::Result<StepSettings> {
        let file = StepConfig::load_or_default(self.config.as_deref())?;

        let flags = StepConfig {
            builder_name: self.builder_name,
            got_revision: self.got_revision,
            perf_data_dir: self.perf_data_dir,
            resource_dir: self.resource_dir,
            device_perf_dir: self.device_perf_dir,
            out_dir: self.out_dir,
            configuration: self.configuration,
            repo_dir: self.repo_dir,
            bench_args: self.bench_args,
        };

        file.merge(flags).resolve()
    }
}

pub mod overrides;
pub mod plan;
pub mod run;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run_json($args))
    };
}

pub(crate) fn run_json(command: crate::Commands) -> (bench_step::Result<serde_json::Value>, i32) {
    crate::tty::status("bench-step is working...");

    match command {
        crate::Commands::Run(args) => dispatch!(args, run),
        crate::Commands::Plan(args) => dispatch!(args, plan),
        crate::Commands::Overrides(args) => dispatch!(args, overrides),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn flags_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "builder_name": "Perf-Android-NexusS-SGX540-Arm7-Release",
                "got_revision": "abc123",
                "resource_dir": "/skia/resources",
                "bench_args": ["--repeat", "3"]
            }}"#
        )
        .unwrap();

        let args = StepArgs {
            config: Some(file.path().to_path_buf()),
            got_revision: Some("def456".to_string()),
            bench_args: vec!["--verbose".to_string()],
            ..Default::default()
        };

        let settings = args.resolve().unwrap();
        assert_eq!(settings.builder_name, "Perf-Android-NexusS-SGX540-Arm7-Release");
        assert_eq!(settings.got_revision, "def456");
        assert_eq!(settings.bench_args, vec!["--repeat", "3", "--verbose"]);
    }

    #[test]
    fn parsed_commands_dispatch_to_json() {
        use clap::Parser;

        let cli = crate::Cli::try_parse_from([
            "bench-step",
            "overrides",
            "--builder-name",
            "Test-Android-Nexus4-Valgrind-Debug",
        ])
        .unwrap();

        let (value, exit_code) = run_json(cli.command);
        let value = value.unwrap();
        assert_eq!(exit_code, 0);
        assert_eq!(value["entries"][0]["fragment"], "Nexus4");
        assert_eq!(value["entries"][1]["fragment"], "Valgrind");
    }

    #[test]
    fn invalid_step_settings_exit_with_2() {
        use clap::Parser;

        let config = NamedTempFile::new().unwrap();
        std::fs::write(config.path(), "{}").unwrap();
        let config_path = config.path().to_string_lossy().into_owned();
        let cli = crate::Cli::try_parse_from([
            "bench-step",
            "plan",
            "--config",
            config_path.as_str(),
            "--builder-name",
            "Perf-Android-Nexus4-Adreno320-Arm7-Release",
        ])
        .unwrap();

        let (value, exit_code) = run_json(cli.command);
        assert_eq!(exit_code, 2);
        assert_eq!(
            value.err().unwrap().code,
            bench_step::ErrorCode::ValidationMissingArgument
        );
    }
}
