use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::bench::{self, BENCH_APP};
use crate::error::Result;
use crate::flavor::{FlavorRunner, RunnerOutput};
use crate::git::CommitTimestamp;

/// Directories on the device under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDirs {
    resource_dir: String,
    perf_dir: String,
}

impl DeviceDirs {
    pub fn new(resource_dir: impl Into<String>, perf_dir: impl Into<String>) -> Self {
        Self {
            resource_dir: resource_dir.into(),
            perf_dir: perf_dir.into(),
        }
    }

    pub fn resource_dir(&self) -> &str {
        &self.resource_dir
    }

    pub fn perf_dir(&self) -> &str {
        &self.perf_dir
    }
}

/// A fully assembled `bench` command line.
#[derive(Debug, Clone, Serialize)]
pub struct BenchInvocation {
    pub app: String,
    pub args: Vec<String>,
    /// Fragments from the override table that matched the builder.
    pub overrides: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_data_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_timestamp: Option<i64>,
}

/// Result of running the step.
#[derive(Debug, Clone)]
pub struct BenchRun {
    pub invocation: BenchInvocation,
    pub output: RunnerOutput,
}

/// Build step that runs `bench` for one builder at one revision.
pub struct RunBench {
    builder_name: String,
    got_revision: String,
    device_dirs: DeviceDirs,
    perf_data_dir: Option<PathBuf>,
    bench_args: Vec<String>,
}

impl RunBench {
    pub fn new(
        builder_name: impl Into<String>,
        got_revision: impl Into<String>,
        device_dirs: DeviceDirs,
    ) -> Self {
        Self {
            builder_name: builder_name.into(),
            got_revision: got_revision.into(),
            device_dirs,
            perf_data_dir: None,
            bench_args: Vec::new(),
        }
    }

    /// Emit perf result flags. `None` makes this a diagnostic run with no result files.
    pub fn perf_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.perf_data_dir = dir;
        self
    }

    /// Arguments appended verbatim after everything else.
    pub fn bench_args(mut self, args: &[String]) -> Self {
        self.bench_args.extend(args.iter().cloned());
        self
    }

    pub fn builder_name(&self) -> &str {
        &self.builder_name
    }

    /// Raw log file: `<perf_dir>/bench_<revision>_data`
    pub fn data_file(&self) -> String {
        device_join(
            self.device_dirs.perf_dir(),
            &format!("bench_{}_data", self.got_revision),
        )
    }

    /// JSON results file: `<perf_dir>/microbench_<revision>_<timestamp>.json`
    pub fn json_data_file(&self, git_timestamp: i64) -> String {
        device_join(
            self.device_dirs.perf_dir(),
            &format!("microbench_{}_{}.json", self.got_revision, git_timestamp),
        )
    }

    /// Assemble the command line without running anything.
    ///
    /// `timestamps` is only consulted when a perf data dir is set.
    pub fn build_args(&self, timestamps: &dyn CommitTimestamp) -> Result<BenchInvocation> {
        let mut args = vec![
            "-i".to_string(),
            self.device_dirs.resource_dir().to_string(),
        ];

        let mut data_file = None;
        let mut json_data_file = None;
        let mut commit_timestamp = None;

        if self.perf_data_dir.is_some() {
            let log_file = self.data_file();
            args.extend(bench::bench_args(&log_file));

            let ts = timestamps.commit_timestamp()?;
            let json_file = self.json_data_file(ts);
            args.push("--outResultsFile".to_string());
            args.push(json_file.clone());

            data_file = Some(log_file);
            json_data_file = Some(json_file);
            commit_timestamp = Some(ts);
        }

        let matched = bench::matching_overrides(&self.builder_name);
        for (_, flags) in &matched {
            args.extend(flags.iter().map(|f| f.to_string()));
        }

        args.extend(self.bench_args.iter().cloned());

        Ok(BenchInvocation {
            app: BENCH_APP.to_string(),
            args,
            overrides: matched
                .into_iter()
                .map(|(fragment, _)| fragment.to_string())
                .collect(),
            data_file,
            json_data_file,
            commit_timestamp,
        })
    }

    /// Assemble the command line and hand it to `flavor`.
    ///
    /// Failures from either collaborator are returned as-is.
    pub fn run(
        &self,
        timestamps: &dyn CommitTimestamp,
        flavor: &dyn FlavorRunner,
    ) -> Result<BenchRun> {
        let invocation = self.build_args(timestamps)?;

        if invocation.overrides.is_empty() {
            log_status!("bench", "No overrides for builder {}", self.builder_name);
        } else {
            log_status!(
                "bench",
                "Applying overrides for {}: {}",
                self.builder_name,
                invocation.overrides.join(", ")
            );
        }

        let output = flavor.run_flavored_cmd(&invocation.app, &invocation.args)?;

        Ok(BenchRun { invocation, output })
    }
}

fn device_join(dir: &str, file_name: &str) -> String {
    Path::new(dir).join(file_name).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::{Cell, RefCell};

    struct FixedTimestamp {
        ts: i64,
        calls: Cell<usize>,
    }

    impl FixedTimestamp {
        fn new(ts: i64) -> Self {
            Self {
                ts,
                calls: Cell::new(0),
            }
        }
    }

    impl CommitTimestamp for FixedTimestamp {
        fn commit_timestamp(&self) -> Result<i64> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.ts)
        }
    }

    struct FailingTimestamp;

    impl CommitTimestamp for FailingTimestamp {
        fn commit_timestamp(&self) -> Result<i64> {
            Err(Error::git_command_failed("not a git repository"))
        }
    }

    #[derive(Default)]
    struct RecordingFlavor {
        calls: RefCell<Vec<(String, Vec<String>)>>,
        exit_code: i32,
    }

    impl FlavorRunner for RecordingFlavor {
        fn run_flavored_cmd(&self, app: &str, args: &[String]) -> Result<RunnerOutput> {
            self.calls
                .borrow_mut()
                .push((app.to_string(), args.to_vec()));
            Ok(RunnerOutput::from_exit_code(self.exit_code))
        }
    }

    fn dirs() -> DeviceDirs {
        DeviceDirs::new("/skia/resources", "/skia/perf")
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn diagnostic_run_has_only_resource_dir() {
        let step = RunBench::new("Perf-Ubuntu12-ShuttleA-GTX660-x86-Release", "abc123", dirs());
        let ts = FixedTimestamp::new(1406721715);

        let invocation = step.build_args(&ts).unwrap();

        assert_eq!(invocation.args, strings(&["-i", "/skia/resources"]));
        assert!(invocation.data_file.is_none());
        assert!(invocation.json_data_file.is_none());
        assert_eq!(ts.calls.get(), 0);
    }

    #[test]
    fn perf_run_adds_log_then_results_file() {
        let step = RunBench::new("Perf-Ubuntu12-ShuttleA-GTX660-x86-Release", "abc123", dirs())
            .perf_data_dir(Some(PathBuf::from("/host/perfdata")));

        let invocation = step.build_args(&FixedTimestamp::new(1406721715)).unwrap();

        let data_file = device_join("/skia/perf", "bench_abc123_data");
        let json_file = device_join("/skia/perf", "microbench_abc123_1406721715.json");
        assert_eq!(
            invocation.args,
            vec![
                "-i".to_string(),
                "/skia/resources".to_string(),
                "--timers".to_string(),
                "wg".to_string(),
                "--logFile".to_string(),
                data_file.clone(),
                "--outResultsFile".to_string(),
                json_file.clone(),
            ]
        );
        assert_ne!(data_file, json_file);
        assert_eq!(invocation.commit_timestamp, Some(1406721715));
    }

    #[test]
    fn overrides_follow_perf_flags() {
        let step = RunBench::new("Perf-Android-Nexus4-Adreno320-Arm7-Release", "abc123", dirs())
            .perf_data_dir(Some(PathBuf::from("/host/perfdata")));

        let args = step.build_args(&FixedTimestamp::new(1)).unwrap().args;

        let config_pos = args.iter().position(|a| a == "--config").unwrap();
        let results_pos = args.iter().position(|a| a == "--outResultsFile").unwrap();
        assert!(config_pos > results_pos);
        assert_eq!(
            &args[config_pos..config_pos + 3],
            &strings(&["--config", "defaults", "MSAA4"])[..]
        );
        assert_eq!(args.iter().filter(|a| *a == "MSAA4").count(), 1);
    }

    #[test]
    fn galaxy_nexus_match_appears_once() {
        let step = RunBench::new("Perf-Android-GalaxyNexus-SGX540-Arm7-Release", "r1", dirs());

        let invocation = step.build_args(&FixedTimestamp::new(1)).unwrap();

        assert_eq!(
            invocation.args,
            strings(&["-i", "/skia/resources", "--match", "~DeferredSurfaceCopy"])
        );
        assert_eq!(invocation.overrides, strings(&["GalaxyNexus"]));
    }

    #[test]
    fn extra_args_trail_in_order() {
        let extra = strings(&["--repeat", "5", "--match", "bitmap"]);
        let step = RunBench::new("Test-Android-Nexus4-Valgrind-Debug", "r1", dirs())
            .perf_data_dir(Some(PathBuf::from("/host/perfdata")))
            .bench_args(&extra);

        let args = step.build_args(&FixedTimestamp::new(1)).unwrap().args;

        assert_eq!(&args[args.len() - extra.len()..], &extra[..]);
        // Both overrides come before the caller's arguments.
        let valgrind_pos = args.iter().position(|a| a == "NONRENDERING").unwrap();
        assert!(valgrind_pos < args.len() - extra.len());
    }

    #[test]
    fn timestamp_failure_propagates() {
        let step = RunBench::new("Perf-Android-Nexus4", "r1", dirs())
            .perf_data_dir(Some(PathBuf::from("/host/perfdata")));
        let flavor = RecordingFlavor::default();

        let err = step.run(&FailingTimestamp, &flavor).unwrap_err();

        assert_eq!(err.code, crate::error::ErrorCode::GitCommandFailed);
        assert!(flavor.calls.borrow().is_empty());
    }

    #[test]
    fn run_delegates_bench_with_assembled_args() {
        let step = RunBench::new("Perf-Android-NexusS-SGX540-Arm7-Release", "r1", dirs())
            .bench_args(&strings(&["--verbose"]));
        let flavor = RecordingFlavor {
            exit_code: 3,
            ..Default::default()
        };

        let run = step.run(&FixedTimestamp::new(1), &flavor).unwrap();

        let calls = flavor.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "bench");
        assert_eq!(calls[0].1, run.invocation.args);
        assert_eq!(run.output.exit_code, 3);
        assert!(!run.output.success);
    }
}
