//! Argument assembly for the `bench` executable.
//!
//! `bench_args` is the timer/log flag set shared with other perf tooling, and
//! `EXTRA_ARGS` patches known per-device quirks by builder-name fragment.

/// Name of the benchmark executable handed to the flavor runner.
pub const BENCH_APP: &str = "bench";

/// Builder-name fragment -> extra `bench` arguments.
///
/// A fragment may be a full builder name. Every fragment contained in the
/// builder name contributes its flags, in table order.
pub const EXTRA_ARGS: &[(&str, &[&str])] = &[
    // Crash: skbug.com/1687
    ("GalaxyNexus", &["--match", "~DeferredSurfaceCopy"]),
    ("Nexus4", &["--config", "defaults", "MSAA4"]),
    // Crash: skbug.com/1687
    ("NexusS", &["--match", "~DeferredSurfaceCopy"]),
    (
        "Valgrind",
        &["--runOnce", "true", "--config", "8888", "GPU", "NONRENDERING"],
    ),
    // Crash: skbug.com/2505
    (
        "Perf-Win8-ShuttleA-GTX660-x86-Release",
        &["--match", "~giantdashline"],
    ),
];

/// Flags telling `bench` to record wall-clock and GPU timers into `data_file`.
///
/// Other scripts parse this exact shape, so `--outResultsFile` is added by the
/// step rather than here.
pub fn bench_args(data_file: &str) -> Vec<String> {
    vec![
        "--timers".to_string(),
        "wg".to_string(),
        "--logFile".to_string(),
        data_file.to_string(),
    ]
}

/// Table entries whose fragment occurs in `builder_name`, in table order.
pub fn matching_overrides(builder_name: &str) -> Vec<(&'static str, &'static [&'static str])> {
    EXTRA_ARGS
        .iter()
        .filter(|(fragment, _)| builder_name.contains(fragment))
        .copied()
        .collect()
}

/// Concatenated flags of every matching table entry.
pub fn extra_args_for_builder(builder_name: &str) -> Vec<String> {
    matching_overrides(builder_name)
        .into_iter()
        .flat_map(|(_, flags)| flags.iter().map(|f| f.to_string()))
        .collect()
}
