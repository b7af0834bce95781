use clap::Args;
use serde::Serialize;

use bench_step::shell;
use bench_step::step::BenchInvocation;

use super::{CmdResult, StepArgs};

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    step: StepArgs,
}

#[derive(Serialize)]
pub struct RunOutput {
    status: String,
    builder_name: String,
    command: String,
    exit_code: i32,
    #[serde(flatten)]
    invocation: BenchInvocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    committed_at: Option<String>,
}

pub fn run_json(args: RunArgs) -> CmdResult<RunOutput> {
    let settings = args.step.resolve()?;
    let flavor = settings.local_flavor()?;
    let step = settings.run_bench();

    let result = step.run(&settings.commit_timestamps(), &flavor)?;

    let program = flavor.app_path(&result.invocation.app);
    let command = shell::render_command(&program.to_string_lossy(), &result.invocation.args);
    let status = if result.output.success {
        "passed"
    } else {
        "failed"
    };

    let output = RunOutput {
        status: status.to_string(),
        builder_name: step.builder_name().to_string(),
        command,
        exit_code: result.output.exit_code,
        committed_at: result.invocation.commit_timestamp.and_then(rfc3339),
        invocation: result.invocation,
    };

    Ok((output, process_exit_code(&result.output)))
}

/// Signal deaths report -1; the process must still exit non-zero.
fn process_exit_code(output: &bench_step::flavor::RunnerOutput) -> i32 {
    if output.success {
        0
    } else if output.exit_code > 0 {
        output.exit_code
    } else {
        1
    }
}

pub(crate) fn rfc3339(timestamp: i64) -> Option<String> {
    chrono::DateTime::from_timestamp(timestamp, 0).map(|dt| dt.to_rfc3339())
}
