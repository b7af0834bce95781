use clap::Args;
use serde::Serialize;

use bench_step::shell;
use bench_step::step::BenchInvocation;

use super::{CmdResult, StepArgs};

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    step: StepArgs,
}

#[derive(Serialize)]
pub struct PlanOutput {
    builder_name: String,
    command: String,
    #[serde(flatten)]
    invocation: BenchInvocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    committed_at: Option<String>,
}

/// Show the bench command line `run` would execute, without executing it.
pub fn run_json(args: PlanArgs) -> CmdResult<PlanOutput> {
    let settings = args.step.resolve()?;
    let step = settings.run_bench();
    let invocation = step.build_args(&settings.commit_timestamps())?;

    // Without an out dir there is no host path to show; fall back to the app name.
    let program = match settings.local_flavor() {
        Ok(flavor) => flavor.app_path(&invocation.app).to_string_lossy().into_owned(),
        Err(_) => invocation.app.clone(),
    };

    let output = PlanOutput {
        builder_name: step.builder_name().to_string(),
        command: shell::render_command(&program, &invocation.args),
        committed_at: invocation.commit_timestamp.and_then(super::run::rfc3339),
        invocation,
    };

    Ok((output, 0))
}
