use clap::{Parser, Subcommand};

mod commands;
mod output;
mod tty;

use commands::{overrides, plan, run};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "bench-step")]
#[command(version = VERSION)]
#[command(about = "Run the bench executable as a CI build step")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the bench command line and run it
    Run(run::RunArgs),
    /// Print the bench command line without running it
    Plan(plan::PlanArgs),
    /// List per-builder argument overrides
    Overrides(overrides::OverridesArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let (json_result, exit_code) = commands::run_json(cli.command);
    // stdout may already be gone; the exit code still reports the step.
    let _ = output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
