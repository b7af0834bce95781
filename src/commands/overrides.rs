use clap::Args;
use serde::Serialize;

use bench_step::bench;

use super::CmdResult;

#[derive(Args)]
pub struct OverridesArgs {
    /// Only show entries that apply to this builder
    #[arg(long)]
    builder_name: Option<String>,
}

#[derive(Serialize)]
pub struct OverrideEntry {
    fragment: String,
    args: Vec<String>,
}

#[derive(Serialize)]
pub struct OverridesOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    builder_name: Option<String>,
    entries: Vec<OverrideEntry>,
    /// Flags the builder would receive, in order.
    #[serde(skip_serializing_if = "Option::is_none")]
    extra_args: Option<Vec<String>>,
}

pub fn run_json(args: OverridesArgs) -> CmdResult<OverridesOutput> {
    let selected: Vec<(&str, &[&str])> = match args.builder_name.as_deref() {
        Some(name) => bench::matching_overrides(name),
        None => bench::EXTRA_ARGS.to_vec(),
    };

    let entries = selected
        .into_iter()
        .map(|(fragment, flags)| OverrideEntry {
            fragment: fragment.to_string(),
            args: flags.iter().map(|f| f.to_string()).collect(),
        })
        .collect();

    let extra_args = args
        .builder_name
        .as_deref()
        .map(bench::extra_args_for_builder);

    Ok((
        OverridesOutput {
            builder_name: args.builder_name,
            entries,
            extra_args,
        },
        0,
    ))
}
