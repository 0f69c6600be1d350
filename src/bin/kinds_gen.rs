//! Core Kinds Generator CLI
//!
//! Regenerates every core kind artifact, or checks that they are up to date.
//!
//! Usage:
//!   kinds-gen                      write generated files
//!   CODEGEN_VERIFY=1 kinds-gen     verify only, fail if anything drifted
//!
//! Takes no arguments. Paths come from `kindgen.toml` and `KINDGEN__*`.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use kinds_codegen::{run, GenConfig, Mode, PipelineConfig, RunOutcome};
use tracing_subscriber::EnvFilter;

const VERIFY_ENV: &str = "CODEGEN_VERIFY";

#[derive(Parser)]
#[command(name = "kinds-gen")]
#[command(about = "Generate core kind code from kind schemas")]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = Cli::try_parse() {
        eprintln!("{}", e.render());
        eprintln!("kinds-gen takes no arguments; set {} to verify instead of write", VERIFY_ENV);
        return ExitCode::FAILURE;
    }

    match execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute() -> anyhow::Result<()> {
    let config = GenConfig::load().context("failed to load kindgen configuration")?;

    let mode = if std::env::var_os(VERIFY_ENV).is_some() {
        Mode::Verify
    } else {
        Mode::Write
    };
    let pipeline = PipelineConfig::new(config.root.clone(), mode);

    match run(&config, &pipeline)? {
        RunOutcome::Written(stats) => {
            eprintln!(
                "generated {} files ({} changed)",
                stats.written + stats.unchanged,
                stats.written
            );
        }
        RunOutcome::Verified { files } => {
            eprintln!("{} generated files are up to date", files);
        }
    }
    Ok(())
}
