//! CLI entry point for wave function collapse image generation

use clap::Parser;
use wavetiler::io::cli::{Cli, JobRunner};

fn main() -> wavetiler::Result<()> {
    let cli = Cli::parse();
    let mut runner = JobRunner::new(cli);
    runner.process()
}
