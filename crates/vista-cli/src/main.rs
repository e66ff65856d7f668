// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `vista` CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vista_cli::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let stdout = std::io::stdout();
    vista_cli::run(cli, &mut stdout.lock())
}
