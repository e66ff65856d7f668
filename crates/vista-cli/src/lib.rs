// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Library half of the `vista` binary, split out so commands are testable
//! without spawning a process.

use std::io::Write;

use anyhow::Result;
use vista_viewer::Key;

pub mod cli;
pub mod inspect;
pub mod simulate;

use cli::{Cli, Command};
use simulate::SimulateOptions;

/// Dispatch a parsed command line, writing results to `out`.
pub fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    match cli.command {
        Command::Inspect { file } => inspect::run(&file, out),
        Command::Simulate {
            file,
            frames,
            keys,
            prefs,
        } => {
            let opts = SimulateOptions {
                file,
                frames,
                keys: keys.iter().map(|k| Key::from_code(k.trim())).collect(),
                prefs,
            };
            simulate::run(&opts, out)
        }
    }
}
