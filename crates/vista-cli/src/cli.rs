// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line surface of the `vista` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level arguments.
#[derive(Parser, Debug)]
#[command(name = "vista")]
#[command(author, version, about = "Inspect and dry-run glTF/GLB scenes")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// `vista` subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode an asset and print a summary table
    Inspect {
        /// Path to a .gltf or .glb file
        file: PathBuf,
    },
    /// Drive the viewer lifecycle headlessly and print a report
    Simulate {
        /// Path to a .gltf or .glb file
        file: PathBuf,
        /// Animation frames to deliver after loading
        #[arg(long, default_value_t = 60)]
        frames: u32,
        /// Key codes to press before the frames run (e.g. ArrowUp,Escape)
        #[arg(long, value_delimiter = ',')]
        keys: Vec<String>,
        /// JSON file holding viewer preferences
        #[arg(long)]
        prefs: Option<PathBuf>,
    },
}
