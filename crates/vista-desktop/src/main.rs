// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Vista desktop viewer: open a glTF/GLB file by argument or drag-and-drop.
//!
//! Arrow keys move the camera, left-drag orbits, the wheel zooms. Escape
//! asks to leave; Enter confirms and Backspace stays.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use winit::event_loop::EventLoop;

mod app;
mod backend;
mod gpu;
mod host;
mod keys;
mod outline;
mod window_port;

#[derive(Parser, Debug)]
#[command(name = "vista-desktop")]
#[command(author, version, about = "Interactive glTF/GLB scene viewer")]
struct Args {
    /// Asset to open on startup
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .init();

    let event_loop = EventLoop::new()?;
    let mut app = app::App::new(args.file)?;
    event_loop.run_app(&mut app)?;
    Ok(())
}
