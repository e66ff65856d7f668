// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `vista simulate`: run the full viewer lifecycle against headless adapters.
//!
//! Loads the asset through the real provisioner and decoder, presses the
//! requested keys, pumps animation frames, then exits. Escape among the keys
//! leaves the exit prompt open, in which case the exit is confirmed;
//! otherwise the viewer is disposed directly.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use tokio::task::LocalSet;
use tracing::{info, warn};
use vista_app_core::prefs::ViewerPrefs;
use vista_scene_codec::{HeadlessBackend, HeadlessHost};
use vista_scene_port::{CameraState, Viewport};
use vista_viewer::{
    ExitPrompt, FrameOutcome, Key, KeyRoute, LoadOutcome, LoaderProvisioner, PreRegistered,
    ResourceSet, ResourceSetId, TeardownReport, ViewerController, ViewerEvent, ViewerHandle,
};

use crate::inspect::read_asset;

const FRAME_MS: f64 = 1000.0 / 60.0;

/// Inputs of one simulation run.
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    /// Asset to load.
    pub file: PathBuf,
    /// Animation frames to deliver.
    pub frames: u32,
    /// Keys pressed after the load, in order.
    pub keys: Vec<Key>,
    /// Optional JSON preferences file.
    pub prefs: Option<PathBuf>,
}

/// How the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitPath {
    /// The exit prompt was open and got confirmed.
    Confirmed,
    /// The viewer was disposed without a prompt.
    Disposed,
}

/// Everything `simulate` observed.
#[derive(Debug)]
pub struct SimulationReport {
    /// Asset display name.
    pub asset: String,
    /// Resource set the asset landed in.
    pub set: ResourceSetId,
    /// Frames the render loop completed.
    pub frames_rendered: u64,
    /// Rolling frames per second.
    pub fps: f32,
    /// Each key code with what it did.
    pub key_routes: Vec<(String, String)>,
    /// Camera before exit.
    pub camera: Option<CameraState>,
    /// Status headline before exit.
    pub status: String,
    /// Exit path taken.
    pub exit: ExitPath,
    /// Disposal report.
    pub teardown: TeardownReport,
    /// Every event the controller emitted.
    pub events: Vec<ViewerEvent>,
    /// Surfaces still mounted after exit.
    pub mounted_after: usize,
    /// Host listeners still registered after exit.
    pub listeners_after: usize,
    /// Renderers disposed over the run.
    pub renderers_disposed: u32,
}

/// Run `vista simulate` and print its report.
pub fn run(opts: &SimulateOptions, out: &mut impl Write) -> Result<()> {
    let report = simulate(opts)?;
    write_report(&report, out)?;
    Ok(())
}

/// Run the simulation on a single-threaded runtime.
pub fn simulate(opts: &SimulateOptions) -> Result<SimulationReport> {
    let prefs = load_prefs(opts.prefs.as_deref())?;
    let (name, bytes) = read_asset(&opts.file)?;
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("failed to start runtime")?;
    LocalSet::new().block_on(&rt, drive(name, Bytes::from(bytes), prefs, opts))
}

fn load_prefs(path: Option<&Path>) -> Result<ViewerPrefs> {
    let Some(path) = path else {
        return Ok(ViewerPrefs::default());
    };
    let raw = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("invalid prefs in {}", path.display()))
}

async fn drive(
    name: String,
    bytes: Bytes,
    prefs: ViewerPrefs,
    opts: &SimulateOptions,
) -> Result<SimulationReport> {
    let host = HeadlessHost::new(Viewport::default());
    let backend = HeadlessBackend::new();
    let controller =
        ViewerController::new(Box::new(backend.clone()), Box::new(host.clone()), prefs);
    let viewer = ViewerHandle::new(
        controller,
        LoaderProvisioner::with_fallback(PreRegistered::new()),
    );

    let outcome = viewer
        .load_asset(bytes, &name)
        .await
        .with_context(|| format!("failed to load {name}"))?;
    let LoadOutcome::Active(set) = outcome else {
        bail!("load of {name} was superseded");
    };
    info!(%set, "scene active");

    let mut key_routes = Vec::with_capacity(opts.keys.len());
    for key in &opts.keys {
        let route = viewer.borrow_mut().handle_key(key);
        key_routes.push((key.code().to_owned(), describe_route(&route)));
    }

    let mut timestamp = 0.0;
    'frames: for _ in 0..opts.frames {
        for handle in host.take_due_frames() {
            let outcome = viewer.borrow_mut().on_animation_frame(handle, timestamp);
            if let FrameOutcome::Failed(err) = outcome {
                warn!(error = %err, "render loop stopped");
                break 'frames;
            }
        }
        timestamp += FRAME_MS;
    }

    let (frames_rendered, fps, camera, status, prompt) = {
        let c = viewer.borrow();
        let live = c.resources();
        (
            live.map_or(0, ResourceSet::frames),
            live.map_or(0.0, |s| s.perf().fps()),
            c.camera(),
            c.status().headline(),
            c.prompt(),
        )
    };

    let (exit, teardown) = if prompt == ExitPrompt::Shown {
        let report = viewer.borrow_mut().confirm_exit().unwrap_or_default();
        (ExitPath::Confirmed, report)
    } else {
        (ExitPath::Disposed, viewer.borrow_mut().dispose())
    };
    let events = viewer.borrow_mut().drain_events();
    let listeners_after = host.state().listeners.len();
    let renderers_disposed = backend.ledger().renderers_disposed;

    Ok(SimulationReport {
        asset: name,
        set,
        frames_rendered,
        fps,
        key_routes,
        camera,
        status,
        exit,
        teardown,
        events,
        mounted_after: host.mounted().len(),
        listeners_after,
        renderers_disposed,
    })
}

fn describe_route(route: &KeyRoute) -> String {
    match route {
        KeyRoute::Move(camera) => format!("moved to {}", fmt_vec3(camera.position)),
        KeyRoute::ExitPrompt => "exit prompt".to_owned(),
        KeyRoute::Ignored => "ignored".to_owned(),
    }
}

fn describe_event(event: &ViewerEvent) -> String {
    match event {
        ViewerEvent::SceneReady { set, name } => format!("scene-ready {set} ({name})"),
        ViewerEvent::ExitPromptShown => "exit-prompt-shown".to_owned(),
        ViewerEvent::ExitPromptHidden => "exit-prompt-hidden".to_owned(),
        ViewerEvent::NavigateAway => "navigate-away".to_owned(),
        ViewerEvent::Error(err) => format!("error ({err})"),
    }
}

fn fmt_vec3(v: [f32; 3]) -> String {
    format!("[{:.3}, {:.3}, {:.3}]", v[0], v[1], v[2])
}

/// Print `report` as aligned `label: value` lines.
pub fn write_report(report: &SimulationReport, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "asset:      {}", report.asset)?;
    writeln!(out, "set:        {}", report.set)?;
    writeln!(
        out,
        "frames:     {} rendered ({:.1} fps)",
        report.frames_rendered, report.fps
    )?;
    for (code, what) in &report.key_routes {
        writeln!(out, "key:        {code} -> {what}")?;
    }
    if let Some(camera) = &report.camera {
        writeln!(
            out,
            "camera:     position {} target {}",
            fmt_vec3(camera.position),
            fmt_vec3(camera.target)
        )?;
    }
    writeln!(out, "status:     {}", report.status)?;
    let exit = match report.exit {
        ExitPath::Confirmed => "confirmed, navigate away",
        ExitPath::Disposed => "disposed",
    };
    writeln!(out, "exit:       {exit}")?;
    if report.teardown.is_clean() {
        writeln!(out, "teardown:   clean")?;
    } else {
        writeln!(out, "teardown:   {} error(s)", report.teardown.errors.len())?;
        for err in &report.teardown.errors {
            writeln!(out, "  - {err}")?;
        }
    }
    let events: Vec<_> = report.events.iter().map(describe_event).collect();
    writeln!(out, "events:     {}", events.join(", "))?;
    writeln!(
        out,
        "after exit: {} mounted, {} listeners, {} renderer(s) disposed",
        report.mounted_after, report.listeners_after, report.renderers_disposed
    )
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use vista_scene_codec::fixtures;

    fn write_fixture(dir: &Path) -> PathBuf {
        let path = dir.join("city.glb");
        std::fs::write(&path, fixtures::triangle_glb("city")).expect("write fixture");
        path
    }

    fn options(file: PathBuf, keys: &[&str], frames: u32) -> SimulateOptions {
        SimulateOptions {
            file,
            frames,
            keys: keys.iter().map(|k| Key::from_code(k)).collect(),
            prefs: None,
        }
    }

    #[test]
    fn simulation_loads_renders_and_releases() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = simulate(&options(write_fixture(dir.path()), &[], 10)).expect("simulate");
        assert_eq!(report.frames_rendered, 10);
        assert_eq!(report.exit, ExitPath::Disposed);
        assert!(report.teardown.is_clean());
        assert_eq!(report.mounted_after, 0);
        assert_eq!(report.listeners_after, 0);
        assert_eq!(report.renderers_disposed, 1);
        assert_eq!(report.status, "Viewing: city.glb");
    }

    #[test]
    fn escape_routes_through_the_prompt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = simulate(&options(
            write_fixture(dir.path()),
            &["ArrowUp", "Escape", "KeyQ"],
            2,
        ))
        .expect("simulate");
        assert_eq!(report.exit, ExitPath::Confirmed);
        assert_eq!(report.key_routes[1].1, "exit prompt");
        assert_eq!(report.key_routes[2].1, "ignored");
        assert!(report.key_routes[0].1.starts_with("moved to"));
        assert_eq!(report.events.last(), Some(&ViewerEvent::NavigateAway));
        assert_eq!(report.mounted_after, 0);
    }

    #[test]
    fn describes_routes_and_events() {
        assert_eq!(describe_route(&KeyRoute::Ignored), "ignored");
        assert_eq!(
            describe_event(&ViewerEvent::SceneReady {
                set: ResourceSetId(3),
                name: "a.glb".into()
            }),
            "scene-ready #3 (a.glb)"
        );
    }
}
