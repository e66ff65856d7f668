// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Self-rescheduling frame task owned by one resource set.
//!
//! The loop is a chain of host frame requests: each delivered frame draws,
//! then asks for the next. It only stops when its owner cancels the pending
//! request, or when a draw fails (fail-stop, never rescheduled).

use tracing::{debug, error};
use vista_scene_port::{FrameHandle, HostPort, PortError};

use crate::error::ViewerError;
use crate::perf::PerfStats;

/// Scheduling state of a [`RenderLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not started.
    Idle,
    /// A frame request is outstanding.
    Running,
    /// A draw failed; no frame is requested.
    Failed,
    /// Cancelled by teardown.
    Stopped,
}

/// What happened to a delivered frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Drawn and the next frame requested.
    Rendered {
        /// The new pending request.
        next: FrameHandle,
    },
    /// Not this loop's pending frame; ignored.
    Stale,
    /// The draw failed and the loop stopped.
    Failed(ViewerError),
}

/// Cancellable render loop.
#[derive(Debug, Clone)]
pub struct RenderLoop {
    state: LoopState,
    pending: Option<FrameHandle>,
    frames: u64,
    last_timestamp_ms: Option<f64>,
    perf: PerfStats,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self {
            state: LoopState::Idle,
            pending: None,
            frames: 0,
            last_timestamp_ms: None,
            perf: PerfStats::default(),
        }
    }
}

impl RenderLoop {
    /// A loop that has not requested any frame.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Request the first frame.
    pub fn start(&mut self, host: &mut dyn HostPort) {
        if self.state == LoopState::Running {
            return;
        }
        self.pending = Some(host.request_frame());
        self.state = LoopState::Running;
    }

    /// Handle a delivered frame: draw it with `draw`, then request the next.
    pub fn frame<F>(
        &mut self,
        handle: FrameHandle,
        timestamp_ms: f64,
        host: &mut dyn HostPort,
        draw: F,
    ) -> FrameOutcome
    where
        F: FnOnce() -> Result<(), PortError>,
    {
        if self.state != LoopState::Running || self.pending != Some(handle) {
            debug!(frame = handle.0, "ignoring stale frame");
            return FrameOutcome::Stale;
        }
        self.pending = None;
        if let Some(prev) = self.last_timestamp_ms.replace(timestamp_ms) {
            self.perf.push((timestamp_ms - prev) as f32);
        }

        if let Err(err) = draw() {
            self.state = LoopState::Failed;
            error!(frame = handle.0, error = %err, "frame render failed; stopping render loop");
            return FrameOutcome::Failed(ViewerError::RenderFailure(err.to_string()));
        }

        self.frames += 1;
        let next = host.request_frame();
        self.pending = Some(next);
        FrameOutcome::Rendered { next }
    }

    /// Cancel the outstanding frame request, if any. The loop cannot restart.
    pub fn cancel(&mut self, host: &mut dyn HostPort) -> Result<(), PortError> {
        self.state = LoopState::Stopped;
        match self.pending.take() {
            Some(handle) => host.cancel_frame(handle),
            None => Ok(()),
        }
    }

    /// Current state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Outstanding frame request.
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Frames drawn so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frame timing.
    pub fn perf(&self) -> &PerfStats {
        &self.perf
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use vista_scene_codec::HeadlessHost;
    use vista_scene_port::Viewport;

    #[test]
    fn each_frame_requests_exactly_one_more() {
        let host = HeadlessHost::new(Viewport::default());
        let mut port = host.clone();
        let mut rl = RenderLoop::idle();
        rl.start(&mut port);
        for _ in 0..3 {
            let due = host.take_due_frames();
            assert_eq!(due.len(), 1);
            let out = rl.frame(due[0], 0.0, &mut port, || Ok(()));
            assert!(matches!(out, FrameOutcome::Rendered { .. }));
        }
        assert_eq!(rl.frames(), 3);
        assert_eq!(host.state().pending_frames.len(), 1);
    }

    #[test]
    fn stale_handles_are_ignored() {
        let host = HeadlessHost::new(Viewport::default());
        let mut port = host.clone();
        let mut rl = RenderLoop::idle();
        rl.start(&mut port);
        let mut drew = false;
        let out = rl.frame(FrameHandle(999), 0.0, &mut port, || {
            drew = true;
            Ok(())
        });
        assert_eq!(out, FrameOutcome::Stale);
        assert!(!drew);
        assert!(rl.pending().is_some());
    }

    #[test]
    fn draw_error_fail_stops() {
        let host = HeadlessHost::new(Viewport::default());
        let mut port = host.clone();
        let mut rl = RenderLoop::idle();
        rl.start(&mut port);
        let due = host.take_due_frames();
        let out = rl.frame(due[0], 0.0, &mut port, || {
            Err(PortError::Backend("device lost".into()))
        });
        assert!(matches!(out, FrameOutcome::Failed(ViewerError::RenderFailure(_))));
        assert_eq!(rl.state(), LoopState::Failed);
        assert!(host.take_due_frames().is_empty());
        // Cancelling a failed loop has nothing to cancel.
        assert!(rl.cancel(&mut port).is_ok());
    }

    #[test]
    fn cancel_withdraws_pending_request() {
        let host = HeadlessHost::new(Viewport::default());
        let mut port = host.clone();
        let mut rl = RenderLoop::idle();
        rl.start(&mut port);
        rl.cancel(&mut port).expect("cancel");
        assert_eq!(rl.state(), LoopState::Stopped);
        assert!(host.state().pending_frames.is_empty());
        assert_eq!(host.state().cancelled_frames, 1);
    }

    #[test]
    fn frame_intervals_feed_perf() {
        let host = HeadlessHost::new(Viewport::default());
        let mut port = host.clone();
        let mut rl = RenderLoop::idle();
        rl.start(&mut port);
        for ts in [0.0, 20.0, 40.0] {
            let due = host.take_due_frames();
            rl.frame(due[0], ts, &mut port, || Ok(()));
        }
        assert_eq!(rl.perf().samples(), 2);
        assert!((rl.perf().fps() - 50.0).abs() < 1e-3);
    }
}
