// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! [`HostPort`] for a native window.
//!
//! Frame requests become redraw requests; the app collects the due handles
//! on `RedrawRequested` and feeds them back to the controller.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use vista_scene_port::{
    FrameHandle, HostPort, ListenerHandle, ListenerKind, PortError, SurfaceId, Viewport,
};

use crate::window_port::WindowPort;

#[derive(Default)]
struct Bookkeeping {
    next: u64,
    pending: BTreeSet<FrameHandle>,
    listeners: BTreeMap<ListenerHandle, ListenerKind>,
    mounted: Option<SurfaceId>,
}

impl Bookkeeping {
    fn next(&mut self) -> u64 {
        self.next += 1;
        self.next
    }
}

/// Cloneable host; every clone shares the same bookkeeping.
#[derive(Clone)]
pub struct WindowHost {
    window: Rc<dyn WindowPort>,
    state: Rc<RefCell<Bookkeeping>>,
}

impl WindowHost {
    pub fn new(window: Rc<dyn WindowPort>) -> Self {
        Self {
            window,
            state: Rc::default(),
        }
    }

    /// Frame requests outstanding at the time of the redraw, oldest first.
    pub fn take_due_frames(&self) -> Vec<FrameHandle> {
        let pending = std::mem::take(&mut self.state.borrow_mut().pending);
        pending.into_iter().collect()
    }

    /// True when a listener of `kind` is registered.
    pub fn listening(&self, kind: ListenerKind) -> bool {
        self.state.borrow().listeners.values().any(|k| *k == kind)
    }

    /// True when a surface is mounted.
    pub fn has_mount(&self) -> bool {
        self.state.borrow().mounted.is_some()
    }
}

impl HostPort for WindowHost {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = {
            let mut state = self.state.borrow_mut();
            let handle = FrameHandle(state.next());
            state.pending.insert(handle);
            handle
        };
        self.window.request_redraw();
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) -> Result<(), PortError> {
        if self.state.borrow_mut().pending.remove(&handle) {
            Ok(())
        } else {
            Err(PortError::UnknownHandle(format!("frame {}", handle.0)))
        }
    }

    fn viewport(&self) -> Viewport {
        self.window.viewport()
    }

    fn add_listener(&mut self, kind: ListenerKind) -> ListenerHandle {
        let mut state = self.state.borrow_mut();
        let handle = ListenerHandle(state.next());
        state.listeners.insert(handle, kind);
        handle
    }

    fn remove_listener(&mut self, handle: ListenerHandle) -> Result<(), PortError> {
        self.state
            .borrow_mut()
            .listeners
            .remove(&handle)
            .map(|_| ())
            .ok_or_else(|| PortError::UnknownHandle(format!("listener {}", handle.0)))
    }

    fn mount_surface(&mut self, surface: SurfaceId) -> Result<(), PortError> {
        let mut state = self.state.borrow_mut();
        if let Some(current) = state.mounted {
            return Err(PortError::Backend(format!(
                "window already shows surface {}; cannot mount {}",
                current.0, surface.0
            )));
        }
        state.mounted = Some(surface);
        Ok(())
    }

    fn clear_mount(&mut self) -> Result<(), PortError> {
        self.state.borrow_mut().mounted = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct FakeWindow {
        redraws: Cell<u32>,
    }

    impl WindowPort for FakeWindow {
        fn request_redraw(&self) {
            self.redraws.set(self.redraws.get() + 1);
        }

        fn viewport(&self) -> Viewport {
            Viewport {
                width: 800,
                height: 600,
                scale_factor: 2.0,
            }
        }
    }

    fn host() -> (WindowHost, Rc<FakeWindow>) {
        let window = Rc::new(FakeWindow::default());
        (WindowHost::new(window.clone()), window)
    }

    #[test]
    fn frame_requests_wake_the_window() {
        let (mut host, window) = host();
        let a = host.request_frame();
        let b = host.request_frame();
        assert_eq!(window.redraws.get(), 2);
        assert_eq!(host.take_due_frames(), [a, b]);
        assert!(host.take_due_frames().is_empty());
    }

    #[test]
    fn cancelled_frames_are_not_delivered() {
        let (mut host, _window) = host();
        let a = host.request_frame();
        host.cancel_frame(a).expect("cancel");
        assert!(host.cancel_frame(a).is_err());
        assert!(host.take_due_frames().is_empty());
    }

    #[test]
    fn listeners_are_tracked() {
        let (mut host, _window) = host();
        let resize = host.add_listener(ListenerKind::Resize);
        assert!(host.listening(ListenerKind::Resize));
        assert!(!host.listening(ListenerKind::KeyDown));
        host.remove_listener(resize).expect("remove");
        assert!(host.remove_listener(resize).is_err());

        assert_eq!(host.viewport().width, 800);
    }

    #[test]
    fn window_shows_one_surface_at_a_time() {
        let (mut host, _window) = host();
        host.mount_surface(SurfaceId(1)).expect("mount");
        assert!(host.mount_surface(SurfaceId(1)).is_err());
        assert!(host.mount_surface(SurfaceId(2)).is_err());
        assert!(host.has_mount());

        host.clear_mount().expect("clear");
        assert!(!host.has_mount());
        host.mount_surface(SurfaceId(2)).expect("mount after clear");
    }
}
