// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Window-facing port; lets the host schedule redraws without coupling to winit.

use vista_scene_port::Viewport;
use winit::window::Window;

/// What the host needs from the native window.
pub trait WindowPort {
    /// Ask the windowing system for a redraw.
    fn request_redraw(&self);
    /// Current drawable size and scale.
    fn viewport(&self) -> Viewport;
}

/// [`WindowPort`] over a winit window.
#[derive(Clone, Copy)]
pub struct WinitWindow {
    win: &'static Window,
}

impl WinitWindow {
    pub fn new(win: &'static Window) -> Self {
        Self { win }
    }
}

impl WindowPort for WinitWindow {
    fn request_redraw(&self) {
        self.win.request_redraw();
    }

    fn viewport(&self) -> Viewport {
        let size = self.win.inner_size();
        Viewport {
            width: size.width,
            height: size.height,
            scale_factor: self.win.scale_factor() as f32,
        }
    }
}
