// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Tiny rolling frame time tracker.

use std::collections::VecDeque;

/// Rolling window of frame intervals in milliseconds.
#[derive(Clone, Debug)]
pub struct PerfStats {
    frame_ms: VecDeque<f32>,
    max_samples: usize,
}

impl Default for PerfStats {
    fn default() -> Self {
        Self {
            frame_ms: VecDeque::with_capacity(120),
            max_samples: 120,
        }
    }
}

impl PerfStats {
    /// Record one frame interval.
    pub fn push(&mut self, frame: f32) {
        if !frame.is_finite() || frame <= 0.0 {
            return;
        }
        if self.frame_ms.len() == self.max_samples {
            self.frame_ms.pop_front();
        }
        self.frame_ms.push_back(frame);
    }

    /// Mean frame interval over the window.
    pub fn mean_ms(&self) -> Option<f32> {
        if self.frame_ms.is_empty() {
            return None;
        }
        Some(self.frame_ms.iter().sum::<f32>() / self.frame_ms.len() as f32)
    }

    /// Frames per second over the window; 0 before the second frame.
    pub fn fps(&self) -> f32 {
        self.mean_ms().map_or(0.0, |ms| 1000.0 / ms)
    }

    /// Number of samples in the window.
    pub fn samples(&self) -> usize {
        self.frame_ms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn fps_averages_the_window() {
        let mut perf = PerfStats::default();
        assert_relative_eq!(perf.fps(), 0.0);
        perf.push(10.0);
        perf.push(30.0);
        assert_relative_eq!(perf.fps(), 50.0);
    }

    #[test]
    fn window_is_bounded_and_ignores_garbage() {
        let mut perf = PerfStats::default();
        for _ in 0..500 {
            perf.push(16.0);
        }
        perf.push(f32::NAN);
        perf.push(0.0);
        assert_eq!(perf.samples(), 120);
    }
}
