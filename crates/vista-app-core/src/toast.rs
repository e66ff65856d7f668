// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Short-lived user-facing messages (load failures, rejected files).
//!
//! Repeating the same message while it is still on screen extends it and bumps
//! its repeat count instead of stacking copies.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    /// Informational note.
    Info,
    /// Something the user did was not accepted.
    Warn,
    /// The viewer failed to do what was asked.
    Error,
}

/// Identifier for a toast entry.
pub type ToastId = u64;

/// One queued message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Stable identifier.
    pub id: ToastId,
    /// Severity.
    pub kind: ToastKind,
    /// Short title line.
    pub title: String,
    /// Optional detail line.
    pub body: Option<String>,
    /// How many times this message was pushed while visible.
    pub repeats: u32,
    /// When the toast stops being visible.
    pub expires: Instant,
}

impl Toast {
    /// Whether the toast is still on screen at `now`.
    pub fn is_live(&self, now: Instant) -> bool {
        now < self.expires
    }

    /// Title with a repeat marker, e.g. `Failed to load model (x3)`.
    pub fn label(&self) -> String {
        if self.repeats > 1 {
            format!("{} (x{})", self.title, self.repeats)
        } else {
            self.title.clone()
        }
    }
}

/// Bounded toast queue; the oldest entry is evicted first.
#[derive(Debug)]
pub struct ToastService {
    queue: VecDeque<Toast>,
    max: usize,
    next_id: ToastId,
}

impl ToastService {
    /// Queue holding at most `max` toasts (at least one).
    pub fn new(max: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            max: max.max(1),
            next_id: 1,
        }
    }

    /// Show a message for `ttl`. A live toast with the same kind, title and
    /// body is extended instead, and its id is returned.
    pub fn push(
        &mut self,
        kind: ToastKind,
        title: impl Into<String>,
        body: Option<String>,
        ttl: Duration,
        now: Instant,
    ) -> ToastId {
        let title = title.into();
        let expires = now + ttl;
        if let Some(live) = self
            .queue
            .iter_mut()
            .find(|t| t.is_live(now) && t.kind == kind && t.title == title && t.body == body)
        {
            live.repeats += 1;
            live.expires = live.expires.max(expires);
            return live.id;
        }

        let id = self.next_id;
        self.next_id += 1;
        if self.queue.len() == self.max {
            self.queue.pop_front();
        }
        self.queue.push_back(Toast {
            id,
            kind,
            title,
            body,
            repeats: 1,
            expires,
        });
        id
    }

    /// Remove a toast early. Returns false if it was already gone.
    pub fn dismiss(&mut self, id: ToastId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|t| t.id != id);
        self.queue.len() != before
    }

    /// Drop toasts whose time is up.
    pub fn retain_visible(&mut self, now: Instant) {
        self.queue.retain(|t| t.is_live(now));
    }

    /// Live toasts at `now`, oldest first.
    pub fn active(&self, now: Instant) -> impl Iterator<Item = &Toast> + '_ {
        self.queue.iter().filter(move |t| t.is_live(now))
    }

    /// Most recently queued toast of `kind`, live or not.
    pub fn latest(&self, kind: ToastKind) -> Option<&Toast> {
        self.queue.iter().rev().find(|t| t.kind == kind)
    }

    /// Number of queued toasts.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True when no toast is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(5);

    #[test]
    fn repeats_extend_the_live_toast() {
        let mut svc = ToastService::new(8);
        let now = Instant::now();
        let a = svc.push(ToastKind::Error, "Failed", None, TTL, now);
        let later = now + Duration::from_secs(3);
        let b = svc.push(ToastKind::Error, "Failed", None, TTL, later);
        assert_eq!(a, b);
        assert_eq!(svc.len(), 1);

        let toast = svc.latest(ToastKind::Error).cloned();
        assert_eq!(toast.as_ref().map(|t| t.repeats), Some(2));
        assert_eq!(toast.as_ref().map(Toast::label).as_deref(), Some("Failed (x2)"));
        assert_eq!(svc.active(now + Duration::from_secs(7)).count(), 1);
    }

    #[test]
    fn expired_message_starts_fresh() {
        let mut svc = ToastService::new(8);
        let now = Instant::now();
        let a = svc.push(ToastKind::Warn, "w", None, Duration::from_millis(10), now);
        let b = svc.push(ToastKind::Warn, "w", None, TTL, now + Duration::from_millis(20));
        assert_ne!(a, b);
    }

    #[test]
    fn queue_is_bounded() {
        let mut svc = ToastService::new(2);
        let now = Instant::now();
        for i in 0..3 {
            svc.push(ToastKind::Info, format!("t{i}"), None, TTL, now);
        }
        let titles: Vec<_> = svc.active(now).map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["t1", "t2"]);
    }

    #[test]
    fn expired_toasts_drop_out() {
        let mut svc = ToastService::new(4);
        let now = Instant::now();
        svc.push(ToastKind::Warn, "w", None, Duration::from_millis(10), now);
        let later = now + Duration::from_millis(20);
        assert_eq!(svc.active(later).count(), 0);
        assert!(svc.latest(ToastKind::Warn).is_some());
        svc.retain_visible(later);
        assert!(svc.is_empty());
    }

    #[test]
    fn dismiss_removes_once() {
        let mut svc = ToastService::new(4);
        let id = svc.push(ToastKind::Info, "i", None, TTL, Instant::now());
        assert!(svc.dismiss(id));
        assert!(!svc.dismiss(id));
    }
}
