// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pure state transitions for the exit confirmation prompt.

/// Prompt visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExitPrompt {
    /// Not on screen.
    #[default]
    Hidden,
    /// Waiting for confirm or dismiss.
    Shown,
    /// Confirmed; the viewer is retired.
    Disposed,
}

/// Inputs to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptEvent {
    /// Escape or the exit button.
    Request,
    /// "Stay".
    Dismiss,
    /// "Leave".
    Confirm,
}

/// Side effects the controller carries out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptEffect {
    /// Tell the host to show the prompt.
    Show,
    /// Tell the host to hide the prompt.
    Hide,
    /// Dispose the viewer.
    Dispose,
    /// Tell the host to leave the viewer page.
    NavigateAway,
}

/// Apply `ev` to `state`.
pub fn reduce(state: ExitPrompt, ev: PromptEvent) -> (ExitPrompt, Vec<PromptEffect>) {
    match (state, ev) {
        (ExitPrompt::Hidden, PromptEvent::Request) => (ExitPrompt::Shown, vec![PromptEffect::Show]),
        (ExitPrompt::Shown, PromptEvent::Dismiss) => (ExitPrompt::Hidden, vec![PromptEffect::Hide]),
        // Dispose runs before the host is told to leave.
        (ExitPrompt::Shown, PromptEvent::Confirm) => (
            ExitPrompt::Disposed,
            vec![PromptEffect::Dispose, PromptEffect::NavigateAway],
        ),
        (state, _) => (state, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_then_dismiss() {
        let (s, fx) = reduce(ExitPrompt::Hidden, PromptEvent::Request);
        assert_eq!(s, ExitPrompt::Shown);
        assert_eq!(fx, [PromptEffect::Show]);
        let (s, fx) = reduce(s, PromptEvent::Dismiss);
        assert_eq!(s, ExitPrompt::Hidden);
        assert_eq!(fx, [PromptEffect::Hide]);
    }

    #[test]
    fn confirm_disposes_then_navigates() {
        let (s, fx) = reduce(ExitPrompt::Shown, PromptEvent::Confirm);
        assert_eq!(s, ExitPrompt::Disposed);
        assert_eq!(fx, [PromptEffect::Dispose, PromptEffect::NavigateAway]);
    }

    #[test]
    fn confirm_without_prompt_is_ignored() {
        let (s, fx) = reduce(ExitPrompt::Hidden, PromptEvent::Confirm);
        assert_eq!(s, ExitPrompt::Hidden);
        assert!(fx.is_empty());
    }

    #[test]
    fn disposed_is_terminal() {
        for ev in [PromptEvent::Request, PromptEvent::Dismiss, PromptEvent::Confirm] {
            let (s, fx) = reduce(ExitPrompt::Disposed, ev);
            assert_eq!(s, ExitPrompt::Disposed);
            assert!(fx.is_empty());
        }
    }

    #[test]
    fn repeated_request_keeps_prompt_shown() {
        let (s, fx) = reduce(ExitPrompt::Shown, PromptEvent::Request);
        assert_eq!(s, ExitPrompt::Shown);
        assert!(fx.is_empty());
    }
}
