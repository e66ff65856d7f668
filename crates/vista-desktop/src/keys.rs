// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! winit keys to viewer input.

use vista_viewer::Key;
use winit::keyboard::{Key as WinitKey, NamedKey};

/// What a key press means to the desktop host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    /// Forward to the controller's key router.
    Viewer(Key),
    /// Confirm the exit prompt.
    Confirm,
    /// Dismiss the exit prompt.
    Dismiss,
}

pub fn map_key(key: &WinitKey) -> Option<KeyInput> {
    let input = match key {
        WinitKey::Named(NamedKey::ArrowUp) => KeyInput::Viewer(Key::ArrowUp),
        WinitKey::Named(NamedKey::ArrowDown) => KeyInput::Viewer(Key::ArrowDown),
        WinitKey::Named(NamedKey::ArrowLeft) => KeyInput::Viewer(Key::ArrowLeft),
        WinitKey::Named(NamedKey::ArrowRight) => KeyInput::Viewer(Key::ArrowRight),
        WinitKey::Named(NamedKey::Escape) => KeyInput::Viewer(Key::Escape),
        WinitKey::Named(NamedKey::Enter) => KeyInput::Confirm,
        WinitKey::Named(NamedKey::Backspace) => KeyInput::Dismiss,
        WinitKey::Character(c) => KeyInput::Viewer(Key::Other(c.to_string())),
        _ => return None,
    };
    Some(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_escape_reach_the_router() {
        assert_eq!(
            map_key(&WinitKey::Named(NamedKey::ArrowLeft)),
            Some(KeyInput::Viewer(Key::ArrowLeft))
        );
        assert_eq!(
            map_key(&WinitKey::Named(NamedKey::Escape)),
            Some(KeyInput::Viewer(Key::Escape))
        );
    }

    #[test]
    fn prompt_keys_are_separate() {
        assert_eq!(
            map_key(&WinitKey::Named(NamedKey::Enter)),
            Some(KeyInput::Confirm)
        );
        assert_eq!(
            map_key(&WinitKey::Named(NamedKey::Backspace)),
            Some(KeyInput::Dismiss)
        );
        assert_eq!(map_key(&WinitKey::Named(NamedKey::Tab)), None);
    }

    #[test]
    fn characters_pass_through() {
        assert_eq!(
            map_key(&WinitKey::Character("q".into())),
            Some(KeyInput::Viewer(Key::Other("q".into())))
        );
    }
}
