use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// A keystroke as the typing engine sees it.
///
/// Terminal events are classified exactly once, here, so nothing downstream
/// has to inspect raw key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    /// Escape: abandons the current race, or quits when no race is running.
    Cancel,
    Enter,
    Tab,
    Left,
    Right,
    Resize,
    /// Ctrl-C: leaves the program no matter what.
    Quit,
    Unknown,
}

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        if event.kind == KeyEventKind::Release {
            return Key::Unknown;
        }

        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);
        match event.code {
            KeyCode::Char('c') if ctrl => Key::Quit,
            KeyCode::Char('h') if ctrl => Key::Backspace,
            KeyCode::Char(_) if ctrl => Key::Unknown,
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Esc => Key::Cancel,
            KeyCode::Enter => Key::Enter,
            KeyCode::Tab => Key::Tab,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            _ => Key::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Key {
        Key::from(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_plain_characters() {
        assert_eq!(press(KeyCode::Char('a'), KeyModifiers::NONE), Key::Char('a'));
        assert_eq!(press(KeyCode::Char('A'), KeyModifiers::SHIFT), Key::Char('A'));
        assert_eq!(press(KeyCode::Char('é'), KeyModifiers::NONE), Key::Char('é'));
        assert_eq!(press(KeyCode::Char(' '), KeyModifiers::NONE), Key::Char(' '));
    }

    #[test]
    fn test_named_keys() {
        assert_eq!(press(KeyCode::Backspace, KeyModifiers::NONE), Key::Backspace);
        assert_eq!(press(KeyCode::Esc, KeyModifiers::NONE), Key::Cancel);
        assert_eq!(press(KeyCode::Enter, KeyModifiers::NONE), Key::Enter);
        assert_eq!(press(KeyCode::Tab, KeyModifiers::NONE), Key::Tab);
        assert_eq!(press(KeyCode::Left, KeyModifiers::NONE), Key::Left);
        assert_eq!(press(KeyCode::Right, KeyModifiers::NONE), Key::Right);
        assert_eq!(press(KeyCode::F(5), KeyModifiers::NONE), Key::Unknown);
    }

    #[test]
    fn test_control_chords() {
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::CONTROL), Key::Quit);
        assert_eq!(
            press(KeyCode::Char('h'), KeyModifiers::CONTROL),
            Key::Backspace
        );
        assert_eq!(press(KeyCode::Char('x'), KeyModifiers::CONTROL), Key::Unknown);
    }

    #[test]
    fn test_release_is_ignored() {
        let mut event = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        event.kind = KeyEventKind::Release;
        assert_eq!(Key::from(event), Key::Unknown);
    }
}
