//! Keyboard input handling for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::runtime::App;
use crate::config::ScenarioConfig;

/// Maps a key event to an application action.
///
/// Guards on [`KeyEventKind::Press`] to avoid double-fire on some terminals.
/// Digits select presets in [`ScenarioConfig::PRESETS`] order.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit = true,
        KeyCode::Char(' ') => app.toggle_pause(),
        KeyCode::Char('+' | '=') | KeyCode::Right => app.speed_up(),
        KeyCode::Char('-') | KeyCode::Left => app.speed_down(),
        KeyCode::Char(d @ '1'..='9') => {
            let idx = d as usize - '1' as usize;
            if let Some(name) = ScenarioConfig::PRESETS.get(idx) {
                app.switch_preset(name);
            }
        }
        KeyCode::Char('r') => app.restart(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventState;

    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn digits_switch_presets() {
        let mut app = App::new(ScenarioConfig::baseline()).unwrap();
        handle_key(&mut app, press(KeyCode::Char('5')));
        assert_eq!(app.preset_name, "heatwave");
        handle_key(&mut app, press(KeyCode::Char('9')));
        assert_eq!(app.preset_name, "heatwave");
    }

    #[test]
    fn release_events_are_ignored() {
        let mut app = App::new(ScenarioConfig::baseline()).unwrap();
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        handle_key(&mut app, key);
        assert!(!app.quit);
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(app.quit);
    }
}
