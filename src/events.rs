use crate::app::{App, InputMode};
use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, PartialEq, Eq)]
pub enum EventAction {
    Refresh,
    Quit,
    None,
}

pub fn handle_key_event(app: &mut App, key: KeyEvent) -> EventAction {
    app.modifiers.update(key.modifiers);
    app.request_redraw();

    if app.modifiers.ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')) {
        return EventAction::Quit;
    }

    match app.input {
        InputMode::Search => handle_search_key(app, key.code),
        InputMode::Amount(_) => handle_amount_key(app, key.code),
        InputMode::Normal => handle_normal_key(app, key.code),
    }
}

fn handle_search_key(app: &mut App, key_code: KeyCode) -> EventAction {
    match key_code {
        KeyCode::Esc => app.clear_search(),
        KeyCode::Enter => app.close_popup(),
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Up => app.move_selection(-1),
        KeyCode::Down => app.move_selection(1),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
    EventAction::None
}

fn handle_amount_key(app: &mut App, key_code: KeyCode) -> EventAction {
    match key_code {
        KeyCode::Esc | KeyCode::Enter => app.close_popup(),
        KeyCode::Tab | KeyCode::BackTab => app.toggle_amount_side(),
        KeyCode::Backspace => app.amount_backspace(),
        KeyCode::Char(c) => app.amount_key(c),
        _ => {}
    }
    EventAction::None
}

fn handle_normal_key(app: &mut App, key_code: KeyCode) -> EventAction {
    match key_code {
        KeyCode::Left => app.move_view(-1),
        KeyCode::Right | KeyCode::Tab => app.move_view(1),
        KeyCode::Up => app.move_selection(-1),
        KeyCode::Down => app.move_selection(1),
        KeyCode::Enter => app.open_amount_input(),
        KeyCode::Esc => app.clear_search(),
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('s') | KeyCode::Char('S') => app.cycle_sort(),
        KeyCode::Char('h') | KeyCode::Char('H') => app.toggle_dust(),
        KeyCode::Char('r') | KeyCode::Char('R') => return EventAction::Refresh,
        KeyCode::Char('q') | KeyCode::Char('Q') => return EventAction::Quit,
        _ => {}
    }
    EventAction::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{SortKey, View};
    use crate::config::AppMode;
    use crate::memo::TimerQueue;
    use crate::settings::Settings;
    use crossterm::event::KeyModifiers;
    use std::time::Duration;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn app() -> App {
        App::with_parts(
            AppMode::Full,
            Some("0xabc".into()),
            Settings::default(),
            Duration::from_millis(300),
            TimerQueue::new(),
        )
    }

    fn press(app: &mut App, code: KeyCode) -> EventAction {
        handle_key_event(app, key(code, KeyModifiers::NONE))
    }

    #[test]
    fn ctrl_c_quits_from_any_mode() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(
            handle_key_event(&mut app, key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            EventAction::Quit
        );
    }

    #[test]
    fn search_mode_captures_letters() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        for ch in "qrs".chars() {
            assert_eq!(press(&mut app, KeyCode::Char(ch)), EventAction::None);
        }
        assert_eq!(app.search_query, "qrs");
        assert_eq!(app.settings.sort, SortKey::Supply);

        press(&mut app, KeyCode::Esc);
        assert!(app.search_query.is_empty());
        assert!(matches!(app.input, InputMode::Normal));
    }

    #[test]
    fn normal_mode_shortcuts() {
        let mut app = app();
        assert_eq!(press(&mut app, KeyCode::Char('r')), EventAction::Refresh);
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.settings.sort, SortKey::SupplyApy);
        press(&mut app, KeyCode::Char('h'));
        assert!(!app.settings.hide_dust);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.current_view(), View::Vaults);
        assert_eq!(press(&mut app, KeyCode::Char('q')), EventAction::Quit);
    }

    #[test]
    fn modifiers_track_latest_event() {
        let mut app = app();
        handle_key_event(&mut app, key(KeyCode::Down, KeyModifiers::SHIFT | KeyModifiers::ALT));
        assert!(app.modifiers.shift && app.modifiers.alt && !app.modifiers.ctrl);
        press(&mut app, KeyCode::Down);
        assert!(!app.modifiers.shift && !app.modifiers.alt);
    }
}
