use super::mode::AppMode;
use crossterm::event::KeyCode;

/// Application events
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AppEvent {
    MoveUp,
    MoveDown,
    Top,
    Bottom,
    OpenPreview,
    ClosePreview,
    Delete,
    Capture,
    Reload,
    Quit,
    None,
}

/// Map a key press to an event for the given mode
pub fn key_to_event(mode: AppMode, code: KeyCode) -> AppEvent {
    match (mode, code) {
        (_, KeyCode::Char('j') | KeyCode::Down) => AppEvent::MoveDown,
        (_, KeyCode::Char('k') | KeyCode::Up) => AppEvent::MoveUp,
        (_, KeyCode::Char('g') | KeyCode::Home) => AppEvent::Top,
        (_, KeyCode::Char('G') | KeyCode::End) => AppEvent::Bottom,
        (_, KeyCode::Char('d') | KeyCode::Delete) => AppEvent::Delete,
        (_, KeyCode::Char('c')) => AppEvent::Capture,
        (_, KeyCode::Char('r')) => AppEvent::Reload,

        (AppMode::List, KeyCode::Enter | KeyCode::Char(' ')) => AppEvent::OpenPreview,
        (AppMode::List, KeyCode::Char('q')) => AppEvent::Quit,

        (AppMode::Preview, KeyCode::Esc | KeyCode::Char('q')) => AppEvent::ClosePreview,
        (AppMode::Preview, KeyCode::Enter | KeyCode::Char(' ')) => AppEvent::ClosePreview,

        _ => AppEvent::None,
    }
}
