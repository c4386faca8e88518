use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Action {
    Quit,
    ToggleGrid,
    ToggleInvert,
    TogglePause,
    ToggleHud,
    SpeedUp,
    SlowDown,
    RaiseDivisor,
    LowerDivisor,
    Reseed,
    Resized(u16, u16),
}

/// Drains everything queued on the terminal without blocking the frame.
pub(crate) fn collect_actions() -> anyhow::Result<Vec<Action>> {
    let mut out = Vec::new();
    while event::poll(Duration::ZERO)? {
        if let Some(a) = map_event(event::read()?) {
            out.push(a);
            if out.len() >= 64 {
                break;
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_event(ev: Event) -> Option<Action> {
    match ev {
        Event::Key(k) if k.kind != KeyEventKind::Release => map_key(k),
        Event::Resize(c, r) => Some(Action::Resized(c, r)),
        _ => None,
    }
}

fn map_key(k: KeyEvent) -> Option<Action> {
    if k.modifiers.contains(KeyModifiers::CONTROL) {
        return match k.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    match k.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
        KeyCode::Char('g') | KeyCode::Char('G') => Some(Action::ToggleGrid),
        KeyCode::Char('i') | KeyCode::Char('I') => Some(Action::ToggleInvert),
        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleHud),
        KeyCode::Char('f') | KeyCode::Char('F') => Some(Action::SpeedUp),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(Action::SlowDown),
        // o raises, p lowers
        KeyCode::Char('o') | KeyCode::Char('O') => Some(Action::RaiseDivisor),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::LowerDivisor),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Reseed),
        _ => None,
    }
}
