use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{can_add_email_char, can_add_password_char, App, AppState, Focus};

/// Handle a key press. Returns `true` when the app should exit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::Alerting => {
            // The alert blocks everything else until dismissed
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                app.dismiss_alert();
            }
            Ok(false)
        }
        AppState::ConfirmingQuit => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                app.state = AppState::Quitting;
                Ok(true)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
                Ok(false)
            }
            _ => Ok(false),
        },
        AppState::Quitting => Ok(true),
        AppState::Normal => {
            handle_page_input(app, key);
            Ok(false)
        }
    }
}

fn handle_page_input(app: &mut App, key: KeyEvent) {
    let signed_in = app.is_signed_in_view();

    match key.code {
        KeyCode::Esc => app.state = AppState::ConfirmingQuit,
        KeyCode::Down | KeyCode::Tab => app.focus = app.focus.next(signed_in),
        KeyCode::Up | KeyCode::BackTab => app.focus = app.focus.prev(signed_in),
        KeyCode::Enter => app.press(),
        KeyCode::Backspace => match app.focus {
            Focus::Email => {
                app.screen.email.pop();
            }
            Focus::Password => {
                app.screen.password.pop();
            }
            _ => {}
        },
        KeyCode::Char(c) => match app.focus {
            Focus::Email => {
                if can_add_email_char(app.screen.email.chars().count(), c) {
                    app.screen.email.push(c);
                }
            }
            Focus::Password => {
                if can_add_password_char(app.screen.password.chars().count(), c) {
                    app.screen.password.push(c);
                }
            }
            // Typing is text input only inside the fields
            _ if c == 'q' => app.state = AppState::ConfirmingQuit,
            _ => {}
        },
        _ => {}
    }
}
