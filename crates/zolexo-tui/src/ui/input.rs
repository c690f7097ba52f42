//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{can_add_password_char, can_add_phone_char, App, AppState, LoginFocus, Screen};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle alert overlay
    if matches!(app.state, AppState::ShowingAlert) {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.dismiss_alert();
        }
        return Ok(false);
    }

    match app.screen {
        Screen::Splash => {
            if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                app.shutdown();
                return Ok(true);
            }
            Ok(false)
        }
        Screen::Login => Ok(handle_login_input(app, key)),
        Screen::Home => handle_home_input(app, key).await,
    }
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> bool {
    if key.code == KeyCode::Esc {
        // Quit if on login screen
        app.shutdown();
        return true;
    }

    let Some(view) = app.login.as_mut() else {
        return false;
    };

    if key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL) {
        view.toggle_password_visibility();
        return false;
    }

    match key.code {
        KeyCode::Down | KeyCode::Tab => {
            view.focus = view.focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            view.focus = view.focus.prev();
        }
        KeyCode::Enter => match view.focus {
            LoginFocus::Phone => view.focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                view.focus = LoginFocus::Button;
                app.submit_login();
            }
        },
        KeyCode::Backspace => match view.focus {
            LoginFocus::Phone => {
                view.phone_number.pop();
            }
            LoginFocus::Password => {
                view.password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match view.focus {
            LoginFocus::Phone => {
                if can_add_phone_char(view.phone_number.chars().count(), c) {
                    view.phone_number.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(view.password.chars().count(), c) {
                    view.password.push(c);
                }
            }
            LoginFocus::Button => {
                // Ignore character input on button
            }
        },
        _ => {}
    }
    false
}

async fn handle_home_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.shutdown();
            return Ok(true);
        }
        KeyCode::Char('l') | KeyCode::Char('L') => {
            app.logout().await;
        }
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use zolexo_core::{AuthClient, Config, FixedDeviceId};

    fn login_app(dir: &TempDir) -> App {
        let config = Config {
            storage_path: Some(dir.path().join("storage.json")),
            ..Config::default()
        };
        let session = App::open_session(&config).unwrap();
        let client = AuthClient::new("http://127.0.0.1:9").unwrap();
        let mut app = App::with_parts(config, session, client, Box::new(FixedDeviceId("dev-1".into())));
        app.screen = Screen::Login;
        app.login = Some(crate::app::LoginView::mount(&FixedDeviceId("dev-1".into())));
        app
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            handle_input(app, press(KeyCode::Char(c))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_typing_fills_focused_field() {
        let dir = TempDir::new().unwrap();
        let mut app = login_app(&dir);

        type_str(&mut app, "9998887776").await;
        handle_input(&mut app, press(KeyCode::Tab)).await.unwrap();
        type_str(&mut app, "secret").await;
        handle_input(&mut app, press(KeyCode::Backspace)).await.unwrap();

        let view = app.login.as_ref().unwrap();
        assert_eq!(view.phone_number, "9998887776");
        assert_eq!(view.password, "secre");
        assert_eq!(view.focus, LoginFocus::Password);
    }

    #[tokio::test]
    async fn test_enter_on_phone_moves_to_password() {
        let dir = TempDir::new().unwrap();
        let mut app = login_app(&dir);
        handle_input(&mut app, press(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.login.as_ref().unwrap().focus, LoginFocus::Password);
        assert!(!app.login.as_ref().unwrap().is_submitting());
    }

    #[tokio::test]
    async fn test_ctrl_r_toggles_password_visibility() {
        let dir = TempDir::new().unwrap();
        let mut app = login_app(&dir);
        let ctrl_r = || KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);

        handle_input(&mut app, ctrl_r()).await.unwrap();
        assert!(app.login.as_ref().unwrap().show_password);
        // Toggle key is not typed into the field
        assert!(app.login.as_ref().unwrap().phone_number.is_empty());

        handle_input(&mut app, ctrl_r()).await.unwrap();
        assert!(!app.login.as_ref().unwrap().show_password);
    }

    #[tokio::test]
    async fn test_esc_quits_from_login() {
        let dir = TempDir::new().unwrap();
        let mut app = login_app(&dir);
        assert!(handle_input(&mut app, press(KeyCode::Esc)).await.unwrap());
        assert_eq!(app.state, AppState::Quitting);
        assert!(app.login.is_none());
    }

    #[tokio::test]
    async fn test_alert_swallows_keys_until_dismissed() {
        let dir = TempDir::new().unwrap();
        let mut app = login_app(&dir);
        app.show_alert(crate::app::Alert::error("Invalid credentials"));

        handle_input(&mut app, press(KeyCode::Char('9'))).await.unwrap();
        assert!(app.login.as_ref().unwrap().phone_number.is_empty());

        handle_input(&mut app, press(KeyCode::Enter)).await.unwrap();
        assert_eq!(app.state, AppState::Normal);
        assert!(app.alert.is_none());
    }
}
