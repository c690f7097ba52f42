use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{Alert, App, AppState, LoginFocus, LoginView, Screen};

use super::styles;

/// Company name shown at the top of the login screen
const BRAND_NAME: &str = "ZOLEXOMART PVT LTD";

/// Width of the text inside a form field
const FIELD_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App) {
    match app.screen {
        Screen::Splash => render_splash(frame),
        Screen::Login => {
            if let Some(ref view) = app.login {
                render_login(frame, view);
            }
        }
        Screen::Home => render_home(frame, app),
    }

    // Render overlays
    if matches!(app.state, AppState::ShowingAlert) {
        if let Some(ref alert) = app.alert {
            render_alert_overlay(frame, alert);
        }
    }
}

fn render_splash(frame: &mut Frame) {
    let area = centered_rect_fixed(30, 5, frame.area());
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("{:^28}", "Zolexomart"), styles::title_style())),
        Line::from(Span::styled(format!("{:^28}", "Loading..."), styles::muted_style())),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Format a form field, padding to a fixed width and keeping the tail visible
fn field_text(value: &str, focused: bool) -> String {
    let cursor = if focused { "▌" } else { " " };
    let count = value.chars().count();
    let visible: String = if count > FIELD_WIDTH {
        value.chars().skip(count - FIELD_WIDTH).collect()
    } else {
        value.to_string()
    };
    format!("{:<width$}{}", visible, cursor, width = FIELD_WIDTH)
}

fn render_login(frame: &mut Frame, view: &LoginView) {
    let area = centered_rect_fixed(46, 16, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("{:^44}", BRAND_NAME), styles::title_style())),
        Line::from(Span::styled(
            format!("{:^44}", "Sign in to your account"),
            styles::subtitle_style(),
        )),
        Line::from(""),
    ];

    // Phone number field
    let phone_focused = view.focus == LoginFocus::Phone;
    let phone_style = if phone_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Phone    [", styles::muted_style()),
        Span::styled(field_text(&view.phone_number, phone_focused), phone_style),
        Span::styled("]", styles::muted_style()),
    ]));
    lines.push(Line::from(""));

    // Password field, masked unless toggled
    let password_focused = view.focus == LoginFocus::Password;
    let password_style = if password_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let password_display = if view.show_password {
        view.password.clone()
    } else {
        "*".repeat(view.password.chars().count())
    };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Password [", styles::muted_style()),
        Span::styled(field_text(&password_display, password_focused), password_style),
        Span::styled("]", styles::muted_style()),
    ]));
    let toggle_hint = if view.show_password {
        "Ctrl+R hide password"
    } else {
        "Ctrl+R show password"
    };
    lines.push(Line::from(Span::styled(
        format!("{:>42}", toggle_hint),
        styles::muted_style(),
    )));
    lines.push(Line::from(""));

    // Sign in button
    let button_focused = view.focus == LoginFocus::Button;
    let button_label = if view.is_submitting() {
        " Signing in... "
    } else if button_focused {
        " ▶ Sign In ◀ "
    } else {
        "   Sign In   "
    };
    lines.push(Line::from(vec![
        Span::raw(" ".repeat(44usize.saturating_sub(button_label.chars().count()) / 2)),
        Span::styled(button_label, styles::button_style(button_focused)),
    ]));
    lines.push(Line::from(""));

    // Key hints
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("[Tab]", styles::help_key_style()),
        Span::styled(" next  ", styles::muted_style()),
        Span::styled("[Enter]", styles::help_key_style()),
        Span::styled(" submit  ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" quit", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_home(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(5),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    let title = Paragraph::new(Line::from(Span::styled("  Zolexomart", styles::title_style())))
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(styles::muted_style()),
        );
    frame.render_widget(title, chunks[0]);

    let since = app
        .signed_in_at
        .map(|t| format!("Signed in since {}", t.format("%H:%M")))
        .unwrap_or_else(|| "Signed in".to_string());

    let body = vec![
        Line::from(""),
        Line::from(Span::styled("  You are signed in.", styles::highlight_style())),
        Line::from(""),
        Line::from(Span::styled(format!("  {}", since), styles::list_item_style())),
    ];
    frame.render_widget(Paragraph::new(body), chunks[1]);

    render_status_bar(frame, app, chunks[2]);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = format!(" {} ", app.config.base_url);
    let right_text = " [l]ogout | [q]uit ";

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn render_alert_overlay(frame: &mut Frame, alert: &Alert) {
    let area = centered_rect_fixed(46, 8, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(format!(" {}", alert.message), styles::error_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Press ", styles::muted_style()),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" to dismiss", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .title(Span::styled(format!(" {} ", alert.title), styles::error_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_text_pads_and_marks_focus() {
        assert_eq!(field_text("999", true), format!("{:<24}▌", "999"));
        assert_eq!(field_text("", false), format!("{:<24} ", ""));
    }

    #[test]
    fn test_field_text_keeps_tail_of_long_input() {
        let long = "0123456789".repeat(3);
        let shown = field_text(&long, false);
        assert!(shown.starts_with("6789"));
        assert!(shown.trim_end().ends_with("0123456789"));
    }

    #[test]
    fn test_centered_rect_fixed_clamps_to_area() {
        let area = Rect::new(0, 0, 20, 10);
        let rect = centered_rect_fixed(46, 16, area);
        assert_eq!(rect, Rect::new(0, 0, 20, 10));

        let rect = centered_rect_fixed(10, 4, Rect::new(0, 0, 30, 20));
        assert_eq!(rect, Rect::new(10, 8, 10, 4));
    }
}
