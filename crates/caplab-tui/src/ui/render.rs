use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, Focus};

use super::styles;

/// Visible width of the text fields in the login box
const FIELD_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Page
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);

    // Exactly one of the two is visible after a load
    if !app.screen.login_box_hidden {
        render_login_box(frame, app, chunks[1]);
    }
    if !app.screen.sign_out_hidden {
        render_signed_in(frame, app, chunks[1]);
    }

    render_status_bar(frame, app, chunks[2]);

    match app.state {
        AppState::Alerting => render_alert_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  CapLab";
    let state_hint = if app.auth_state.is_authenticated() {
        "signed in"
    } else {
        "signed out"
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + state_hint.len() + 2),
        )),
        Span::styled(state_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

/// Show the tail of a value that overflows its field
fn fit_field(value: &str) -> String {
    let len = value.chars().count();
    let shown: String = value.chars().skip(len.saturating_sub(FIELD_WIDTH)).collect();
    format!("{:<width$}", shown, width = FIELD_WIDTH)
}

fn button<'a>(label: &'a str, focused: bool) -> Vec<Span<'a>> {
    let text = if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    vec![
        Span::raw("["),
        Span::styled(text, styles::field_style(focused)),
        Span::raw("]"),
    ]
}

fn render_login_box(frame: &mut Frame, app: &App, area: Rect) {
    let area = centered_rect_fixed(46, 11, area);

    let mut lines = vec![Line::from("")];

    let email_focused = app.focus == Focus::Email;
    let cursor = if email_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Email:    [", styles::muted_style()),
        Span::styled(
            format!("{}{}", fit_field(&app.screen.email), cursor),
            styles::field_style(email_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    let password_focused = app.focus == Focus::Password;
    let masked = "*".repeat(app.screen.password.chars().count());
    let cursor = if password_focused { "▌" } else { "" };
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Password: [", styles::muted_style()),
        Span::styled(
            format!("{}{}", fit_field(&masked), cursor),
            styles::field_style(password_focused),
        ),
        Span::styled("]", styles::muted_style()),
    ]));

    lines.push(Line::from(""));

    let mut buttons = vec![Span::raw("     ")];
    buttons.extend(button("Sign up", app.focus == Focus::SignUp));
    buttons.push(Span::raw("  "));
    buttons.extend(button("Login", app.focus == Focus::Login));
    lines.push(Line::from(buttons));

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Tab to move, Enter to press",
        styles::muted_style(),
    )));

    let block = Block::default()
        .title(Span::styled(" Sign in ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_signed_in(frame: &mut Frame, app: &App, area: Rect) {
    let area = centered_rect_fixed(46, 8, area);

    let who = app
        .config
        .last_email
        .as_deref()
        .map(|email| format!("  Signed in as {}", email))
        .unwrap_or_else(|| "  Signed in".to_string());

    let mut sign_out = vec![Span::raw("            ")];
    sign_out.extend(button("Sign out", app.focus == Focus::SignOut));

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(who, styles::success_style())),
        Line::from(""),
        Line::from(sign_out),
    ];

    let block = Block::default()
        .title(Span::styled(" Session ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = "[Tab] move | [Enter] press | [Esc] quit";

    let left_text = if app.in_flight > 0 {
        " Working... ".to_string()
    } else if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else {
        String::new()
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::highlight_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);

    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn render_alert_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(52, 9, frame.area());
    frame.render_widget(Clear, area);

    let message = app.alert.as_deref().unwrap_or_default();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {}", message), styles::error_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" to dismiss", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .title(Span::styled(" Alert ", styles::error_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style())
        .style(Style::default());

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style())
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
