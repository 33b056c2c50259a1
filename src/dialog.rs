use crossterm::event::KeyCode;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::{modal::TextInput, theme::THEME};

// ============================================================================
// Dialog Result
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResult {
    Accept,
    Reject,
    Pending,
}

/// Handle common yes/no key bindings for dialogs.
/// Returns Accept for Y/y/Enter, Reject for N/n/Esc, Pending otherwise.
pub fn handle_yes_no_keys(key: KeyCode) -> DialogResult {
    match key {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => DialogResult::Accept,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => DialogResult::Reject,
        _ => DialogResult::Pending,
    }
}

// ============================================================================
// Dialog Frame Rendering
// ============================================================================

/// Renders the common dialog frame: shadow, clear, bordered block with title.
/// Returns the inner area (inside the block) for content rendering.
pub fn render_dialog_frame(frame: &mut Frame, area: Rect, title: &str, border_color: Color) -> Rect {
    // Shadow, clipped to the screen
    let screen = frame.area();
    let shadow_area = Rect {
        x: area.x.saturating_add(2),
        y: area.y.saturating_add(1),
        width: area.width,
        height: area.height,
    }
    .intersection(screen);
    frame.render_widget(
        Block::default().style(Style::default().bg(THEME.dialog_shadow)),
        shadow_area,
    );

    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(THEME.dialog_bg));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    inner
}

// ============================================================================
// Buttons and inputs
// ============================================================================

/// Renders a centered row of buttons, e.g. `[Y]es` `[N]o`
pub fn render_buttons(frame: &mut Frame, area: Rect, labels: &[&str]) {
    let button_style = Style::default()
        .fg(THEME.dialog_button_fg)
        .bg(THEME.dialog_button_bg);

    let mut spans = Vec::with_capacity(labels.len() * 2);
    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(format!(" {} ", label), button_style));
    }

    let row = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(row, area);
}

pub fn render_yes_no_buttons(frame: &mut Frame, area: Rect) {
    render_buttons(frame, area, &["[Y]es", "[N]o"]);
}

/// What an input line shows: the text (or bullets) with a block cursor.
/// Long input scrolls so the cursor stays within `width`.
pub fn input_display(input: &TextInput, masked: bool, width: usize) -> String {
    let chars: Vec<char> = if masked {
        vec!['•'; input.text().chars().count()]
    } else {
        input.text().chars().collect()
    };

    let cursor = input.cursor().min(chars.len());
    let mut shown: Vec<char> = chars[..cursor].to_vec();
    shown.push('█');
    shown.extend_from_slice(&chars[cursor..]);

    let width = width.max(1);
    let start = (cursor + 1).saturating_sub(width);
    shown.into_iter().skip(start).take(width).collect()
}

pub fn render_input_line(frame: &mut Frame, area: Rect, input: &TextInput, masked: bool) {
    let text = input_display(input, masked, area.width as usize);
    let line = Paragraph::new(text).style(
        Style::default()
            .fg(THEME.dialog_input_fg)
            .bg(THEME.dialog_input_bg),
    );
    frame.render_widget(line, area);
}

pub fn render_hint(frame: &mut Frame, area: Rect, hint: &str) {
    let hint = Paragraph::new(hint).style(Style::default().fg(THEME.dialog_hint));
    frame.render_widget(hint, area);
}

// ============================================================================
// Centered Rect Helper
// ============================================================================

/// Creates a centered rectangle within an area, at least `min_width` x
/// `min_height` when the area allows it.
pub fn centered_rect(percent_x: u16, percent_y: u16, min_width: u16, min_height: u16, area: Rect) -> Rect {
    let scaled = |total: u16, percent: u16| (u32::from(total) * u32::from(percent) / 100) as u16;
    let height = scaled(area.height, percent_y).max(min_height).min(area.height);
    let width = scaled(area.width, percent_x).max(min_width).min(area.width);

    let popup_layout = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width),
        Constraint::Fill(1),
    ])
    .split(popup_layout[1])[1]
}
