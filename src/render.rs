//! Rendering for the file manager
//!
//! Everything here reads the Session; nothing mutates it. Geometry comes from
//! `Session::layout` so list rows line up with mouse hit-testing.

use std::path::PathBuf;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

use crate::{
    dialog::{
        centered_rect, render_buttons, render_dialog_frame, render_hint, render_input_line,
        render_yes_no_buttons,
    },
    drives::disk_usage,
    fs_ops::{Entry, EntryKind},
    layout::list_height,
    modal::{Modal, TextInput},
    ops::{display_name, ClipboardMode},
    panel::{PanelId, TreePanel},
    session::{NoticeLevel, Session},
    theme::THEME,
    util::{format_bytes, format_mode, format_size, format_time, truncate},
};

const HELP: &[(&str, &str)] = &[
    ("Tab", "Panel"),
    ("Spc", "Mark"),
    ("c", "Copy"),
    ("x", "Cut"),
    ("v", "Paste"),
    ("d", "Delete"),
    ("r", "Rename"),
    ("n", "New"),
    ("e", "Edit"),
    (":", "Shell"),
    ("/", "Filter"),
    ("h", "Hidden"),
    ("t", "Dual"),
    ("m/u", "Mount"),
    ("q", "Quit"),
];

fn border_style(active: bool) -> Style {
    if active {
        Style::default().fg(THEME.panel_active_border)
    } else {
        Style::default().fg(THEME.panel_inactive_border)
    }
}

fn cursor_style(active: bool) -> Style {
    if active {
        Style::default()
            .bg(THEME.cursor_active_bg)
            .fg(THEME.cursor_active_fg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .bg(THEME.cursor_inactive_bg)
            .fg(THEME.cursor_inactive_fg)
    }
}

impl Session {
    pub fn render(&self, frame: &mut Frame) {
        let layout = self.layout;

        self.render_tree(frame, PanelId::PrimaryTree, layout.primary);
        if let Some(rect) = layout.secondary {
            self.render_tree(frame, PanelId::SecondaryTree, rect);
        }
        self.render_shortcuts(frame, layout.shortcuts);
        self.render_drives(frame, layout.drives);
        self.render_info(frame, layout.info);
        self.render_preview(frame, layout.preview);
        self.render_status_bar(frame, layout.status);

        // the filter prompt takes over the help row, like a search bar
        match &self.modal {
            Modal::Filter { input, .. } => {
                frame.render_widget(Clear, layout.help);
                let label = "Filter: ";
                let [label_area, input_area] =
                    Layout::horizontal([Constraint::Length(label.len() as u16), Constraint::Fill(1)])
                        .areas(layout.help);
                frame.render_widget(Paragraph::new(label), label_area);
                render_input_line(frame, input_area, input, false);
            }
            _ => self.render_help_bar(frame, layout.help),
        }

        self.render_modal(frame);
    }

    // ------------------------------------------------------------------------
    // Panels
    // ------------------------------------------------------------------------

    fn render_tree(&self, frame: &mut Frame, id: PanelId, area: Rect) {
        let Some(panel) = self.tree(id) else {
            return;
        };
        let is_active = self.focus == id;

        let mut title = format!(" {} ", panel.dir().display());
        if !panel.filter().is_empty() {
            title.push_str(&format!("[/{}] ", panel.filter()));
        }
        if !panel.marked().is_empty() {
            title.push_str(&format!("[{} marked] ", panel.marked().len()));
        }

        let mut block = Block::default()
            .title(truncate(&title, area.width.saturating_sub(2) as usize))
            .title_style(Style::default().fg(THEME.panel_title))
            .borders(Borders::ALL)
            .border_style(border_style(is_active));
        if let Some(error) = panel.error() {
            block = block.title_bottom(
                Line::styled(format!(" {} ", error), Style::default().fg(THEME.panel_error)),
            );
        }

        let inner_width = area.width.saturating_sub(2) as usize;
        let rows = list_height(area);
        let list = &panel.list;

        let items: Vec<ListItem> = list
            .items()
            .iter()
            .enumerate()
            .skip(list.scroll())
            .take(rows)
            .map(|(i, entry)| {
                let style = if i == list.cursor() {
                    cursor_style(is_active)
                } else {
                    self.entry_style(panel, entry)
                };
                ListItem::new(entry_row(entry, panel.is_marked(&entry.path), inner_width)).style(style)
            })
            .collect();

        let list_widget = if items.is_empty() {
            let placeholder = if panel.filter().is_empty() { "(empty)" } else { "(no matches)" };
            List::new([ListItem::new(placeholder).style(Style::default().fg(THEME.hidden_fg))])
        } else {
            List::new(items)
        };
        frame.render_widget(list_widget.block(block), area);
    }

    fn entry_style(&self, panel: &TreePanel, entry: &Entry) -> Style {
        if panel.is_marked(&entry.path) {
            return Style::default().fg(THEME.marked_fg).bg(THEME.marked_bg);
        }
        let on_cut_clipboard = self
            .clipboard
            .as_ref()
            .is_some_and(|c| c.mode == ClipboardMode::Cut && c.paths().contains(&entry.path));
        if on_cut_clipboard {
            return Style::default()
                .fg(THEME.clipboard_cut_fg)
                .add_modifier(Modifier::ITALIC);
        }

        let fg = match entry.kind {
            EntryKind::Directory => THEME.directory_fg,
            EntryKind::Symlink => THEME.symlink_fg,
            EntryKind::Special => THEME.special_fg,
            EntryKind::File if entry.hidden => THEME.hidden_fg,
            EntryKind::File => THEME.file_fg,
        };
        let style = Style::default().fg(fg);
        if entry.is_dir() {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }

    fn render_shortcuts(&self, frame: &mut Frame, area: Rect) {
        let is_active = self.focus == PanelId::Shortcuts;
        let block = Block::default()
            .title(" Places ")
            .title_style(Style::default().fg(THEME.panel_title))
            .borders(Borders::ALL)
            .border_style(border_style(is_active));

        let width = area.width.saturating_sub(2) as usize;
        let list = &self.shortcuts;
        let items: Vec<ListItem> = list
            .items()
            .iter()
            .enumerate()
            .skip(list.scroll())
            .take(list_height(area))
            .map(|(i, shortcut)| {
                let style = if i == list.cursor() {
                    cursor_style(is_active)
                } else {
                    Style::default().fg(THEME.shortcut_fg)
                };
                ListItem::new(truncate(&shortcut.label, width)).style(style)
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }

    fn render_drives(&self, frame: &mut Frame, area: Rect) {
        let is_active = self.focus == PanelId::Drives;
        let mut block = Block::default()
            .title(" Drives ")
            .title_style(Style::default().fg(THEME.panel_title))
            .borders(Borders::ALL)
            .border_style(border_style(is_active));
        if self.drives_degraded {
            block = block.title_bottom(
                Line::styled(" lsblk unavailable ", Style::default().fg(THEME.drive_degraded)),
            );
        }

        let width = area.width.saturating_sub(2) as usize;
        let list = &self.drives;
        let items: Vec<ListItem> = list
            .items()
            .iter()
            .enumerate()
            .skip(list.scroll())
            .take(list_height(area))
            .map(|(i, drive)| {
                let (bullet, fg) = if drive.is_mounted() {
                    ("● ", THEME.drive_mounted_fg)
                } else {
                    ("○ ", THEME.drive_unmounted_fg)
                };
                let style = if i == list.cursor() {
                    cursor_style(is_active)
                } else {
                    Style::default().fg(fg)
                };
                ListItem::new(truncate(&format!("{}{}", bullet, drive.summary()), width)).style(style)
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }

    // ------------------------------------------------------------------------
    // Info and preview
    // ------------------------------------------------------------------------

    fn render_info(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Info ")
            .title_style(Style::default().fg(THEME.panel_title))
            .borders(Borders::ALL)
            .border_style(border_style(false));
        let width = area.width.saturating_sub(2) as usize;

        let mut lines = Vec::new();
        if let Some(entry) = self.selected_entry() {
            let kind = match entry.kind {
                EntryKind::Directory => "directory",
                EntryKind::File => "file",
                EntryKind::Symlink if entry.target_is_dir => "link to directory",
                EntryKind::Symlink => "link",
                EntryKind::Special => "special",
            };
            let size = if entry.is_dir() {
                "-".to_owned()
            } else {
                format_bytes(entry.size)
            };
            let rows = [
                ("Name", entry.name.clone()),
                ("Kind", kind.to_owned()),
                ("Size", size),
                ("Modified", format_time(entry.modified)),
                ("Mode", format_mode(entry.mode, entry.kind)),
            ];
            lines.extend(rows.into_iter().map(|(label, value)| info_line(label, &value, width)));
        }

        let dir = self.tree(self.target_tree()).map(TreePanel::dir);
        if let Some((total, available)) = dir.and_then(disk_usage) {
            let free = format!("{} of {}", format_bytes(available), format_bytes(total));
            lines.push(info_line("Free", &free, width));
        }

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_preview(&self, frame: &mut Frame, area: Rect) {
        let title = match &self.preview.path {
            Some(path) => format!(" {} ", display_name(path)),
            None => " Preview ".to_owned(),
        };
        let block = Block::default()
            .title(truncate(&title, area.width.saturating_sub(2) as usize))
            .title_style(Style::default().fg(THEME.panel_title))
            .borders(Borders::ALL)
            .border_style(border_style(false));

        let placeholder = |text: String| {
            Paragraph::new(text).style(Style::default().fg(THEME.preview_placeholder))
        };
        let body = if let Some(error) = &self.preview.error {
            placeholder(error.clone())
        } else if self.preview.loading {
            placeholder("loading...".to_owned())
        } else if self.preview.path.is_none() {
            placeholder(String::new())
        } else {
            let lines: Vec<Line> = self.preview.lines.iter().map(|l| Line::raw(l.as_str())).collect();
            Paragraph::new(lines).style(Style::default().fg(THEME.preview_fg))
        };

        frame.render_widget(body.block(block), area);
    }

    // ------------------------------------------------------------------------
    // Status and help
    // ------------------------------------------------------------------------

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let base = Style::default().bg(THEME.status_bg);
        frame.render_widget(Block::default().style(base), area);

        let clip = self
            .clipboard
            .as_ref()
            .map(|c| format!(" [{}] ", c.summary()))
            .unwrap_or_default();
        let [left, right] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(clip.chars().count() as u16)])
                .areas(area);

        let (text, fg) = if let Some(notice) = &self.notice {
            let fg = match notice.level {
                NoticeLevel::Info => THEME.status_info_fg,
                NoticeLevel::Warning => THEME.status_warning_fg,
                NoticeLevel::Error => THEME.status_error_fg,
            };
            (format!(" {}", notice.text), fg)
        } else if !self.jobs.is_empty() {
            (format!(" [{}] {}", self.jobs.len(), self.jobs.join(" | ")), THEME.status_job_fg)
        } else {
            (String::new(), THEME.status_info_fg)
        };

        let width = left.width as usize;
        frame.render_widget(
            Paragraph::new(truncate(&text, width)).style(base.fg(fg)),
            left,
        );
        frame.render_widget(
            Paragraph::new(clip)
                .style(base.fg(THEME.marked_fg))
                .alignment(Alignment::Right),
            right,
        );
    }

    fn render_help_bar(&self, frame: &mut Frame, area: Rect) {
        let key_style = Style::default()
            .fg(THEME.help_key_fg)
            .bg(THEME.help_key_bg);
        let desc_style = Style::default()
            .fg(THEME.help_desc_fg)
            .bg(THEME.help_desc_bg);
        let sep_style = Style::default().bg(THEME.help_desc_bg);

        let mut spans: Vec<Span> = Vec::new();
        for (i, (key, desc)) in HELP.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" ", sep_style));
            }
            spans.push(Span::styled(format!(" {} ", key), key_style));
            spans.push(Span::styled(format!("{} ", desc), desc_style));
        }

        let line = Line::from(spans);
        let paragraph = Paragraph::new(line).style(Style::default().bg(THEME.help_desc_bg));
        frame.render_widget(paragraph, area);
    }

    // ------------------------------------------------------------------------
    // Dialogs
    // ------------------------------------------------------------------------

    fn render_modal(&self, frame: &mut Frame) {
        let screen = frame.area();
        let title = self.modal.title();

        match &self.modal {
            Modal::None | Modal::Filter { .. } => {}
            Modal::NameInput { dir, input } => {
                let label = format!("In {}:", dir.display());
                self.render_input_dialog(frame, title, &label, input, "Enter to create, Esc to cancel");
            }
            Modal::Rename { target, input } => {
                let label = format!("New name for '{}':", display_name(target));
                self.render_input_dialog(frame, title, &label, input, "Enter to rename, Esc to cancel");
            }
            Modal::ShellCommand { dir, input } => {
                let label = format!("{}$", dir.display());
                self.render_input_dialog(frame, title, &label, input, "Enter to run, Esc to cancel");
            }
            Modal::MountPassword { drive, input, .. } => {
                let label = format!("Password for {}:", drive.display_name());
                self.render_input_dialog(frame, title, &label, input, "Enter to submit, Esc to cancel");
            }
            Modal::DeleteConfirmation { paths } => {
                let area = centered_rect(50, 40, 44, 10, screen);
                let inner = render_dialog_frame(frame, area, title, THEME.dialog_delete_border);
                let [_, message, _, buttons, _] = Layout::vertical([
                    Constraint::Length(1),
                    Constraint::Fill(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ])
                .areas(inner);

                let msg = Paragraph::new(delete_message(paths)).alignment(Alignment::Center);
                frame.render_widget(msg, message);
                render_yes_no_buttons(frame, buttons);
            }
            Modal::Conflict { path, .. } => {
                let area = centered_rect(50, 30, 50, 8, screen);
                let inner = render_dialog_frame(frame, area, title, THEME.dialog_warning_border);
                let [_, name, question, _, buttons] = Layout::vertical([
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ])
                .areas(inner);

                let width = inner.width as usize;
                frame.render_widget(
                    Paragraph::new(truncate(&format!("\"{}\"", path.display()), width))
                        .alignment(Alignment::Center),
                    name,
                );
                frame.render_widget(
                    Paragraph::new("already exists. What do you want to do?").alignment(Alignment::Center),
                    question,
                );
                render_buttons(frame, buttons, &["[O]verwrite", "[S]kip", "[R]ename", "[C]ancel"]);
            }
            Modal::QuitConfirmation => {
                let area = centered_rect(40, 25, 36, 7, screen);
                let inner = render_dialog_frame(frame, area, title, THEME.dialog_warning_border);
                let [_, jobs, question, _, buttons] = Layout::vertical([
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ])
                .areas(inner);

                let count = self.jobs.len();
                let msg = format!(
                    "{} job{} still running.",
                    count,
                    if count == 1 { " is" } else { "s are" }
                );
                frame.render_widget(
                    Paragraph::new(msg)
                        .style(Style::default().fg(THEME.dialog_warning_text))
                        .alignment(Alignment::Center),
                    jobs,
                );
                frame.render_widget(
                    Paragraph::new("Abandon them and quit?").alignment(Alignment::Center),
                    question,
                );
                render_yes_no_buttons(frame, buttons);
            }
        }
    }

    fn render_input_dialog(
        &self,
        frame: &mut Frame,
        title: &str,
        label: &str,
        input: &TextInput,
        hint: &str,
    ) {
        let area = centered_rect(50, 20, 40, 7, frame.area());
        let inner = render_dialog_frame(frame, area, title, THEME.dialog_border);

        let [_, label_area, input_area, _, hint_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .areas(inner);

        frame.render_widget(
            Paragraph::new(truncate(label, inner.width as usize)),
            label_area,
        );
        render_input_line(frame, input_area, input, self.modal.is_masked());
        render_hint(frame, hint_area, hint);
    }
}

/// One list row: mark, name with a type suffix, and a right-aligned size
fn entry_row(entry: &Entry, marked: bool, width: usize) -> String {
    let marker = if marked { "* " } else { "  " };
    let suffix = match entry.kind {
        EntryKind::Directory => "/",
        EntryKind::Symlink if entry.target_is_dir => "@/",
        EntryKind::Symlink => "@",
        _ => "",
    };
    let name = format!("{}{}{}", marker, entry.name, suffix);

    let size = match entry.kind {
        EntryKind::File => format_size(entry.size),
        _ => String::new(),
    };
    const SIZE_WIDTH: usize = 7;
    if width <= SIZE_WIDTH + 4 {
        return truncate(&name, width);
    }

    let name_width = width - SIZE_WIDTH - 1;
    format!(
        "{:<name_width$} {:>SIZE_WIDTH$}",
        truncate(&name, name_width),
        size,
    )
}

fn info_line(label: &str, value: &str, width: usize) -> Line<'static> {
    let label = format!("{:<9}", label);
    let value = truncate(value, width.saturating_sub(label.len()));
    Line::from(vec![
        Span::styled(label, Style::default().fg(THEME.info_label)),
        Span::styled(value, Style::default().fg(THEME.info_value)),
    ])
}

fn delete_message(paths: &[PathBuf]) -> String {
    match paths {
        [single] if single.is_dir() => {
            format!("Delete directory \"{}\"\nand all its contents?", display_name(single))
        }
        [single] => format!("Delete \"{}\"?", display_name(single)),
        _ => {
            let mut lines = vec![format!("Delete {} items?", paths.len()), String::new()];
            lines.extend(paths.iter().take(4).map(|p| display_name(p)));
            if paths.len() > 4 {
                lines.push(format!("... and {} more", paths.len() - 4));
            }
            lines.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::{config::Config, events::AppEvent};

    fn screen_text(session: &Session) -> String {
        let (width, height) = session.size;
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| session.render(frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..height {
            for x in 0..width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn session_in(dir: &Path) -> Session {
        let config = Config {
            shortcuts: vec![crate::config::Shortcut {
                path: dir.to_path_buf(),
                label: "Scratch".to_owned(),
            }],
            ..Config::default()
        };
        let mut session = Session::new(config, dir.to_path_buf(), None, false);
        session.dispatch(AppEvent::Resize { width: 120, height: 30 });
        session
    }

    #[test]
    fn test_entry_row_aligns_size_column() {
        let entry = crate::fs_ops::Entry {
            path: PathBuf::from("/x/notes.txt"),
            name: "notes.txt".to_owned(),
            kind: EntryKind::File,
            target_is_dir: false,
            size: 1024,
            modified: None,
            mode: 0o644,
            hidden: false,
        };
        let row = entry_row(&entry, true, 30);
        assert_eq!(row.chars().count(), 30);
        assert!(row.starts_with("* notes.txt"));
        assert!(row.ends_with("1.0K"));
    }

    #[test]
    fn test_delete_message_lists_items() {
        let paths: Vec<PathBuf> = (0..6).map(|i| PathBuf::from(format!("/nowhere/f{}", i))).collect();
        let msg = delete_message(&paths);
        assert!(msg.starts_with("Delete 6 items?"));
        assert!(msg.contains("... and 2 more"));
        assert_eq!(delete_message(&paths[..1]), "Delete \"f0\"?");
    }

    #[test]
    fn test_screen_shows_panels_and_entries() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("projects")).unwrap();
        fs::write(tmp.path().join("readme.md"), b"hello").unwrap();
        let session = session_in(tmp.path());

        let text = screen_text(&session);
        assert!(text.contains("projects/"));
        assert!(text.contains("readme.md"));
        assert!(text.contains("Scratch"));
        assert!(text.contains("Drives"));
        assert!(text.contains(" Panel "));
    }

    #[test]
    fn test_password_is_never_drawn() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        session.modal = Modal::MountPassword {
            action: crate::drives::MountAction::Mount,
            drive: crate::drives::Drive {
                device: PathBuf::from("/dev/sdz1"),
                name: "sdz1".to_owned(),
                mount_point: None,
                label: None,
                model: None,
                fs_type: None,
                capacity: 0,
                used: None,
            },
            input: TextInput::new("hunter2"),
        };

        let text = screen_text(&session);
        assert!(text.contains("Password for sdz1"));
        assert!(!text.contains("hunter2"));
        assert!(text.contains("•••••••"));
    }

    #[test]
    fn test_filter_prompt_replaces_help_bar() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        session.dispatch(AppEvent::Key(crossterm::event::KeyEvent::from(
            crossterm::event::KeyCode::Char('/'),
        )));

        let text = screen_text(&session);
        assert!(text.contains("Filter: █"));
        assert!(!text.contains(" Panel "));
    }
}
