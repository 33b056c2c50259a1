//! Session state and the input transition function.
//!
//! `Session::dispatch` is the only place key and mouse input mutates state.
//! Side effects that need threads, processes or the terminal come back out as
//! [`Command`]s for the application loop to execute.

use std::{
    collections::VecDeque,
    mem,
    path::{Path, PathBuf},
    time::Instant,
};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;

use crate::{
    config::{Config, Shortcut},
    drives::{Drive, DriveReply, DriveScan, MountAction, MountResult, Secret},
    error::{Error, Result},
    events::AppEvent,
    fs_ops::{self, Entry},
    jobs::{JobEvent, JobId, JobKind},
    layout::{list_height, AppLayout},
    modal::{Modal, ModalOutcome, TextInput},
    ops::{self, Clipboard, ClipboardMode, Resolution},
    panel::{Keyed, ListModel, PanelId, PanelKind, TreePanel},
    preview::{PreviewRequest, PreviewResult},
    refresh::RefreshResult,
    update::UpdateStatus,
};

// ============================================================================
// Commands and notices
// ============================================================================

/// Side effects requested by the session
#[derive(Debug)]
pub enum Command {
    StartPaste {
        sources: Vec<PathBuf>,
        mode: ClipboardMode,
        dest: PathBuf,
    },
    StartDelete(Vec<PathBuf>),
    ResolveConflict {
        job_id: JobId,
        resolution: Resolution,
    },
    Mount {
        action: MountAction,
        drive: Drive,
        secret: Option<Secret>,
    },
    /// Ctrl-R: tick the refresher and rescan drives now
    RefreshAll,
    Edit(PathBuf),
    Shell {
        command: String,
        dir: PathBuf,
    },
    CheckUpdates,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub posted_at: Instant,
}

#[derive(Debug, Default)]
pub struct PreviewState {
    pub path: Option<PathBuf>,
    pub lines: Vec<String>,
    pub error: Option<String>,
    pub loading: bool,
}

// ============================================================================
// Session
// ============================================================================

pub struct Session {
    pub config: Config,
    pub primary: TreePanel,
    pub secondary: Option<TreePanel>,
    pub shortcuts: ListModel<Shortcut>,
    pub drives: ListModel<Drive>,
    pub drives_degraded: bool,
    pub focus: PanelId,
    /// Tree that shortcut and drive activations navigate
    last_tree: PanelId,
    pub modal: Modal,
    pub clipboard: Option<Clipboard>,
    pub show_hidden: bool,
    remembered_secondary: Option<PathBuf>,
    pub notice: Option<Notice>,
    pub size: (u16, u16),
    pub layout: AppLayout,
    pub preview: PreviewState,
    /// Descriptions of running background jobs
    pub jobs: Vec<String>,
    pending_conflicts: VecDeque<(JobId, PathBuf)>,
    /// Device to open once its mount finishes
    open_after_mount: Option<PathBuf>,
}

impl Session {
    pub fn new(config: Config, start_dir: PathBuf, remembered_secondary: Option<PathBuf>, dual_panel: bool) -> Self {
        let show_hidden = false;
        let primary = TreePanel::open(start_dir, show_hidden);
        let secondary = dual_panel.then(|| {
            let dir = remembered_secondary
                .clone()
                .unwrap_or_else(|| primary.dir().to_path_buf());
            TreePanel::open(dir, show_hidden)
        });
        let shortcuts = ListModel::new(config.shortcuts.clone());

        let mut session = Self {
            config,
            primary,
            secondary,
            shortcuts,
            drives: ListModel::default(),
            drives_degraded: false,
            focus: PanelId::PrimaryTree,
            last_tree: PanelId::PrimaryTree,
            modal: Modal::None,
            clipboard: None,
            show_hidden,
            remembered_secondary,
            notice: None,
            size: (80, 24),
            layout: AppLayout::default(),
            preview: PreviewState::default(),
            jobs: Vec::new(),
            pending_conflicts: VecDeque::new(),
            open_after_mount: None,
        };
        session.sync_view();
        session
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn dual_panel(&self) -> bool {
        self.secondary.is_some()
    }

    /// Directory the secondary panel shows or will show when toggled on
    pub fn secondary_path(&self) -> Option<PathBuf> {
        self.secondary
            .as_ref()
            .map(|p| p.dir().to_path_buf())
            .or_else(|| self.remembered_secondary.clone())
    }

    pub fn tree(&self, id: PanelId) -> Option<&TreePanel> {
        match id {
            PanelId::PrimaryTree => Some(&self.primary),
            PanelId::SecondaryTree => self.secondary.as_ref(),
            _ => None,
        }
    }

    pub fn tree_mut(&mut self, id: PanelId) -> Option<&mut TreePanel> {
        match id {
            PanelId::PrimaryTree => Some(&mut self.primary),
            PanelId::SecondaryTree => self.secondary.as_mut(),
            _ => None,
        }
    }

    fn is_active(&self, id: PanelId) -> bool {
        id != PanelId::SecondaryTree || self.secondary.is_some()
    }

    /// The focused tree, or the last focused one while a sidebar panel has focus
    pub fn target_tree(&self) -> PanelId {
        if self.focus.kind() == PanelKind::Tree {
            self.focus
        } else if self.is_active(self.last_tree) {
            self.last_tree
        } else {
            PanelId::PrimaryTree
        }
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.tree(self.target_tree())?.selected()
    }

    /// Directories the refresher should keep listing
    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.primary.dir().to_path_buf()];
        if let Some(secondary) = &self.secondary {
            if secondary.dir() != self.primary.dir() {
                dirs.push(secondary.dir().to_path_buf());
            }
        }
        dirs
    }

    // ------------------------------------------------------------------------
    // Notices
    // ------------------------------------------------------------------------

    pub fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            NoticeLevel::Info => tracing::info!("{}", text),
            NoticeLevel::Warning | NoticeLevel::Error => tracing::warn!("{}", text),
        }
        self.notice = Some(Notice {
            level,
            text,
            posted_at: Instant::now(),
        });
    }

    fn notify_error(&mut self, context: &str, err: &Error) {
        self.notify(NoticeLevel::Error, format!("{}: {}", context, err));
    }

    pub fn expire_notice(&mut self, now: Instant) {
        let ttl = self.config.notice_duration();
        if self
            .notice
            .as_ref()
            .is_some_and(|n| now.duration_since(n.posted_at) >= ttl)
        {
            self.notice = None;
        }
    }

    // ------------------------------------------------------------------------
    // View sync
    // ------------------------------------------------------------------------

    /// Recompute geometry and keep every cursor on screen
    pub fn sync_view(&mut self) {
        let (width, height) = self.size;
        self.layout = AppLayout::compute(Rect::new(0, 0, width, height), self.dual_panel());

        let primary_rows = list_height(self.layout.primary);
        self.primary.list.ensure_visible(primary_rows);
        if let (Some(panel), Some(rect)) = (self.secondary.as_mut(), self.layout.secondary) {
            panel.list.ensure_visible(list_height(rect));
        }
        self.shortcuts.ensure_visible(list_height(self.layout.shortcuts));
        self.drives.ensure_visible(list_height(self.layout.drives));
    }

    fn page_size(&self, id: PanelId) -> isize {
        self.layout
            .panel_rect(id)
            .map(|r| list_height(r).max(1) as isize)
            .unwrap_or(1)
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    pub fn dispatch(&mut self, event: AppEvent) -> Vec<Command> {
        let mut commands = Vec::new();

        match event {
            AppEvent::Resize { width, height } => self.size = (width, height),
            AppEvent::Key(key) if self.modal.is_active() => {
                let outcome = self.modal.handle_key(key);
                self.after_modal(outcome, &mut commands);
            }
            AppEvent::Paste(text) if self.modal.is_active() => {
                let outcome = self.modal.handle_paste(&text);
                self.after_modal(outcome, &mut commands);
            }
            // pointer input is ignored while a modal is up
            _ if self.modal.is_active() => {}
            AppEvent::Key(key) => self.handle_key(key, &mut commands),
            AppEvent::Paste(_) => {}
            AppEvent::Click { col, row } => self.click(col, row, false, &mut commands),
            AppEvent::DoubleClick { col, row } => self.click(col, row, true, &mut commands),
            AppEvent::Scroll { col, row, delta } => self.scroll(col, row, delta),
        }

        self.sync_view();
        commands
    }

    fn handle_key(&mut self, key: KeyEvent, commands: &mut Vec<Command>) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('r') if ctrl => {
                self.force_refresh();
                commands.push(Command::RefreshAll);
            }
            KeyCode::Char('c') if ctrl => self.request_quit(commands),
            _ if ctrl => {}
            KeyCode::Tab => self.cycle_focus(),
            KeyCode::Char('q') => self.request_quit(commands),
            KeyCode::Char('t') => self.toggle_dual_panel(),
            KeyCode::Char('h') => self.toggle_hidden(),
            KeyCode::Char('U') => {
                self.notify(NoticeLevel::Info, "Checking for updates...");
                commands.push(Command::CheckUpdates);
            }
            KeyCode::Char(':') => self.open_shell_prompt(),
            _ => match self.focus.kind() {
                PanelKind::Tree => self.tree_key(key, commands),
                PanelKind::Shortcuts => self.shortcuts_key(key),
                PanelKind::Drives => self.drives_key(key, commands),
            },
        }
    }

    /// Cursor keys shared by every list. Returns true when handled.
    fn navigate<T: Keyed>(list: &mut ListModel<T>, code: KeyCode, page: isize) -> bool {
        match code {
            KeyCode::Up | KeyCode::Char('k') => list.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => list.move_cursor(1),
            KeyCode::PageUp => list.page(-page),
            KeyCode::PageDown => list.page(page),
            KeyCode::Home => list.select_first(),
            KeyCode::End => list.select_last(),
            _ => return false,
        }
        true
    }

    fn tree_key(&mut self, key: KeyEvent, commands: &mut Vec<Command>) {
        let id = self.focus;
        let page = self.page_size(id);
        let Some(panel) = self.tree_mut(id) else {
            return;
        };
        if Self::navigate(&mut panel.list, key.code, page) {
            return;
        }

        match key.code {
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => self.activate_tree(id, commands),
            KeyCode::Left | KeyCode::Backspace => self.go_parent(id),
            KeyCode::Char(' ') | KeyCode::Insert => panel.toggle_mark(),
            KeyCode::Char('c') => self.set_clipboard(ClipboardMode::Copy),
            KeyCode::Char('x') => self.set_clipboard(ClipboardMode::Cut),
            KeyCode::Char('v') => self.paste(commands),
            KeyCode::Char('d') | KeyCode::Delete | KeyCode::F(8) => self.prompt_delete(),
            KeyCode::Char('r') | KeyCode::F(2) => self.prompt_rename(),
            KeyCode::Char('n') | KeyCode::F(7) => {
                let dir = panel.dir().to_path_buf();
                self.modal = Modal::NameInput {
                    dir,
                    input: TextInput::new("f "),
                };
            }
            KeyCode::Char('e') | KeyCode::F(4) => {
                if let Some(entry) = panel.selected().filter(|e| !e.is_dir()) {
                    commands.push(Command::Edit(entry.path.clone()));
                }
            }
            KeyCode::Char('/') => {
                let input = TextInput::new(panel.filter());
                self.modal = Modal::Filter { panel: id, input };
            }
            KeyCode::Esc => {
                panel.set_filter("");
                panel.clear_marks();
            }
            _ => {}
        }
    }

    fn shortcuts_key(&mut self, key: KeyEvent) {
        let page = self.page_size(PanelId::Shortcuts);
        if Self::navigate(&mut self.shortcuts, key.code, page) {
            return;
        }
        if matches!(key.code, KeyCode::Enter | KeyCode::Right | KeyCode::Char('l')) {
            self.open_shortcut();
        }
    }

    fn drives_key(&mut self, key: KeyEvent, commands: &mut Vec<Command>) {
        let page = self.page_size(PanelId::Drives);
        if Self::navigate(&mut self.drives, key.code, page) {
            return;
        }
        match key.code {
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => self.open_drive(commands),
            KeyCode::Char('m') => self.mount_selected(commands),
            KeyCode::Char('u') => self.unmount_selected(commands),
            _ => {}
        }
    }

    // ------------------------------------------------------------------------
    // Mouse
    // ------------------------------------------------------------------------

    fn click(&mut self, col: u16, row: u16, double: bool, commands: &mut Vec<Command>) {
        let Some(hit) = self.layout.hit_test(col, row) else {
            return;
        };
        self.set_focus(hit.panel);

        let Some(row) = hit.row else {
            return;
        };
        let selected = match hit.panel {
            PanelId::PrimaryTree | PanelId::SecondaryTree => self
                .tree_mut(hit.panel)
                .is_some_and(|p| p.list.select_index(p.list.scroll() + row)),
            PanelId::Shortcuts => self.shortcuts.select_index(self.shortcuts.scroll() + row),
            PanelId::Drives => self.drives.select_index(self.drives.scroll() + row),
        };

        if selected && double {
            match hit.panel.kind() {
                PanelKind::Tree => self.activate_tree(hit.panel, commands),
                PanelKind::Shortcuts => self.open_shortcut(),
                PanelKind::Drives => self.open_drive(commands),
            }
        }
    }

    fn scroll(&mut self, col: u16, row: u16, delta: isize) {
        let Some(hit) = self.layout.hit_test(col, row) else {
            return;
        };
        match hit.panel {
            PanelId::PrimaryTree | PanelId::SecondaryTree => {
                if let Some(panel) = self.tree_mut(hit.panel) {
                    panel.move_cursor(delta);
                }
            }
            PanelId::Shortcuts => self.shortcuts.move_cursor(delta),
            PanelId::Drives => self.drives.move_cursor(delta),
        }
    }

    // ------------------------------------------------------------------------
    // Focus and panels
    // ------------------------------------------------------------------------

    fn set_focus(&mut self, id: PanelId) {
        if !self.is_active(id) {
            return;
        }
        self.focus = id;
        if id.kind() == PanelKind::Tree {
            self.last_tree = id;
        }
    }

    pub fn cycle_focus(&mut self) {
        let order = PanelId::CYCLE;
        let start = order.iter().position(|p| *p == self.focus).unwrap_or(0);
        let next = (1..=order.len())
            .map(|step| order[(start + step) % order.len()])
            .find(|id| self.is_active(*id))
            .unwrap_or(PanelId::PrimaryTree);
        self.set_focus(next);
    }

    pub fn toggle_dual_panel(&mut self) {
        match self.secondary.take() {
            Some(panel) => {
                self.remembered_secondary = Some(panel.dir().to_path_buf());
                if self.focus == PanelId::SecondaryTree {
                    self.set_focus(PanelId::PrimaryTree);
                }
                if self.last_tree == PanelId::SecondaryTree {
                    self.last_tree = PanelId::PrimaryTree;
                }
            }
            None => {
                let dir = self
                    .remembered_secondary
                    .clone()
                    .unwrap_or_else(|| self.primary.dir().to_path_buf());
                self.secondary = Some(TreePanel::open(dir, self.show_hidden));
            }
        }
    }

    pub fn toggle_hidden(&mut self) {
        self.show_hidden = !self.show_hidden;
        let show = self.show_hidden;
        self.primary.set_show_hidden(show);
        if let Some(secondary) = self.secondary.as_mut() {
            secondary.set_show_hidden(show);
        }
    }

    fn activate_tree(&mut self, id: PanelId, commands: &mut Vec<Command>) {
        let Some(entry) = self.tree(id).and_then(TreePanel::selected).cloned() else {
            return;
        };
        if !entry.is_dir() {
            commands.push(Command::Edit(entry.path));
            return;
        }
        if let Some(Err(e)) = self.tree_mut(id).map(TreePanel::enter_selected) {
            self.notify_error("cannot open", &e);
        }
    }

    fn go_parent(&mut self, id: PanelId) {
        if let Some(Err(e)) = self.tree_mut(id).map(TreePanel::navigate_up) {
            self.notify_error("cannot go up", &e);
        }
    }

    fn navigate_target(&mut self, dir: PathBuf) {
        let id = self.target_tree();
        let result = match self.tree_mut(id) {
            Some(panel) => panel.navigate(dir),
            None => return,
        };
        match result {
            Ok(()) => self.set_focus(id),
            Err(e) => self.notify_error("cannot open", &e),
        }
    }

    fn open_shortcut(&mut self) {
        if let Some(shortcut) = self.shortcuts.selected().cloned() {
            self.navigate_target(shortcut.path);
        }
    }

    // ------------------------------------------------------------------------
    // File operations
    // ------------------------------------------------------------------------

    fn set_clipboard(&mut self, mode: ClipboardMode) {
        let id = self.focus;
        let Some(panel) = self.tree_mut(id) else {
            return;
        };
        let selection = panel.selection();
        if selection.is_empty() {
            return;
        }
        panel.clear_marks();

        let clipboard = Clipboard::new(selection, mode, id);
        self.notify(NoticeLevel::Info, format!("Clipboard: {}", clipboard.summary()));
        self.clipboard = Some(clipboard);
    }

    fn paste(&mut self, commands: &mut Vec<Command>) {
        let Some(clipboard) = self.clipboard.as_ref().filter(|c| !c.is_empty()) else {
            self.notify(NoticeLevel::Warning, "Clipboard is empty");
            return;
        };
        let Some(dest) = self.tree(self.focus).map(|p| p.dir().to_path_buf()) else {
            return;
        };
        commands.push(Command::StartPaste {
            sources: clipboard.paths().to_vec(),
            mode: clipboard.mode,
            dest,
        });
    }

    fn prompt_delete(&mut self) {
        let paths = self
            .tree(self.focus)
            .map(TreePanel::selection)
            .unwrap_or_default();
        if !paths.is_empty() {
            self.modal = Modal::DeleteConfirmation { paths };
        }
    }

    fn prompt_rename(&mut self) {
        if let Some(entry) = self.tree(self.focus).and_then(TreePanel::selected) {
            self.modal = Modal::Rename {
                target: entry.path.clone(),
                input: TextInput::new(entry.name.clone()),
            };
        }
    }

    fn open_shell_prompt(&mut self) {
        let Some(dir) = self.tree(self.target_tree()).map(|p| p.dir().to_path_buf()) else {
            return;
        };
        self.modal = Modal::ShellCommand {
            dir,
            input: TextInput::default(),
        };
    }

    /// Re-list every tree panel related to a touched path
    pub fn refresh_touched(&mut self, touched: &[PathBuf]) {
        let mut relocated = Vec::new();
        for id in [PanelId::PrimaryTree, PanelId::SecondaryTree] {
            let Some(panel) = self.tree_mut(id) else {
                continue;
            };
            let dir = panel.dir().to_path_buf();
            let related = touched
                .iter()
                .any(|p| p.starts_with(&dir) || dir.starts_with(p));
            if !related {
                continue;
            }
            if let Err(e) = panel.reload() {
                if e.is_not_found() {
                    panel.relocate(&dir);
                    relocated.push((dir, panel.dir().to_path_buf()));
                }
            }
        }
        for (from, to) in relocated {
            self.notify(
                NoticeLevel::Warning,
                format!("{} is gone, moved to {}", from.display(), to.display()),
            );
        }
        self.invalidate_preview();
    }

    fn force_refresh(&mut self) {
        let mut touched = vec![self.primary.dir().to_path_buf()];
        if let Some(secondary) = &self.secondary {
            touched.push(secondary.dir().to_path_buf());
        }
        self.refresh_touched(&touched);
        self.notify(NoticeLevel::Info, "Refreshed");
    }

    fn request_quit(&mut self, commands: &mut Vec<Command>) {
        if self.jobs.is_empty() {
            commands.push(Command::Quit);
        } else {
            self.modal = Modal::QuitConfirmation;
        }
    }

    // ------------------------------------------------------------------------
    // Modals
    // ------------------------------------------------------------------------

    fn after_modal(&mut self, outcome: ModalOutcome, commands: &mut Vec<Command>) {
        match outcome {
            ModalOutcome::Pending => {}
            ModalOutcome::Edited => {
                if let Modal::Filter { panel, input } = &self.modal {
                    let (id, text) = (*panel, input.text().to_owned());
                    if let Some(panel) = self.tree_mut(id) {
                        panel.set_filter(&text);
                    }
                }
            }
            ModalOutcome::Confirm => {
                let modal = mem::take(&mut self.modal);
                self.confirm_modal(modal, commands);
                self.next_conflict();
            }
            ModalOutcome::Cancel => {
                let modal = mem::take(&mut self.modal);
                self.cancel_modal(modal);
                self.next_conflict();
            }
            ModalOutcome::Choose(resolution) => {
                if let Modal::Conflict { job_id, .. } = mem::take(&mut self.modal) {
                    commands.push(Command::ResolveConflict { job_id, resolution });
                }
                self.next_conflict();
            }
        }
    }

    fn confirm_modal(&mut self, modal: Modal, commands: &mut Vec<Command>) {
        match modal {
            Modal::NameInput { dir, input } => {
                let result = ops::create(&dir, input.text());
                self.finish_sync_op("create", result, &[]);
            }
            Modal::Rename { target, input } => {
                let result = ops::rename(&target, input.text());
                self.finish_sync_op("rename", result, &[target]);
            }
            Modal::ShellCommand { dir, input } => {
                let template = input.text().trim();
                if !template.is_empty() {
                    let selected = self.selected_entry().map(|e| e.path.clone());
                    commands.push(Command::Shell {
                        command: build_shell_command(template, selected.as_deref()),
                        dir,
                    });
                }
            }
            Modal::DeleteConfirmation { paths } => {
                self.primary.clear_marks();
                if let Some(secondary) = self.secondary.as_mut() {
                    secondary.clear_marks();
                }
                commands.push(Command::StartDelete(paths));
            }
            Modal::MountPassword { action, drive, input } => {
                commands.push(Command::Mount {
                    action,
                    drive,
                    secret: Some(Secret::new(input.into_text())),
                });
            }
            Modal::QuitConfirmation => commands.push(Command::Quit),
            Modal::Filter { .. } | Modal::Conflict { .. } | Modal::None => {}
        }
    }

    fn cancel_modal(&mut self, modal: Modal) {
        match modal {
            Modal::Filter { panel, .. } => {
                if let Some(panel) = self.tree_mut(panel) {
                    panel.set_filter("");
                }
            }
            Modal::MountPassword { action, drive, .. } => {
                self.finish_mount(action, &drive, MountResult::Cancelled);
            }
            _ => {}
        }
    }

    /// Shared tail of the synchronous create and rename operations
    fn finish_sync_op(&mut self, what: &str, result: Result<PathBuf>, extra: &[PathBuf]) {
        match result {
            Ok(path) => {
                let mut touched = vec![path.clone()];
                touched.extend_from_slice(extra);
                self.refresh_touched(&touched);
                if let Some(panel) = self.tree_mut(self.focus) {
                    panel.list.select_key(&path);
                }
                self.notify(NoticeLevel::Info, format!("{}: {}", what, ops::display_name(&path)));
            }
            Err(e) => self.notify_error(&format!("{} failed", what), &e),
        }
    }

    fn next_conflict(&mut self) {
        if self.modal.is_active() {
            return;
        }
        if let Some((job_id, path)) = self.pending_conflicts.pop_front() {
            self.modal = Modal::Conflict { job_id, path };
        }
    }

    // ------------------------------------------------------------------------
    // Drives
    // ------------------------------------------------------------------------

    fn open_drive(&mut self, commands: &mut Vec<Command>) {
        let Some(drive) = self.drives.selected().cloned() else {
            return;
        };
        match &drive.mount_point {
            Some(mount_point) => self.navigate_target(mount_point.clone()),
            None => {
                self.open_after_mount = Some(drive.device.clone());
                self.start_mount(MountAction::Mount, drive, commands);
            }
        }
    }

    fn mount_selected(&mut self, commands: &mut Vec<Command>) {
        let Some(drive) = self.drives.selected().cloned() else {
            return;
        };
        if drive.is_mounted() {
            self.notify(NoticeLevel::Info, format!("{} is already mounted", drive.display_name()));
            return;
        }
        self.start_mount(MountAction::Mount, drive, commands);
    }

    fn unmount_selected(&mut self, commands: &mut Vec<Command>) {
        let Some(drive) = self.drives.selected().cloned() else {
            return;
        };
        let Some(mount_point) = drive.mount_point.clone() else {
            self.notify(NoticeLevel::Info, format!("{} is not mounted", drive.display_name()));
            return;
        };
        self.leave_mount_point(&mount_point);
        self.start_mount(MountAction::Unmount, drive, commands);
    }

    fn start_mount(&mut self, action: MountAction, drive: Drive, commands: &mut Vec<Command>) {
        let verb = match action {
            MountAction::Mount => "Mounting",
            MountAction::Unmount => "Unmounting",
        };
        self.notify(NoticeLevel::Info, format!("{} {}...", verb, drive.display_name()));
        commands.push(Command::Mount {
            action,
            drive,
            secret: None,
        });
    }

    /// Move every tree panel out from under `mount_point`
    pub fn leave_mount_point(&mut self, mount_point: &Path) {
        let outside = mount_point.parent().unwrap_or(mount_point);
        let target = fs_ops::nearest_listable_ancestor(outside);

        for id in [PanelId::PrimaryTree, PanelId::SecondaryTree] {
            if let Some(panel) = self.tree_mut(id) {
                if panel.dir().starts_with(mount_point) {
                    panel.relocate(&target);
                }
            }
        }
        if self
            .remembered_secondary
            .as_ref()
            .is_some_and(|p| p.starts_with(mount_point))
        {
            self.remembered_secondary = Some(target);
        }
        self.invalidate_preview();
    }

    pub fn apply_drive_scan(&mut self, scan: DriveScan) {
        self.drives_degraded = scan.degraded;
        self.drives.replace(scan.drives);
    }

    pub fn apply_drive_reply(&mut self, reply: DriveReply) {
        match reply {
            DriveReply::Scanned(scan) => self.apply_drive_scan(scan),
            DriveReply::NeedsPassword { action, drive } => {
                if self.modal.is_active() {
                    self.notify(NoticeLevel::Warning, "Authorization required; try again");
                    return;
                }
                self.modal = Modal::MountPassword {
                    action,
                    drive,
                    input: TextInput::default(),
                };
            }
            DriveReply::Finished {
                action,
                drive,
                result,
                scan,
            } => {
                if let Some(scan) = scan {
                    self.apply_drive_scan(scan);
                }
                self.finish_mount(action, &drive, result);
            }
        }
    }

    fn finish_mount(&mut self, action: MountAction, drive: &Drive, result: MountResult) {
        let open_after = self.open_after_mount.take_if(|device| *device == drive.device);
        let name = drive.display_name().to_owned();

        match result {
            MountResult::Succeeded(mount_point) => match action {
                MountAction::Mount => {
                    let at = mount_point
                        .as_ref()
                        .map(|p| format!(" at {}", p.display()))
                        .unwrap_or_default();
                    self.notify(NoticeLevel::Info, format!("Mounted {}{}", name, at));
                    if let (Some(_), Some(mount_point)) = (open_after, mount_point) {
                        self.navigate_target(mount_point);
                    }
                }
                MountAction::Unmount => self.notify(NoticeLevel::Info, format!("Unmounted {}", name)),
            },
            MountResult::Failed { code, diagnostic } => {
                let verb = match action {
                    MountAction::Mount => "mount",
                    MountAction::Unmount => "unmount",
                };
                let code = code.map(|c| format!(" (exit {})", c)).unwrap_or_default();
                self.notify(
                    NoticeLevel::Error,
                    format!("Cannot {} {}: {}{}", verb, name, diagnostic, code),
                );
            }
            MountResult::Cancelled => self.notify(NoticeLevel::Info, "Cancelled"),
        }
    }

    // ------------------------------------------------------------------------
    // Background results
    // ------------------------------------------------------------------------

    pub fn apply_job_event(&mut self, event: JobEvent) {
        match event {
            JobEvent::Conflict { job_id, path } => {
                self.pending_conflicts.push_back((job_id, path));
                self.next_conflict();
            }
            JobEvent::Finished { kind, report } => {
                if matches!(kind, JobKind::Paste(ClipboardMode::Cut) | JobKind::Delete) {
                    if let Some(clipboard) = self.clipboard.as_mut() {
                        clipboard.remove_moved(&report.moved);
                        if clipboard.is_empty() {
                            self.clipboard = None;
                        }
                    }
                }
                self.refresh_touched(&report.touched);

                let level = if !report.failures.is_empty() {
                    NoticeLevel::Error
                } else if !report.is_clean() {
                    NoticeLevel::Warning
                } else {
                    NoticeLevel::Info
                };
                self.notify(level, report.summary(kind.verb()));
            }
        }
    }

    pub fn apply_refresh(&mut self, result: RefreshResult) {
        let mut notices = Vec::new();

        for (dir, listing) in result.listings {
            for id in [PanelId::PrimaryTree, PanelId::SecondaryTree] {
                let Some(panel) = self.tree_mut(id) else {
                    continue;
                };
                // stale result for a directory we already left
                if panel.dir() != dir {
                    continue;
                }
                match &listing {
                    Ok(entries) => panel.apply_listing(entries.clone()),
                    Err(e) if e.is_not_found() => {
                        panel.relocate(&dir);
                        notices.push(format!(
                            "{} is gone, moved to {}",
                            dir.display(),
                            panel.dir().display()
                        ));
                    }
                    Err(e) => panel.record_error(e.clone()),
                }
            }
        }

        self.apply_drive_scan(result.drives);
        for notice in notices {
            self.notify(NoticeLevel::Warning, notice);
        }
    }

    pub fn apply_update(&mut self, status: Result<UpdateStatus>) {
        match status {
            Ok(status @ UpdateStatus::Available(_)) => self.notify(NoticeLevel::Warning, status.message()),
            Ok(status) => self.notify(NoticeLevel::Info, status.message()),
            Err(e) => self.notify_error("Cannot check for updates", &e),
        }
    }

    // ------------------------------------------------------------------------
    // Preview
    // ------------------------------------------------------------------------

    pub fn invalidate_preview(&mut self) {
        self.preview.path = None;
    }

    /// A render request when the selected entry differs from what is shown
    pub fn wanted_preview(&mut self) -> Option<PreviewRequest> {
        let Some(entry) = self.selected_entry().cloned() else {
            self.preview = PreviewState::default();
            return None;
        };
        if self.preview.path.as_ref() == Some(&entry.path) {
            return None;
        }

        self.preview = PreviewState {
            path: Some(entry.path.clone()),
            lines: Vec::new(),
            error: None,
            loading: true,
        };
        let rect = self.layout.preview;
        Some(PreviewRequest {
            path: entry.path,
            kind: entry.kind,
            width: rect.width.saturating_sub(2),
            height: rect.height.saturating_sub(2),
        })
    }

    pub fn apply_preview(&mut self, result: PreviewResult) {
        if self.preview.path.as_ref() != Some(&result.path) {
            return;
        }
        self.preview.loading = false;
        match result.lines {
            Ok(lines) => {
                self.preview.lines = lines;
                self.preview.error = None;
            }
            Err(e) => {
                self.preview.lines.clear();
                self.preview.error = Some(e.to_string());
            }
        }
    }
}

/// Quote `s` for `sh -c`
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Substitute `{file}` with the quoted selection, or append it when absent.
pub fn build_shell_command(template: &str, selected: Option<&Path>) -> String {
    let Some(path) = selected else {
        return template.to_owned();
    };
    let quoted = shell_quote(&path.to_string_lossy());
    if template.contains("{file}") {
        template.replace("{file}", &quoted)
    } else {
        format!("{} {}", template, quoted)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::ops::OpReport;

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ch(c: char) -> AppEvent {
        key(KeyCode::Char(c))
    }

    fn config() -> Config {
        Config {
            shortcuts: Vec::new(),
            ..Config::default()
        }
    }

    fn session_in(dir: &Path) -> Session {
        let mut session = Session::new(config(), dir.to_path_buf(), None, false);
        session.dispatch(AppEvent::Resize {
            width: 120,
            height: 40,
        });
        session
    }

    fn names(panel: &TreePanel) -> Vec<String> {
        panel.list.items().iter().map(|e| e.name.clone()).collect()
    }

    fn drive(mount_point: Option<PathBuf>) -> Drive {
        Drive {
            device: PathBuf::from("/dev/sdz1"),
            name: "sdz1".to_owned(),
            mount_point,
            label: Some("USB".to_owned()),
            model: None,
            fs_type: Some("vfat".to_owned()),
            capacity: 1 << 30,
            used: None,
        }
    }

    #[test]
    fn test_focus_cycle_skips_inactive_secondary() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());

        let mut seen = Vec::new();
        for _ in 0..3 {
            session.dispatch(key(KeyCode::Tab));
            seen.push(session.focus);
        }
        assert_eq!(
            seen,
            vec![PanelId::Drives, PanelId::Shortcuts, PanelId::PrimaryTree]
        );

        session.dispatch(ch('t'));
        session.dispatch(key(KeyCode::Tab));
        assert_eq!(session.focus, PanelId::SecondaryTree);
    }

    #[test]
    fn test_dual_panel_off_moves_focus_and_remembers_path() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        let mut session = session_in(tmp.path());

        session.dispatch(ch('t'));
        session.dispatch(key(KeyCode::Tab));
        assert_eq!(session.focus, PanelId::SecondaryTree);
        session.dispatch(key(KeyCode::Enter));
        assert_eq!(session.secondary.as_ref().unwrap().dir(), tmp.path().join("sub"));

        session.dispatch(ch('t'));
        assert!(session.secondary.is_none());
        assert_eq!(session.focus, PanelId::PrimaryTree);
        assert_eq!(session.secondary_path(), Some(tmp.path().join("sub")));

        session.dispatch(ch('t'));
        assert_eq!(session.secondary.as_ref().unwrap().dir(), tmp.path().join("sub"));
    }

    #[test]
    fn test_copy_then_paste_issues_job_for_focused_directory() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("dst")).unwrap();
        fs::write(tmp.path().join("a.txt"), b"").unwrap();
        let mut session = session_in(tmp.path());

        session.dispatch(key(KeyCode::Down));
        assert_eq!(session.selected_entry().unwrap().name, "a.txt");
        session.dispatch(ch('c'));
        let clip = session.clipboard.clone().unwrap();
        assert_eq!(clip.paths(), &[tmp.path().join("a.txt")]);
        assert_eq!(clip.mode, ClipboardMode::Copy);

        session.dispatch(key(KeyCode::Up));
        session.dispatch(key(KeyCode::Enter));
        let commands = session.dispatch(ch('v'));
        match commands.as_slice() {
            [Command::StartPaste { sources, mode, dest }] => {
                assert_eq!(sources, &vec![tmp.path().join("a.txt")]);
                assert_eq!(*mode, ClipboardMode::Copy);
                assert_eq!(dest, &tmp.path().join("dst"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cut_clipboard_shrinks_to_unmoved_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        let (a, b) = (tmp.path().join("a"), tmp.path().join("b"));
        session.clipboard = Some(Clipboard::new(
            [a.clone(), b.clone()],
            ClipboardMode::Cut,
            PanelId::PrimaryTree,
        ));

        let report = OpReport {
            moved: vec![a],
            ..OpReport::default()
        };
        session.apply_job_event(JobEvent::Finished {
            kind: JobKind::Paste(ClipboardMode::Cut),
            report,
        });
        assert_eq!(session.clipboard.as_ref().unwrap().paths(), &[b.clone()]);

        let report = OpReport {
            moved: vec![b],
            ..OpReport::default()
        };
        session.apply_job_event(JobEvent::Finished {
            kind: JobKind::Paste(ClipboardMode::Cut),
            report,
        });
        assert!(session.clipboard.is_none());
    }

    #[test]
    fn test_copy_clipboard_survives_paste() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        let a = tmp.path().join("a");
        session.clipboard = Some(Clipboard::new([a.clone()], ClipboardMode::Copy, PanelId::PrimaryTree));

        session.apply_job_event(JobEvent::Finished {
            kind: JobKind::Paste(ClipboardMode::Copy),
            report: OpReport {
                succeeded: vec![tmp.path().join("a (2)")],
                ..OpReport::default()
            },
        });
        assert_eq!(session.clipboard.as_ref().unwrap().paths(), &[a]);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("doomed"), b"").unwrap();
        let mut session = session_in(tmp.path());

        assert!(session.dispatch(ch('d')).is_empty());
        assert!(matches!(session.modal, Modal::DeleteConfirmation { .. }));

        // navigation keys go to the modal, not the panel
        assert!(session.dispatch(key(KeyCode::Down)).is_empty());
        let commands = session.dispatch(ch('y'));
        assert!(matches!(
            commands.as_slice(),
            [Command::StartDelete(paths)] if paths == &vec![tmp.path().join("doomed")]
        ));
        assert!(!session.modal.is_active());
    }

    #[test]
    fn test_conflicts_queue_behind_open_modal() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        session.dispatch(ch(':'));

        session.apply_job_event(JobEvent::Conflict {
            job_id: JobId::for_test(7),
            path: tmp.path().join("x"),
        });
        assert!(matches!(session.modal, Modal::ShellCommand { .. }));

        session.dispatch(key(KeyCode::Esc));
        assert!(matches!(session.modal, Modal::Conflict { .. }));

        let commands = session.dispatch(ch('s'));
        assert!(matches!(
            commands.as_slice(),
            [Command::ResolveConflict { resolution: Resolution::Skip, .. }]
        ));
    }

    #[test]
    fn test_rename_and_create_run_synchronously() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("old"), b"").unwrap();
        let mut session = session_in(tmp.path());

        session.dispatch(ch('r'));
        for _ in 0..3 {
            session.dispatch(key(KeyCode::Backspace));
        }
        for c in "new".chars() {
            session.dispatch(ch(c));
        }
        session.dispatch(key(KeyCode::Enter));
        assert_eq!(names(&session.primary), vec!["new"]);

        session.dispatch(ch('n'));
        for c in "notes".chars() {
            session.dispatch(ch(c));
        }
        session.dispatch(key(KeyCode::Enter));
        assert_eq!(names(&session.primary), vec!["new", "notes"]);
        assert_eq!(session.selected_entry().unwrap().name, "notes");
    }

    #[test]
    fn test_invalid_rename_posts_error_notice() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a"), b"").unwrap();
        let mut session = session_in(tmp.path());

        session.dispatch(ch('r'));
        session.dispatch(ch('/'));
        session.dispatch(ch('b'));
        session.dispatch(key(KeyCode::Enter));

        let notice = session.notice.as_ref().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.text.contains("invalid name"));
        assert_eq!(names(&session.primary), vec!["a"]);
    }

    #[test]
    fn test_filter_applies_live_and_escape_clears() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["alpha", "beta", "alphabet"] {
            fs::write(tmp.path().join(name), b"").unwrap();
        }
        let mut session = session_in(tmp.path());

        session.dispatch(ch('/'));
        for c in "ALP".chars() {
            session.dispatch(ch(c));
        }
        assert_eq!(names(&session.primary), vec!["alpha", "alphabet"]);
        session.dispatch(key(KeyCode::Enter));
        assert_eq!(session.primary.filter(), "ALP");

        session.dispatch(key(KeyCode::Esc));
        assert_eq!(names(&session.primary).len(), 3);
    }

    #[test]
    fn test_double_click_enters_directory() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("inner")).unwrap();
        let mut session = session_in(tmp.path());
        session.focus = PanelId::Shortcuts;

        let rect = session.layout.primary;
        session.dispatch(AppEvent::Click {
            col: rect.x + 2,
            row: rect.y + 1,
        });
        assert_eq!(session.focus, PanelId::PrimaryTree);
        assert_eq!(session.primary.dir(), tmp.path());

        session.dispatch(AppEvent::DoubleClick {
            col: rect.x + 2,
            row: rect.y + 1,
        });
        assert_eq!(session.primary.dir(), tmp.path().join("inner"));
    }

    #[test]
    fn test_double_click_on_file_edits() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("f.txt"), b"").unwrap();
        let mut session = session_in(tmp.path());
        let rect = session.layout.primary;

        let commands = session.dispatch(AppEvent::DoubleClick {
            col: rect.x + 2,
            row: rect.y + 1,
        });
        assert!(matches!(commands.as_slice(), [Command::Edit(p)] if p == &tmp.path().join("f.txt")));
    }

    #[test]
    fn test_mouse_ignored_while_modal_open() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("inner")).unwrap();
        let mut session = session_in(tmp.path());
        session.dispatch(ch(':'));

        let rect = session.layout.primary;
        session.dispatch(AppEvent::DoubleClick {
            col: rect.x + 2,
            row: rect.y + 1,
        });
        assert_eq!(session.primary.dir(), tmp.path());
    }

    #[test]
    fn test_unmount_relocates_panels_below_mount_point() {
        let tmp = tempfile::tempdir().unwrap();
        let mount_point = tmp.path().join("media/usb");
        fs::create_dir_all(mount_point.join("photos")).unwrap();

        let mut session = session_in(&mount_point.join("photos"));
        session.dispatch(ch('t'));
        session.apply_drive_scan(DriveScan {
            drives: vec![drive(Some(mount_point.clone()))],
            degraded: false,
        });

        session.focus = PanelId::Drives;
        let commands = session.dispatch(ch('u'));
        assert!(matches!(
            commands.as_slice(),
            [Command::Mount { action: MountAction::Unmount, secret: None, .. }]
        ));
        assert_eq!(session.primary.dir(), tmp.path().join("media"));
        assert_eq!(session.secondary.as_ref().unwrap().dir(), tmp.path().join("media"));
    }

    #[test]
    fn test_mount_keys_only_act_in_drives_panel() {
        let tmp = tempfile::tempdir().unwrap();
        let mount_point = tmp.path().join("usb");
        fs::create_dir(&mount_point).unwrap();
        let mut session = session_in(tmp.path());
        session.apply_drive_scan(DriveScan {
            drives: vec![drive(Some(mount_point.clone()))],
            degraded: false,
        });

        assert_eq!(session.focus, PanelId::PrimaryTree);
        assert!(session.dispatch(ch('u')).is_empty());
        assert!(session.dispatch(ch('m')).is_empty());
        assert!(mount_point.is_dir());

        session.focus = PanelId::Drives;
        assert!(matches!(
            session.dispatch(ch('u')).as_slice(),
            [Command::Mount { action: MountAction::Unmount, .. }]
        ));
    }

    #[test]
    fn test_password_modal_escape_cancels_mount() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        session.apply_drive_reply(DriveReply::NeedsPassword {
            action: MountAction::Mount,
            drive: drive(None),
        });
        assert!(session.modal.is_masked());

        for c in "pw".chars() {
            session.dispatch(ch(c));
        }
        let commands = session.dispatch(key(KeyCode::Esc));
        assert!(commands.is_empty());
        assert_eq!(session.notice.as_ref().unwrap().text, "Cancelled");
    }

    #[test]
    fn test_password_modal_submits_secret() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        session.apply_drive_reply(DriveReply::NeedsPassword {
            action: MountAction::Mount,
            drive: drive(None),
        });
        for c in "pw".chars() {
            session.dispatch(ch(c));
        }
        let commands = session.dispatch(key(KeyCode::Enter));
        assert!(matches!(
            commands.as_slice(),
            [Command::Mount { secret: Some(_), .. }]
        ));
    }

    #[test]
    fn test_opening_unmounted_drive_mounts_then_navigates() {
        let tmp = tempfile::tempdir().unwrap();
        let mount_point = tmp.path().join("usb");
        fs::create_dir(&mount_point).unwrap();
        let mut session = session_in(tmp.path());
        session.apply_drive_scan(DriveScan {
            drives: vec![drive(None)],
            degraded: false,
        });

        session.focus = PanelId::Drives;
        let commands = session.dispatch(key(KeyCode::Enter));
        assert!(matches!(
            commands.as_slice(),
            [Command::Mount { action: MountAction::Mount, .. }]
        ));

        session.apply_drive_reply(DriveReply::Finished {
            action: MountAction::Mount,
            drive: drive(None),
            result: MountResult::Succeeded(Some(mount_point.clone())),
            scan: None,
        });
        assert_eq!(session.primary.dir(), mount_point);
        assert_eq!(session.focus, PanelId::PrimaryTree);
    }

    #[test]
    fn test_refresh_relocates_vanished_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let doomed = tmp.path().join("a/b");
        fs::create_dir_all(&doomed).unwrap();
        let mut session = session_in(&doomed);

        fs::remove_dir_all(tmp.path().join("a")).unwrap();
        session.apply_refresh(RefreshResult {
            listings: vec![(doomed.clone(), fs_ops::list_dir(&doomed))],
            drives: DriveScan::default(),
        });

        assert_eq!(session.primary.dir(), tmp.path());
        let notice = session.notice.as_ref().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
    }

    #[test]
    fn test_refresh_keeps_cursor_on_same_entry() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["b", "c"] {
            fs::write(tmp.path().join(name), b"").unwrap();
        }
        let mut session = session_in(tmp.path());
        session.dispatch(key(KeyCode::Down));
        assert_eq!(session.selected_entry().unwrap().name, "c");

        fs::write(tmp.path().join("a"), b"").unwrap();
        session.apply_refresh(RefreshResult {
            listings: vec![(tmp.path().to_path_buf(), fs_ops::list_dir(tmp.path()))],
            drives: DriveScan::default(),
        });
        assert_eq!(session.selected_entry().unwrap().name, "c");
        assert_eq!(session.primary.list.cursor(), 2);
    }

    #[test]
    fn test_quit_asks_while_jobs_run() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session_in(tmp.path());
        assert!(matches!(session.dispatch(ch('q')).as_slice(), [Command::Quit]));

        session.jobs = vec!["Copying 'a'".to_owned()];
        assert!(session.dispatch(ch('q')).is_empty());
        assert!(matches!(session.modal, Modal::QuitConfirmation));
        assert!(matches!(session.dispatch(ch('y')).as_slice(), [Command::Quit]));
    }

    #[test]
    fn test_build_shell_command() {
        let path = Path::new("/tmp/it's here.txt");
        assert_eq!(
            build_shell_command("wc -l {file}", Some(path)),
            r"wc -l '/tmp/it'\''s here.txt'"
        );
        assert_eq!(
            build_shell_command("file", Some(Path::new("/a b"))),
            "file '/a b'"
        );
        assert_eq!(build_shell_command("ls", None), "ls");
    }

    #[test]
    fn test_preview_requested_once_per_selection() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a"), b"").unwrap();
        fs::write(tmp.path().join("b"), b"").unwrap();
        let mut session = session_in(tmp.path());

        let first = session.wanted_preview().unwrap();
        assert_eq!(first.path, tmp.path().join("a"));
        assert!(session.wanted_preview().is_none());

        session.dispatch(key(KeyCode::Down));
        assert_eq!(session.wanted_preview().unwrap().path, tmp.path().join("b"));
    }
}
