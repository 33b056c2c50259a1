mod config;
mod dialog;
mod drives;
mod error;
mod events;
mod fs_ops;
mod jobs;
mod layout;
mod modal;
mod ops;
mod panel;
mod preview;
mod refresh;
mod render;
mod session;
mod state;
mod theme;
mod update;
mod util;

use std::{
    env, fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process,
    sync::Arc,
    time::{Duration, Instant},
};

use color_eyre::eyre::{bail, WrapErr};
use crossterm::{
    event::{self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::DefaultTerminal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::Config;
use drives::{DriveRequest, DriveWorker, SystemRunner};
use events::{AppEvent, ClickTracker};
use jobs::JobManager;
use preview::{DefaultRenderer, PreviewWorker};
use refresh::Refresher;
use session::{Command, NoticeLevel, Session};
use state::AppState;
use update::{GithubReleases, UpdateTask};
use util::EVENT_POLL_MS;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_logging();

    let start_dir = start_dir()?;
    let config = Config::load();
    tracing::info!("starting in {}", start_dir.display());

    let mut app = App::new(config, start_dir);
    ratatui::run(|terminal| app.run(terminal))?;
    app.save_state();
    Ok(())
}

/// Log to `$XDG_STATE_HOME/burrow/burrow.log`; the terminal belongs to the UI.
fn init_logging() {
    let dir = state::state_dir();
    if fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(log_file) = fs::File::create(dir.join("burrow.log")) else {
        return;
    };

    let filter = EnvFilter::try_from_env("BURROW_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_writer(Arc::new(log_file)).with_ansi(false);
    let _ = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init();
}

/// First CLI argument, or the current directory
fn start_dir() -> color_eyre::Result<PathBuf> {
    let Some(arg) = env::args_os().nth(1) else {
        return env::current_dir().wrap_err("cannot determine the current directory");
    };
    let path = PathBuf::from(arg);
    if !path.is_dir() {
        bail!("not a directory: {}", path.display());
    }
    path.canonicalize()
        .wrap_err_with(|| format!("cannot resolve {}", path.display()))
}

// ============================================================================
// App
// ============================================================================

struct App {
    session: Session,
    jobs: JobManager,
    drives: DriveWorker,
    refresher: Refresher,
    previews: PreviewWorker,
    update: Option<UpdateTask>,
    clicks: ClickTracker,
    should_quit: bool,
}

impl App {
    fn new(config: Config, start_dir: PathBuf) -> Self {
        let state = AppState::load();
        let dual_panel = state.dual_panel || config.start_dual_panel;
        let timeout = config.helper_timeout();

        let drives = DriveWorker::spawn(Box::new(SystemRunner), timeout);
        let refresher = Refresher::spawn(config.refresh_interval(), Box::new(SystemRunner), timeout);
        let previews = PreviewWorker::spawn(Box::new(DefaultRenderer));
        let clicks = ClickTracker::new(config.double_click_window(), config.double_click_distance);

        Self {
            session: Session::new(config, start_dir, state.secondary_path, dual_panel),
            jobs: JobManager::new(),
            drives,
            refresher,
            previews,
            update: None,
            clicks,
            should_quit: false,
        }
    }

    fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        io::stdout().execute(EnableMouseCapture)?;
        io::stdout().execute(EnableBracketedPaste)?;

        let size = terminal.size()?;
        self.session.dispatch(AppEvent::Resize {
            width: size.width,
            height: size.height,
        });
        self.drives.submit(DriveRequest::Rescan);
        if self.session.config.check_updates_on_start {
            self.start_update_check();
        }

        while !self.should_quit {
            self.apply_background_results();
            if let Some(request) = self.session.wanted_preview() {
                self.previews.request(request);
            }
            self.session.expire_notice(Instant::now());
            self.session.sync_view();

            terminal.draw(|frame| self.session.render(frame))?;

            if event::poll(Duration::from_millis(EVENT_POLL_MS))? {
                self.handle_events(terminal)?;
            }
        }

        io::stdout().execute(DisableBracketedPaste)?;
        io::stdout().execute(DisableMouseCapture)?;
        Ok(())
    }

    /// Drain every pending terminal event before the next frame
    fn handle_events(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        loop {
            let event = event::read()?;
            if let Some(event) = self.clicks.translate(event, Instant::now()) {
                let commands = self.session.dispatch(event);
                for command in commands {
                    self.execute(command, terminal)?;
                }
            }
            if self.should_quit || !event::poll(Duration::ZERO)? {
                return Ok(());
            }
        }
    }

    fn apply_background_results(&mut self) {
        for event in self.jobs.process_updates() {
            self.session.apply_job_event(event);
        }

        let mut running: Vec<String> = self
            .jobs
            .running()
            .into_iter()
            .map(|job| match &job.current {
                Some(current) => format!("{}: {}", job.description, current),
                None => job.description.clone(),
            })
            .collect();
        if self.drives.is_busy() {
            running.push("Drive helper running".to_owned());
        }
        self.session.jobs = running;

        for result in self.refresher.poll() {
            self.session.apply_refresh(result);
        }
        for reply in self.drives.poll() {
            self.session.apply_drive_reply(reply);
        }
        if let Some(result) = self.previews.poll() {
            self.session.apply_preview(result);
        }
        if let Some(status) = self.update.as_ref().and_then(UpdateTask::poll) {
            self.session.apply_update(status);
            self.update = None;
        }

        // navigation may have changed what the refresher should list
        self.refresher.watch(self.session.watched_dirs());
    }

    fn execute(&mut self, command: Command, terminal: &mut DefaultTerminal) -> io::Result<()> {
        match command {
            Command::StartPaste { sources, mode, dest } => {
                self.jobs.start_paste(sources, mode, dest);
            }
            Command::StartDelete(paths) => {
                self.jobs.start_delete(paths);
            }
            Command::ResolveConflict { job_id, resolution } => {
                self.jobs.send_conflict_resolution(job_id, resolution);
            }
            Command::Mount { action, drive, secret } => {
                self.drives.submit(DriveRequest::Run { action, drive, secret });
            }
            Command::RefreshAll => {
                self.refresher.refresh_now();
                self.drives.submit(DriveRequest::Rescan);
            }
            Command::Edit(path) => self.edit(&path, terminal)?,
            Command::Shell { command, dir } => self.shell(&command, &dir, terminal)?,
            Command::CheckUpdates => self.start_update_check(),
            Command::Quit => self.should_quit = true,
        }
        Ok(())
    }

    fn start_update_check(&mut self) {
        if self.update.is_some() {
            return;
        }
        let source = GithubReleases::new(self.session.config.update_repo.clone());
        self.update = Some(UpdateTask::spawn(Box::new(source)));
    }

    fn edit(&mut self, path: &Path, terminal: &mut DefaultTerminal) -> io::Result<()> {
        let Some(editor) = self.session.config.resolve_editor() else {
            let tried = self.session.config.editors.join(", ");
            self.session
                .notify(NoticeLevel::Error, format!("No editor found (tried {})", tried));
            return Ok(());
        };

        tracing::info!("editing {} with {}", path.display(), editor.display());
        let status = suspended(terminal, || process::Command::new(&editor).arg(path).status())?;

        match status {
            Ok(status) if !status.success() => self
                .session
                .notify(NoticeLevel::Warning, format!("Editor exited with {}", status)),
            Ok(_) => {}
            Err(e) => self.session.notify(
                NoticeLevel::Error,
                format!("Failed to run '{}': {}", editor.display(), e),
            ),
        }
        self.session.refresh_touched(&[path.to_path_buf()]);
        Ok(())
    }

    fn shell(&mut self, command: &str, dir: &Path, terminal: &mut DefaultTerminal) -> io::Result<()> {
        tracing::info!("running shell command in {}", dir.display());
        let status = suspended(terminal, || {
            let status = process::Command::new("sh")
                .arg("-c")
                .arg(command)
                .current_dir(dir)
                .status();

            println!("\n[Press Enter to continue]");
            let _ = io::stdout().flush();
            let mut buf = String::new();
            let _ = io::stdin().read_line(&mut buf);
            status
        })?;

        if let Err(e) = status {
            self.session
                .notify(NoticeLevel::Error, format!("Failed to run sh: {}", e));
        }
        self.session.refresh_touched(&[dir.to_path_buf()]);
        Ok(())
    }

    fn save_state(&self) {
        AppState {
            secondary_path: self.session.secondary_path(),
            dual_panel: self.session.dual_panel(),
        }
        .save();
    }
}

/// Hand the terminal to a child process for the duration of `f`
fn suspended<T>(terminal: &mut DefaultTerminal, f: impl FnOnce() -> T) -> io::Result<T> {
    let mut stdout = io::stdout();
    stdout.execute(DisableMouseCapture)?;
    stdout.execute(LeaveAlternateScreen)?;
    disable_raw_mode()?;

    let result = f();

    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;
    // Force ratatui to do a full redraw
    terminal.clear()?;
    Ok(result)
}
