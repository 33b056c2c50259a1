use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "burrow";

/// A labelled bookmark shown in the shortcuts panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortcut {
    pub path: PathBuf,
    pub label: String,
}

/// User configuration, read once at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_shortcuts")]
    pub shortcuts: Vec<Shortcut>,

    /// Editors tried in order; the first one found on PATH wins
    #[serde(default = "default_editors")]
    pub editors: Vec<String>,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_ms: u64,

    #[serde(default = "default_double_click_ms")]
    pub double_click_ms: u64,

    /// Maximum column distance between the two presses of a double click
    #[serde(default = "default_double_click_distance")]
    pub double_click_distance: u16,

    #[serde(default = "default_helper_timeout")]
    pub helper_timeout_secs: u64,

    #[serde(default = "default_notice_secs")]
    pub notice_secs: u64,

    #[serde(default = "default_update_repo")]
    pub update_repo: String,

    #[serde(default)]
    pub check_updates_on_start: bool,

    #[serde(default)]
    pub start_dual_panel: bool,
}

fn default_shortcuts() -> Vec<Shortcut> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };

    let mut shortcuts = vec![Shortcut {
        path: home.clone(),
        label: "Home".to_owned(),
    }];

    let known = [
        (dirs::download_dir(), "Downloads"),
        (dirs::picture_dir(), "Pictures"),
        (dirs::video_dir(), "Videos"),
        (dirs::document_dir(), "Documents"),
        (dirs::desktop_dir(), "Desktop"),
    ];
    for (dir, label) in known {
        shortcuts.push(Shortcut {
            path: dir.unwrap_or_else(|| home.join(label)),
            label: label.to_owned(),
        });
    }

    shortcuts
}

fn default_editors() -> Vec<String> {
    ["nvim", "vim", "nano", "vi"].map(str::to_owned).to_vec()
}

fn default_refresh_interval() -> u64 {
    2000
}

fn default_double_click_ms() -> u64 {
    400
}

fn default_double_click_distance() -> u16 {
    1
}

fn default_helper_timeout() -> u64 {
    15
}

fn default_notice_secs() -> u64 {
    5
}

fn default_update_repo() -> String {
    "burrow-fm/burrow".to_owned()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shortcuts: default_shortcuts(),
            editors: default_editors(),
            refresh_interval_ms: default_refresh_interval(),
            double_click_ms: default_double_click_ms(),
            double_click_distance: default_double_click_distance(),
            helper_timeout_secs: default_helper_timeout(),
            notice_secs: default_notice_secs(),
            update_repo: default_update_repo(),
            check_updates_on_start: false,
            start_dual_panel: false,
        }
    }
}

impl Config {
    pub const FILENAME: &'static str = "config.json";

    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(Self::FILENAME))
    }

    /// Load the user config, falling back to defaults when it is missing or broken.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!("cannot read {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match serde_json::from_str(&text) {
            Ok(config) => {
                tracing::info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(100))
    }

    pub fn double_click_window(&self) -> Duration {
        Duration::from_millis(self.double_click_ms)
    }

    pub fn helper_timeout(&self) -> Duration {
        Duration::from_secs(self.helper_timeout_secs.max(1))
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_secs(self.notice_secs)
    }

    /// First configured editor that resolves on PATH
    pub fn resolve_editor(&self) -> Option<PathBuf> {
        let search = env::var_os("PATH")?;
        self.editors
            .iter()
            .find_map(|name| find_in_path(name, &search))
    }
}

fn find_in_path(program: &str, search: &std::ffi::OsStr) -> Option<PathBuf> {
    if program.contains('/') {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }
    env::split_paths(search)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
