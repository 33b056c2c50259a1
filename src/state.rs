use std::{
    fs,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::config::APP_NAME;

/// `$XDG_STATE_HOME/burrow`, falling back to `~/.local/state/burrow` on
/// platforms without a state directory
pub fn state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/state")))
        .unwrap_or_else(|| PathBuf::from(".local/state"))
        .join(APP_NAME)
}

pub fn get_state_file_path() -> PathBuf {
    state_dir().join("state")
}

/// What survives between runs
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AppState {
    pub secondary_path: Option<PathBuf>,
    pub dual_panel: bool,
}

impl AppState {
    pub fn load() -> Self {
        Self::load_from(&get_state_file_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(file) = fs::File::open(path) else {
            return Self::default();
        };

        let reader = BufReader::new(file);
        let mut state = Self::default();

        for line in reader.lines().map_while(Result::ok) {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key {
                "secondary" => {
                    let path = PathBuf::from(value);
                    // Only use the path if it still exists
                    if path.is_dir() {
                        state.secondary_path = Some(path);
                    }
                }
                "dual" => state.dual_panel = value == "1",
                _ => {}
            }
        }

        state
    }

    pub fn save(&self) {
        let path = get_state_file_path();
        if let Err(e) = self.save_to(&path) {
            tracing::warn!("cannot save state to {}: {}", path.display(), e);
        }
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(fs::File::create(path)?);
        if let Some(secondary) = &self.secondary_path {
            writeln!(writer, "secondary={}", secondary.display())?;
        }
        writeln!(writer, "dual={}", if self.dual_panel { 1 } else { 0 })?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_survives_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("nested/state");
        let state = AppState {
            secondary_path: Some(tmp.path().to_path_buf()),
            dual_panel: true,
        };

        state.save_to(&file).unwrap();
        assert_eq!(AppState::load_from(&file), state);
    }

    #[test]
    fn test_vanished_secondary_path_is_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("state");
        fs::write(&file, "secondary=/no/such/dir\ndual=1\ngarbage\n").unwrap();

        let state = AppState::load_from(&file);
        assert_eq!(state.secondary_path, None);
        assert!(state.dual_panel);
    }

    #[test]
    fn test_state_dir_follows_platform_state_home() {
        let dir = state_dir();
        assert!(dir.ends_with(APP_NAME));
        if let Some(state_home) = dirs::state_dir() {
            assert_eq!(dir, state_home.join(APP_NAME));
        }
        assert_eq!(get_state_file_path(), dir.join("state"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(AppState::load_from(&tmp.path().join("absent")), AppState::default());
    }
}
