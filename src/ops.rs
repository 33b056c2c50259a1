use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

use crate::{
    error::{Error, Result},
    fs_ops::{self, EntryKind, MoveOutcome},
    panel::PanelId,
};

// ============================================================================
// Clipboard
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipboardMode {
    Copy,
    Cut,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clipboard {
    paths: Vec<PathBuf>,
    pub mode: ClipboardMode,
    pub owner: PanelId,
}

impl Clipboard {
    /// Build a clipboard from paths in selection order. Duplicates are dropped.
    pub fn new(paths: impl IntoIterator<Item = PathBuf>, mode: ClipboardMode, owner: PanelId) -> Self {
        let mut unique: Vec<PathBuf> = Vec::new();
        for path in paths {
            if !unique.contains(&path) {
                unique.push(path);
            }
        }
        Self {
            paths: unique,
            mode,
            owner,
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Drop sources that a cut paste moved away
    pub fn remove_moved(&mut self, moved: &[PathBuf]) {
        self.paths.retain(|p| !moved.contains(p));
    }

    pub fn summary(&self) -> String {
        let verb = match self.mode {
            ClipboardMode::Copy => "copy",
            ClipboardMode::Cut => "cut",
        };
        match self.paths.as_slice() {
            [single] => format!("{}: {}", verb, display_name(single)),
            paths => format!("{}: {} items", verb, paths.len()),
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Answer to a destination collision
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Overwrite,
    Skip,
    Rename,
    Cancel,
}

#[derive(Debug, Default, Clone)]
pub struct OpReport {
    pub succeeded: Vec<PathBuf>,
    pub skipped: usize,
    pub failures: Vec<(PathBuf, Error)>,
    pub warnings: Vec<String>,
    /// Sources that no longer exist at their old location
    pub moved: Vec<PathBuf>,
    /// Every path whose parent listing may have changed
    pub touched: Vec<PathBuf>,
}

impl OpReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.warnings.is_empty()
    }

    fn touch(&mut self, path: &Path) {
        if !self.touched.iter().any(|p| p == path) {
            self.touched.push(path.to_path_buf());
        }
    }

    /// One-line summary for the status bar
    pub fn summary(&self, verb: &str) -> String {
        let mut parts = vec![format!("{} {}", verb, self.succeeded.len())];
        if self.skipped > 0 {
            parts.push(format!("skipped {}", self.skipped));
        }
        if !self.failures.is_empty() {
            parts.push(format!("failed {}", self.failures.len()));
        }
        let mut line = parts.join(", ");
        if let Some((_, err)) = self.failures.first() {
            line.push_str(&format!(" ({})", err));
        } else if let Some(warning) = self.warnings.first() {
            line.push_str(&format!(" ({})", warning));
        }
        line
    }
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

// ============================================================================
// Paste
// ============================================================================

/// Copy or move every clipboard source into `dest_dir`.
///
/// `resolve` is asked only when a destination already exists and the source
/// lives elsewhere. `progress` is told about each source before it is handled.
pub fn paste(
    sources: &[PathBuf],
    mode: ClipboardMode,
    dest_dir: &Path,
    mut resolve: impl FnMut(&Path) -> Resolution,
    mut progress: impl FnMut(&Path),
) -> OpReport {
    let mut report = OpReport::default();
    report.touch(dest_dir);

    for (index, source) in sources.iter().enumerate() {
        progress(source);

        let Some(name) = source.file_name() else {
            report
                .failures
                .push((source.clone(), Error::InvalidName(source.display().to_string())));
            continue;
        };

        let source_is_dir = fs_ops::stat(source).map(|e| e.is_dir()).unwrap_or(false);
        if source_is_dir && dest_dir.starts_with(source) {
            report.failures.push((
                source.clone(),
                Error::InvalidName(format!(
                    "cannot paste {} into itself",
                    display_name(source)
                )),
            ));
            continue;
        }

        let same_dir = source.parent() == Some(dest_dir);
        if same_dir && mode == ClipboardMode::Cut {
            report.skipped += 1;
            continue;
        }

        let mut dest = dest_dir.join(name);
        let mut overwrite = false;
        if same_dir {
            dest = free_name(dest_dir, name, source_is_dir);
        } else if dest.symlink_metadata().is_ok() {
            match resolve(&dest) {
                Resolution::Overwrite => overwrite = true,
                Resolution::Skip => {
                    report.skipped += 1;
                    continue;
                }
                Resolution::Rename => dest = free_name(dest_dir, name, source_is_dir),
                Resolution::Cancel => {
                    report.skipped += sources.len() - index;
                    break;
                }
            }
        }

        let result = if overwrite {
            replace_existing(source, &dest, mode)
        } else {
            transfer(source, &dest, mode)
        };

        match result {
            Ok(outcome) => {
                report.touch(&dest);
                report.succeeded.push(dest);
                if mode == ClipboardMode::Cut {
                    if let Some(parent) = source.parent() {
                        report.touch(parent);
                    }
                    match outcome {
                        MoveOutcome::Moved => report.moved.push(source.clone()),
                        MoveOutcome::SourceKept(e) => report
                            .warnings
                            .push(format!("copied but could not remove source: {}", e)),
                    }
                }
            }
            Err(e) => report.failures.push((source.clone(), e)),
        }
    }

    report
}

fn transfer(source: &Path, dest: &Path, mode: ClipboardMode) -> Result<MoveOutcome> {
    match mode {
        ClipboardMode::Copy => fs_ops::copy(source, dest).map(|()| MoveOutcome::Moved),
        ClipboardMode::Cut => fs_ops::move_path(source, dest),
    }
}

/// Put `source` at `dest`, replacing what is there. The new content is staged
/// under a hidden name first; the old destination is removed only once the
/// stage is complete.
fn replace_existing(source: &Path, dest: &Path, mode: ClipboardMode) -> Result<MoveOutcome> {
    if source.starts_with(dest) {
        return Err(Error::InvalidName(format!(
            "{} is inside {}",
            display_name(source),
            display_name(dest)
        )));
    }

    let (Some(dir), Some(name)) = (dest.parent(), dest.file_name()) else {
        return Err(Error::InvalidName(dest.display().to_string()));
    };
    let mut stage_name = OsString::from(".");
    stage_name.push(name);
    stage_name.push(".part");
    let mut stage = dir.join(&stage_name);
    if stage.symlink_metadata().is_ok() {
        stage = free_name(dir, &stage_name, false);
    }

    let outcome = match transfer(source, &stage, mode) {
        Ok(outcome) => outcome,
        Err(e) => {
            if stage.symlink_metadata().is_ok() {
                if let Err(cleanup) = fs_ops::delete(&stage) {
                    tracing::warn!("could not remove {}: {}", stage.display(), cleanup);
                }
            }
            return Err(e);
        }
    };

    if let Err(e) = fs_ops::delete(dest) {
        // give the staged content back so nothing is lost
        let restored = match (mode, &outcome) {
            (ClipboardMode::Cut, MoveOutcome::Moved) => fs_ops::move_path(&stage, source).map(|_| ()),
            _ => fs_ops::delete(&stage),
        };
        if let Err(undo) = restored {
            tracing::warn!("could not undo staged {}: {}", stage.display(), undo);
        }
        return Err(e);
    }

    fs_ops::rename(&stage, dest)?;
    Ok(outcome)
}

/// `name (n).ext` with the smallest n >= 2 that is free in `dir`
pub fn free_name(dir: &Path, name: &OsStr, is_dir: bool) -> PathBuf {
    let as_path = Path::new(name);
    let (stem, ext) = if is_dir {
        (name.to_string_lossy().into_owned(), None)
    } else {
        (
            as_path
                .file_stem()
                .unwrap_or(name)
                .to_string_lossy()
                .into_owned(),
            as_path.extension().map(|e| e.to_string_lossy().into_owned()),
        )
    };

    (2u32..)
        .map(|n| match &ext {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|candidate| candidate.symlink_metadata().is_err())
        .unwrap_or_else(|| dir.join(name))
}

// ============================================================================
// Delete
// ============================================================================

pub fn delete(paths: &[PathBuf], mut progress: impl FnMut(&Path)) -> OpReport {
    let mut report = OpReport::default();
    for path in paths {
        progress(path);
        match fs_ops::delete(path) {
            Ok(()) => {
                report.succeeded.push(path.clone());
                report.moved.push(path.clone());
                report.touch(path);
            }
            Err(e) => {
                // a partial delete still changed the parent listing
                if matches!(e, Error::PartialDelete { .. }) {
                    report.touch(path);
                }
                report.failures.push((path.clone(), e));
            }
        }
    }
    report
}

// ============================================================================
// Rename / create
// ============================================================================

pub fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(Error::InvalidName(format!("{:?}", name)));
    }
    Ok(())
}

/// Rename `target` within its directory, returning the new path.
pub fn rename(target: &Path, new_name: &str) -> Result<PathBuf> {
    validate_name(new_name)?;
    let parent = target
        .parent()
        .ok_or_else(|| Error::InvalidName(target.display().to_string()))?;
    let dest = parent.join(new_name);
    if dest == target {
        return Ok(dest);
    }
    fs_ops::rename(target, &dest)?;
    tracing::info!("renamed {} -> {}", target.display(), dest.display());
    Ok(dest)
}

/// Create from `f <name>` (file) or `d <name>` (directory) inside `parent`.
pub fn create(parent: &Path, text: &str) -> Result<PathBuf> {
    let (tag, name) = text
        .trim_start()
        .split_once(' ')
        .ok_or_else(|| Error::InvalidName("expected 'f <name>' or 'd <name>'".to_owned()))?;

    let kind = match tag {
        "f" => EntryKind::File,
        "d" => EntryKind::Directory,
        _ => {
            return Err(Error::InvalidName(
                "expected 'f <name>' or 'd <name>'".to_owned(),
            ));
        }
    };

    let name = name.trim();
    validate_name(name)?;
    let path = parent.join(name);
    fs_ops::create(&path, kind)?;
    tracing::info!("created {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn never_asked(_: &Path) -> Resolution {
        panic!("resolver should not be consulted");
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_clipboard_keeps_first_occurrence_order() {
        let clip = Clipboard::new(
            [PathBuf::from("/b"), PathBuf::from("/a"), PathBuf::from("/b")],
            ClipboardMode::Copy,
            PanelId::PrimaryTree,
        );
        assert_eq!(clip.paths(), &[PathBuf::from("/b"), PathBuf::from("/a")]);
    }

    #[test]
    fn test_copy_paste_is_repeatable() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("a.txt"), b"a").unwrap();

        let sources = vec![src.join("a.txt")];
        let first = paste(&sources, ClipboardMode::Copy, &dst, never_asked, |_| {});
        assert_eq!(first.succeeded, vec![dst.join("a.txt")]);
        assert!(first.moved.is_empty());

        let second = paste(&sources, ClipboardMode::Copy, &dst, |_| Resolution::Rename, |_| {});
        assert_eq!(second.succeeded, vec![dst.join("a (2).txt")]);
        assert!(src.join("a.txt").exists());
    }

    #[test]
    fn test_cut_paste_reports_moved_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("a"), b"a").unwrap();
        fs::write(src.join("b"), b"b").unwrap();
        fs::write(dst.join("b"), b"old").unwrap();

        let mut clip = Clipboard::new(
            [src.join("a"), src.join("b")],
            ClipboardMode::Cut,
            PanelId::PrimaryTree,
        );
        let report = paste(clip.paths(), clip.mode, &dst, |_| Resolution::Skip, |_| {});
        assert_eq!(report.moved, vec![src.join("a")]);
        assert_eq!(report.skipped, 1);

        clip.remove_moved(&report.moved);
        assert_eq!(clip.paths(), &[src.join("b")]);
        assert!(report.touched.contains(&src));
        assert!(report.touched.contains(&dst));
    }

    #[test]
    fn test_copy_into_source_directory_renames_without_asking() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("notes.md"), b"x").unwrap();
        let sources = vec![tmp.path().join("notes.md")];

        paste(&sources, ClipboardMode::Copy, tmp.path(), never_asked, |_| {});
        paste(&sources, ClipboardMode::Copy, tmp.path(), never_asked, |_| {});

        assert_eq!(
            names(tmp.path()),
            vec!["notes (2).md", "notes (3).md", "notes.md"]
        );
    }

    #[test]
    fn test_cut_into_source_directory_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a"), b"").unwrap();
        let report = paste(
            &[tmp.path().join("a")],
            ClipboardMode::Cut,
            tmp.path(),
            never_asked,
            |_| {},
        );
        assert_eq!(report.skipped, 1);
        assert!(report.succeeded.is_empty());
        assert!(tmp.path().join("a").exists());
    }

    #[test]
    fn test_paste_directory_into_itself_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("proj");
        fs::create_dir_all(dir.join("sub")).unwrap();

        let report = paste(
            &[dir.clone()],
            ClipboardMode::Copy,
            &dir.join("sub"),
            never_asked,
            |_| {},
        );
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].1, Error::InvalidName(_)));
    }

    #[test]
    fn test_overwrite_replaces_existing_destination() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(dst.join("data")).unwrap();
        fs::write(dst.join("data/stale"), b"").unwrap();
        fs::write(src.join("data"), b"fresh").unwrap();

        let report = paste(
            &[src.join("data")],
            ClipboardMode::Copy,
            &dst,
            |_| Resolution::Overwrite,
            |_| {},
        );
        assert!(report.is_clean());
        assert_eq!(fs::read(dst.join("data")).unwrap(), b"fresh");
    }

    #[test]
    fn test_overwrite_never_deletes_an_enclosing_source() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("x/x");
        fs::create_dir_all(tmp.path().join("x")).unwrap();
        fs::write(&source, b"keep me").unwrap();

        let report = paste(
            &[source.clone()],
            ClipboardMode::Copy,
            tmp.path(),
            |_| Resolution::Overwrite,
            |_| {},
        );
        assert!(report.succeeded.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].1, Error::InvalidName(_)));
        assert_eq!(fs::read(&source).unwrap(), b"keep me");
        assert_eq!(names(tmp.path()), vec!["x"]);
    }

    #[test]
    fn test_cut_overwrite_swaps_in_new_content() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(dst.join("notes")).unwrap();
        fs::write(dst.join("notes/old"), b"").unwrap();
        fs::write(src.join("notes"), b"new").unwrap();

        let report = paste(
            &[src.join("notes")],
            ClipboardMode::Cut,
            &dst,
            |_| Resolution::Overwrite,
            |_| {},
        );
        assert!(report.is_clean());
        assert_eq!(report.moved, vec![src.join("notes")]);
        assert_eq!(fs::read(dst.join("notes")).unwrap(), b"new");
        assert_eq!(names(&dst), vec!["notes"]);
        assert!(names(&src).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_overwrite_keeps_old_destination() {
        use std::os::unix::fs::PermissionsExt;
        if fs_ops::running_as_root() {
            return;
        }

        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        fs::write(src.join("report"), b"unreadable").unwrap();
        fs::write(dst.join("report"), b"old").unwrap();
        fs::set_permissions(src.join("report"), fs::Permissions::from_mode(0o000)).unwrap();

        let report = paste(
            &[src.join("report")],
            ClipboardMode::Copy,
            &dst,
            |_| Resolution::Overwrite,
            |_| {},
        );

        fs::set_permissions(src.join("report"), fs::Permissions::from_mode(0o644)).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].1, Error::AccessDenied(_)));
        assert_eq!(fs::read(dst.join("report")).unwrap(), b"old");
        assert_eq!(names(&dst), vec!["report"]);
    }

    #[test]
    fn test_copy_clipboard_pastes_into_several_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.txt"), b"a").unwrap();
        let clip = Clipboard::new([src.join("a.txt")], ClipboardMode::Copy, PanelId::PrimaryTree);

        for target in ["one", "two"] {
            let dir = tmp.path().join(target);
            fs::create_dir(&dir).unwrap();
            let report = paste(clip.paths(), clip.mode, &dir, never_asked, |_| {});
            assert_eq!(report.succeeded, vec![dir.join("a.txt")]);
            assert!(report.moved.is_empty());
        }

        assert_eq!(fs::read(tmp.path().join("one/a.txt")).unwrap(), b"a");
        assert_eq!(fs::read(tmp.path().join("two/a.txt")).unwrap(), b"a");
        assert!(src.join("a.txt").exists());
    }

    #[test]
    fn test_cancel_skips_remaining_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dst).unwrap();
        for name in ["a", "b", "c"] {
            fs::write(src.join(name), b"").unwrap();
        }
        fs::write(dst.join("b"), b"").unwrap();

        let mut asked = Vec::new();
        let report = paste(
            &[src.join("a"), src.join("b"), src.join("c")],
            ClipboardMode::Copy,
            &dst,
            |p| {
                asked.push(p.to_path_buf());
                Resolution::Cancel
            },
            |_| {},
        );
        assert_eq!(asked, vec![dst.join("b")]);
        assert_eq!(report.succeeded, vec![dst.join("a")]);
        assert_eq!(report.skipped, 2);
        assert!(!dst.join("c").exists());
    }

    #[test]
    fn test_failure_on_one_source_does_not_abort_others() {
        let tmp = tempfile::tempdir().unwrap();
        let dst = tmp.path().join("dst");
        fs::create_dir_all(&dst).unwrap();
        fs::write(tmp.path().join("real"), b"").unwrap();

        let report = paste(
            &[tmp.path().join("ghost"), tmp.path().join("real")],
            ClipboardMode::Copy,
            &dst,
            never_asked,
            |_| {},
        );
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].1.is_not_found());
        assert_eq!(report.succeeded, vec![dst.join("real")]);
    }

    #[test]
    fn test_free_name_numbering() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("report.pdf"), b"").unwrap();
        fs::write(tmp.path().join("report (2).pdf"), b"").unwrap();
        fs::write(tmp.path().join(".bashrc"), b"").unwrap();
        fs::create_dir(tmp.path().join("v1.2")).unwrap();

        assert_eq!(
            free_name(tmp.path(), OsStr::new("report.pdf"), false),
            tmp.path().join("report (3).pdf")
        );
        assert_eq!(
            free_name(tmp.path(), OsStr::new(".bashrc"), false),
            tmp.path().join(".bashrc (2)")
        );
        assert_eq!(
            free_name(tmp.path(), OsStr::new("v1.2"), true),
            tmp.path().join("v1.2 (2)")
        );
    }

    #[test]
    fn test_delete_aggregates_per_path() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("d/e")).unwrap();
        fs::write(tmp.path().join("f"), b"").unwrap();

        let report = delete(
            &[tmp.path().join("d"), tmp.path().join("missing"), tmp.path().join("f")],
            |_| {},
        );
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(names(tmp.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_delete_reports_access_denied_entry() {
        use std::os::unix::fs::PermissionsExt;
        if fs_ops::running_as_root() {
            return;
        }

        let tmp = tempfile::tempdir().unwrap();
        let locked = tmp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("keep"), b"").unwrap();
        fs::create_dir_all(tmp.path().join("build/out")).unwrap();
        fs::write(tmp.path().join("log.txt"), b"").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        let report = delete(
            &[
                tmp.path().join("build"),
                locked.join("keep"),
                tmp.path().join("log.txt"),
            ],
            |_| {},
        );

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, locked.join("keep"));
        assert!(matches!(report.failures[0].1, Error::AccessDenied(_)));

        let listing: Vec<String> = fs_ops::list_dir(tmp.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(listing, vec!["locked"]);
        assert!(locked.join("keep").exists());
    }

    #[test]
    fn test_rename_validates_names() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a");
        fs::write(&target, b"").unwrap();
        fs::write(tmp.path().join("taken"), b"").unwrap();

        for bad in ["", ".", "..", "x/y", "x\\y", "nul\0"] {
            assert!(
                matches!(rename(&target, bad), Err(Error::InvalidName(_))),
                "{:?} should be rejected",
                bad
            );
        }
        assert!(matches!(
            rename(&target, "taken"),
            Err(Error::AlreadyExists(_))
        ));
        assert_eq!(rename(&target, "b").unwrap(), tmp.path().join("b"));
    }

    #[test]
    fn test_create_parses_kind_prefix() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(create(tmp.path(), "f notes.txt").unwrap().is_file());
        assert!(create(tmp.path(), "d build").unwrap().is_dir());
        assert!(matches!(
            create(tmp.path(), "x thing"),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(create(tmp.path(), "f "), Err(Error::InvalidName(_))));
        assert!(matches!(
            create(tmp.path(), "f notes.txt"),
            Err(Error::AlreadyExists(_))
        ));
    }
}
