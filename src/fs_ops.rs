//! Filesystem access layer
//!
//! Stateless primitives used by panels and the file operation engine. Every
//! failure is mapped onto `error::Error`; nothing is silently dropped.

use std::{
    cmp::Ordering,
    fs, io,
    path::{Path, PathBuf},
    time::SystemTime,
};

use walkdir::WalkDir;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    /// Sockets, FIFOs, device nodes
    Special,
}

/// Snapshot of one filesystem object. Re-read on refresh, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
    /// Only meaningful for symlinks
    pub target_is_dir: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub mode: u32,
    pub hidden: bool,
}

impl Entry {
    /// Directories and symlinks pointing at directories can be entered
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory || (self.kind == EntryKind::Symlink && self.target_is_dir)
    }
}

/// Outcome of a move that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Cross-device move copied everything but could not remove the source
    SourceKept(Error),
}

pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Read a single entry without following a trailing symlink.
pub fn stat(path: &Path) -> Result<Entry> {
    let meta = fs::symlink_metadata(path).map_err(|e| Error::from_io(&e, path))?;
    let file_type = meta.file_type();

    let kind = if file_type.is_symlink() {
        EntryKind::Symlink
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Special
    };

    let target_is_dir = kind == EntryKind::Symlink
        && fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false);

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(Entry {
        hidden: is_hidden(&name),
        path: path.to_path_buf(),
        name,
        kind,
        target_is_dir,
        size: meta.len(),
        modified: meta.modified().ok(),
        mode: permission_bits(&meta),
    })
}

#[cfg(unix)]
fn permission_bits(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(meta: &fs::Metadata) -> u32 {
    if meta.permissions().readonly() { 0o444 } else { 0o644 }
}

/// List a directory, hidden entries included, sorted directories-first.
pub fn list_dir(path: &Path) -> Result<Vec<Entry>> {
    let reader = fs::read_dir(path).map_err(|e| Error::from_io(&e, path))?;

    // Entries that vanish between readdir and stat are skipped
    let mut entries: Vec<Entry> = reader
        .filter_map(|e| e.ok())
        .filter_map(|e| stat(&e.path()).ok())
        .collect();

    sort_entries(&mut entries);
    Ok(entries)
}

/// Directories first, then case-insensitive by name.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(|a, b| match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
    });
}

fn ensure_absent(path: &Path) -> Result<()> {
    if fs::symlink_metadata(path).is_ok() {
        return Err(Error::AlreadyExists(path.to_path_buf()));
    }
    Ok(())
}

pub fn create(path: &Path, kind: EntryKind) -> Result<()> {
    let result = match kind {
        EntryKind::Directory => fs::create_dir(path),
        _ => fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(|_| ()),
    };
    result.map_err(|e| Error::from_io(&e, path))
}

/// Delete a file, symlink or whole directory tree.
///
/// Directory trees are removed contents-first. When some children go away and
/// another one refuses, the failure is reported once as `PartialDelete` with the
/// number of items that were removed.
pub fn delete(path: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(path).map_err(|e| Error::from_io(&e, path))?;
    if !meta.is_dir() {
        return fs::remove_file(path).map_err(|e| Error::from_io(&e, path));
    }

    let mut removed = 0usize;
    let mut first_error: Option<Error> = None;

    for item in WalkDir::new(path).contents_first(true) {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                first_error.get_or_insert(Error::from_walk(e, path));
                continue;
            }
        };

        let result = if item.file_type().is_dir() {
            fs::remove_dir(item.path())
        } else {
            fs::remove_file(item.path())
        };

        match result {
            Ok(()) if item.depth() > 0 => removed += 1,
            Ok(()) => {}
            Err(e) => {
                first_error.get_or_insert(Error::from_io(&e, item.path()));
            }
        }
    }

    match first_error {
        None => Ok(()),
        Some(cause) if removed == 0 => Err(cause),
        Some(cause) => Err(Error::PartialDelete {
            path: path.to_path_buf(),
            removed,
            cause: Box::new(cause),
        }),
    }
}

/// Rename without ever overwriting an existing target.
pub fn rename(src: &Path, dst: &Path) -> Result<()> {
    fs::symlink_metadata(src).map_err(|e| Error::from_io(&e, src))?;
    rename_no_clobber(src, dst).map_err(|e| rename_error(&e, src, dst))
}

fn rename_error(err: &io::Error, src: &Path, dst: &Path) -> Error {
    if err.kind() == io::ErrorKind::AlreadyExists {
        Error::AlreadyExists(dst.to_path_buf())
    } else {
        Error::from_io(err, src)
    }
}

/// rename(2) that fails with `AlreadyExists` instead of replacing `dst`.
/// Atomic where the kernel and filesystem support RENAME_NOREPLACE.
fn rename_no_clobber(src: &Path, dst: &Path) -> io::Result<()> {
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    {
        if rename_noreplace(src, dst)? {
            return Ok(());
        }
    }

    if fs::symlink_metadata(dst).is_ok() {
        return Err(io::Error::from(io::ErrorKind::AlreadyExists));
    }
    fs::rename(src, dst)
}

/// Ok(false) when the filesystem does not support the flag.
#[cfg(all(target_os = "linux", target_env = "gnu"))]
fn rename_noreplace(src: &Path, dst: &Path) -> io::Result<bool> {
    use std::{ffi::CString, os::unix::ffi::OsStrExt};

    let c_path = |path: &Path| {
        CString::new(path.as_os_str().as_bytes())
            .map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))
    };
    let (src_c, dst_c) = (c_path(src)?, c_path(dst)?);

    // SAFETY: both pointers are valid NUL-terminated strings for the call
    let rc = unsafe {
        libc::renameat2(
            libc::AT_FDCWD,
            src_c.as_ptr(),
            libc::AT_FDCWD,
            dst_c.as_ptr(),
            libc::RENAME_NOREPLACE,
        )
    };
    if rc == 0 {
        return Ok(true);
    }

    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::EINVAL) | Some(libc::ENOSYS) | Some(libc::EOPNOTSUPP) => Ok(false),
        _ => Err(err),
    }
}

/// Copy a file, symlink or directory tree. Permission bits are preserved.
pub fn copy(src: &Path, dst: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(src).map_err(|e| Error::from_io(&e, src))?;
    ensure_absent(dst)?;

    let file_type = meta.file_type();
    if file_type.is_dir() {
        copy_tree(src, dst)
    } else if file_type.is_symlink() {
        copy_symlink(src, dst)
    } else if file_type.is_file() {
        copy_file(src, dst)
    } else {
        Err(Error::Unavailable(format!(
            "cannot copy special file {}",
            src.display()
        )))
    }
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    fs::File::open(src).map_err(|e| Error::from_io(&e, src))?;
    // fs::copy carries the permission bits over
    fs::copy(src, dst).map_err(|e| Error::from_io(&e, dst))?;
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = fs::read_link(src).map_err(|e| Error::from_io(&e, src))?;
    std::os::unix::fs::symlink(&target, dst).map_err(|e| Error::from_io(&e, dst))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    copy_file(src, dst)
}

fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    let mut dir_permissions = Vec::new();

    for item in WalkDir::new(src) {
        let item = item.map_err(|e| Error::from_walk(e, src))?;
        let relative = item.path().strip_prefix(src).unwrap_or(item.path());
        let target = dst.join(relative);
        let file_type = item.file_type();

        if file_type.is_dir() {
            fs::create_dir(&target).map_err(|e| Error::from_io(&e, &target))?;
            let meta = item.metadata().map_err(|e| Error::from_walk(e, item.path()))?;
            dir_permissions.push((target, meta.permissions()));
        } else if file_type.is_symlink() {
            copy_symlink(item.path(), &target)?;
        } else if file_type.is_file() {
            copy_file(item.path(), &target)?;
        }
        // Special files inside a tree are skipped
    }

    // Applied deepest-first so read-only directories don't block their own contents
    for (dir, permissions) in dir_permissions.into_iter().rev() {
        fs::set_permissions(&dir, permissions).map_err(|e| Error::from_io(&e, &dir))?;
    }

    Ok(())
}

fn is_cross_device(err: &io::Error) -> bool {
    #[cfg(unix)]
    let exdev = err.raw_os_error() == Some(libc::EXDEV);
    #[cfg(not(unix))]
    let exdev = false;
    exdev || err.kind() == io::ErrorKind::CrossesDevices
}

/// Move via rename(2), falling back to copy-then-delete across filesystems.
pub fn move_path(src: &Path, dst: &Path) -> Result<MoveOutcome> {
    fs::symlink_metadata(src).map_err(|e| Error::from_io(&e, src))?;

    match rename_no_clobber(src, dst) {
        Ok(()) => Ok(MoveOutcome::Moved),
        Err(e) if is_cross_device(&e) => {
            tracing::debug!("cross-device move {} -> {}", src.display(), dst.display());
            copy_then_remove(src, dst)
        }
        Err(e) => Err(rename_error(&e, src, dst)),
    }
}

/// Second half of a cross-device move. A failed copy removes whatever part of
/// the destination it created.
pub(crate) fn copy_then_remove(src: &Path, dst: &Path) -> Result<MoveOutcome> {
    if let Err(e) = copy(src, dst) {
        let preexisting = matches!(&e, Error::AlreadyExists(p) if p == dst);
        if !preexisting && fs::symlink_metadata(dst).is_ok() {
            if let Err(cleanup) = delete(dst) {
                tracing::warn!("could not clean up partial copy {}: {}", dst.display(), cleanup);
            }
        }
        return Err(e);
    }

    match delete(src) {
        Ok(()) => Ok(MoveOutcome::Moved),
        Err(e) => Ok(MoveOutcome::SourceKept(e)),
    }
}

/// Walk upward from `path` until a directory that can actually be listed.
pub fn nearest_listable_ancestor(path: &Path) -> PathBuf {
    path.ancestors()
        .filter(|p| !p.as_os_str().is_empty())
        .find(|p| fs::read_dir(p).is_ok())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"))
}

#[cfg(test)]
pub(crate) fn running_as_root() -> bool {
    // SAFETY: geteuid has no preconditions
    #[cfg(unix)]
    let root = unsafe { libc::geteuid() == 0 };
    #[cfg(not(unix))]
    let root = false;
    root
}
