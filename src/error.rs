use std::{
    io,
    path::{Path, PathBuf},
};

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by filesystem, drive, preview and update operations.
///
/// Every variant is cheap to clone so results can travel over channels and be
/// kept around as a panel's "last error".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("{}: not found", .0.display())]
    NotFound(PathBuf),

    #[error("{}: permission denied", .0.display())]
    AccessDenied(PathBuf),

    #[error("{}: already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("cancelled")]
    Cancelled,

    /// A recursive delete that removed some children before hitting a failure.
    #[error("{}: removed {removed} item(s) before failing: {cause}", .path.display())]
    PartialDelete {
        path: PathBuf,
        removed: usize,
        cause: Box<Error>,
    },

    #[error("{}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
}

impl Error {
    /// Map an IO error for `path` onto the taxonomy.
    pub fn from_io(err: &io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Error::AccessDenied(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => Error::AlreadyExists(path.to_path_buf()),
            _ => Error::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        }
    }

    pub fn from_walk(err: walkdir::Error, fallback: &Path) -> Self {
        let path = err.path().unwrap_or(fallback).to_path_buf();
        match err.into_io_error() {
            Some(io_err) => Error::from_io(&io_err, &path),
            None => Error::Io {
                path,
                message: "filesystem loop detected".to_owned(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_kinds_map_to_taxonomy() {
        let path = Path::new("/tmp/x");
        let not_found = io::Error::from(io::ErrorKind::NotFound);
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        let exists = io::Error::from(io::ErrorKind::AlreadyExists);
        let other = io::Error::other("disk on fire");

        assert_eq!(Error::from_io(&not_found, path), Error::NotFound(path.into()));
        assert_eq!(Error::from_io(&denied, path), Error::AccessDenied(path.into()));
        assert_eq!(Error::from_io(&exists, path), Error::AlreadyExists(path.into()));
        assert!(matches!(Error::from_io(&other, path), Error::Io { .. }));
    }

    #[test]
    fn test_partial_delete_message_counts_children() {
        let err = Error::PartialDelete {
            path: PathBuf::from("/data/tree"),
            removed: 4,
            cause: Box::new(Error::AccessDenied(PathBuf::from("/data/tree/locked"))),
        };
        let text = err.to_string();
        assert!(text.contains("removed 4 item(s)"));
        assert!(text.contains("permission denied"));
    }
}
