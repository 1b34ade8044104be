//! Error types for the baget device.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for baget operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while mounting or serving the baget device.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No link path was configured.
    #[error("No link path given: set --path to where the baget device should appear")]
    MissingLinkPath,

    /// Something already lives at the requested link path.
    #[error("Path already exists: {0}")]
    PathCollision(PathBuf),

    /// The private mount root could not be created.
    #[error("Failed to create mount root in {path}: {source}")]
    MountRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The FUSE session could not be established.
    #[error("Failed to mount at {path}: {source}")]
    Mount {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Write access requested on the read-only file.
    #[error("Access denied: the baget device is read-only")]
    AccessDenied,

    /// Negative read offset.
    #[error("Invalid read offset: {0}")]
    InvalidOffset(i64),

    /// Read or release against a handle that is not open.
    #[error("Unknown file handle: {0}")]
    UnknownHandle(u64),

    /// Signal mask or wait failure.
    #[error("Signal handling error: {0}")]
    Signal(String),

    /// The published link could not be removed.
    #[error("Failed to remove {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Errno reported back through the FUSE channel.
    pub fn errno(&self) -> libc::c_int {
        match self {
            Error::AccessDenied => libc::EACCES,
            Error::InvalidOffset(_) => libc::EINVAL,
            Error::UnknownHandle(_) => libc::EBADF,
            Error::Io(e) => e.raw_os_error().unwrap_or(libc::EIO),
            _ => libc::EIO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(Error::AccessDenied.errno(), libc::EACCES);
        assert_eq!(Error::InvalidOffset(-1).errno(), libc::EINVAL);
        assert_eq!(Error::UnknownHandle(7).errno(), libc::EBADF);
        assert_eq!(Error::MissingLinkPath.errno(), libc::EIO);
    }

    #[test]
    fn test_io_errno_passthrough() {
        let err = Error::from(std::io::Error::from_raw_os_error(libc::ENOENT));
        assert_eq!(err.errno(), libc::ENOENT);
    }

    #[test]
    fn test_collision_message_names_path() {
        let err = Error::PathCollision(PathBuf::from("/tmp/taken"));
        assert!(err.to_string().contains("/tmp/taken"));
    }
}
