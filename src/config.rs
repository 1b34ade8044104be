//! Configuration constants and types for the baget device.

use crate::error::{Error, Result};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Number of text lines in one baget.
pub const LINE_COUNT: RangeInclusive<usize> = 4..=7;

/// Number of words in one line.
pub const WORD_COUNT: RangeInclusive<usize> = 5..=14;

/// Marker placed on its own line between text lines.
pub const SEPARATOR: char = '@';

/// Name of the single entry at the mount root.
pub const DEFAULT_FILE_NAME: &str = "baget";

/// Prefix for the private mount root directory.
pub const MOUNT_ROOT_PREFIX: &str = "baget-device-";

/// Filesystem name reported to the kernel.
pub const FS_NAME: &str = "baget";

/// Permission bits of the virtual file.
pub const FILE_PERMISSIONS: u16 = 0o444;

/// Permission bits of the mount root.
pub const ROOT_PERMISSIONS: u16 = 0o555;

/// How long the kernel may cache attributes and entries.
///
/// Content is never cached; see `OpenDirective`.
pub const ATTR_TTL: Duration = Duration::from_secs(1);

/// Configuration for mounting the baget device.
#[derive(Debug, Clone)]
pub struct MountConfig {
    /// Where the externally visible symlink is published.
    pub link_path: PathBuf,

    /// Directory under which the private mount root is created.
    pub mount_parent: PathBuf,

    /// Name of the virtual file inside the mount root.
    pub file_name: String,

    /// Let other users read through the mount.
    /// Requires `user_allow_other` in /etc/fuse.conf.
    pub allow_other: bool,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            link_path: PathBuf::new(),
            mount_parent: std::env::temp_dir(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            allow_other: false,
        }
    }
}

impl MountConfig {
    /// Create a configuration publishing the device at `link_path`.
    pub fn new(link_path: impl Into<PathBuf>) -> Self {
        Self {
            link_path: link_path.into(),
            ..Self::default()
        }
    }

    pub fn with_mount_parent(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mount_parent = dir.into();
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = name.into();
        self
    }

    pub fn with_allow_other(mut self, allow: bool) -> Self {
        self.allow_other = allow;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.link_path.as_os_str().is_empty() {
            return Err(Error::MissingLinkPath);
        }
        if self.file_name.is_empty()
            || self.file_name == "."
            || self.file_name == ".."
            || self.file_name.contains('/')
        {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid file name: {:?}", self.file_name),
            )));
        }
        Ok(())
    }

    /// The link path made absolute against the current directory.
    ///
    /// The path itself is not canonicalized: it must not exist yet.
    pub fn absolute_link_path(&self) -> Result<PathBuf> {
        absolutize(&self.link_path)
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
