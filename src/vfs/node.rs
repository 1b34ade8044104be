//! The virtual file node.

use crate::error::{Error, Result};
use crate::generator::{self, RandomSource};
use crate::vfs::handle::{EphemeralHandle, FileReader};
use std::sync::Arc;

/// Access requested by an open call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    /// Decode the access mode bits of open(2) flags.
    pub fn from_open_flags(flags: i32) -> Self {
        match flags & libc::O_ACCMODE {
            libc::O_RDONLY => AccessMode::Read,
            libc::O_WRONLY => AccessMode::Write,
            _ => AccessMode::ReadWrite,
        }
    }

    pub fn is_read_only(self) -> bool {
        self == AccessMode::Read
    }
}

/// Caching instructions returned with each new handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenDirective {
    /// Serve every read from the handle, never from the page cache.
    pub direct_io: bool,
}

impl OpenDirective {
    pub fn bypass_cache() -> Self {
        Self { direct_io: true }
    }

    /// `FOPEN_*` flags for the open reply.
    pub fn fuse_flags(&self) -> u32 {
        if self.direct_io {
            fuser::consts::FOPEN_DIRECT_IO
        } else {
            0
        }
    }
}

/// Produces a handle for each open of a node.
pub trait NodeOpener: Send + Sync {
    type Handle: FileReader;

    /// Name of the node in its parent directory.
    fn name(&self) -> &str;

    fn open(&self, access: AccessMode) -> Result<(Self::Handle, OpenDirective)>;
}

/// The baget file: a stateless factory of freshly generated handles.
pub struct VirtualFile {
    name: String,
    source: Arc<dyn RandomSource>,
}

impl VirtualFile {
    pub fn new(name: impl Into<String>, source: Arc<dyn RandomSource>) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

impl std::fmt::Debug for VirtualFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualFile")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl NodeOpener for VirtualFile {
    type Handle = EphemeralHandle;

    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self, access: AccessMode) -> Result<(EphemeralHandle, OpenDirective)> {
        if !access.is_read_only() {
            return Err(Error::AccessDenied);
        }
        let handle = EphemeralHandle::new(generator::generate(self.source.as_ref()));
        Ok((handle, OpenDirective::bypass_cache()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{SequenceSource, SharedRng};

    #[test]
    fn test_access_mode_from_flags() {
        assert_eq!(AccessMode::from_open_flags(libc::O_RDONLY), AccessMode::Read);
        assert_eq!(
            AccessMode::from_open_flags(libc::O_RDONLY | libc::O_NONBLOCK),
            AccessMode::Read
        );
        assert_eq!(AccessMode::from_open_flags(libc::O_WRONLY), AccessMode::Write);
        assert_eq!(
            AccessMode::from_open_flags(libc::O_RDWR | libc::O_APPEND),
            AccessMode::ReadWrite
        );
    }

    #[test]
    fn test_write_opens_denied() {
        let file = VirtualFile::new("baget", Arc::new(SharedRng::with_seed(1)));
        assert!(matches!(file.open(AccessMode::Write), Err(Error::AccessDenied)));
        assert!(matches!(
            file.open(AccessMode::ReadWrite),
            Err(Error::AccessDenied)
        ));
    }

    #[test]
    fn test_denied_open_draws_nothing() {
        let source = Arc::new(SequenceSource::new(vec![0]));
        let file = VirtualFile::new("baget", source.clone());
        let _ = file.open(AccessMode::Write);
        assert_eq!(source.draws(), 0);
    }

    #[test]
    fn test_read_open_bypasses_cache() {
        let file = VirtualFile::new("baget", Arc::new(SharedRng::with_seed(1)));
        let (handle, directive) = file.open(AccessMode::Read).unwrap();
        assert!(directive.direct_io);
        assert_eq!(directive.fuse_flags(), fuser::consts::FOPEN_DIRECT_IO);
        assert!(handle.content().ends_with(b"\n"));
    }

    #[test]
    fn test_each_open_is_a_new_draw() {
        let file = VirtualFile::new("baget", Arc::new(SharedRng::with_seed(5)));
        let (first, _) = file.open(AccessMode::Read).unwrap();
        let differs = (0..16).any(|_| file.open(AccessMode::Read).unwrap().0 != first);
        assert!(differs);
    }

    #[test]
    fn test_default_directive_allows_cache() {
        assert_eq!(OpenDirective::default().fuse_flags(), 0);
    }
}
