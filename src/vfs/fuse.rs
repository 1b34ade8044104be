//! FUSE adapter serving one virtual file at the mount root.
//!
//! ```text
//! ino 1  /        dr-xr-xr-x
//! ino 2  /<name>  -r--r--r--  size 0, direct I/O
//! ```

use std::collections::HashMap;
use std::ffi::OsStr;
use std::time::{SystemTime, UNIX_EPOCH};

use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry,
    ReplyOpen, Request, FUSE_ROOT_ID,
};
use tracing::{debug, warn};

use crate::config::{ATTR_TTL, FILE_PERMISSIONS, ROOT_PERMISSIONS};
use crate::error::{Error, Result};
use crate::vfs::handle::FileReader;
use crate::vfs::node::{AccessMode, NodeOpener};

/// Inode of the root directory.
pub const ROOT_INO: u64 = FUSE_ROOT_ID;

/// Inode of the virtual file.
pub const FILE_INO: u64 = 2;

/// Filesystem with a single node under the root.
pub struct BagetFs<N: NodeOpener> {
    node: N,
    /// Open handles keyed by `fh`.
    handles: HashMap<u64, N::Handle>,
    next_fh: u64,
    mounted_at: SystemTime,
    uid: u32,
    gid: u32,
}

impl<N: NodeOpener> BagetFs<N> {
    pub fn new(node: N) -> Self {
        Self {
            node,
            handles: HashMap::new(),
            next_fh: 1,
            mounted_at: SystemTime::now(),
            uid: unsafe { libc::getuid() },
            gid: unsafe { libc::getgid() },
        }
    }

    /// Number of handles currently open.
    pub fn open_handles(&self) -> usize {
        self.handles.len()
    }

    /// Attributes for `ino`, if it exists.
    pub fn attr(&self, ino: u64) -> Option<FileAttr> {
        let (kind, perm, nlink) = match ino {
            ROOT_INO => (FileType::Directory, ROOT_PERMISSIONS, 2),
            FILE_INO => (FileType::RegularFile, FILE_PERMISSIONS, 1),
            _ => return None,
        };
        Some(FileAttr {
            ino,
            // Content length is only known after an open.
            size: 0,
            blocks: 0,
            atime: self.mounted_at,
            mtime: self.mounted_at,
            ctime: self.mounted_at,
            crtime: UNIX_EPOCH,
            kind,
            perm,
            nlink,
            uid: self.uid,
            gid: self.gid,
            rdev: 0,
            blksize: 512,
            flags: 0,
        })
    }

    /// Resolve `name` under `parent`.
    pub fn lookup_child(&self, parent: u64, name: &OsStr) -> Result<FileAttr> {
        if parent != ROOT_INO {
            return Err(os_error(libc::ENOENT));
        }
        match name.to_str() {
            Some(n) if n == self.node.name() => self
                .attr(FILE_INO)
                .ok_or_else(|| os_error(libc::ENOENT)),
            _ => Err(os_error(libc::ENOENT)),
        }
    }

    /// Directory listing of `ino`, including `.` and `..`.
    pub fn entries(&self, ino: u64) -> Result<Vec<(u64, FileType, String)>> {
        match ino {
            ROOT_INO => Ok(vec![
                (ROOT_INO, FileType::Directory, ".".to_string()),
                (ROOT_INO, FileType::Directory, "..".to_string()),
                (FILE_INO, FileType::RegularFile, self.node.name().to_string()),
            ]),
            FILE_INO => Err(os_error(libc::ENOTDIR)),
            _ => Err(os_error(libc::ENOENT)),
        }
    }

    /// Open `ino`, returning the new `fh` and the `FOPEN_*` reply flags.
    pub fn open_handle(&mut self, ino: u64, flags: i32) -> Result<(u64, u32)> {
        match ino {
            FILE_INO => {}
            ROOT_INO => return Err(os_error(libc::EISDIR)),
            _ => return Err(os_error(libc::ENOENT)),
        }

        let (handle, directive) = self.node.open(AccessMode::from_open_flags(flags))?;
        let fh = self.next_fh;
        self.next_fh += 1;
        debug!(fh, bytes = handle.len(), "opened baget");
        self.handles.insert(fh, handle);
        Ok((fh, directive.fuse_flags()))
    }

    /// Read from an open handle.
    pub fn read_handle(&self, fh: u64, offset: i64, size: u32) -> Result<&[u8]> {
        let offset = u64::try_from(offset).map_err(|_| Error::InvalidOffset(offset))?;
        let handle = self.handles.get(&fh).ok_or(Error::UnknownHandle(fh))?;
        Ok(handle.read(offset, size as usize))
    }

    /// Drop an open handle and its content.
    pub fn release_handle(&mut self, fh: u64) -> Result<()> {
        match self.handles.remove(&fh) {
            Some(_) => {
                debug!(fh, "released baget");
                Ok(())
            }
            None => Err(Error::UnknownHandle(fh)),
        }
    }
}

fn os_error(code: libc::c_int) -> Error {
    Error::Io(std::io::Error::from_raw_os_error(code))
}

impl<N: NodeOpener> Filesystem for BagetFs<N> {
    fn lookup(&mut self, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        match self.lookup_child(parent, name) {
            Ok(attr) => reply.entry(&ATTR_TTL, &attr, 0),
            Err(e) => reply.error(e.errno()),
        }
    }

    fn getattr(&mut self, _req: &Request, ino: u64, reply: ReplyAttr) {
        match self.attr(ino) {
            Some(attr) => reply.attr(&ATTR_TTL, &attr),
            None => reply.error(libc::ENOENT),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let entries = match self.entries(ino) {
            Ok(e) => e,
            Err(e) => {
                reply.error(e.errno());
                return;
            }
        };

        let skip = usize::try_from(offset).unwrap_or(0);
        for (i, (e_ino, kind, name)) in entries.iter().enumerate().skip(skip) {
            if reply.add(*e_ino, (i + 1) as i64, *kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn open(&mut self, _req: &Request, ino: u64, flags: i32, reply: ReplyOpen) {
        match self.open_handle(ino, flags) {
            Ok((fh, open_flags)) => reply.opened(fh, open_flags),
            Err(e) => {
                if matches!(e, Error::AccessDenied) {
                    warn!(ino, flags, "rejected write open");
                }
                reply.error(e.errno());
            }
        }
    }

    fn read(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock: Option<u64>,
        reply: ReplyData,
    ) {
        match self.read_handle(fh, offset, size) {
            Ok(data) => reply.data(data),
            Err(e) => {
                warn!(fh, offset, "read failed: {}", e);
                reply.error(e.errno());
            }
        }
    }

    fn release(
        &mut self,
        _req: &Request,
        _ino: u64,
        fh: u64,
        _flags: i32,
        _lock: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        match self.release_handle(fh) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(e.errno()),
        }
    }
}
