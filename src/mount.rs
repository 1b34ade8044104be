//! Mount lifecycle: private mount root, FUSE session, published symlink.
//!
//! ```text
//! Initializing ──(mounted + link published)──▶ Serving ──▶ Terminated
//!      │                                                      ▲
//!      └──────────────────(any failure)───────────────────────┘
//! ```
//!
//! Serving ends when the filesystem is unmounted externally
//! (`fusermount -u`) or when the process receives SIGINT/SIGTERM. In both
//! cases the symlink is removed, the session is unmounted and the mount
//! root directory is deleted.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use fuser::{MountOption, Session};
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

use crate::config::{MountConfig, FS_NAME, MOUNT_ROOT_PREFIX};
use crate::error::{Error, Result};
use crate::generator::RandomSource;
use crate::signal::InterruptWatcher;
use crate::vfs::{BagetFs, VirtualFile};

/// Lifecycle state of a mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Initializing,
    Serving,
    Terminated,
}

/// Why serving stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// The host unmounted the filesystem.
    Unmounted,
    /// The process received the given signal.
    Interrupted(libc::c_int),
}

impl Shutdown {
    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Shutdown::Unmounted => 0,
            Shutdown::Interrupted(_) => 1,
        }
    }
}

/// The externally visible symlink to the virtual file.
#[derive(Debug)]
pub struct PublishedLink {
    path: PathBuf,
    removed: AtomicBool,
}

impl PublishedLink {
    /// Create a symlink at `path` pointing to `target`.
    ///
    /// Never replaces an existing entry.
    pub fn publish(target: &Path, path: PathBuf) -> Result<Self> {
        match std::os::unix::fs::symlink(target, &path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::PathCollision(path));
            }
            Err(e) => return Err(Error::Io(e)),
        }
        debug!(link = %path.display(), target = %target.display(), "published link");
        Ok(Self {
            path,
            removed: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the symlink. Only the first call touches the filesystem.
    ///
    /// Returns whether this call performed the removal.
    pub fn remove(&self) -> Result<bool> {
        if self.removed.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(link = %self.path.display(), "removed link");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(link = %self.path.display(), "link already gone");
                Ok(true)
            }
            Err(source) => Err(Error::Cleanup {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// The mount root, the virtual file inside it, and the link pointing there.
///
/// While the link exists it resolves through the mount root to the file.
#[derive(Debug)]
pub struct MountBinding {
    root: TempDir,
    file_path: PathBuf,
    link: Arc<PublishedLink>,
}

impl MountBinding {
    pub fn new(root: TempDir, file_path: PathBuf, link: PublishedLink) -> Self {
        Self {
            root,
            file_path,
            link: Arc::new(link),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn link(&self) -> &Arc<PublishedLink> {
        &self.link
    }

    /// Remove the link and the mount root. The session must be unmounted.
    pub fn teardown(self) -> Result<()> {
        let removed = self.link.remove().map(|_| ());
        let root = self.root.path().to_path_buf();
        if let Err(e) = self.root.close() {
            warn!(root = %root.display(), "failed to remove mount root: {}", e);
        }
        removed
    }

    /// Tear down on an error path where the original error takes priority.
    pub fn discard(self) {
        let link = self.link.path().to_path_buf();
        if let Err(e) = self.teardown() {
            warn!(link = %link.display(), "cleanup after failure: {}", e);
        }
    }
}

/// Fail if anything, including a dangling symlink, occupies `path`.
pub fn check_link_target(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(_) => Err(Error::PathCollision(path.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Io(e)),
    }
}

/// FUSE mount options for `config`.
pub fn mount_options(config: &MountConfig) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::FSName(FS_NAME.to_string()),
        MountOption::Subtype(FS_NAME.to_string()),
        MountOption::RO,
        MountOption::NoAtime,
        MountOption::DefaultPermissions,
    ];
    if config.allow_other {
        options.push(MountOption::AllowOther);
    }
    options
}

/// Drives one mount from setup to teardown.
pub struct MountLifecycle {
    config: MountConfig,
    source: Arc<dyn RandomSource>,
    state: LifecycleState,
}

impl MountLifecycle {
    pub fn new(config: MountConfig, source: Arc<dyn RandomSource>) -> Self {
        Self {
            config,
            source,
            state: LifecycleState::Initializing,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Mount, publish and serve until unmounted or interrupted.
    ///
    /// Blocks the calling thread. Interrupt signals are blocked on it and
    /// handled by a watcher thread.
    pub fn run(&mut self) -> Result<Shutdown> {
        let result = self.serve();
        self.transition(LifecycleState::Terminated);
        result
    }

    fn transition(&mut self, next: LifecycleState) {
        debug!(from = ?self.state, to = ?next, "lifecycle transition");
        self.state = next;
    }

    fn serve(&mut self) -> Result<Shutdown> {
        self.config.validate()?;
        let link_path = self.config.absolute_link_path()?;
        check_link_target(&link_path)?;

        let mount_root = tempfile::Builder::new()
            .prefix(MOUNT_ROOT_PREFIX)
            .tempdir_in(&self.config.mount_parent)
            .map_err(|source| Error::MountRoot {
                path: self.config.mount_parent.clone(),
                source,
            })?;
        let root_path = mount_root.path().to_path_buf();

        let watcher = InterruptWatcher::install()?;

        let node = VirtualFile::new(self.config.file_name.clone(), Arc::clone(&self.source));
        let mut session = Session::new(
            BagetFs::new(node),
            &root_path,
            &mount_options(&self.config),
        )
        .map_err(|source| Error::Mount {
            path: root_path.clone(),
            source,
        })?;
        info!(root = %root_path.display(), "mounted");

        let file_path = root_path.join(&self.config.file_name);
        let link = match PublishedLink::publish(&file_path, link_path) {
            Ok(l) => l,
            Err(e) => {
                // unmount before the mount root is deleted
                drop(session);
                drop(mount_root);
                return Err(e);
            }
        };
        let binding = MountBinding::new(mount_root, file_path, link);
        self.transition(LifecycleState::Serving);

        // The one line meant for the operator.
        println!("cat {} to see a new baget", binding.link().path().display());

        let (interrupted_tx, interrupted_rx) = mpsc::sync_channel::<libc::c_int>(1);
        let mut unmounter = session.unmount_callable();
        let watcher_link = Arc::clone(binding.link());
        let spawned = watcher.spawn(move |signal| {
            info!(signal, "interrupted, removing {}", watcher_link.path().display());
            if let Err(e) = watcher_link.remove() {
                error!("{}", e);
            }
            let _ = interrupted_tx.send(signal);
            if let Err(e) = unmounter.unmount() {
                error!("unmount failed: {}", e);
                std::process::exit(1);
            }
        });
        let watcher = match spawned {
            Ok(w) => w,
            Err(e) => {
                drop(session);
                binding.discard();
                return Err(e);
            }
        };

        let served = session.run();
        // wakes the watcher after an external unmount and unblocks signals
        watcher.stop();
        drop(session);
        let torn_down = binding.teardown();

        if let Ok(signal) = interrupted_rx.try_recv() {
            if let Err(e) = served {
                debug!("session ended after interrupt: {}", e);
            }
            return Ok(Shutdown::Interrupted(signal));
        }

        served.map_err(|source| Error::Mount {
            path: root_path,
            source,
        })?;
        torn_down?;
        info!("unmounted");
        Ok(Shutdown::Unmounted)
    }
}
