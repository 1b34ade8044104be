//! Baget device
//!
//! Serves a single read-only file over FUSE whose content is generated anew
//! on every open: a few uppercase lines of random words separated by `@`
//! lines. The file is published through a symlink so that `cat` and
//! friends can read it like any other file.
//!
//! # Architecture
//!
//! ```text
//! MountLifecycle ── Session<BagetFs> ── VirtualFile::open ── generate()
//!       │                                      │
//!  PublishedLink                        EphemeralHandle::read
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use baget_fs::{MountConfig, MountLifecycle, SharedRng};
//! use std::sync::Arc;
//!
//! let config = MountConfig::new("/tmp/baget");
//! let mut lifecycle = MountLifecycle::new(config, Arc::new(SharedRng::from_time()));
//! let shutdown = lifecycle.run().unwrap();
//! std::process::exit(shutdown.exit_code());
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod mount;
pub mod signal;
pub mod vfs;

pub use config::MountConfig;
pub use error::{Error, Result};
pub use generator::{generate, RandomSource, SequenceSource, SharedRng};
pub use mount::{LifecycleState, MountBinding, MountLifecycle, PublishedLink, Shutdown};
pub use vfs::{BagetFs, EphemeralHandle, FileReader, NodeOpener, VirtualFile};
