//! The virtual file and its FUSE surface.
//!
//! A [`VirtualFile`] hands out an [`EphemeralHandle`] per open, each with
//! freshly generated content; [`BagetFs`] exposes it as the only entry of
//! the mount root.

mod fuse;
mod handle;
mod node;

pub use fuse::{BagetFs, FILE_INO, ROOT_INO};
pub use handle::{EphemeralHandle, FileReader};
pub use node::{AccessMode, NodeOpener, OpenDirective, VirtualFile};
