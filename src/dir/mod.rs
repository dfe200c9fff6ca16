//! Types for interacting with the directories of a file system, primarily [`Directory`] and the
//! [`Entry`] values produced while iterating its [`Contents`].
//!
//! Like [`File`](crate::file::File)s, `Directory`s are entities identified by a location and a
//! name. Most operations are also available as associated functions taking a [`Path`](crate::path::Path),
//! such as [`Directory::create_at`] or [`Directory::remove_at`].

mod dir;
mod entry;
mod tests;

pub use dir::*;
pub use entry::*;
