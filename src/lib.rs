//! This crate is a small, strongly typed take on file system access, built around entities rather
//! than raw paths.
//!
//! # Model
//! A [`Path`](path::Path) is a lexical value: a list of validated components which is never
//! resolved against the file system. [`File`](file::File)s and [`Directory`](dir::Directory)s are
//! entities identified by a location and a name, each optionally holding an open OS handle. Their
//! lifecycle is explicit: opening twice is an error, closing is idempotent and dropping releases
//! whatever is still held.
//!
//! Reading and writing goes through a [`BufferedStream`](stream::BufferedStream), which implements
//! the standard [`Read`](std::io::Read), [`Write`](std::io::Write) and [`Seek`](std::io::Seek)
//! traits.
//!
//! # Error Handling
//! Errors are strongly typed, using enums for static dispatch with structs (mostly ZSTs) that
//! implement [`Error`](std::error::Error). Every OS failure is translated right at the call site,
//! with "already exists" and "no such entry" given their own variants and everything else carried
//! as a [`SystemError`](error::SystemError) with the original error number.
//!
//! # Dependencies
//! The crate relies on `libc` for its thin syscall wrappers, and on some derive macros because
//! they're helpful and remove the need for some very repetitive programming. Lifecycle operations
//! emit [`tracing`] events but no subscriber is ever installed by this crate.
//!
//! # Features
//! - `temp`: scoped temporary directories, see [`temp`].
//! - `logger`: a [`tracing_subscriber`] layer writing to a [`File`](file::File), see [`logger`].
//!
//! # Platforms
//! Linux, Android, macOS, iOS, the BSDs and Solaris/illumos. Other targets build an empty crate.
#![cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "solaris",
    target_os = "illumos"
))]

#![warn(clippy::missing_safety_doc)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![warn(clippy::missing_const_for_fn)]
#![warn(clippy::missing_panics_doc)]
#![warn(clippy::unwrap_used)]
#![allow(clippy::module_inception)]

pub mod dir;
pub mod error;
pub mod file;
pub mod path;
pub mod permissions;
pub mod stream;

#[cfg(feature = "logger")]
pub mod logger;
#[cfg(feature = "temp")]
pub mod temp;

pub(crate) mod util;

pub use util::{FileType, Metadata};
