//! Types for working with files, primarily the [`File`] entity and its [`Name`].
//!
//! A [`File`] is identified by a location and a name, and may hold at most one open descriptor.
//! Opening a file yields a [`Stream`], a [`BufferedStream`](crate::stream::BufferedStream)
//! borrowing the file, through which all reads and writes go.
//!
//! # Flags
//! Access is requested with a combination of [`Flags`]:
//! ```no_run
//! # use entity_fs::file::{File, Flags};
//! # use std::io::Write;
//! let mut file = File::parse("/tmp/test.txt")?;
//! let mut stream = file.open(Flags::WRITE | Flags::CREATE | Flags::TRUNCATE)?;
//! stream.write_all(b"test string")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod file;
mod flags;
mod io;
mod name;

pub use file::*;
pub use flags::*;
pub use name::*;
