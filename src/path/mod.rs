//! Lexical paths, made of validated [`Component`]s.
//!
//! A [`Path`] is a plain value: it is never resolved against the file system, so equality is
//! component-wise and `..` or `.` segments are kept as written. The only environment access is
//! [`Path::expand_tilde`], which reads `HOME`.
//!
//! # Parsing
//! Strings are split on `'/'` with empty segments preserved, which keeps the leading empty
//! component that marks an absolute path:
//! ```
//! # use entity_fs::path::Path;
//! let path = Path::parse("/tmp/test").unwrap();
//! assert_eq!(path.components(), ["", "tmp", "test"]);
//! assert!(path.is_absolute());
//! assert_eq!(path.to_string(), "/tmp/test");
//! ```

mod component;
mod path;

pub use component::*;
pub use path::*;

pub const SEPARATOR: char = '/';
