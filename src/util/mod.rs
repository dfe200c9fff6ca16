mod dir_stream;
mod fd;
mod file_type;
mod metadata;
mod syscall;

pub(crate) use dir_stream::*;
pub(crate) use fd::*;
pub use file_type::*;
pub use metadata::*;
pub(crate) use syscall::*;
