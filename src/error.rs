use std::fmt::{self, Display, Formatter};
use std::io;

use derive_more::{Display, Error, From, IsVariant};
use libc::{EEXIST, ENOENT, c_int};

use crate::util;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("invalid file name")]
pub struct InvalidNameError;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("invalid file path")]
pub struct InvalidPathError;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("the file is already opened")]
pub struct AlreadyOpenedError;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("the file was closed or wasn't opened")]
pub struct ClosedError;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("the file or directory already exists")]
pub struct AlreadyExistsError;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("the file or directory doesn't exist")]
pub struct MissingError;

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("environment variable HOME is unset or empty")]
pub struct HomeResolutionError;

/// An OS error that has no dedicated variant, carrying the raw error number for diagnostics.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub struct SystemError(#[error(not(source))] pub c_int);

impl SystemError {
    pub const fn code(&self) -> c_int {
        self.0
    }
}

impl Display for SystemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "system error {}: {}", self.0, io::Error::from_raw_os_error(self.0))
    }
}

/// Errors produced by pure [`Path`](crate::path::Path) operations, which never touch the file
/// system.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, From, Error, IsVariant)]
pub enum PathError {
    InvalidPath(InvalidPathError),
    HomeResolution(HomeResolutionError),
}

/// The error type shared by every [`File`](crate::file::File) and
/// [`Directory`](crate::dir::Directory) operation.
///
/// Only the "already exists" and "no such entry" conditions are given their own variants, every
/// other OS failure is surfaced as [`Error::System`] with the original error number attached.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, From, Error, IsVariant)]
pub enum Error {
    InvalidName(InvalidNameError),
    InvalidPath(InvalidPathError),
    AlreadyOpened(AlreadyOpenedError),
    Closed(ClosedError),
    Exists(AlreadyExistsError),
    DoesntExist(MissingError),
    HomeResolution(HomeResolutionError),
    System(SystemError),
}

impl Error {
    pub const fn from_err_no(code: c_int) -> Error {
        match code {
            EEXIST => Error::Exists(AlreadyExistsError),
            ENOENT => Error::DoesntExist(MissingError),
            e => Error::System(SystemError(e)),
        }
    }

    /// Interprets the current value of `errno`. Must be called directly after the failing call.
    pub(crate) fn last_os_error() -> Error {
        Error::from_err_no(util::err_no())
    }
}

impl From<PathError> for Error {
    fn from(value: PathError) -> Self {
        match value {
            PathError::InvalidPath(e) => e.into(),
            PathError::HomeResolution(e) => e.into(),
        }
    }
}

impl From<io::Error> for Error {
    fn from(value: io::Error) -> Self {
        if let Some(code) = value.raw_os_error() {
            return Error::from_err_no(code);
        }
        match value.kind() {
            io::ErrorKind::NotConnected => ClosedError.into(),
            io::ErrorKind::ResourceBusy => AlreadyOpenedError.into(),
            io::ErrorKind::InvalidData => SystemError(libc::EILSEQ).into(),
            io::ErrorKind::UnexpectedEof => SystemError(libc::ENODATA).into(),
            _ => SystemError(libc::EIO).into(),
        }
    }
}

impl From<Error> for io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Exists(_) => io::Error::from_raw_os_error(EEXIST),
            Error::DoesntExist(_) => io::Error::from_raw_os_error(ENOENT),
            Error::System(SystemError(code)) => io::Error::from_raw_os_error(code),
            Error::Closed(e) => io::Error::new(io::ErrorKind::NotConnected, e),
            Error::AlreadyOpened(e) => io::Error::new(io::ErrorKind::ResourceBusy, e),
            e => io::Error::new(io::ErrorKind::InvalidInput, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_err_no_mapping() {
        assert!(Error::from_err_no(EEXIST).is_exists());
        assert!(Error::from_err_no(ENOENT).is_doesnt_exist());
        assert_eq!(
            Error::from_err_no(libc::EACCES),
            Error::System(SystemError(libc::EACCES)),
            "Codes other than EEXIST and ENOENT should be wrapped opaquely."
        );
    }

    #[test]
    fn test_io_conversion_keeps_code() {
        let io: io::Error = Error::from_err_no(libc::EIO).into();
        assert_eq!(io.raw_os_error(), Some(libc::EIO));

        let io: io::Error = Error::from(ClosedError).into();
        assert_eq!(io.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn test_closed_survives_io_round_trip() {
        let io: io::Error = Error::from(ClosedError).into();
        assert!(Error::from(io).is_closed());
    }

    #[test]
    fn test_path_error_into_error() {
        assert!(Error::from(PathError::from(HomeResolutionError)).is_home_resolution());
        assert!(Error::from(PathError::from(InvalidPathError)).is_invalid_path());
    }
}
