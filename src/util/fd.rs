use std::ffi::CString;
use std::fmt::{self, Debug, Formatter};
use std::ops::Deref;

use libc::{c_int, mode_t};

use crate::error::Error;
use crate::path::Path;
use crate::util::{self, Metadata};

/// An owned file descriptor. It is closed when dropped, unless it has already been closed
/// explicitly via [`Fd::close`].
pub(crate) struct Fd(c_int);

impl Fd {
    pub fn open(file_path: &Path, flags: c_int, mode: mode_t) -> Result<Fd, Error> {
        let pathname = CString::from(file_path);

        // SAFETY: pathname is a valid null-terminated string for the duration of the call. The
        // mode is passed as an unsigned int, as required for variadic arguments.
        match unsafe { libc::open(pathname.as_ptr(), flags | libc::O_CLOEXEC, mode as libc::c_uint) } {
            -1 => Err(Error::last_os_error()),
            fd => Ok(Fd(fd)),
        }
    }

    pub fn metadata(&self) -> Result<Metadata, Error> {
        Ok(Metadata::from_stat(util::fstat(self.0)?))
    }

    pub fn set_mode(&self, mode: mode_t) -> Result<(), Error> {
        // SAFETY: There is no memory management here and any returned errors are handled.
        if unsafe { libc::fchmod(self.0, mode) } == -1 {
            Err(Error::last_os_error())?
        }
        Ok(())
    }

    pub fn close(self) -> Result<(), Error> {
        let fd = self.0;
        // The descriptor is invalidated by close regardless of the outcome, so Drop mustn't try
        // again.
        std::mem::forget(self);
        // SAFETY: fd is owned by this handle and not used again after this point.
        if unsafe { libc::close(fd) } == -1 {
            Err(Error::last_os_error())?
        }
        Ok(())
    }
}

impl Deref for Fd {
    type Target = c_int;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        // SAFETY: After this, the file descriptor is invalidated but we are dropping self so it
        // doesn't matter.
        if unsafe { libc::close(self.0) } == -1 {
            // Nobody is left to observe the error.
            tracing::warn!(fd = self.0, error = %Error::last_os_error(), "error while dropping file descriptor");
        }
    }
}

impl Debug for Fd {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Fd({})", self.0)
    }
}
