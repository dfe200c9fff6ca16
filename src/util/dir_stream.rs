use std::ffi::{CStr, CString};
use std::fmt::{self, Debug, Formatter};
use std::ptr::NonNull;

use libc::{DIR, c_int};

use crate::error::{Error, InvalidNameError};
use crate::util::{self, FileType};

/// A single record read from a [`DirStream`], with the name already copied out of the buffer
/// owned by the C library. The name is kept as the raw bytes stored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawEntry {
    pub name: CString,
    pub file_type: Option<FileType>,
}

impl RawEntry {
    pub fn is_self_or_parent(&self) -> bool {
        matches!(self.name.to_bytes(), b"." | b"..")
    }

    /// The name as UTF-8.
    ///
    /// # Errors
    /// Fails with [`InvalidName`](Error::InvalidName) if the bytes on disk aren't valid UTF-8.
    pub fn name_str(&self) -> Result<&str, Error> {
        Ok(self.name.to_str().map_err(|_| InvalidNameError)?)
    }

    /// The full pathname of this entry, given the pathname of the directory it was read from.
    pub fn pathname_in(&self, dir_pathname: &CStr) -> CString {
        let mut bytes = dir_pathname.to_bytes().to_vec();
        if bytes.last().is_some_and(|last| *last != b'/') {
            bytes.push(b'/');
        }
        bytes.extend_from_slice(self.name.to_bytes());
        // SAFETY: Both parts come from C strings, so neither contains a null byte.
        unsafe { CString::from_vec_unchecked(bytes) }
    }
}

/// An owned directory stream, as returned by `opendir`. Closed when dropped, unless it has
/// already been closed explicitly via [`DirStream::close`].
pub(crate) struct DirStream(NonNull<DIR>);

impl DirStream {
    pub fn open(pathname: &CStr) -> Result<DirStream, Error> {
        // SAFETY: pathname is a valid null-terminated string for the duration of the call.
        match NonNull::new(unsafe { libc::opendir(pathname.as_ptr()) }) {
            Some(dir) => Ok(DirStream(dir)),
            None => Err(Error::last_os_error()),
        }
    }

    /// Reads the next record, including the `.` and `..` pseudo-entries. Returns `Ok(None)` once
    /// the end of the stream is reached.
    pub fn read(&mut self) -> Result<Option<RawEntry>, Error> {
        // readdir signals both the end of the stream and errors with NULL, only errno tells them
        // apart.
        util::clear_err_no();
        // SAFETY: self.0 is a live stream obtained from opendir and only used from this handle.
        let entry = unsafe { libc::readdir(self.0.as_ptr()) };
        if entry.is_null() {
            return match util::err_no() {
                0 => Ok(None),
                e => Err(Error::from_err_no(e)),
            };
        }
        // SAFETY: readdir returned a valid entry, which stays valid until the next call on this
        // stream. d_name is always null-terminated.
        let (name, d_type) = unsafe {
            let entry = &*entry;
            (CStr::from_ptr(entry.d_name.as_ptr()).to_owned(), entry.d_type)
        };

        Ok(Some(RawEntry {
            name,
            file_type: FileType::from_dirent_type(d_type),
        }))
    }

    pub fn fd(&self) -> c_int {
        // SAFETY: self.0 is a live stream obtained from opendir.
        unsafe { libc::dirfd(self.0.as_ptr()) }
    }

    pub fn close(self) -> Result<(), Error> {
        let dir = self.0;
        // closedir releases the stream regardless of the outcome, so Drop mustn't try again.
        std::mem::forget(self);
        // SAFETY: dir is owned by this handle and not used again after this point.
        if unsafe { libc::closedir(dir.as_ptr()) } == -1 {
            Err(Error::last_os_error())?
        }
        Ok(())
    }
}

// SAFETY: A DIR stream isn't tied to the thread that opened it, and DirStream never hands out
// shared access to it.
unsafe impl Send for DirStream {}

impl Drop for DirStream {
    fn drop(&mut self) {
        // SAFETY: self.0 is a live stream and self is being dropped, so it isn't used again.
        if unsafe { libc::closedir(self.0.as_ptr()) } == -1 {
            tracing::warn!(error = %Error::last_os_error(), "error while dropping directory stream");
        }
    }
}

impl Debug for DirStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "DirStream({:p})", self.0)
    }
}
