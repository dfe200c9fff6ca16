use std::ffi::{CStr, CString};
use std::io;
use std::mem::MaybeUninit;

use libc::{F_OK, c_int, stat as Stat};

use crate::error::Error;
use crate::path::Path;

pub fn err_no() -> c_int {
    // SAFETY: raw_os_error guarantees Some if constructed from last_os_error.
    unsafe { io::Error::last_os_error().raw_os_error().unwrap_unchecked() }
}

/// Resets `errno`, needed before calls such as `readdir` which only signal failure through it.
pub fn clear_err_no() {
    // SAFETY: The errno location is thread local and always valid for writes.
    unsafe {
        *errno_location() = 0;
    }
}

#[cfg(any(target_os = "linux", target_os = "dragonfly"))]
use libc::__errno_location as errno_location;
#[cfg(any(target_os = "android", target_os = "netbsd", target_os = "openbsd"))]
use libc::__errno as errno_location;
#[cfg(any(target_os = "solaris", target_os = "illumos"))]
use libc::___errno as errno_location;
#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
use libc::__error as errno_location;

pub fn access(path: &Path) -> bool {
    let pathname = CString::from(path);
    // SAFETY: pathname is a valid null-terminated string for the duration of the call.
    unsafe { libc::access(pathname.as_ptr(), F_OK) == 0 }
}

pub fn stat(pathname: &CStr) -> Result<Stat, Error> {
    let mut raw_meta: MaybeUninit<Stat> = MaybeUninit::uninit();
    // SAFETY: pathname is null-terminated and raw_meta is valid for writes of a stat struct.
    if unsafe { libc::stat(pathname.as_ptr(), raw_meta.as_mut_ptr()) } == -1 {
        Err(Error::last_os_error())?
    }
    // SAFETY: stat either initializes raw_meta or returns an error, which is handled above.
    Ok(unsafe { raw_meta.assume_init() })
}

pub fn lstat(pathname: &CStr) -> Result<Stat, Error> {
    let mut raw_meta: MaybeUninit<Stat> = MaybeUninit::uninit();
    // SAFETY: pathname is null-terminated and raw_meta is valid for writes of a stat struct.
    if unsafe { libc::lstat(pathname.as_ptr(), raw_meta.as_mut_ptr()) } == -1 {
        Err(Error::last_os_error())?
    }
    // SAFETY: lstat either initializes raw_meta or returns an error, which is handled above.
    Ok(unsafe { raw_meta.assume_init() })
}

pub fn fstat(fd: c_int) -> Result<Stat, Error> {
    let mut raw_meta: MaybeUninit<Stat> = MaybeUninit::uninit();
    // SAFETY: raw_meta is valid for writes of a stat struct, a bad fd is reported through errno.
    if unsafe { libc::fstat(fd, raw_meta.as_mut_ptr()) } == -1 {
        Err(Error::last_os_error())?
    }
    // SAFETY: fstat either initializes raw_meta or returns an error, which is handled above.
    Ok(unsafe { raw_meta.assume_init() })
}

/// The device and inode `fd` refers to, or `None` if it isn't open.
#[cfg(test)]
pub fn fd_identity(fd: c_int) -> Option<(u64, u64)> {
    fstat(fd).ok().map(|raw| (raw.st_dev as u64, raw.st_ino as u64))
}
