use std::ffi::CString;
use std::fmt::{self, Display, Formatter};
use std::io::Read;

use crate::dir::Directory;
use crate::error::{AlreadyExistsError, AlreadyOpenedError, ClosedError, Error, InvalidPathError};
use crate::file::{Flags, Name};
use crate::path::Path;
use crate::permissions::Permissions;
use crate::stream::{BufferedStream, DEFAULT_BUFFER_SIZE};
use crate::util::{self, Fd, Metadata};

/// A buffered stream borrowing an open [`File`].
pub type Stream<'a> = BufferedStream<&'a File>;

/// A file identified by its name and the directory it lives in.
///
/// A `File` starts out closed and holds at most one open descriptor at a time:
/// - [`File::open`] moves it from closed to open, and fails with
///   [`AlreadyOpened`](Error::AlreadyOpened) if it's already open.
/// - [`File::close`] moves it back and does nothing if it's already closed.
/// - Dropping an open `File` closes the descriptor, ignoring any error.
///
/// Operations that don't need a descriptor, such as [`File::exists`] or [`File::rename`], work
/// in either state.
#[derive(Debug)]
pub struct File {
    name: Name,
    location: Path,
    pub(crate) fd: Option<Fd>,
    buffer_size: usize,
}

impl File {
    pub fn new(name: Name, location: Path) -> File {
        File {
            name,
            location,
            fd: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Splits `path` into a location and a name.
    ///
    /// # Errors
    /// Fails with [`InvalidPath`](Error::InvalidPath) if the path has no components, or
    /// [`InvalidName`](Error::InvalidName) if the last one is empty, as for `"/"` or `"/tmp/"`.
    pub fn at(path: &Path) -> Result<File, Error> {
        let mut location = path.clone();
        let name = location.delete_last_component().ok_or(InvalidPathError)?;
        Ok(File::new(Name::from_component(name)?, location))
    }

    pub fn parse(path: &str) -> Result<File, Error> {
        File::at(&Path::parse(path)?)
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn path(&self) -> Path {
        self.location.appending(self.name.as_component().clone())
    }

    pub fn is_open(&self) -> bool {
        self.fd.is_some()
    }

    /// The capacity of the buffers used by the most recently opened stream.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Checks whether anything exists at this file's path, regardless of whether it's open.
    pub fn exists(&self) -> bool {
        File::exists_at(&self.path())
    }

    /// Queries the size on disk at the time of the call, through the descriptor when open.
    pub fn size(&self) -> Result<u64, Error> {
        Ok(self.metadata()?.size)
    }

    pub fn metadata(&self) -> Result<Metadata, Error> {
        match &self.fd {
            Some(fd) => fd.metadata(),
            None => Ok(Metadata::from_stat(util::stat(&CString::from(&self.path()))?)),
        }
    }

    pub fn permissions(&self) -> Result<Permissions, Error> {
        Ok(self.metadata()?.permissions)
    }

    /// Changes the permissions of the file, through the descriptor when open. `None` clears every
    /// permission bit.
    pub fn set_permissions(&self, permissions: Option<Permissions>) -> Result<(), Error> {
        let mode = Permissions::mode_or_empty(permissions);
        match &self.fd {
            Some(fd) => fd.set_mode(mode),
            None => {
                let pathname = CString::from(&self.path());
                // SAFETY: pathname is a valid null-terminated string for the duration of the call.
                if unsafe { libc::chmod(pathname.as_ptr(), mode) } == -1 {
                    Err(Error::last_os_error())?
                }
                Ok(())
            },
        }
    }

    /// Creates the file if it doesn't exist yet, leaving it closed. Existing files are left
    /// untouched.
    ///
    /// # Errors
    /// Fails with [`Exists`](Error::Exists) if this instance is currently open.
    pub fn create(&mut self, with_intermediate_directories: bool, permissions: Permissions) -> Result<(), Error> {
        if self.fd.is_some() {
            Err(AlreadyExistsError)?
        }
        if with_intermediate_directories
            && !self.location.is_empty()
            && !Directory::exists_at(&self.location)
        {
            Directory::create_at(&self.location, true, Permissions::DIRECTORY)?;
        }
        self.open_handle(Flags::CREATE, permissions)?;
        self.close()
    }

    /// Opens the file with the default permissions for newly created files and buffer size.
    pub fn open(&mut self, flags: Flags) -> Result<Stream<'_>, Error> {
        self.open_with(flags, Permissions::FILE, DEFAULT_BUFFER_SIZE)
    }

    /// Opens the file and returns a buffered stream over it. `permissions` only apply if the file
    /// is created by this call.
    ///
    /// # Errors
    /// Fails with [`AlreadyOpened`](Error::AlreadyOpened) if the file is already open, or
    /// [`DoesntExist`](Error::DoesntExist) if it's missing and [`Flags::CREATE`] wasn't requested.
    pub fn open_with(
        &mut self,
        flags: Flags,
        permissions: Permissions,
        buffer_size: usize,
    ) -> Result<Stream<'_>, Error> {
        self.open_handle(flags, permissions)?;
        self.buffer_size = buffer_size;
        Ok(BufferedStream::with_capacity(buffer_size, &*self))
    }

    /// Returns a new buffered stream over an already open file.
    pub fn stream(&self) -> Result<Stream<'_>, Error> {
        if self.fd.is_none() {
            Err(ClosedError)?
        }
        Ok(BufferedStream::with_capacity(self.buffer_size, self))
    }

    /// Opens the file and moves it into a buffered stream, for when the stream has to outlive the
    /// current scope.
    pub fn into_stream(
        mut self,
        flags: Flags,
        permissions: Permissions,
        buffer_size: usize,
    ) -> Result<BufferedStream<File>, Error> {
        self.open_handle(flags, permissions)?;
        self.buffer_size = buffer_size;
        Ok(BufferedStream::with_capacity(buffer_size, self))
    }

    fn open_handle(&mut self, flags: Flags, permissions: Permissions) -> Result<(), Error> {
        if self.fd.is_some() {
            Err(AlreadyOpenedError)?
        }
        let path = self.path();
        let fd = Fd::open(&path, flags.open_flags(), permissions.mode())?;
        tracing::debug!(%path, ?flags, fd = *fd, "opened file");
        self.fd = Some(fd);
        Ok(())
    }

    pub(crate) fn raw_fd(&self) -> Result<libc::c_int, Error> {
        match &self.fd {
            Some(fd) => Ok(**fd),
            None => Err(ClosedError.into()),
        }
    }

    /// Releases the descriptor, if there is one.
    pub fn close(&mut self) -> Result<(), Error> {
        if let Some(fd) = self.fd.take() {
            tracing::debug!(path = %self.path(), fd = *fd, "closing file");
            fd.close()?;
        }
        Ok(())
    }

    /// Closes the file and unlinks it.
    pub fn remove(&mut self) -> Result<(), Error> {
        self.close()?;
        let path = self.path();
        let pathname = CString::from(&path);
        // SAFETY: pathname is a valid null-terminated string for the duration of the call.
        if unsafe { libc::unlink(pathname.as_ptr()) } == -1 {
            Err(Error::last_os_error())?
        }
        tracing::debug!(%path, "removed file");
        Ok(())
    }

    /// Renames the file within its location. The in-memory name only changes once the OS call has
    /// succeeded.
    pub fn rename(&mut self, name: Name) -> Result<(), Error> {
        let old_path = self.path();
        let new_path = self.location.appending(name.as_component().clone());
        let (old, new) = (CString::from(&old_path), CString::from(&new_path));
        // SAFETY: Both strings are valid and null-terminated for the duration of the call.
        if unsafe { libc::rename(old.as_ptr(), new.as_ptr()) } == -1 {
            Err(Error::last_os_error())?
        }
        tracing::debug!(from = %old_path, to = %new_path, "renamed file");
        self.name = name;
        Ok(())
    }

    /// Opens the file for reading, reads it to the end and closes it again.
    pub fn read_all_string(&mut self) -> Result<String, Error> {
        let mut content = String::new();
        let result = self.open(Flags::READ)?.read_to_string(&mut content);
        self.close()?;
        result?;
        Ok(content)
    }

    pub fn exists_at(path: &Path) -> bool {
        util::access(path)
    }

    pub fn remove_at(path: &Path) -> Result<(), Error> {
        File::at(path)?.remove()
    }

    pub fn create_at(
        name: Name,
        location: Path,
        with_intermediate_directories: bool,
        permissions: Permissions,
    ) -> Result<(), Error> {
        File::new(name, location).create(with_intermediate_directories, permissions)
    }

    pub fn rename_at(old: Name, new: Name, location: Path) -> Result<(), Error> {
        File::new(old, location).rename(new)
    }
}

impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.location == other.location
    }
}

impl Eq for File {}

impl PartialEq<str> for File {
    fn eq(&self, other: &str) -> bool {
        self.path() == *other
    }
}

impl PartialEq<&str> for File {
    fn eq(&self, other: &&str) -> bool {
        self.path() == *other
    }
}

impl Display for File {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "file://{}", self.path())
    }
}
