use std::ffi::{CStr, CString};
use std::fmt::{self, Display, Formatter};

use libc::{ERANGE, PATH_MAX, c_char};

use crate::dir::Contents;
use crate::error::{AlreadyOpenedError, Error, InvalidPathError};
use crate::path::{Component, Path};
use crate::permissions::Permissions;
use crate::util::{self, DirStream, FileType, Metadata};

/// A directory identified by its name and the directory it lives in. The root is represented with
/// an empty name and an empty location.
///
/// A `Directory` may hold an open directory stream, which is released by [`Directory::close`],
/// [`Directory::remove`] or when the value is dropped.
#[derive(Debug)]
pub struct Directory {
    name: Component,
    location: Path,
    stream: Option<DirStream>,
}

impl Directory {
    pub fn new(name: Component, location: Path) -> Directory {
        Directory {
            name,
            location,
            stream: None,
        }
    }

    /// Splits `path` into a location and a name. `"/"` yields the root.
    ///
    /// # Errors
    /// Fails with [`InvalidPath`](Error::InvalidPath) if the path has no components.
    pub fn at(path: &Path) -> Result<Directory, Error> {
        let mut location = path.clone();
        let name = location.delete_last_component().ok_or(InvalidPathError)?;
        Ok(Directory::new(name, location))
    }

    pub fn parse(path: &str) -> Result<Directory, Error> {
        Directory::at(&Path::parse(path)?)
    }

    pub fn name(&self) -> &Component {
        &self.name
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn path(&self) -> Path {
        self.location.appending(self.name.clone())
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn exists(&self) -> bool {
        Directory::exists_at(&self.path())
    }

    /// Opens a directory stream, held until the directory is closed.
    ///
    /// # Errors
    /// Fails with [`AlreadyOpened`](Error::AlreadyOpened) if a stream is already held.
    pub fn open(&mut self) -> Result<(), Error> {
        if self.stream.is_some() {
            Err(AlreadyOpenedError)?
        }
        let path = self.path();
        let stream = DirStream::open(&CString::from(&path))?;
        tracing::debug!(%path, "opened directory");
        self.stream = Some(stream);
        Ok(())
    }

    /// Releases the directory stream, if there is one.
    pub fn close(&mut self) -> Result<(), Error> {
        if let Some(stream) = self.stream.take() {
            tracing::debug!(path = %self.path(), "closing directory");
            stream.close()?;
        }
        Ok(())
    }

    pub fn metadata(&self) -> Result<Metadata, Error> {
        let raw = match &self.stream {
            Some(stream) => util::fstat(stream.fd())?,
            None => util::stat(&CString::from(&self.path()))?,
        };
        Ok(Metadata::from_stat(raw))
    }

    pub fn permissions(&self) -> Result<Permissions, Error> {
        Ok(self.metadata()?.permissions)
    }

    pub fn create(&self, with_intermediate_directories: bool, permissions: Permissions) -> Result<(), Error> {
        Directory::create_at(&self.path(), with_intermediate_directories, permissions)
    }

    /// Closes the directory and removes it along with everything inside it.
    pub fn remove(&mut self) -> Result<(), Error> {
        self.close()?;
        Directory::remove_at(&self.path())
    }

    /// Starts a lazy iteration over the entries of this directory, independent of whether the
    /// directory itself is open.
    pub fn contents(&self) -> Result<Contents, Error> {
        Directory::contents_at(&self.path())
    }

    pub fn exists_at(path: &Path) -> bool {
        util::access(path)
    }

    /// Creates a directory at `path`. Missing ancestors are only created when
    /// `with_intermediate_directories` is set, and always with
    /// [`Permissions::INTERMEDIATE_DIRECTORIES`].
    ///
    /// # Errors
    /// Fails with [`Exists`](Error::Exists) if something already exists at `path`, or
    /// [`DoesntExist`](Error::DoesntExist) if the parent is missing and intermediate directories
    /// weren't requested.
    pub fn create_at(path: &Path, with_intermediate_directories: bool, permissions: Permissions) -> Result<(), Error> {
        if with_intermediate_directories {
            Directory::create_ancestors(path)?;
        }
        make_directory(path, permissions)
    }

    fn create_ancestors(path: &Path) -> Result<(), Error> {
        let mut parent = path.clone();
        // A trailing separator doesn't name a directory of its own.
        while parent.components.len() > 1 && parent.last_component().is_some_and(|c| c.is_empty()) {
            parent.delete_last_component();
        }
        let parent = parent.deleting_last_component();

        if parent.is_empty() || parent == *path || Directory::exists_at(&parent) {
            return Ok(());
        }
        Directory::create_ancestors(&parent)?;
        make_directory(&parent, Permissions::INTERMEDIATE_DIRECTORIES)
    }

    /// Removes the directory at `path` depth-first: files (symlinks included) are unlinked,
    /// subdirectories are removed recursively, then the directory itself.
    ///
    /// Children are addressed by the bytes stored on disk, so entries that [`Contents`] can't
    /// represent are removed as well.
    ///
    /// The first failure is returned as is. Anything removed before it stays removed.
    pub fn remove_at(path: &Path) -> Result<(), Error> {
        remove_tree(&CString::from(path))?;
        tracing::debug!(%path, "removed directory");
        Ok(())
    }

    pub fn contents_at(path: &Path) -> Result<Contents, Error> {
        Contents::open(path.clone())
    }

    /// The current working directory of the process.
    ///
    /// # Errors
    /// Fails with [`InvalidPath`](Error::InvalidPath) if its path isn't UTF-8 or isn't a valid
    /// [`Path`].
    pub fn current() -> Result<Directory, Error> {
        let mut buf: Vec<c_char> = vec![0; PATH_MAX as usize];
        loop {
            // SAFETY: buf is valid for writes of buf.len() bytes, and getcwd null-terminates its
            // output on success.
            if !unsafe { libc::getcwd(buf.as_mut_ptr(), buf.len()) }.is_null() {
                break;
            }
            match util::err_no() {
                ERANGE => buf.resize(buf.len() * 2, 0),
                e => Err(Error::from_err_no(e))?,
            }
        }
        // SAFETY: getcwd succeeded, so buf holds a null-terminated string.
        let cwd = unsafe { CStr::from_ptr(buf.as_ptr()) };
        Directory::at(&Path::parse(cwd.to_str().map_err(|_| InvalidPathError)?)?)
    }

    /// Changes the current working directory of the process to `directory`.
    pub fn set_current(directory: &Directory) -> Result<(), Error> {
        Directory::change_working_directory(&directory.path())
    }

    pub fn change_working_directory(path: &Path) -> Result<(), Error> {
        let pathname = CString::from(path);
        // SAFETY: pathname is a valid null-terminated string for the duration of the call.
        if unsafe { libc::chdir(pathname.as_ptr()) } == -1 {
            Err(Error::last_os_error())?
        }
        tracing::debug!(%path, "changed working directory");
        Ok(())
    }
}

fn remove_tree(pathname: &CStr) -> Result<(), Error> {
    let mut stream = DirStream::open(pathname)?;
    while let Some(entry) = stream.read()? {
        if entry.is_self_or_parent() {
            continue;
        }
        let child = entry.pathname_in(pathname);
        let file_type = match entry.file_type {
            Some(file_type) => file_type,
            None => FileType::from_stat_mode(util::lstat(&child)?.st_mode),
        };

        if file_type.is_dir() {
            remove_tree(&child)?;
        } else {
            // SAFETY: child is a valid null-terminated string for the duration of the call.
            if unsafe { libc::unlink(child.as_ptr()) } == -1 {
                Err(Error::last_os_error())?
            }
        }
    }
    stream.close()?;

    // SAFETY: pathname is a valid null-terminated string for the duration of the call.
    if unsafe { libc::rmdir(pathname.as_ptr()) } == -1 {
        Err(Error::last_os_error())?
    }
    Ok(())
}

fn make_directory(path: &Path, permissions: Permissions) -> Result<(), Error> {
    let pathname = CString::from(path);
    // SAFETY: pathname is a valid null-terminated string for the duration of the call.
    if unsafe { libc::mkdir(pathname.as_ptr(), permissions.mode()) } == -1 {
        Err(Error::last_os_error())?
    }
    tracing::debug!(%path, %permissions, "created directory");
    Ok(())
}

impl PartialEq for Directory {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.location == other.location
    }
}

impl Eq for Directory {}

impl PartialEq<str> for Directory {
    fn eq(&self, other: &str) -> bool {
        self.path() == *other
    }
}

impl PartialEq<&str> for Directory {
    fn eq(&self, other: &&str) -> bool {
        self.path() == *other
    }
}

impl Display for Directory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
