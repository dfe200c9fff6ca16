use std::ffi::CString;
use std::iter::FusedIterator;

use derive_more::IsVariant;
#[cfg(test)]
use libc::c_int;

use crate::dir::Directory;
use crate::error::{Error, InvalidNameError};
use crate::file::{File, Name};
use crate::path::{Component, Path};
use crate::util::{self, DirStream, FileType, RawEntry};

/// An item of a directory's contents. Anything that isn't a directory, symlinks included, is
/// reported as a [`File`].
#[derive(Debug, PartialEq, Eq, IsVariant)]
pub enum Entry {
    File(File),
    Directory(Directory),
}

impl Entry {
    /// # Errors
    /// Fails with [`InvalidName`](Error::InvalidName) if the name on disk isn't UTF-8 or isn't a
    /// valid [`Component`], since such an entry couldn't be addressed through a [`Path`].
    fn from_raw(location: &Path, raw: RawEntry) -> Result<Entry, Error> {
        let name = Component::try_new(raw.name_str()?).map_err(|_| InvalidNameError)?;
        let file_type = match raw.file_type {
            Some(file_type) => file_type,
            // Not every file system fills in d_type.
            None => {
                let pathname = CString::from(&location.appending(name.clone()));
                FileType::from_stat_mode(util::lstat(&pathname)?.st_mode)
            },
        };

        Ok(if file_type.is_dir() {
            Entry::Directory(Directory::new(name, location.clone()))
        } else {
            Entry::File(File::new(Name::from_component(name)?, location.clone()))
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Entry::File(file) => file.name(),
            Entry::Directory(directory) => directory.name(),
        }
    }

    pub fn path(&self) -> Path {
        match self {
            Entry::File(file) => file.path(),
            Entry::Directory(directory) => directory.path(),
        }
    }
}

/// A lazy, single-pass iterator over the entries of a directory, skipping `.` and `..`.
///
/// An entry whose name can't be represented as a [`Component`] is reported as an
/// [`InvalidName`](Error::InvalidName) error in its place. Iteration may continue past it.
///
/// The underlying directory stream is held until the iterator is exhausted, fails, is closed
/// explicitly or is dropped, whichever comes first.
#[derive(Debug)]
pub struct Contents {
    location: Path,
    stream: Option<DirStream>,
}

impl Contents {
    pub(crate) fn open(location: Path) -> Result<Contents, Error> {
        let stream = DirStream::open(&CString::from(&location))?;
        Ok(Contents {
            location,
            stream: Some(stream),
        })
    }

    /// The directory being iterated, which is the location of every yielded entry.
    pub fn location(&self) -> &Path {
        &self.location
    }

    #[cfg(test)]
    pub(crate) fn fd(&self) -> Option<c_int> {
        self.stream.as_ref().map(DirStream::fd)
    }

    /// Releases the directory stream early. Further calls to `next` return `None`.
    pub fn close(&mut self) -> Result<(), Error> {
        match self.stream.take() {
            Some(stream) => stream.close(),
            None => Ok(()),
        }
    }
}

impl Iterator for Contents {
    type Item = Result<Entry, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let stream = self.stream.as_mut()?;
        let result = loop {
            match stream.read() {
                Ok(Some(raw)) if raw.is_self_or_parent() => continue,
                Ok(Some(raw)) => return Some(Entry::from_raw(&self.location, raw)),
                Ok(None) => break None,
                Err(e) => break Some(Err(e)),
            }
        };

        // Exhausted or failed: either way the stream isn't needed anymore.
        match (self.close(), result) {
            (Err(e), None) => Some(Err(e)),
            (_, result) => result,
        }
    }
}

impl FusedIterator for Contents {}
