//! Scoped temporary directories, removed once the task using them is done.
//!
//! Every directory lives under `<temp>/entity-fs/`, named after a [`TempSuffix`]. Removal runs
//! when the task returns, whether it succeeded or not, and also when it panics.

use crate::dir::Directory;
use crate::error::Error;
use crate::path::{Component, Path};
use crate::permissions::Permissions;

const PREFIX: &str = "entity-fs";

impl Path {
    /// The platform's temporary directory.
    pub fn temp() -> Path {
        let mut path = Path::root();
        #[cfg(target_os = "macos")]
        path.append(Component::from_static("private"));
        path.append(Component::from_static("tmp"));
        path
    }
}

/// How the last part of a temporary directory's path is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TempSuffix {
    /// A random hexadecimal name.
    #[default]
    Random,
    /// A fixed relative path, which may span several components.
    Components(String),
}

impl From<&str> for TempSuffix {
    fn from(value: &str) -> Self {
        TempSuffix::Components(value.to_owned())
    }
}

impl TempSuffix {
    fn to_path(&self) -> Result<Path, Error> {
        let base = Path::temp().appending(Component::from_static(PREFIX));
        Ok(match self {
            TempSuffix::Random => base.appending(Component::try_new(format!("{:016x}", fastrand::u64(..)))?),
            TempSuffix::Components(value) => base.appending_str(value)?,
        })
    }
}

/// Removes the directory when dropped, unless it has already been removed by
/// [`TempDirectory::remove`].
struct TempDirectory {
    directory: Directory,
    removed: bool,
}

impl TempDirectory {
    fn create(suffix: &TempSuffix) -> Result<TempDirectory, Error> {
        let path = suffix.to_path()?;
        if Directory::exists_at(&path) {
            Directory::remove_at(&path)?;
        }
        Directory::create_at(&path, true, Permissions::DIRECTORY)?;
        Ok(TempDirectory {
            directory: Directory::at(&path)?,
            removed: false,
        })
    }

    fn remove(mut self) -> Result<(), Error> {
        self.removed = true;
        self.directory.remove()
    }
}

impl Drop for TempDirectory {
    fn drop(&mut self) {
        if !self.removed
            && let Err(error) = self.directory.remove()
        {
            tracing::warn!(path = %self.directory.path(), %error, "error while removing temporary directory");
        }
    }
}

/// Creates a temporary directory, runs `task` with it and removes it again.
///
/// The task's error takes precedence over one raised while removing the directory.
///
/// # Errors
/// Fails if the directory can't be created or removed, or with whatever `task` returns.
pub fn with_temp_directory<T, E, F>(suffix: TempSuffix, task: F) -> Result<T, E>
where
    E: From<Error>,
    F: FnOnce(&Directory) -> Result<T, E>,
{
    let temp = TempDirectory::create(&suffix)?;
    let result = task(&temp.directory);
    let removed = temp.remove();
    let value = result?;
    removed?;
    Ok(value)
}

/// Like [`with_temp_directory`], handing the task the directory's path instead.
pub fn with_temp_path<T, E, F>(suffix: TempSuffix, task: F) -> Result<T, E>
where
    E: From<Error>,
    F: FnOnce(&Path) -> Result<T, E>,
{
    with_temp_directory(suffix, |directory| task(&directory.path()))
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use super::*;
    use crate::file::File;

    #[test]
    fn test_temp_directory_lifecycle() {
        let path = with_temp_directory(TempSuffix::Random, |dir| {
            assert!(dir.exists(), "The directory should exist while the task runs.");
            assert!(dir.path().components().starts_with(Path::temp().components()));
            Ok::<_, Error>(dir.path())
        })
        .unwrap();
        assert!(!Directory::exists_at(&path), "The directory should be removed afterwards.");
    }

    #[test]
    fn test_named_suffix() {
        let path = with_temp_path("temp-named/nested".into(), |path| {
            assert!(path.to_string().ends_with("/entity-fs/temp-named/nested"));
            Ok::<_, Error>(path.clone())
        })
        .unwrap();
        assert!(!Directory::exists_at(&path));
    }

    #[test]
    fn test_existing_directory_is_replaced() {
        let suffix = TempSuffix::from("temp-existing");
        let path = suffix.to_path().unwrap();
        Directory::create_at(&path, true, Permissions::DIRECTORY).ok();
        File::create_at("stale".parse().unwrap(), path.clone(), false, Permissions::FILE).unwrap();

        with_temp_path(suffix, |path| {
            assert!(
                !File::exists_at(&path.appending_str("stale").unwrap()),
                "A leftover directory should be replaced by a fresh one."
            );
            Ok::<_, Error>(())
        })
        .unwrap();
    }

    #[test]
    fn test_removed_on_task_error() {
        let suffix = TempSuffix::from("temp-error");
        let path = suffix.to_path().unwrap();
        let result: Result<(), Error> = with_temp_directory(suffix, |_| Err(Error::from_err_no(libc::EIO)));
        assert_eq!(result, Err(Error::from_err_no(libc::EIO)), "The task's error should be returned.");
        assert!(!Directory::exists_at(&path));
    }

    #[test]
    fn test_removed_on_panic() {
        let suffix = TempSuffix::from("temp-panic");
        let path = suffix.to_path().unwrap();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            with_temp_directory(suffix, |_| -> Result<(), Error> { panic!("task failed") })
        }));
        assert!(result.is_err());
        assert!(!Directory::exists_at(&path), "The directory should be removed while unwinding.");
    }
}
