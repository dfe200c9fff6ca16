#![cfg(all(test, feature = "temp"))]

use std::ffi::{CStr, CString, OsStr};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::symlink;

use libc::c_int;
use serial_test::serial;

use super::*;
use crate::error::Error;
use crate::file::{File, Name};
use crate::path::{Component, Path};
use crate::permissions::{PermissionSet, Permissions};
use crate::temp::{TempSuffix, with_temp_directory, with_temp_path};
use crate::util;

const LONG_NAME_LEN: usize = 250;
const CHAIN_LEVELS: usize = 18;

fn touch(location: &Path, name: &str) -> Result<(), Error> {
    File::create_at(Name::try_new(name)?, location.clone(), false, Permissions::FILE)
}

/// Creates an empty file whose name is taken byte for byte, bypassing name validation.
fn touch_raw(location: &Path, name: &[u8]) {
    let mut pathname = location.to_string().into_bytes();
    pathname.push(b'/');
    pathname.extend_from_slice(name);
    std::fs::File::create(OsStr::from_bytes(&pathname)).unwrap();
}

fn long_name(level: usize) -> CString {
    CString::new(format!("{level:0>width$}", width = LONG_NAME_LEN)).unwrap()
}

fn open_dir_at(dir_fd: c_int, pathname: &CStr) -> OwnedFd {
    // SAFETY: pathname is null-terminated, a bad dir_fd is reported through errno.
    let fd = unsafe { libc::openat(dir_fd, pathname.as_ptr(), libc::O_RDONLY | libc::O_DIRECTORY) };
    assert_ne!(fd, -1, "{}", Error::last_os_error());
    // SAFETY: fd was just opened and nothing else owns it.
    unsafe { OwnedFd::from_raw_fd(fd) }
}

/// Nests directories with long names under `parent` until their full path is longer than
/// `PATH_MAX`. Returns a descriptor for `parent` followed by one for every level, each level
/// living inside the one before it.
fn create_deep_chain(parent: &Path) -> Vec<OwnedFd> {
    let mut chain = vec![open_dir_at(libc::AT_FDCWD, &CString::from(parent))];
    for level in 0..CHAIN_LEVELS {
        let name = long_name(level);
        let dir_fd = chain[level].as_raw_fd();
        // SAFETY: dir_fd is held open by chain and name is null-terminated.
        assert_eq!(unsafe { libc::mkdirat(dir_fd, name.as_ptr(), 0o755) }, 0);
        chain.push(open_dir_at(dir_fd, &name));
    }
    chain
}

fn sorted_names(contents: Contents) -> Result<Vec<String>, Error> {
    let mut names = contents
        .map(|entry| entry.map(|entry| entry.name().to_owned()))
        .collect::<Result<Vec<_>, _>>()?;
    names.sort();
    Ok(names)
}

#[test]
fn test_create_and_remove() {
    with_temp_path(TempSuffix::Random, |path| {
        let mut dir = Directory::at(&path.appending_str("test")?)?;
        assert!(!dir.exists());
        dir.create(false, Permissions::DIRECTORY)?;
        assert!(dir.exists());
        assert_eq!(dir.permissions()?.owner, Permissions::DIRECTORY.owner);
        assert!(dir.create(false, Permissions::DIRECTORY).unwrap_err().is_exists());

        dir.remove()?;
        assert!(!dir.exists());
        assert!(dir.remove().unwrap_err().is_doesnt_exist());
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_create_intermediate() {
    with_temp_path(TempSuffix::Random, |path| {
        let nested = path.appending_str("a/b/c")?;
        assert!(
            Directory::create_at(&nested, false, Permissions::DIRECTORY).unwrap_err().is_doesnt_exist(),
            "Missing parents aren't created by default."
        );

        Directory::create_at(&nested, true, Permissions::DIRECTORY)?;
        for ancestor in ["a", "a/b", "a/b/c"] {
            assert!(Directory::exists_at(&path.appending_str(ancestor)?), "'{ancestor}' should exist.");
        }
        assert_eq!(
            Directory::at(&path.appending_str("a/b")?)?.permissions()?.owner,
            PermissionSet::ALL,
            "Ancestors should use the intermediate permissions."
        );
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_create_trailing_separator() {
    with_temp_path(TempSuffix::Random, |path| {
        let nested = Path::parse(&format!("{path}/a/b/"))?;
        Directory::create_at(&nested, true, Permissions::DIRECTORY)?;
        assert!(Directory::exists_at(&path.appending_str("a/b")?));
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_contents() {
    with_temp_directory(TempSuffix::Random, |dir| {
        let path = dir.path();
        touch(&path, "one.txt")?;
        touch(&path, "two.txt")?;
        Directory::create_at(&path.appending_str("sub")?, false, Permissions::DIRECTORY)?;

        assert_eq!(sorted_names(dir.contents()?)?, ["one.txt", "sub", "two.txt"]);

        for entry in dir.contents()? {
            match entry? {
                Entry::Directory(sub) => {
                    assert_eq!(sub.name(), "sub");
                    assert_eq!(*sub.location(), path);
                },
                Entry::File(file) => assert!(file.name().ends_with(".txt")),
            }
        }
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_contents_single_directory() {
    with_temp_directory(TempSuffix::Random, |dir| {
        Directory::create_at(&dir.path().appending_str("sub")?, false, Permissions::DIRECTORY)?;

        let entries: Vec<Entry> = dir.contents()?.collect::<Result<_, _>>()?;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_directory(), "A subdirectory should be classified as a directory.");
        assert_eq!(entries[0].path(), dir.path().appending_str("sub")?);
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_contents_empty_and_missing() {
    with_temp_directory(TempSuffix::Random, |dir| {
        assert_eq!(dir.contents()?.count(), 0, "'.' and '..' shouldn't be reported.");
        assert!(
            Directory::contents_at(&dir.path().appending_str("missing")?)
                .unwrap_err()
                .is_doesnt_exist()
        );
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_contents_close_early() {
    with_temp_directory(TempSuffix::Random, |dir| {
        touch(&dir.path(), "one.txt")?;
        touch(&dir.path(), "two.txt")?;

        let mut contents = dir.contents()?;
        assert!(contents.next().is_some());
        contents.close()?;
        assert!(contents.next().is_none(), "A closed iteration shouldn't yield anything.");
        contents.close()?;
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_contents_dropped_early() {
    with_temp_directory(TempSuffix::Random, |dir| {
        touch(&dir.path(), "one.txt")?;
        touch(&dir.path(), "two.txt")?;

        let mut contents = dir.contents()?;
        assert!(contents.next().is_some());
        let fd = contents.fd().unwrap();
        let held = util::fd_identity(fd);
        assert!(held.is_some(), "The stream should be held while iterating.");

        drop(contents);
        assert_ne!(util::fd_identity(fd), held, "Dropping the iteration should release its stream.");
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_contents_invalid_names() {
    with_temp_directory(TempSuffix::Random, |dir| {
        touch(&dir.path(), "ok.txt")?;
        touch_raw(&dir.path(), b"12:30.log");
        touch_raw(&dir.path(), b"bad\xffname");

        let (entries, errors): (Vec<_>, Vec<_>) = dir.contents()?.partition(Result::is_ok);
        let entries: Vec<Entry> = entries.into_iter().map(Result::unwrap).collect();
        assert_eq!(entries.len(), 1, "Only the representable name should become an entry.");
        assert_eq!(entries[0].name(), "ok.txt");
        assert_eq!(errors.len(), 2);
        for error in errors {
            assert!(error.unwrap_err().is_invalid_name(), "Unrepresentable names should fail with InvalidName.");
        }
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_remove_recursive() {
    with_temp_path(TempSuffix::Random, |path| {
        let root = path.appending_str("tree")?;
        Directory::create_at(&root.appending_str("sub/deeper")?, true, Permissions::DIRECTORY)?;
        touch(&root, "file.txt")?;
        touch(&root.appending_str("sub")?, "nested.txt")?;
        touch(&root.appending_str("sub/deeper")?, "deepest.txt")?;

        Directory::remove_at(&root)?;
        assert!(!Directory::exists_at(&root));
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_remove_non_utf8_name() {
    with_temp_path(TempSuffix::Random, |path| {
        let tree = path.appending_str("tree")?;
        Directory::create_at(&tree.appending_str("sub")?, true, Permissions::DIRECTORY)?;
        touch_raw(&tree.appending_str("sub")?, b"bad\xffname");

        Directory::remove_at(&tree)?;
        assert!(!Directory::exists_at(&tree), "A name that isn't UTF-8 shouldn't stop the removal.");
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_remove_name_with_colon() {
    with_temp_path(TempSuffix::Random, |path| {
        let tree = path.appending_str("tree")?;
        Directory::create_at(&tree, false, Permissions::DIRECTORY)?;
        touch_raw(&tree, b"12:30.log");

        Directory::remove_at(&tree)?;
        assert!(!Directory::exists_at(&tree), "A name with ':' shouldn't stop the removal.");
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_remove_stops_at_first_failure() {
    with_temp_path(TempSuffix::Random, |path| {
        let tree = path.appending_str("tree")?;
        let deep = tree.appending_str("deep")?;
        Directory::create_at(&deep, true, Permissions::DIRECTORY)?;
        for index in 0..8 {
            touch(&tree, &format!("file{index}.txt"))?;
        }
        let chain = create_deep_chain(&deep);

        // Removal visits entries in the order the directory lists them.
        let order = Directory::contents_at(&tree)?
            .map(|entry| entry.map(|entry| entry.name().to_owned()))
            .collect::<Result<Vec<_>, _>>()?;
        let failing = order.iter().position(|name| name == "deep").unwrap();

        let error = Directory::remove_at(&tree).unwrap_err();
        assert_eq!(error, Error::from_err_no(libc::ENAMETOOLONG), "The failure should be returned as is.");
        assert!(Directory::exists_at(&tree));
        for (index, name) in order.iter().enumerate() {
            assert_eq!(
                util::access(&tree.appending_str(name)?),
                index >= failing,
                "'{name}' should be left exactly when it comes at or after the failing entry."
            );
        }

        // Splitting the chain in two brings every path back under the limit.
        let middle = CHAIN_LEVELS / 2;
        let moved = long_name(middle);
        let rest = CString::new("rest").unwrap();
        // SAFETY: Both descriptors are held open by chain and both names are null-terminated.
        let renamed = unsafe {
            libc::renameat(
                chain[middle].as_raw_fd(),
                moved.as_ptr(),
                chain[0].as_raw_fd(),
                rest.as_ptr(),
            )
        };
        assert_eq!(renamed, 0, "{}", Error::last_os_error());
        drop(chain);

        Directory::remove_at(&tree)?;
        assert!(!Directory::exists_at(&tree));
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_symlink_not_followed() {
    with_temp_path(TempSuffix::Random, |path| {
        let target = path.appending_str("target")?;
        Directory::create_at(&target, false, Permissions::DIRECTORY)?;
        touch(&target, "keep.txt")?;

        let tree = path.appending_str("tree")?;
        Directory::create_at(&tree, false, Permissions::DIRECTORY)?;
        symlink(target.to_string(), format!("{tree}/link")).unwrap();

        let entries: Vec<Entry> = Directory::contents_at(&tree)?.collect::<Result<_, _>>()?;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_file(), "Symlinks should be reported as files.");

        Directory::remove_at(&tree)?;
        assert!(!Directory::exists_at(&tree));
        assert!(
            File::exists_at(&target.appending_str("keep.txt")?),
            "Removing a tree shouldn't touch what its symlinks point to."
        );
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_open_close() {
    with_temp_directory(TempSuffix::Random, |dir| {
        let mut dir = Directory::at(&dir.path())?;
        dir.open()?;
        assert!(dir.is_open());
        assert!(dir.open().unwrap_err().is_already_opened());
        assert_eq!(
            dir.permissions()?.owner,
            PermissionSet::ALL,
            "Metadata should be readable while open."
        );
        dir.close()?;
        assert!(!dir.is_open());
        dir.close()?;
        Ok::<_, Error>(())
    })
    .unwrap();
}

#[test]
fn test_root() {
    let root = Directory::parse("/").unwrap();
    assert!(root.name().is_empty());
    assert!(root.location().is_empty());
    assert_eq!(root.path(), Path::root());
    assert_eq!(root.to_string(), "/");
    assert!(root.exists());

    assert!(Directory::at(&Path::default()).unwrap_err().is_invalid_path());
}

#[test]
fn test_equality() {
    let dir = Directory::parse("/tmp/test").unwrap();
    assert_eq!(dir, Directory::new(Component::try_new("test").unwrap(), Path::parse("/tmp").unwrap()));
    assert_eq!(dir, "/tmp/test");
    assert_ne!(dir, Directory::parse("/tmp/other").unwrap());
}

#[test]
#[serial]
fn test_current() {
    let previous = Directory::current().unwrap();
    assert!(previous.path().is_absolute());

    with_temp_directory(TempSuffix::Random, |dir| {
        Directory::set_current(dir)?;
        let current = Directory::current();
        Directory::set_current(&previous)?;
        assert_eq!(current?.path(), dir.path());
        Ok::<_, Error>(())
    })
    .unwrap();
    assert_eq!(Directory::current().unwrap(), previous);
}

#[test]
#[serial]
fn test_set_current_missing() {
    let previous = Directory::current().unwrap();
    let missing = Directory::parse("/entity-fs-missing/directory").unwrap();
    assert!(Directory::set_current(&missing).unwrap_err().is_doesnt_exist());
    assert_eq!(Directory::current().unwrap(), previous, "A failed change should keep the old directory.");
}
