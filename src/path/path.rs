use std::env;
use std::ffi::{CString, OsString};
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use derive_more::IsVariant;

use crate::error::{HomeResolutionError, InvalidPathError, PathError};
use crate::path::{Component, SEPARATOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum PathKind {
    Absolute,
    Relative,
}

/// An ordered list of [`Component`]s. Purely lexical: no operation here touches the file system,
/// and no normalization is performed, so `a/../b` and `b` are different paths.
///
/// An absolute path starts with an empty component, which stands for the root. The root itself is
/// a single empty component and is rendered as `"/"`.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Path {
    pub(crate) components: Vec<Component>,
}

impl Path {
    /// Splits `value` on the separator, keeping empty segments so that the string can be
    /// reproduced exactly.
    pub fn parse(value: &str) -> Result<Path, InvalidPathError> {
        if value.is_empty() {
            return Ok(Path::default());
        }
        if value.len() == SEPARATOR.len_utf8() && value.starts_with(SEPARATOR) {
            return Ok(Path::root());
        }
        Ok(Path {
            components: split(value)?,
        })
    }

    /// Builds a path from a list of components, an empty list yields the current directory.
    pub fn from_components<I: IntoIterator<Item = Component>>(components: I) -> Path {
        let components: Vec<Component> = components.into_iter().collect();
        if components.is_empty() {
            Path::current()
        } else {
            Path { components }
        }
    }

    pub fn root() -> Path {
        Path {
            components: vec![Component::EMPTY],
        }
    }

    pub fn current() -> Path {
        Path {
            components: vec![Component::current()],
        }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn kind(&self) -> PathKind {
        match self.components.first() {
            Some(first) if first.is_empty() => PathKind::Absolute,
            _ => PathKind::Relative,
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.kind().is_absolute()
    }

    pub fn is_relative(&self) -> bool {
        self.kind().is_relative()
    }

    pub fn last_component(&self) -> Option<&Component> {
        self.components.last()
    }

    pub fn append(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn append_path(&mut self, other: &Path) {
        self.components.extend(other.components.iter().cloned());
    }

    /// Appends every segment of `value`, so `"one/two"` adds two components.
    pub fn append_str(&mut self, value: &str) -> Result<(), InvalidPathError> {
        self.components.extend(split(value)?);
        Ok(())
    }

    pub fn appending(&self, component: Component) -> Path {
        let mut path = self.clone();
        path.append(component);
        path
    }

    pub fn appending_path(&self, other: &Path) -> Path {
        let mut path = self.clone();
        path.append_path(other);
        path
    }

    pub fn appending_str(&self, value: &str) -> Result<Path, InvalidPathError> {
        let mut path = self.clone();
        path.append_str(value)?;
        Ok(path)
    }

    /// Removes and returns the last component, with no special handling for the root.
    pub fn delete_last_component(&mut self) -> Option<Component> {
        self.components.pop()
    }

    /// Returns the parent path. The root is its own parent, while a single relative component
    /// leaves an empty path.
    pub fn deleting_last_component(&self) -> Path {
        if self.components.len() > 1 {
            return Path {
                components: self.components[..self.components.len() - 1].to_vec(),
            };
        }
        match self.kind() {
            PathKind::Absolute => self.clone(),
            PathKind::Relative => Path::default(),
        }
    }

    /// Replaces a leading `~` with the components of `$HOME`. Only relative paths starting with
    /// exactly `~` are affected.
    ///
    /// # Errors
    /// Fails with [`HomeResolutionError`] if `HOME` is unset or empty, or
    /// [`InvalidPathError`] if it can't be parsed.
    pub fn expand_tilde(&mut self) -> Result<(), PathError> {
        if !self.starts_with_tilde() {
            return Ok(());
        }
        self.expand_tilde_with(env::var_os("HOME"))
    }

    pub fn expanding_tilde(&self) -> Result<Path, PathError> {
        let mut path = self.clone();
        path.expand_tilde()?;
        Ok(path)
    }

    fn starts_with_tilde(&self) -> bool {
        self.is_relative() && self.components.first().is_some_and(|c| *c == "~")
    }

    pub(crate) fn expand_tilde_with(&mut self, home: Option<OsString>) -> Result<(), PathError> {
        if !self.starts_with_tilde() {
            return Ok(());
        }
        let home = home
            .filter(|home| !home.is_empty())
            .ok_or(HomeResolutionError)?
            .into_string()
            .map_err(|_| InvalidPathError)?;

        let mut components = Path::parse(&home)?.components;
        components.extend(self.components.drain(1..));
        self.components = components;
        Ok(())
    }
}

fn split(value: &str) -> Result<Vec<Component>, InvalidPathError> {
    value.split(SEPARATOR).map(Component::try_new).collect()
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.components.len() == 1 && self.is_absolute() {
            return write!(f, "{SEPARATOR}");
        }
        let mut iter = self.components.iter();
        if let Some(first) = iter.next() {
            write!(f, "{first}")?;
        }
        for component in iter {
            write!(f, "{SEPARATOR}{component}")?;
        }
        Ok(())
    }
}

impl Debug for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Path({:?})", self.to_string())
    }
}

impl FromStr for Path {
    type Err = InvalidPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl TryFrom<&str> for Path {
    type Error = InvalidPathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Path::parse(value)
    }
}

impl From<Component> for Path {
    fn from(value: Component) -> Self {
        Path {
            components: vec![value],
        }
    }
}

impl PartialEq<str> for Path {
    fn eq(&self, other: &str) -> bool {
        self.to_string() == other
    }
}

impl PartialEq<&str> for Path {
    fn eq(&self, other: &&str) -> bool {
        self.to_string() == *other
    }
}

impl From<&Path> for CString {
    fn from(value: &Path) -> Self {
        // SAFETY: Components are validated to contain no '\0', and neither does the separator.
        unsafe { CString::from_vec_unchecked(value.to_string().into_bytes()) }
    }
}
