use std::fmt::{self, Debug, Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;

use crate::error::InvalidPathError;
use crate::path::SEPARATOR;

/// A single segment of a [`Path`](super::Path), found between separators.
///
/// # Invariants
/// - Contains no separator, no `':'` and no `'\0'`.
/// - May be empty, which denotes the root when it is the first component of a path.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Component(String);

impl Component {
    pub const EMPTY: Component = Component(String::new());

    pub fn try_new<S: Into<String>>(value: S) -> Result<Component, InvalidPathError> {
        let value = value.into();
        if Component::is_valid(&value) {
            Ok(Component(value))
        } else {
            Err(InvalidPathError)
        }
    }

    pub(crate) fn from_static(value: &'static str) -> Component {
        debug_assert!(Component::is_valid(value));
        Component(value.to_owned())
    }

    pub(crate) fn is_valid(value: &str) -> bool {
        !value.contains([SEPARATOR, ':', '\0'])
    }

    /// The `~` component, recognised by [`Path::expand_tilde`](super::Path::expand_tilde).
    pub fn home() -> Component {
        Component(String::from("~"))
    }

    pub fn current() -> Component {
        Component(String::from("."))
    }

    pub fn parent() -> Component {
        Component(String::from(".."))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for Component {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Component {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Component {
    type Err = InvalidPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Component::try_new(s)
    }
}

impl TryFrom<&str> for Component {
    type Error = InvalidPathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Component::try_new(value)
    }
}

impl PartialEq<str> for Component {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Component {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Display for Component {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for Component {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
