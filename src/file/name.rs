use std::fmt::{self, Debug, Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;

use crate::error::{Error, InvalidNameError};
use crate::path::Component;

/// The name of a [`File`](super::File): a non-empty [`Component`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Component);

impl Name {
    pub fn try_new<S: Into<String>>(value: S) -> Result<Name, Error> {
        Name::from_component(Component::try_new(value).map_err(|_| InvalidNameError)?)
    }

    pub fn from_component(value: Component) -> Result<Name, Error> {
        if value.is_empty() {
            Err(InvalidNameError)?
        }
        Ok(Name(value))
    }

    /// The text from the last `'.'` onwards, including the dot itself.
    pub fn extension(&self) -> Option<&str> {
        self.0.as_str().rfind('.').map(|index| &self.0.as_str()[index..])
    }

    pub fn as_component(&self) -> &Component {
        &self.0
    }

    pub fn into_component(self) -> Component {
        self.0
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Name::try_new(s)
    }
}

impl TryFrom<&str> for Name {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Name::try_new(value)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}
