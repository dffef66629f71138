//! Hierarchical container type names.

use std::fmt;
use std::iter::successors;
use std::str::FromStr;

use wiring_core::{Error, Result};

/// The name of a container type.
///
/// Names are dot-delimited to express a hierarchy: `"Scope.Request"` descends from `"Scope"`.
/// Adjusters registered for a type apply to all of its descendants as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerType(String);

impl ContainerType {
    /// Parses and validates a container type name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerType`] if `name` is empty, starts or ends with a dot, or
    /// contains an empty segment.
    pub fn parse(name: &str) -> Result<Self> {
        let reason = if name.is_empty() {
            "must not be empty"
        } else if name.starts_with('.') {
            "must not start with a dot"
        } else if name.ends_with('.') {
            "must not end with a dot"
        } else if name.contains("..") {
            "must not contain empty segments"
        } else {
            return Ok(Self(name.to_owned()));
        };

        Err(Error::invalid_container_type(name, reason))
    }

    /// Creates a container type from a name known to be valid.
    pub(crate) fn from_static(name: &'static str) -> Self {
        debug_assert!(Self::parse(name).is_ok(), "invalid container type {name:?}");
        Self(name.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the direct parent type, if any.
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rsplit_once('.')
            .map(|(parent, _)| Self(parent.to_owned()))
    }

    /// The registry key of this type: the name prefixed with a dot, so the root is `""`.
    pub(crate) fn key(&self) -> String {
        format!(".{}", self.0)
    }

    /// Registry keys of every ancestor of this type followed by its own, outermost first.
    pub(crate) fn scope_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = successors(Some(self.clone()), Self::parent)
            .map(|container_type| container_type.key())
            .collect();
        keys.reverse();
        keys
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContainerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for ContainerType {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl AsRef<str> for ContainerType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns the registry key of the direct parent of `key`, or `None` for the root key.
pub(crate) fn parent_key(key: &str) -> Option<&str> {
    if key.is_empty() {
        return None;
    }
    Some(key.rfind('.').map_or("", |index| &key[..index]))
}
