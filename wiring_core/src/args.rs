//! Positional arguments handed to adjusters and bean factories.

use std::any::type_name;
use std::sync::Arc;

use crate::erased::Erased;
use crate::error::{Error, Result};

/// An immutable, cheaply clonable list of type-erased arguments.
///
/// Container adjusters receive the arguments given to the container creation call, and bean
/// factories receive their resolved dependencies in declaration order.
#[derive(Clone)]
pub struct Args(Arc<[Erased]>);

impl Args {
    /// Creates an empty argument list.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// Returns a new list with `value` appended.
    #[must_use]
    pub fn with<T>(self, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.iter().cloned().chain([Erased::new(value)]).collect()
    }

    /// Returns a new list holding the arguments of `self` followed by those of `other`.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        self.iter().chain(other.iter()).cloned().collect()
    }

    /// Returns the argument at `index`, downcast to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArgumentMissing`] if there is no argument at `index`, and
    /// [`Error::ArgumentTypeMismatch`] if the argument is not of type `T`.
    pub fn get<T>(&self, index: usize) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let erased = self.get_erased(index).ok_or(Error::ArgumentMissing(index))?;
        erased
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| Error::ArgumentTypeMismatch {
                index,
                expected: type_name::<T>(),
                actual: erased.type_name(),
            })
    }

    /// Returns the type-erased argument at `index`.
    pub fn get_erased(&self, index: usize) -> Option<&Erased> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Erased> {
        self.0.iter()
    }
}

impl Default for Args {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Erased> for Args {
    fn from_iter<I: IntoIterator<Item = Erased>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = &'a Erased;
    type IntoIter = std::slice::Iter<'a, Erased>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.iter().map(Erased::type_name))
            .finish()
    }
}
