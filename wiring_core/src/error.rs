//! Error types.

use std::any::type_name;
use std::error::Error as StdError;
use std::sync::Arc;

/// [`Error`] is an error that can be raised by functions and methods from this library
/// and from the `wiring` composition layer built on top of it.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A container type name is malformed.
    #[error("invalid container type `{name}`: {reason}")]
    InvalidContainerType { name: String, reason: &'static str },

    /// A container was requested for a type no wiring knows about.
    #[error("container type `{0}` is not registered")]
    ContainerTypeNotFound(String),

    /// A bean was requested that is not registered in the container.
    #[error("bean `{0}` is not defined")]
    BeanNotDefined(String),

    /// A bean was registered under a name that is already taken.
    #[error("bean `{0}` is already defined, register it as a replacement instead")]
    DuplicateBean(String),

    /// A bean exists but holds a value of another type.
    #[error("bean `{name}` is of type `{actual}`, not `{expected}`")]
    BeanTypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Resolving a bean requires resolving that same bean first.
    #[error("bean `{0}` depends on itself")]
    DependencyCycle(String),

    /// A bean path traverses a bean that is not a container.
    #[error("bean `{0}` is not a container")]
    NotAContainer(String),

    /// An argument was requested past the end of the argument list.
    #[error("argument #{0} is missing")]
    ArgumentMissing(usize),

    /// An argument exists but holds a value of another type.
    #[error("argument #{index} is of type `{actual}`, not `{expected}`")]
    ArgumentTypeMismatch {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },

    #[error(transparent)]
    Other(Arc<dyn StdError + Send + Sync + 'static>),
}

impl Error {
    pub fn invalid_container_type(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidContainerType {
            name: name.into(),
            reason,
        }
    }

    pub fn bean_type_mismatch<T>(name: impl Into<String>, actual: &'static str) -> Self
    where
        T: 'static,
    {
        Self::BeanTypeMismatch {
            name: name.into(),
            expected: type_name::<T>(),
            actual,
        }
    }

    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Other(Arc::from(err.into()))
    }

    pub const fn is_invalid_container_type(&self) -> bool {
        matches!(self, Self::InvalidContainerType { .. })
    }

    pub const fn is_container_type_not_found(&self) -> bool {
        matches!(self, Self::ContainerTypeNotFound(_))
    }

    pub const fn is_bean_not_defined(&self) -> bool {
        matches!(self, Self::BeanNotDefined(_))
    }

    pub fn is_bean_not_defined_for(&self, name: &str) -> bool {
        matches!(self, Self::BeanNotDefined(bean) if bean == name)
    }

    pub const fn is_dependency_cycle(&self) -> bool {
        matches!(self, Self::DependencyCycle(_))
    }

    pub const fn is_duplicate_bean(&self) -> bool {
        matches!(self, Self::DuplicateBean(_))
    }

    pub const fn is_other(&self) -> bool {
        matches!(self, Self::Other(_))
    }
}

/// [`Result`] is an alias to [`core::result::Result`] with [`Error`] as the
/// default error type.
pub type Result<T, E = Error> = core::result::Result<T, E>;
