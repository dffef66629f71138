//! Opaque bean values with erased type information.

use std::any::{Any, type_name};

/// [`CloneBoxed`] clones a reference to an `?Sized` value into a [`Box`].
///
/// This trait is used to work around the [`Sized`] bound on [`Clone`].
trait CloneBoxed: Any + Send + Sync {
    /// Returns the boxed clone of `self`.
    fn clone_boxed(&self) -> Box<dyn CloneBoxed>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
}

impl<T> CloneBoxed for T
where
    T: Any + Clone + Send + Sync,
{
    fn clone_boxed(&self) -> Box<dyn CloneBoxed> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }
}

/// [`Erased`] holds a bean value of an arbitrary type, as long as it
/// implements [`Clone`], [`Send`], and [`Sync`] and is `'static`.
///
/// Cloning an `Erased` clones the underlying value, so beans meant to be shared
/// between consumers are usually wrapped in an [`Arc`](std::sync::Arc) or are
/// cheap handles themselves.
pub struct Erased {
    value: Box<dyn CloneBoxed>,
    type_name: &'static str,
}

impl Erased {
    /// Wraps `value` of type `T`.
    #[must_use]
    pub fn new<T>(value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Returns the name of the concrete type of the wrapped value.
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the wrapped value is of type `T`.
    pub fn is<T: 'static>(&self) -> bool {
        (*self.value).as_any().is::<T>()
    }

    /// Tries to downcast `self` into type `T`.
    ///
    /// # Errors
    ///
    /// If the underlying value is not of type `T`, this method will return
    /// itself as error.
    pub fn downcast<T>(self) -> Result<T, Self>
    where
        T: Clone + Send + Sync + 'static,
    {
        if !self.is::<T>() {
            return Err(self);
        }

        #[expect(clippy::missing_panics_doc, reason = "already checked")]
        let concrete = self
            .value
            .into_any()
            .downcast::<T>()
            .expect("the concrete type of this box should be `T` as it was checked before downcasting.");
        Ok(*concrete)
    }

    /// Returns a reference to the wrapped value if it is of type `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        (*self.value).as_any().downcast_ref()
    }
}

impl Clone for Erased {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone_boxed(),
            type_name: self.type_name,
        }
    }
}

impl std::fmt::Debug for Erased {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Erased")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
