//! Container adjusters and wiring adjusters.
//!
//! Both kinds are shared handles around async closures. Cloning a handle keeps its identity,
//! and identity is what deduplicates registrations: the same handle registered any number of
//! times is applied at most once per container.

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use wiring_core::{Args, BoxFuture, Container, Result};

use crate::expand::WiringSupply;

type ContainerAdjusterFn = dyn Fn(Container, Args) -> BoxFuture<'static, Result<()>> + Send + Sync;

type WiringAdjusterFn =
    dyn Fn(WiringSupply, Option<Container>) -> BoxFuture<'static, Result<()>> + Send + Sync;

/// Identity of an adjuster handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct AdjusterId(usize);

impl AdjusterId {
    fn of<T: ?Sized>(f: &Arc<T>) -> Self {
        Self(Arc::as_ptr(f).cast::<()>().addr())
    }
}

/// Registers or replaces beans in a freshly created container.
///
/// The adjuster receives the container and the arguments given to the creation call.
#[derive(Clone)]
pub struct ContainerAdjuster {
    f: Arc<ContainerAdjusterFn>,
    concrete_type: &'static str,
}

impl ContainerAdjuster {
    /// Creates a new adjuster from an async closure.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Container, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let wrapped_fn = move |container: Container, args: Args| {
            Box::pin(f(container, args)) as BoxFuture<'static, Result<()>>
        };

        Self {
            f: Arc::new(wrapped_fn),
            concrete_type: type_name::<F>(),
        }
    }

    /// Creates a new adjuster from a synchronous closure.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Container, &Args) -> Result<()> + Send + Sync + 'static,
    {
        Self::new(move |container: Container, args: Args| std::future::ready(f(&container, &args)))
    }

    pub(crate) fn id(&self) -> AdjusterId {
        AdjusterId::of(&self.f)
    }

    /// Returns `true` if both handles refer to the same adjuster.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }

    pub(crate) fn adjust(&self, container: Container, args: Args) -> BoxFuture<'static, Result<()>> {
        (self.f)(container, args)
    }
}

impl fmt::Debug for ContainerAdjuster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerAdjuster")
            .field("concrete_type", &self.concrete_type)
            .finish_non_exhaustive()
    }
}

/// Supplies additional wiring instead of registering beans directly.
///
/// Base wiring adjusters run before the first container is created and receive no container.
/// Wiring adjusters registered to run after a container type receive the container just
/// created, so they can decide what to add based on its beans. Either kind hands wiring over
/// through [`WiringSupply::add_wiring`].
#[derive(Clone)]
pub struct WiringAdjuster {
    f: Arc<WiringAdjusterFn>,
    concrete_type: &'static str,
}

impl WiringAdjuster {
    /// Creates a new wiring adjuster from an async closure.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(WiringSupply, Option<Container>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let wrapped_fn = move |supply: WiringSupply, context: Option<Container>| {
            Box::pin(f(supply, context)) as BoxFuture<'static, Result<()>>
        };

        Self {
            f: Arc::new(wrapped_fn),
            concrete_type: type_name::<F>(),
        }
    }

    pub(crate) fn id(&self) -> AdjusterId {
        AdjusterId::of(&self.f)
    }

    /// Returns `true` if both handles refer to the same wiring adjuster.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }

    pub(crate) fn adjust(
        &self,
        supply: WiringSupply,
        context: Option<Container>,
    ) -> BoxFuture<'static, Result<()>> {
        (self.f)(supply, context)
    }
}

impl fmt::Debug for WiringAdjuster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WiringAdjuster")
            .field("concrete_type", &self.concrete_type)
            .finish_non_exhaustive()
    }
}

/// An entry of a container type's adjuster list.
///
/// Wiring adjusters sit in the same list as sentinels, so the position of whatever they
/// eventually supply follows registration order.
#[derive(Debug, Clone)]
pub(crate) enum AdjusterEntry {
    Container(ContainerAdjuster),
    Wiring(WiringAdjuster),
}

impl AdjusterEntry {
    pub(crate) fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Container(a), Self::Container(b)) => a.ptr_eq(b),
            (Self::Wiring(a), Self::Wiring(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}
