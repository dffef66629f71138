//! Composable wiring and container creation.

use std::fmt;
use std::sync::Arc;

use wiring_core::{Args, Container, Error, Result};

use crate::adjuster::{ContainerAdjuster, WiringAdjuster};
use crate::container_type::ContainerType;
use crate::expand::{Working, expand_pending};
use crate::registry::{ROOT_KEY, WiringState};

/// Name of the bean every created container holds its [`ContainerWiring`] under.
pub const WIRING_BEAN: &str = "wiring";

/// An immutable set of adjusters describing how to populate containers of each type.
///
/// A `Wiring` is never modified once built. Each container it creates starts from a private
/// copy of it, so wiring adjusters resolved while creating one container have no effect on the
/// next one.
#[derive(Debug, Clone, Default)]
pub struct Wiring {
    state: Arc<WiringState>,
}

impl Wiring {
    pub fn builder() -> WiringBuilder {
        WiringBuilder::new()
    }

    pub(crate) fn state(&self) -> &WiringState {
        &self.state
    }

    /// Returns the container types this wiring has adjusters for.
    ///
    /// Types supplied by wiring adjusters that have not run yet are not included.
    pub fn container_types(&self) -> Vec<ContainerType> {
        self.state.container_types()
    }

    /// Creates and populates an independent container of `container_type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerType`] if `container_type` is malformed,
    /// [`Error::ContainerTypeNotFound`] if no adjuster refers to it, or the first error raised
    /// by an adjuster.
    pub async fn create_container(&self, container_type: &str, args: Args) -> Result<Container> {
        let working = Working::new(self.state.as_ref().clone());
        create_container(&working, container_type, args).await
    }

    /// Prepares a factory creating independent containers of `container_type`.
    ///
    /// Every container the factory creates starts from a fresh copy of this wiring and gets the
    /// arguments `args` followed by those given to [`ContainerFactory::create`].
    ///
    /// # Errors
    ///
    /// Same as [`Wiring::create_container`], for everything up to creating the container.
    pub async fn create_container_factory(
        &self,
        container_type: &str,
        args: Args,
    ) -> Result<ContainerFactory> {
        // Checked on a throwaway copy; every creation expands base wiring anew.
        let throwaway = Working::new(self.state.as_ref().clone());
        let container_type = prepare(&throwaway, container_type).await?;

        Ok(ContainerFactory {
            container_type,
            args,
            state: Arc::clone(&self.state),
        })
    }
}

/// Accumulates adjusters into a [`Wiring`].
///
/// Registering an adjuster that is already registered for the same type has no effect.
#[derive(Debug, Clone, Default)]
pub struct WiringBuilder {
    state: WiringState,
}

impl WiringBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder starting from everything `wiring` holds.
    pub fn from_wiring(wiring: &Wiring) -> Self {
        Self {
            state: wiring.state().clone(),
        }
    }

    /// Registers a wiring adjuster that runs before the first container is created.
    pub fn adjust_base_wiring(&mut self, adjuster: WiringAdjuster) -> &mut Self {
        self.state.register_wiring_adjuster(ROOT_KEY, adjuster);
        self
    }

    /// Registers `adjuster` for containers of `container_type` and all of its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerType`] if `container_type` is malformed.
    pub fn adjust_container(
        &mut self,
        container_type: &str,
        adjuster: ContainerAdjuster,
    ) -> Result<&mut Self> {
        let container_type = ContainerType::parse(container_type)?;
        Ok(self.adjust_container_type(&container_type, adjuster))
    }

    pub(crate) fn adjust_container_type(
        &mut self,
        container_type: &ContainerType,
        adjuster: ContainerAdjuster,
    ) -> &mut Self {
        self.state
            .register_container_adjuster(container_type, adjuster);
        self
    }

    /// Registers a wiring adjuster that runs right after the first container of
    /// `container_type`, or of one of its descendants, is created.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerType`] if `container_type` is malformed.
    pub fn adjust_wiring_after(
        &mut self,
        container_type: &str,
        adjuster: WiringAdjuster,
    ) -> Result<&mut Self> {
        let container_type = ContainerType::parse(container_type)?;
        Ok(self.adjust_wiring_after_type(&container_type, adjuster))
    }

    pub(crate) fn adjust_wiring_after_type(
        &mut self,
        container_type: &ContainerType,
        adjuster: WiringAdjuster,
    ) -> &mut Self {
        self.state
            .register_wiring_adjuster(&container_type.key(), adjuster);
        self
    }

    /// Adds everything `wiring` holds, after what is already registered.
    pub fn add_wiring(&mut self, wiring: &Wiring) -> &mut Self {
        self.state.import_from(wiring.state());
        self
    }

    /// Returns a snapshot of the builder. Later registrations do not affect it.
    pub fn build(&self) -> Wiring {
        Wiring {
            state: Arc::new(self.state.clone()),
        }
    }
}

/// The wiring a container was created from, registered in it as [`WIRING_BEAN`].
///
/// Containers created through it are ensuing containers: they share the wiring state of the
/// container that holds it, including every wiring adjuster resolved so far.
#[derive(Debug, Clone)]
pub struct ContainerWiring {
    working: Working,
}

impl ContainerWiring {
    /// Returns the wiring `container` was created from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeanNotDefined`] if `container` was not created by a [`Wiring`].
    pub async fn of(container: &Container) -> Result<Self> {
        container.get(WIRING_BEAN).await
    }

    /// Creates and populates an ensuing container of `container_type`.
    ///
    /// # Errors
    ///
    /// Same as [`Wiring::create_container`].
    pub async fn create_container(&self, container_type: &str, args: Args) -> Result<Container> {
        create_container(&self.working, container_type, args).await
    }

    /// Prepares a factory creating containers of `container_type` from the wiring state of the
    /// container holding this bean, as it is now.
    ///
    /// Each creation starts from its own copy of that state, so wiring adjusters that ran for
    /// one of the created containers run again for the next.
    ///
    /// # Errors
    ///
    /// Same as [`Wiring::create_container_factory`].
    pub async fn create_container_factory(
        &self,
        container_type: &str,
        args: Args,
    ) -> Result<ContainerFactory> {
        let container_type = prepare(&self.working, container_type).await?;

        Ok(ContainerFactory {
            container_type,
            args,
            state: Arc::new(self.working.snapshot()),
        })
    }
}

/// Creates containers of one type on demand.
///
/// Every creation is independent: it starts from a fresh copy of the wiring the factory was
/// prepared from and runs base wiring, container adjusters and after-type wiring again.
#[derive(Clone)]
pub struct ContainerFactory {
    container_type: ContainerType,
    args: Args,
    state: Arc<WiringState>,
}

impl ContainerFactory {
    pub const fn container_type(&self) -> &ContainerType {
        &self.container_type
    }

    /// Creates and populates a container with the factory's arguments followed by `args`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by an adjuster.
    pub async fn create(&self, args: Args) -> Result<Container> {
        let working = Working::new(self.state.as_ref().clone());
        let args = self.args.concat(&args);
        expand_pending(&working, ROOT_KEY, None).await?;
        materialize(&working, &self.container_type, args).await
    }
}

impl fmt::Debug for ContainerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerFactory")
            .field("container_type", &self.container_type)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

async fn create_container(working: &Working, container_type: &str, args: Args) -> Result<Container> {
    let container_type = prepare(working, container_type).await?;
    materialize(working, &container_type, args).await
}

/// Expands base wiring and checks that `container_type` is known.
async fn prepare(working: &Working, container_type: &str) -> Result<ContainerType> {
    let container_type = ContainerType::parse(container_type)?;
    expand_pending(working, ROOT_KEY, None).await?;

    if !working.with(|state| state.is_known(&container_type)) {
        error!(%container_type, "container type not found");
        return Err(Error::ContainerTypeNotFound(container_type.to_string()));
    }
    Ok(container_type)
}

async fn materialize(
    working: &Working,
    container_type: &ContainerType,
    args: Args,
) -> Result<Container> {
    let container = Container::new();
    container.register_value(
        WIRING_BEAN,
        ContainerWiring {
            working: working.clone(),
        },
    )?;

    let adjusters = working.with(|state| state.flatten(container_type));
    debug!(%container_type, adjusters = adjusters.len(), "creating container");

    for adjuster in adjusters {
        trace!(%container_type, ?adjuster, "applying container adjuster");
        if let Err(err) = adjuster.adjust(container.clone(), args.clone()).await {
            error!(%container_type, ?adjuster, %err, "container adjuster failed");
            return Err(err);
        }
    }

    for scope_key in container_type.scope_keys() {
        expand_pending(working, &scope_key, Some(&container)).await?;
    }

    Ok(container)
}
