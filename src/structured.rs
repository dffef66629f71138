//! A conventional container layout over [`Wiring`].
//!
//! An application starts from a `Boot` container. The `Boot` container holds the `App`
//! container as bean [`APP_CONTAINER_BEAN`], created on first request, and the `App` container
//! creates `Scope.<name>` containers through its [`SCOPES_BEAN`] bean. All of them are ensuing
//! containers of the `Boot` container, so they share its resolved wiring.

use std::sync::LazyLock;

use wiring_core::{Args, Container, Result};

use crate::adjuster::{ContainerAdjuster, WiringAdjuster};
use crate::container_type::ContainerType;
use crate::wiring::{ContainerFactory, ContainerWiring, WIRING_BEAN, Wiring, WiringBuilder};

pub const BOOT: &str = "Boot";
pub const APP: &str = "App";
pub const SCOPE: &str = "Scope";

/// Name of the bean holding the `App` container in the `Boot` container.
pub const APP_CONTAINER_BEAN: &str = "appContainer";

/// Name of the bean holding the [`ScopeContainers`] in the `App` container.
pub const SCOPES_BEAN: &str = "scopes";

static BOOT_TYPE: LazyLock<ContainerType> = LazyLock::new(|| ContainerType::from_static(BOOT));
static APP_TYPE: LazyLock<ContainerType> = LazyLock::new(|| ContainerType::from_static(APP));

// Shared by every structured wiring, so merging two of them registers these once.
static LAYOUT: LazyLock<Wiring> = LazyLock::new(|| {
    let mut builder = WiringBuilder::new();
    builder
        .adjust_container_type(&BOOT_TYPE, ContainerAdjuster::from_fn(register_app_container))
        .adjust_container_type(&APP_TYPE, ContainerAdjuster::from_fn(register_scopes));
    builder.build()
});

fn register_app_container(boot: &Container, _args: &Args) -> Result<()> {
    boot.register_factory(APP_CONTAINER_BEAN, &[WIRING_BEAN], |args: Args| async move {
        let wiring: ContainerWiring = args.get(0)?;
        wiring.create_container(APP, Args::new()).await
    })
}

fn register_scopes(app: &Container, _args: &Args) -> Result<()> {
    app.register_constructor(SCOPES_BEAN, &[WIRING_BEAN], |args| {
        Ok(ScopeContainers {
            wiring: args.get(0)?,
        })
    })
}

fn scope_type(name: &str) -> String {
    format!("{SCOPE}.{name}")
}

/// Creates `Scope.<name>` containers from the `App` container.
#[derive(Debug, Clone)]
pub struct ScopeContainers {
    wiring: ContainerWiring,
}

impl ScopeContainers {
    /// Creates and populates a container of type `Scope.<name>`.
    ///
    /// # Errors
    ///
    /// Same as [`Wiring::create_container`].
    pub async fn create(&self, name: &str, args: Args) -> Result<Container> {
        self.wiring.create_container(&scope_type(name), args).await
    }

    /// Prepares a factory creating containers of type `Scope.<name>`.
    ///
    /// # Errors
    ///
    /// Same as [`Wiring::create_container_factory`].
    pub async fn factory(&self, name: &str, args: Args) -> Result<ContainerFactory> {
        self.wiring
            .create_container_factory(&scope_type(name), args)
            .await
    }
}

/// Accumulates adjusters for the `Boot`, `App` and `Scope.<name>` containers.
#[derive(Debug, Clone)]
pub struct StructuredWiringBuilder {
    inner: WiringBuilder,
}

impl StructuredWiringBuilder {
    pub fn new() -> Self {
        let mut inner = WiringBuilder::new();
        inner.add_wiring(&LAYOUT);
        Self { inner }
    }

    pub fn adjust_boot(&mut self, adjuster: ContainerAdjuster) -> &mut Self {
        self.inner.adjust_container_type(&BOOT_TYPE, adjuster);
        self
    }

    pub fn adjust_app(&mut self, adjuster: ContainerAdjuster) -> &mut Self {
        self.inner.adjust_container_type(&APP_TYPE, adjuster);
        self
    }

    /// Registers `adjuster` for `Scope.<name>` containers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerType`](wiring_core::Error::InvalidContainerType) if
    /// `name` is not a valid container type name.
    pub fn adjust_scope(&mut self, name: &str, adjuster: ContainerAdjuster) -> Result<&mut Self> {
        self.inner.adjust_container(&scope_type(name), adjuster)?;
        Ok(self)
    }

    pub fn adjust_base_wiring(&mut self, adjuster: WiringAdjuster) -> &mut Self {
        self.inner.adjust_base_wiring(adjuster);
        self
    }

    pub fn adjust_wiring_after_boot(&mut self, adjuster: WiringAdjuster) -> &mut Self {
        self.inner.adjust_wiring_after_type(&BOOT_TYPE, adjuster);
        self
    }

    pub fn adjust_wiring_after_app(&mut self, adjuster: WiringAdjuster) -> &mut Self {
        self.inner.adjust_wiring_after_type(&APP_TYPE, adjuster);
        self
    }

    /// Adds everything `wiring` holds, after what is already registered.
    pub fn add_wiring(&mut self, wiring: &Wiring) -> &mut Self {
        self.inner.add_wiring(wiring);
        self
    }

    pub fn build(&self) -> StructuredWiring {
        StructuredWiring {
            wiring: self.inner.build(),
        }
    }
}

impl Default for StructuredWiringBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A [`Wiring`] following the `Boot`/`App`/`Scope.<name>` layout.
#[derive(Debug, Clone)]
pub struct StructuredWiring {
    wiring: Wiring,
}

impl StructuredWiring {
    pub fn builder() -> StructuredWiringBuilder {
        StructuredWiringBuilder::new()
    }

    pub const fn wiring(&self) -> &Wiring {
        &self.wiring
    }

    /// Creates and populates an independent `Boot` container.
    ///
    /// # Errors
    ///
    /// Same as [`Wiring::create_container`].
    pub async fn create_boot_container(&self, args: Args) -> Result<Container> {
        debug!("creating boot container");
        self.wiring.create_container(BOOT, args).await
    }
}

impl AsRef<Wiring> for StructuredWiring {
    fn as_ref(&self) -> &Wiring {
        &self.wiring
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::expand::WiringSupply;

    const TIMEOUT: Duration = Duration::from_millis(500);

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct AppInfo {
        name: &'static str,
    }

    #[derive(Clone, Debug, Default)]
    struct Config;

    async fn boot(wiring: &StructuredWiring, args: Args) -> Container {
        timeout(TIMEOUT, wiring.create_boot_container(args))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_app_is_reachable_from_boot() {
        let mut builder = StructuredWiring::builder();
        builder
            .adjust_boot(ContainerAdjuster::from_fn(|boot, _| {
                boot.register_value("config", Config)?;
                boot.register_alias("app", "appContainer.app")
            }))
            .adjust_app(ContainerAdjuster::from_fn(|app, _| {
                app.register_value("app", AppInfo { name: "ok" })
            }));
        let wiring = builder.build();

        let boot = boot(&wiring, Args::new()).await;
        assert!(boot.contains("config"));
        assert_eq!(boot.get::<AppInfo>("app").await.unwrap(), AppInfo { name: "ok" });

        // The app container is created once.
        let first: Container = boot.get(APP_CONTAINER_BEAN).await.unwrap();
        let second: Container = boot.get(APP_CONTAINER_BEAN).await.unwrap();
        assert_eq!(first.bean_names(), second.bean_names());
        assert!(first.contains(SCOPES_BEAN));
    }

    #[tokio::test]
    async fn test_scope_containers() {
        let mut builder = StructuredWiring::builder();
        builder
            .adjust_scope(
                "Request",
                ContainerAdjuster::from_fn(|request, args| {
                    request.register_value("id", args.get::<u64>(0)?)
                }),
            )
            .unwrap();
        assert!(
            builder
                .adjust_scope("", ContainerAdjuster::from_fn(|_, _| Ok(())))
                .unwrap_err()
                .is_invalid_container_type()
        );
        let wiring = builder.build();

        let boot = boot(&wiring, Args::new()).await;
        let scopes: ScopeContainers = boot.get("appContainer.scopes").await.unwrap();

        let request = scopes.create("Request", Args::new().with(7_u64)).await.unwrap();
        assert_eq!(request.get::<u64>("id").await.unwrap(), 7);

        let factory = scopes.factory("Request", Args::new()).await.unwrap();
        let request = factory.create(Args::new().with(8_u64)).await.unwrap();
        assert_eq!(request.get::<u64>("id").await.unwrap(), 8);

        assert!(
            scopes
                .create("Session", Args::new())
                .await
                .unwrap_err()
                .is_container_type_not_found()
        );
    }

    #[tokio::test]
    async fn test_wiring_after_app_reaches_scopes() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut builder = StructuredWiring::builder();
        builder
            .adjust_scope("Request", ContainerAdjuster::from_fn(|_, _| Ok(())))
            .unwrap()
            .adjust_wiring_after_app(WiringAdjuster::new({
                let count = count.clone();
                move |supply: WiringSupply, _context| {
                    count.fetch_add(1, Ordering::SeqCst);
                    let mut extra = StructuredWiring::builder();
                    let added = extra.adjust_scope(
                        "Request",
                        ContainerAdjuster::from_fn(|request, _| request.register_value("user", "admin")),
                    );
                    let result = added.map(|extra| supply.add_wiring(extra.build().wiring()));
                    async move { result }
                }
            }));
        let wiring = builder.build();

        let boot = boot(&wiring, Args::new()).await;
        let scopes: ScopeContainers = boot.get("appContainer.scopes").await.unwrap();
        let request = scopes.create("Request", Args::new()).await.unwrap();

        assert_eq!(request.get::<&str>("user").await.unwrap(), "admin");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_scope_factory_reruns_wiring_after_scope() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut after_request = WiringBuilder::new();
        after_request
            .adjust_wiring_after(
                "Scope.Request",
                WiringAdjuster::new({
                    let count = count.clone();
                    move |_supply, _context| {
                        count.fetch_add(1, Ordering::SeqCst);
                        async { Ok(()) }
                    }
                }),
            )
            .unwrap();

        let mut builder = StructuredWiring::builder();
        builder
            .adjust_scope("Request", ContainerAdjuster::from_fn(|_, _| Ok(())))
            .unwrap()
            .add_wiring(&after_request.build());
        let wiring = builder.build();

        let boot = boot(&wiring, Args::new()).await;
        let scopes: ScopeContainers = boot.get("appContainer.scopes").await.unwrap();
        let factory = scopes.factory("Request", Args::new()).await.unwrap();
        for _ in 0..3 {
            timeout(TIMEOUT, factory.create(Args::new()))
                .await
                .unwrap()
                .unwrap();
        }

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_merging_structured_wirings() {
        let mut first = StructuredWiring::builder();
        first.adjust_boot(ContainerAdjuster::from_fn(|boot, _| {
            boot.register_value("first", 1_i32)
        }));
        let first = first.build();

        let mut second = StructuredWiring::builder();
        second.adjust_app(ContainerAdjuster::from_fn(|app, _| {
            app.register_value("second", 2_i32)
        }));
        second.add_wiring(first.wiring());
        let merged = second.build();

        let boot = boot(&merged, Args::new()).await;
        assert_eq!(boot.get::<i32>("first").await.unwrap(), 1);
        assert_eq!(boot.get::<i32>("appContainer.second").await.unwrap(), 2);
    }
}
