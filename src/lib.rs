//! Composable, hierarchical wiring for asynchronous bean containers.
//!
//! A [`Wiring`] maps container types (dot-delimited names such as `"Scope.Request"`) to the
//! adjusters that populate containers of that type. Container adjusters registered for a type
//! also apply to its descendants. Wiring adjusters supply further wiring lazily, either before
//! the first container is created or right after a container of a given type is.
//!
//! ```no_run
//! use wiring::{Args, ContainerAdjuster, WiringBuilder};
//!
//! # async fn run() -> wiring::Result<()> {
//! let mut builder = WiringBuilder::new();
//! builder.adjust_container(
//!     "Server",
//!     ContainerAdjuster::from_fn(|container, args| {
//!         container.register_value("port", args.get::<u16>(0)?)
//!     }),
//! )?;
//!
//! let container = builder
//!     .build()
//!     .create_container("Server", Args::new().with(8080_u16))
//!     .await?;
//! assert_eq!(container.get::<u16>("port").await?, 8080);
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]

pub use wiring_core::{Args, BeanRef, BoxFuture, Container, Erased, Error, Result};

pub use adjuster::{ContainerAdjuster, WiringAdjuster};
pub use container_type::ContainerType;
pub use expand::WiringSupply;
pub use structured::{ScopeContainers, StructuredWiring, StructuredWiringBuilder};
pub use wiring::{ContainerFactory, ContainerWiring, WIRING_BEAN, Wiring, WiringBuilder};

#[macro_use]
pub(crate) mod macros;

mod adjuster;
mod container_type;
mod expand;
mod registry;
pub mod structured;
mod wiring;
