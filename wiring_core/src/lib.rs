//! Bean container primitives consumed by the `wiring` composition layer.
#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::must_use_candidate)]

use std::pin::Pin;

#[macro_use]
pub(crate) mod macros;

pub mod args;
pub mod container;
pub mod erased;
pub mod error;

pub use args::Args;
pub use container::{BeanRef, Container};
pub use erased::Erased;
pub use error::{Error, Result};

/// An owned, boxed future that can be sent across threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
