//! A container of named, lazily evaluated beans.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::OnceCell;

use crate::BoxFuture;
use crate::args::Args;
use crate::erased::Erased;
use crate::error::{Error, Result};

type FactoryFn = dyn Fn(Args) -> BoxFuture<'static, Result<Erased>> + Send + Sync;

/// A reference to a bean, either by name or by a dotted path through nested containers.
///
/// The path `"appContainer.app"` resolves bean `appContainer`, which must hold a [`Container`],
/// and then bean `app` inside of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BeanRef {
    segments: Vec<String>,
}

impl BeanRef {
    /// Parses a bean name or dotted bean path.
    pub fn new(path: &str) -> Self {
        Self {
            segments: path.split('.').map(str::to_owned).collect(),
        }
    }

    /// Returns the path segments of this reference.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn split_first(&self) -> (&str, Option<Self>) {
        match self.segments.split_first() {
            Some((head, rest)) if !rest.is_empty() => (
                head.as_str(),
                Some(Self {
                    segments: rest.to_vec(),
                }),
            ),
            Some((head, _)) => (head.as_str(), None),
            None => ("", None),
        }
    }
}

impl From<&str> for BeanRef {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for BeanRef {
    fn from(path: String) -> Self {
        Self::new(&path)
    }
}

impl From<&BeanRef> for BeanRef {
    fn from(bean: &BeanRef) -> Self {
        bean.clone()
    }
}

impl fmt::Display for BeanRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Beans on the current resolution path, by container and name.
type Resolving = Vec<(usize, String)>;

enum Definition {
    Value(Erased),
    Factory {
        dependencies: Vec<BeanRef>,
        factory: Arc<FactoryFn>,
        instance: OnceCell<Erased>,
    },
    Alias(BeanRef),
}

#[derive(Default)]
struct Beans {
    definitions: RwLock<BTreeMap<String, Arc<Definition>>>,
}

/// A registry of named beans.
///
/// `Container` is a cheap handle: clones share the same beans. Beans are registered by value, by
/// factory (evaluated once, on first request, after its dependencies), by constructor, or as an
/// alias of another bean. Registering a name twice fails unless the replacement form is used.
///
/// Bean names should not contain dots, as dots separate the segments of a [`BeanRef`] path.
#[derive(Clone, Default)]
pub struct Container {
    beans: Arc<Beans>,
}

impl Container {
    /// Creates an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    fn define(&self, name: &str, definition: Definition, replace: bool) -> Result<()> {
        let mut definitions = self
            .beans
            .definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match (definitions.contains_key(name), replace) {
            (true, false) => {
                error!(bean = name, "bean is already defined");
                return Err(Error::DuplicateBean(name.to_owned()));
            }
            (false, true) => return Err(Error::BeanNotDefined(name.to_owned())),
            _ => {}
        }

        trace!(bean = name, replace, "defining bean");
        definitions.insert(name.to_owned(), Arc::new(definition));
        Ok(())
    }

    fn definition(&self, name: &str) -> Option<Arc<Definition>> {
        self.beans
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn factory<T, F, Fut>(dependencies: &[&str], factory: F) -> Definition
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let factory = move |args: Args| {
            let fut = factory(args);
            Box::pin(async move { fut.await.map(Erased::new) }) as BoxFuture<'static, _>
        };

        Definition::Factory {
            dependencies: dependencies.iter().copied().map(BeanRef::new).collect(),
            factory: Arc::new(factory),
            instance: OnceCell::new(),
        }
    }

    /// Registers a bean holding `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateBean`] if `name` is already registered.
    pub fn register_value<T>(&self, name: &str, value: T) -> Result<()>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.define(name, Definition::Value(Erased::new(value)), false)
    }

    /// Registers a bean produced by an async `factory`.
    ///
    /// The factory runs at most once, the first time the bean is requested. It receives the
    /// resolved `dependencies` in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateBean`] if `name` is already registered.
    pub fn register_factory<T, F, Fut>(
        &self,
        name: &str,
        dependencies: &[&str],
        factory: F,
    ) -> Result<()>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.define(name, Self::factory(dependencies, factory), false)
    }

    /// Registers a bean produced by a synchronous `constructor`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateBean`] if `name` is already registered.
    pub fn register_constructor<T, F>(
        &self,
        name: &str,
        dependencies: &[&str],
        constructor: F,
    ) -> Result<()>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(Args) -> Result<T> + Send + Sync + 'static,
    {
        self.register_factory(name, dependencies, move |args| {
            std::future::ready(constructor(args))
        })
    }

    /// Registers `name` as another name for the bean `target` refers to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateBean`] if `name` is already registered.
    pub fn register_alias(&self, name: &str, target: &str) -> Result<()> {
        self.define(name, Definition::Alias(BeanRef::new(target)), false)
    }

    /// Replaces the existing bean `name` with `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeanNotDefined`] if there is no bean to replace.
    pub fn replace_value<T>(&self, name: &str, value: T) -> Result<()>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.define(name, Definition::Value(Erased::new(value)), true)
    }

    /// Replaces the existing bean `name` with a bean produced by `factory`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeanNotDefined`] if there is no bean to replace.
    pub fn replace_factory<T, F, Fut>(
        &self,
        name: &str,
        dependencies: &[&str],
        factory: F,
    ) -> Result<()>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.define(name, Self::factory(dependencies, factory), true)
    }

    /// Returns `true` if a bean named `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.beans
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Returns the names of all registered beans, in ascending order.
    pub fn bean_names(&self) -> Vec<String> {
        self.beans
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Resolves a bean and downcasts it to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BeanNotDefined`] if the bean does not exist,
    /// [`Error::BeanTypeMismatch`] if it is not of type `T`, or any error raised while
    /// evaluating its factory.
    pub async fn get<T>(&self, bean: impl Into<BeanRef>) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let bean = bean.into();
        let erased = self.get_erased(&bean).await?;
        erased
            .downcast::<T>()
            .map_err(|erased| Error::bean_type_mismatch::<T>(bean.to_string(), erased.type_name()))
    }

    /// Resolves a bean without downcasting it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DependencyCycle`] if resolving the bean requires resolving itself, along
    /// with the errors of [`Container::get`].
    pub fn get_erased(&self, bean: &BeanRef) -> BoxFuture<'static, Result<Erased>> {
        self.lookup(bean, Vec::new())
    }

    fn lookup(&self, bean: &BeanRef, resolving: Resolving) -> BoxFuture<'static, Result<Erased>> {
        let container = self.clone();
        let bean = bean.clone();

        Box::pin(async move {
            let (name, rest) = bean.split_first();
            let value = container.resolve(name, resolving.clone()).await?;

            match rest {
                None => Ok(value),
                Some(rest) => {
                    let inner = value
                        .downcast::<Self>()
                        .map_err(|_| Error::NotAContainer(name.to_owned()))?;
                    inner.lookup(&rest, resolving).await
                }
            }
        })
    }

    async fn resolve(&self, name: &str, mut resolving: Resolving) -> Result<Erased> {
        let definition = self
            .definition(name)
            .ok_or_else(|| Error::BeanNotDefined(name.to_owned()))?;

        if let Definition::Value(value) = &*definition {
            return Ok(value.clone());
        }

        let key = (Arc::as_ptr(&self.beans).addr(), name.to_owned());
        if resolving.contains(&key) {
            error!(bean = name, "bean depends on itself");
            return Err(Error::DependencyCycle(name.to_owned()));
        }
        resolving.push(key);

        match &*definition {
            Definition::Value(value) => Ok(value.clone()),
            Definition::Alias(target) => self.lookup(target, resolving).await,
            Definition::Factory {
                dependencies,
                factory,
                instance,
            } => {
                let value = instance
                    .get_or_try_init(|| async {
                        debug!(bean = name, "evaluating bean factory");
                        let mut resolved = Vec::with_capacity(dependencies.len());
                        for dependency in dependencies {
                            resolved.push(self.lookup(dependency, resolving.clone()).await?);
                        }
                        (**factory)(resolved.into_iter().collect()).await
                    })
                    .await?;
                Ok(value.clone())
            }
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("beans", &self.bean_names())
            .finish()
    }
}
