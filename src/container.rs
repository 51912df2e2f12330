use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, Weak},
};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    entry::{Lifetime, ServiceEntry, ServiceMetadata, SharedResolution},
    errors::{DisposeError, DisposeFailure, DisposedError, ResolveError},
    hooks::{ContainerHooks, NoopHooks},
    token::Token,
    types::{DynError, Injectable, ServiceFactory, ServiceInstance},
};

/// A node in the scope hierarchy: owns its service entries and the child
/// scopes it has created, and resolves tokens against its own entries before
/// delegating to its parent.
///
/// `Container` is a cheap handle; clones share the same node. The root is
/// built with [`Container::new`] or through [`crate::ContainerBuilder`],
/// children with [`Container::create_scope`].
#[derive(Clone)]
pub struct Container {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    /// Back-reference only, never owning: the parent owns us
    parent: Option<Weak<NodeInner>>,
    /// One hook set is shared by the whole tree
    hooks: Arc<dyn ContainerHooks>,
    state: Mutex<NodeState>,
}

#[derive(Default)]
struct NodeState {
    entries: HashMap<Token, ServiceEntry>,
    children: Vec<Container>,
    disposed: bool,
}

enum Lookup {
    Hit(ServiceMetadata),
    Delegate(Container),
    Missing,
}

impl Default for Container {
    fn default() -> Self {
        Container::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Container")
            .field("root", &self.is_root())
            .field("disposed", &state.disposed)
            .field("entries", &state.entries)
            .field("children", &state.children.len())
            .finish()
    }
}

impl Container {
    /// Creates a root node with the default no-op hook set
    pub fn new() -> Container {
        Container::with_hooks(NoopHooks)
    }

    /// Creates a root node with a custom hook set
    pub fn with_hooks(hooks: impl ContainerHooks + 'static) -> Container {
        Container::from_hooks(Arc::new(hooks))
    }

    pub(crate) fn from_hooks(hooks: Arc<dyn ContainerHooks>) -> Container {
        Container {
            inner: Arc::new(NodeInner {
                parent: None,
                hooks,
                state: Mutex::new(NodeState::default()),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, NodeState> {
        // The lock is only ever held over plain map operations, never across
        // an await or a user callback, so poisoning cannot occur in practice.
        self.inner.state.lock().expect("container state lock poisoned")
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }

    /// The node that created this scope, if it is still alive
    pub fn parent(&self) -> Option<Container> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Container { inner })
    }

    /// Registers a service under `token`, replacing any prior entry for the
    /// same token in this node. Registration never touches the parent or the
    /// children, and duplicate tokens are not an error: the last registration
    /// silently wins.
    pub fn register<F, Fut>(
        &self,
        token: impl Into<Token>,
        factory: F,
        metadata: ServiceMetadata,
    ) -> Result<(), DisposedError>
    where
        F: Fn(Container) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ServiceInstance, DynError>> + Send + 'static,
    {
        self.register_factory(token.into(), crate::types::factory(factory), metadata)
    }

    /// Registers an already constructed instance as a singleton
    pub fn register_instance(
        &self,
        token: impl Into<Token>,
        instance: ServiceInstance,
    ) -> Result<(), DisposedError> {
        let factory: ServiceFactory = Arc::new(move |_| {
            let instance = instance.clone();
            Box::pin(async move { Ok(instance) })
        });
        self.register_factory(token.into(), factory, ServiceMetadata::singleton())
    }

    /// Type-erased registration; the typed [`Container::register`] and the
    /// builder both funnel through here.
    pub fn register_factory(
        &self,
        token: Token,
        factory: ServiceFactory,
        metadata: ServiceMetadata,
    ) -> Result<(), DisposedError> {
        if self.is_disposed() {
            return Err(DisposedError);
        }
        self.inner.hooks.before_register(&token, &metadata);
        {
            let mut state = self.state();
            if state.disposed {
                return Err(DisposedError);
            }
            tracing::debug!(token = %token, lifetime = %metadata.lifetime, "registering service");
            state
                .entries
                .insert(token.clone(), ServiceEntry::new(factory, metadata.clone()));
        }
        self.inner.hooks.after_register(&token, &metadata);
        Ok(())
    }

    /// Resolves `token` to an instance of `T`
    pub async fn resolve<T: Injectable>(&self, token: &Token) -> Result<Arc<T>, ResolveError> {
        let instance = self.resolve_entry(token).await?;
        instance
            .downcast::<T>()
            .map_err(|actual| ResolveError::Downcast {
                token: token.clone(),
                required: std::any::type_name::<T>(),
                actual,
            })
    }

    /// Resolves `token` against this node, delegating to the parent when the
    /// token is not registered here.
    ///
    /// Returns a boxed future: resolution recurses up the hierarchy, so the
    /// future type must not contain itself.
    pub fn resolve_entry<'a>(
        &'a self,
        token: &'a Token,
    ) -> BoxFuture<'a, Result<ServiceInstance, ResolveError>> {
        Box::pin(self.resolve_entry_inner(token))
    }

    async fn resolve_entry_inner(&self, token: &Token) -> Result<ServiceInstance, ResolveError> {
        if self.is_disposed() {
            return Err(DisposedError.into());
        }
        if let Some(custom) = self.inner.hooks.try_custom_resolve(self, token) {
            return custom.await;
        }

        let lookup = {
            let state = self.state();
            if state.disposed {
                return Err(DisposedError.into());
            }
            if let Some(entry) = state.entries.get(token) {
                Lookup::Hit(entry.metadata.clone())
            } else {
                match self.parent() {
                    Some(parent) => Lookup::Delegate(parent),
                    None => Lookup::Missing,
                }
            }
        };

        match lookup {
            Lookup::Hit(metadata) => {
                self.inner.hooks.before_resolve(token, &metadata);
                let instance = self.resolve_local(token, &metadata).await?;
                self.inner.hooks.after_resolve(token, &instance);
                Ok(instance)
            }
            Lookup::Delegate(parent) => {
                tracing::debug!(token = %token, "no local entry, delegating to parent");
                parent.resolve_entry(token).await
            }
            Lookup::Missing => self.inner.hooks.handle_missing_service(self, token).await,
        }
    }

    /// Applies the lifetime policy for an entry owned by this node
    async fn resolve_local(
        &self,
        token: &Token,
        metadata: &ServiceMetadata,
    ) -> Result<ServiceInstance, ResolveError> {
        match &metadata.lifetime {
            Lifetime::Transient => {
                let instance = self.create_uncached(token).await?;
                self.inner.hooks.on_transient_created(token, &instance);
                Ok(instance)
            }
            // A scope-confined lifetime is meaningless without an enclosing
            // scope, so at the root it degrades to transient
            Lifetime::Scoped if self.is_root() => {
                let instance = self.create_uncached(token).await?;
                self.inner.hooks.on_scoped_created(token, &instance);
                Ok(instance)
            }
            Lifetime::Singleton | Lifetime::Scoped => {
                self.resolve_cached(token, metadata).await
            }
            Lifetime::Custom(name) => Err(ResolveError::UnknownScope(name.clone())),
        }
    }

    /// Singleton and node-local scoped resolution.
    ///
    /// The cached value is the shared in-flight future itself, installed
    /// atomically with the cache check under the node lock. Concurrent
    /// resolutions of the same token therefore all await one factory run;
    /// there is no suspension point between "no instance yet" and "a
    /// resolution is pending".
    async fn resolve_cached(
        &self,
        token: &Token,
        metadata: &ServiceMetadata,
    ) -> Result<ServiceInstance, ResolveError> {
        let (resolution, installed) = {
            let mut state = self.state();
            if state.disposed {
                return Err(DisposedError.into());
            }
            // Entries are only removed wholesale by disposal
            let Some(entry) = state.entries.get_mut(token) else {
                return Err(DisposedError.into());
            };
            match &entry.resolution {
                Some(pending) => (pending.clone(), false),
                None => {
                    let pending = make_resolution(self.clone(), token.clone(), entry.factory.clone());
                    entry.resolution = Some(pending.clone());
                    (pending, true)
                }
            }
        };

        let result = resolution.clone().await;
        if installed {
            match &result {
                Ok(instance) => match metadata.lifetime {
                    Lifetime::Singleton => self.inner.hooks.on_singleton_created(token, instance),
                    _ => self.inner.hooks.on_scoped_created(token, instance),
                },
                // A failed factory run must not poison the entry; clear the
                // cache so a later resolution can retry
                Err(_) => {
                    let mut state = self.state();
                    if let Some(entry) = state.entries.get_mut(token) {
                        if entry
                            .resolution
                            .as_ref()
                            .is_some_and(|pending| pending.ptr_eq(&resolution))
                        {
                            entry.resolution = None;
                        }
                    }
                }
            }
        }
        result
    }

    /// Runs the factory without touching the cache (transient and
    /// scoped-at-root lifetimes)
    async fn create_uncached(&self, token: &Token) -> Result<ServiceInstance, ResolveError> {
        let factory = {
            let state = self.state();
            if state.disposed {
                return Err(DisposedError.into());
            }
            let Some(entry) = state.entries.get(token) else {
                return Err(DisposedError.into());
            };
            entry.factory.clone()
        };
        factory(self.clone()).await.map_err(|error| ResolveError::Factory {
            token: token.clone(),
            error: Arc::new(error),
        })
    }

    /// Creates a child scope.
    ///
    /// Every non-singleton entry is copied into the child with its cache
    /// unset; singleton entries are not copied, so a child needing one falls
    /// through to the parent and the whole hierarchy shares a single cache
    /// per singleton token.
    pub fn create_scope(&self) -> Result<Container, DisposedError> {
        let child = {
            let mut state = self.state();
            if state.disposed {
                return Err(DisposedError);
            }
            let entries: HashMap<Token, ServiceEntry> = state
                .entries
                .iter()
                .filter(|(_, entry)| entry.metadata.lifetime != Lifetime::Singleton)
                .map(|(token, entry)| (token.clone(), entry.copy_for_scope()))
                .collect();
            tracing::debug!(entries = entries.len(), "creating child scope");
            let child = Container {
                inner: Arc::new(NodeInner {
                    parent: Some(Arc::downgrade(&self.inner)),
                    hooks: self.inner.hooks.clone(),
                    state: Mutex::new(NodeState {
                        entries,
                        children: Vec::new(),
                        disposed: false,
                    }),
                }),
            };
            state.children.push(child.clone());
            child
        };
        self.inner.hooks.on_scope_created(&child);
        Ok(child)
    }

    /// Tears this node down: child scopes first, depth-first, then this
    /// node's own cached instances.
    ///
    /// Idempotent; the second call returns immediately. Rejection of further
    /// operations begins as soon as teardown starts. A failing instance never
    /// leaves siblings undisposed: failures are collected into the returned
    /// [`DisposeError`] while the cascade runs to completion.
    ///
    /// Returns a boxed future: the cascade recurses into child scopes, so the
    /// future type must not contain itself.
    pub fn dispose(&self) -> BoxFuture<'_, Result<(), DisposeError>> {
        Box::pin(self.dispose_inner())
    }

    async fn dispose_inner(&self) -> Result<(), DisposeError> {
        let (children, entries) = {
            let mut state = self.state();
            if state.disposed {
                return Ok(());
            }
            state.disposed = true;
            (
                std::mem::take(&mut state.children),
                std::mem::take(&mut state.entries),
            )
        };
        tracing::debug!(children = children.len(), "disposing container");
        self.inner.hooks.before_dispose(self);

        let mut failures = Vec::new();
        for child in children {
            if let Err(error) = child.dispose().await {
                failures.extend(error.failures);
            }
        }

        // Children are gone; release this node's own instances
        for (token, entry) in entries {
            let Some(resolution) = entry.resolution else {
                continue;
            };
            // An in-flight factory is allowed to finish before teardown
            let instance = match resolution.await {
                Ok(instance) => instance,
                Err(_) => continue,
            };
            let Some(handle) = instance.dispose_handle() else {
                // No dispose capability, skipped silently
                continue;
            };
            if handle.is_disposed() {
                continue;
            }
            if let Err(error) = handle.dispose().await {
                tracing::debug!(token = %token, "instance failed to dispose");
                failures.push(DisposeFailure {
                    token,
                    error: Arc::new(error),
                });
            }
        }

        self.detach_from_parent();
        self.inner.hooks.after_dispose(self);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DisposeError { failures })
        }
    }

    fn detach_from_parent(&self) {
        let Some(parent) = self.parent() else {
            return;
        };
        let mut state = parent.state();
        state
            .children
            .retain(|child| !Arc::ptr_eq(&child.inner, &self.inner));
    }
}

fn make_resolution(node: Container, token: Token, factory: ServiceFactory) -> SharedResolution {
    let resolution: BoxFuture<'static, Result<ServiceInstance, ResolveError>> =
        Box::pin(async move {
            factory(node).await.map_err(|error| ResolveError::Factory {
                token,
                error: Arc::new(error),
            })
        });
    resolution.shared()
}
