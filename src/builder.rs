use std::{future::Future, sync::Arc};

use crate::{
    container::Container,
    entry::ServiceMetadata,
    hooks::{ContainerHooks, NoopHooks},
    token::Token,
    types::{self, DynError, Injectable, ServiceFactory, ServiceInstance},
};

/// Fluent configuration surface for a root container.
///
/// The builder holds no resolution logic of its own: every call is pure
/// delegation to [`Container::register_factory`] once [`ContainerBuilder::build`]
/// runs.
pub struct ContainerBuilder {
    hooks: Arc<dyn ContainerHooks>,
    registrations: Vec<(Token, ServiceFactory, ServiceMetadata)>,
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    pub fn new() -> Self {
        ContainerBuilder {
            hooks: Arc::new(NoopHooks),
            registrations: Vec::new(),
        }
    }

    /// Installs a hook set shared by the root and every scope created from it
    pub fn with_hooks(mut self, hooks: impl ContainerHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Registers a service with explicit metadata
    pub fn register(
        mut self,
        token: impl Into<Token>,
        factory: ServiceFactory,
        metadata: ServiceMetadata,
    ) -> Self {
        self.registrations.push((token.into(), factory, metadata));
        self
    }

    /// Registers a singleton: one instance per owning node, shared with all
    /// descendant scopes
    pub fn singleton<F, Fut>(self, token: impl Into<Token>, factory: F) -> Self
    where
        F: Fn(Container) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ServiceInstance, DynError>> + Send + 'static,
    {
        self.register(token, types::factory(factory), ServiceMetadata::singleton())
    }

    /// Registers a scoped service: one instance per scope node
    pub fn scoped<F, Fut>(self, token: impl Into<Token>, factory: F) -> Self
    where
        F: Fn(Container) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ServiceInstance, DynError>> + Send + 'static,
    {
        self.register(token, types::factory(factory), ServiceMetadata::scoped())
    }

    /// Registers a transient service: a fresh instance on every resolution
    pub fn transient<F, Fut>(self, token: impl Into<Token>, factory: F) -> Self
    where
        F: Fn(Container) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ServiceInstance, DynError>> + Send + 'static,
    {
        self.register(token, types::factory(factory), ServiceMetadata::transient())
    }

    /// Registers an already constructed value as a singleton
    pub fn instance<T: Injectable>(self, token: impl Into<Token>, value: T) -> Self {
        let instance = ServiceInstance::new(value);
        let factory: ServiceFactory = Arc::new(move |_| {
            let instance = instance.clone();
            Box::pin(async move { Ok(instance) })
        });
        self.register(token, factory, ServiceMetadata::singleton())
    }

    /// Builds the root container and commits all registrations to it
    pub fn build(self) -> Container {
        let root = Container::from_hooks(self.hooks);
        for (token, factory, metadata) in self.registrations {
            root.register_factory(token, factory, metadata)
                .expect("freshly created root container is never disposed");
        }
        root
    }
}
