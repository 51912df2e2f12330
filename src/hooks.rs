use futures::future::BoxFuture;

use crate::{
    container::Container,
    entry::ServiceMetadata,
    errors::ResolveError,
    token::Token,
    types::ServiceInstance,
};

/// Future returned by the resolution hooks
pub type ResolveFuture = BoxFuture<'static, Result<ServiceInstance, ResolveError>>;

/// Override points invoked at fixed places in registration, resolution and
/// disposal.
///
/// Every method has a default, and the engine never depends on an override
/// for correctness: hooks exist so observers can add logging, metrics,
/// validation or alternate resolution strategies without touching the core
/// algorithm. One hook set is shared by an entire scope tree.
#[allow(unused_variables)]
pub trait ContainerHooks: Send + Sync {
    /// Observes a registration before the entry is committed
    fn before_register(&self, token: &Token, metadata: &ServiceMetadata) {}

    /// Observes a registration after the entry is committed
    fn after_register(&self, token: &Token, metadata: &ServiceMetadata) {}

    /// Runs before the regular lookup; returning `Some` short-circuits the
    /// whole resolution with the produced result
    fn try_custom_resolve(&self, container: &Container, token: &Token) -> Option<ResolveFuture> {
        None
    }

    /// Observes a local entry hit, before the lifetime policy runs
    fn before_resolve(&self, token: &Token, metadata: &ServiceMetadata) {}

    /// Observes a local entry hit, after the instance is available
    fn after_resolve(&self, token: &Token, instance: &ServiceInstance) {}

    /// Fires once, when a singleton instance is first created
    fn on_singleton_created(&self, token: &Token, instance: &ServiceInstance) {}

    /// Fires for every transient instance created
    fn on_transient_created(&self, token: &Token, instance: &ServiceInstance) {}

    /// Fires when a scoped instance is created (once per caching node, per
    /// creation at the root)
    fn on_scoped_created(&self, token: &Token, instance: &ServiceInstance) {}

    /// Fires after a child scope is fully populated and linked
    fn on_scope_created(&self, scope: &Container) {}

    /// Fires at the start of teardown, before any child is disposed
    fn before_dispose(&self, container: &Container) {}

    /// Fires after teardown, once state is fully torn down
    fn after_dispose(&self, container: &Container) {}

    /// Called when resolution reaches the root without finding an entry.
    /// The default fails with [`ResolveError::NotRegistered`].
    fn handle_missing_service(&self, container: &Container, token: &Token) -> ResolveFuture {
        let token = token.clone();
        Box::pin(async move { Err(ResolveError::NotRegistered(token)) })
    }
}

/// The hook set installed when no custom hooks are supplied
#[derive(Default, Clone, Copy, Debug)]
pub struct NoopHooks;

impl ContainerHooks for NoopHooks {}
