use std::{
    any::{Any, TypeId},
    future::Future,
    sync::Arc,
};

use futures::future::BoxFuture;

use crate::{container::Container, dispose::Disposable};

/// All errors must be Send + Sync so they can cross await points
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// We assume that we are using a multithreaded async runtime
/// So anything injectable needs to be Send + Sync + 'static
pub trait Injectable: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Injectable for T {}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

/// A resolved service value, type-erased.
///
/// The disposal capability is captured at construction time: build the
/// instance with [`ServiceInstance::with_dispose`] and the container will call
/// [`Disposable::dispose`] on it during teardown. Instances built with
/// [`ServiceInstance::new`] are skipped silently.
#[derive(Clone)]
pub struct ServiceInstance {
    info: TypeInfo,
    value: Arc<dyn Any + Send + Sync>,
    disposer: Option<Arc<dyn Disposable>>,
}

impl ServiceInstance {
    pub fn new<T: Injectable>(value: T) -> Self {
        ServiceInstance {
            info: TypeInfo::of::<T>(),
            value: Arc::new(value),
            disposer: None,
        }
    }

    /// Wraps a value that knows how to release its resources.
    pub fn with_dispose<T: Injectable + Disposable>(value: T) -> Self {
        let shared = Arc::new(value);
        ServiceInstance {
            info: TypeInfo::of::<T>(),
            disposer: Some(shared.clone()),
            value: shared,
        }
    }

    pub fn type_info(&self) -> TypeInfo {
        self.info
    }

    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match Arc::downcast::<T>(self.value.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }

    /// Explicit capability check: does this instance take part in disposal?
    pub fn has_dispose_capability(&self) -> bool {
        self.disposer.is_some()
    }

    pub(crate) fn dispose_handle(&self) -> Option<&Arc<dyn Disposable>> {
        self.disposer.as_ref()
    }
}

impl std::fmt::Debug for ServiceInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceInstance")
            .field("type", &self.info.type_name)
            .field("disposable", &self.disposer.is_some())
            .finish()
    }
}

/// Future produced by a service factory
pub type FactoryFuture = BoxFuture<'static, Result<ServiceInstance, DynError>>;

/// A factory providing instances of a service.
///
/// The factory receives the container node that owns the entry as its
/// resolution context, so it may resolve its own dependencies from it.
pub type ServiceFactory = Arc<dyn Fn(Container) -> FactoryFuture + Send + Sync>;

/// Wraps an async closure into a [`ServiceFactory`]
pub fn factory<F, Fut>(factory: F) -> ServiceFactory
where
    F: Fn(Container) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ServiceInstance, DynError>> + Send + 'static,
{
    Arc::new(move |container| Box::pin(factory(container)))
}
