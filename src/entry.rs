use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

use futures::future::{BoxFuture, Shared};

use crate::{
    errors::ResolveError,
    types::{ServiceFactory, ServiceInstance},
};

/// Lifetime policy of a registered service
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Lifetime {
    /// One instance per owning node, shared by all descendants via delegation
    #[default]
    Singleton,
    /// A new instance on every resolution
    Transient,
    /// One instance per scope node; acts as a local singleton in non-root
    /// nodes and as transient at the root
    Scoped,
    /// A lifetime the engine does not interpret. Resolving an entry carrying
    /// one fails with [`ResolveError::UnknownScope`] unless a custom
    /// resolution hook takes over.
    Custom(Arc<str>),
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => f.write_str("singleton"),
            Lifetime::Transient => f.write_str("transient"),
            Lifetime::Scoped => f.write_str("scoped"),
            Lifetime::Custom(name) => f.write_str(name),
        }
    }
}

/// Registration metadata for a service entry
#[derive(Clone, Debug, Default)]
pub struct ServiceMetadata {
    pub lifetime: Lifetime,
    pub tags: BTreeSet<String>,
    pub extra: BTreeMap<String, String>,
}

impl ServiceMetadata {
    pub fn singleton() -> ServiceMetadata {
        ServiceMetadata::default()
    }

    pub fn transient() -> ServiceMetadata {
        ServiceMetadata {
            lifetime: Lifetime::Transient,
            ..ServiceMetadata::default()
        }
    }

    pub fn scoped() -> ServiceMetadata {
        ServiceMetadata {
            lifetime: Lifetime::Scoped,
            ..ServiceMetadata::default()
        }
    }

    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Memoized resolution of a cached entry.
///
/// The shared future is installed atomically with the cache check, so every
/// concurrent resolver of the same token awaits the same factory run. Caching
/// the in-flight future rather than the settled value is what makes the
/// single-instance guarantee hold across suspension points.
pub(crate) type SharedResolution = Shared<BoxFuture<'static, Result<ServiceInstance, ResolveError>>>;

/// Registration record owned by exactly one container node
pub(crate) struct ServiceEntry {
    pub(crate) factory: ServiceFactory,
    pub(crate) metadata: ServiceMetadata,
    pub(crate) resolution: Option<SharedResolution>,
}

impl ServiceEntry {
    pub(crate) fn new(factory: ServiceFactory, metadata: ServiceMetadata) -> ServiceEntry {
        ServiceEntry {
            factory,
            metadata,
            resolution: None,
        }
    }

    /// Duplicates this entry for a child scope: same factory, same metadata,
    /// cache unset. The child starts uncached even if this node has already
    /// resolved the entry.
    pub(crate) fn copy_for_scope(&self) -> ServiceEntry {
        ServiceEntry {
            factory: self.factory.clone(),
            metadata: self.metadata.clone(),
            resolution: None,
        }
    }
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("lifetime", &self.metadata.lifetime)
            .field("resolved", &self.resolution.is_some())
            .finish()
    }
}
