//! Hierarchical dependency-injection container.
//!
//! A [`Container`] binds opaque [`Token`]s to async factories and produces
//! instances according to a declared [`Lifetime`]:
//!
//! - `Singleton`: one instance per owning node, shared with every descendant
//!   scope through parent delegation
//! - `Transient`: a fresh instance on every resolution
//! - `Scoped`: one instance per scope node (transient at the root)
//!
//! Scopes form a tree: [`Container::create_scope`] copies all non-singleton
//! entries into a child node, and [`Container::dispose`] tears the tree down
//! depth-first, releasing every cached instance that exposes the
//! [`Disposable`] capability.
//!
//! Singleton and scoped caching is single-flight: the container memoizes the
//! in-flight resolution future itself, so concurrent resolutions of the same
//! token share one factory run and observe the same instance.
//!
//! Cross-cutting behavior (logging, metrics, validation, alternate lookup
//! strategies) plugs in through [`ContainerHooks`] without touching the
//! resolution algorithm.
//!
//! ```
//! use canopy_di::{ContainerBuilder, ServiceInstance, Token};
//!
//! struct Greeter {
//!     greeting: &'static str,
//! }
//!
//! let container = ContainerBuilder::new()
//!     .singleton("greeter", |_| async {
//!         Ok(ServiceInstance::new(Greeter { greeting: "hello" }))
//!     })
//!     .build();
//!
//! let greeter = futures::executor::block_on(
//!     container.resolve::<Greeter>(&Token::named("greeter")),
//! )
//! .unwrap();
//! assert_eq!(greeter.greeting, "hello");
//! ```

mod builder;
mod container;
mod dispose;
mod entry;
mod errors;
mod hooks;
mod token;
mod types;

pub use builder::ContainerBuilder;
pub use container::Container;
pub use dispose::Disposable;
pub use entry::{Lifetime, ServiceMetadata};
pub use errors::{DisposeError, DisposeFailure, DisposedError, ResolveError};
pub use hooks::{ContainerHooks, NoopHooks, ResolveFuture};
pub use token::{Token, TokenRegistry};
pub use types::{
    factory, DynError, FactoryFuture, Injectable, ServiceFactory, ServiceInstance, TypeInfo,
};
