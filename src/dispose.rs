use futures::future::BoxFuture;

use crate::types::DynError;

/// Capability for instances that must release resources on container teardown.
///
/// The container never requires this: instances without the capability are
/// skipped silently during disposal. Implementations must tolerate `dispose`
/// being called after `is_disposed` already returns true.
pub trait Disposable: Send + Sync {
    /// Releases the resources held by this instance
    fn dispose(&self) -> BoxFuture<'_, Result<(), DynError>>;

    /// Whether this instance has already been disposed
    fn is_disposed(&self) -> bool;
}
