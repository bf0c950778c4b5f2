use parse_display::Display;

use crate::destroy::Destroyable;

/// Contract violations in the destroyable lifecycle API.
///
/// Every variant is a programmer error: it is reported eagerly at the
/// violating call site, never swallowed and never retried by the kernel.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum LifecycleError {
    /// The token was never registered, or its destructor was already removed.
    #[display("destructor was not registered on this destroyable")]
    InvalidDestructorRemoval,
    /// Destructor or association changes were requested on a destroyable
    /// whose destruction has already begun.
    #[display("cannot change destructors once destruction has begun")]
    MutationAfterDestroyBegun,
    /// The tracking window was opened while one was already open, or closed
    /// while none was open.
    #[display("destroyable tracking window is already open or was never opened")]
    TrackingWindowMisuse,
    /// Tracked destroyables never finished destruction.
    #[display("destroyables were never destroyed: {leaked:?}")]
    LeakDetected { leaked: Vec<Destroyable> },
}

impl std::error::Error for LifecycleError {}
