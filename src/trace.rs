use crate::{clock::Revision, destroy::Destroyable};

/// Observer of kernel activity.
///
/// Every method has an empty default implementation; implement only the
/// events of interest. Install with [`Clock::set_tracer`](crate::Clock::set_tracer)
/// and [`DestroyRegistry::set_tracer`](crate::DestroyRegistry::set_tracer).
pub trait Tracer: 'static {
    /// The clock advanced to `revision`.
    fn on_advance(&self, _revision: Revision) {}
    /// A dirtyable tag was invalidated at `revision`.
    fn on_dirty(&self, _revision: Revision) {}
    /// Destruction of `destroyable` began.
    fn on_destroy(&self, _destroyable: Destroyable) {}
    /// A destructor for `destroyable` was handed to the scheduler.
    fn on_destroy_scheduled(&self, _destroyable: Destroyable) {}
    /// `destroyable` reached its terminal state.
    fn on_destroyed(&self, _destroyable: Destroyable) {}
}

/// Tracer that discards every event.
#[derive(Clone, Copy, Default, Debug)]
pub struct NoopTracer;

impl Tracer for NoopTracer {}
