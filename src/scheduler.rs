use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use derive_ex::derive_ex;

use crate::destroy::Destroyable;

#[cfg(test)]
mod tests;

/// A queued destructor, run at most once.
pub struct Destructor(Box<dyn FnOnce(Destroyable)>);

impl Destructor {
    pub(crate) fn new(f: impl FnOnce(Destroyable) + 'static) -> Self {
        Self(Box::new(f))
    }

    /// Runs the destructor against its destroyable.
    pub fn run(self, target: Destroyable) {
        (self.0)(target)
    }
}

/// Notice that every destructor of one destroyable has run.
///
/// Running it performs the `Destroying -> Destroyed` transition.
pub struct DestroyedNotice(Box<dyn FnOnce()>);

impl DestroyedNotice {
    pub(crate) fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn run(self) {
        (self.0)()
    }
}

/// Host-supplied policy deciding when queued destruction work executes.
///
/// The registry hands work over and never assumes it runs synchronously;
/// a destroyable observably stays `Destroying` until its notice has run.
pub trait DestroyScheduler: 'static {
    /// Queues one destructor for `target`.
    fn schedule_destroy(&self, target: Destroyable, destructor: Destructor);
    /// Queues the terminal transition of one destroyable. Must run only
    /// after every destructor scheduled for it.
    fn schedule_destroyed(&self, notice: DestroyedNotice);
}

/// FIFO scheduler drained explicitly by the host.
///
/// Cheap to clone; clones share the queues, so the host keeps one handle and
/// gives another to the registry.
#[derive_ex(Clone, Default)]
#[default(Self::new())]
pub struct QueueScheduler(Rc<RefCell<Queues>>);

#[derive(Default)]
struct Queues {
    destroys: VecDeque<(Destroyable, Destructor)>,
    destroyeds: VecDeque<DestroyedNotice>,
}

impl QueueScheduler {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Queues::default())))
    }

    /// Runs queued destructors, then queued notices, until both queues are
    /// empty.
    ///
    /// Each item is popped before it runs, so a destructor may re-enter the
    /// registry and schedule more work mid-flush.
    ///
    /// Returns `true` if anything was run.
    pub fn flush(&self) -> bool {
        let mut handled = false;
        loop {
            let destroy = self.0.borrow_mut().destroys.pop_front();
            if let Some((target, destructor)) = destroy {
                destructor.run(target);
                handled = true;
                continue;
            }
            let destroyed = self.0.borrow_mut().destroyeds.pop_front();
            if let Some(notice) = destroyed {
                notice.run();
                handled = true;
                continue;
            }
            break;
        }
        handled
    }

    pub fn is_empty(&self) -> bool {
        let queues = self.0.borrow();
        queues.destroys.is_empty() && queues.destroyeds.is_empty()
    }
}

impl DestroyScheduler for QueueScheduler {
    fn schedule_destroy(&self, target: Destroyable, destructor: Destructor) {
        self.0.borrow_mut().destroys.push_back((target, destructor));
    }
    fn schedule_destroyed(&self, notice: DestroyedNotice) {
        self.0.borrow_mut().destroyeds.push_back(notice);
    }
}

/// Scheduler that runs every item at the point it is scheduled.
#[derive(Clone, Copy, Default, Debug)]
pub struct ImmediateScheduler;

impl DestroyScheduler for ImmediateScheduler {
    fn schedule_destroy(&self, target: Destroyable, destructor: Destructor) {
        destructor.run(target);
    }
    fn schedule_destroyed(&self, notice: DestroyedNotice) {
        notice.run();
    }
}
