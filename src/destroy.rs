use std::{cell::RefCell, mem::take, rc::Rc};

use slabmap::SlabMap;

use crate::{
    error::LifecycleError,
    scheduler::{DestroyScheduler, DestroyedNotice, Destructor},
};


/// Handle to a lifecycle record tracked by a [`DestroyRegistry`].
///
/// Handles are plain indices into the registry's record arena; the registry
/// never inspects the host object they stand for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Destroyable(usize);

/// Token returned by destructor registration, required to unregister.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DestructorToken {
    owner: Destroyable,
    id: u64,
}

impl DestructorToken {
    /// The destroyable the destructor was registered on.
    pub fn owner(&self) -> Destroyable {
        self.owner
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
enum State {
    Live,
    Destroying,
    Destroyed,
}

struct DestructorEntry {
    id: u64,
    eager: bool,
    destructor: Destructor,
}

struct Record {
    state: State,
    next_destructor_id: u64,
    destructors: Vec<DestructorEntry>,
    children: Vec<Destroyable>,
    parents: Vec<Destroyable>,
}

impl Record {
    fn new() -> Self {
        Self {
            state: State::Live,
            next_destructor_id: 0,
            destructors: Vec::new(),
            children: Vec::new(),
            parents: Vec::new(),
        }
    }
}

struct RawRegistry {
    records: SlabMap<Record>,
    #[cfg(debug_assertions)]
    tracked: Option<Vec<Destroyable>>,
    #[cfg(feature = "trace")]
    tracer: Rc<dyn crate::trace::Tracer>,
}

impl RawRegistry {
    fn live_record(&mut self, d: Destroyable) -> Result<&mut Record, LifecycleError> {
        match self.records.get_mut(d.0) {
            Some(record) if record.state == State::Live => Ok(record),
            _ => Err(LifecycleError::MutationAfterDestroyBegun),
        }
    }

    /// Terminal transition. Everything but the state byte is released.
    fn finish(&mut self, d: Destroyable) {
        if let Some(record) = self.records.get_mut(d.0) {
            record.state = State::Destroyed;
            record.parents = Vec::new();
        }
    }
}

/// Registry of destroyable lifecycle records.
///
/// Tracks per-handle state (`Live -> Destroying -> Destroyed`), ordered
/// destructor lists, and parent/child association edges, and drives ordered,
/// exactly-once destruction through an injected [`DestroyScheduler`].
///
/// Cheap to clone; clones share the records.
#[derive(Clone)]
pub struct DestroyRegistry {
    raw: Rc<RefCell<RawRegistry>>,
    scheduler: Rc<dyn DestroyScheduler>,
}

impl DestroyRegistry {
    pub fn new(scheduler: impl DestroyScheduler) -> Self {
        Self {
            raw: Rc::new(RefCell::new(RawRegistry {
                records: SlabMap::new(),
                #[cfg(debug_assertions)]
                tracked: None,
                #[cfg(feature = "trace")]
                tracer: Rc::new(crate::trace::NoopTracer),
            })),
            scheduler: Rc::new(scheduler),
        }
    }

    /// Mints a new live destroyable.
    pub fn create(&self) -> Destroyable {
        let mut raw = self.raw.borrow_mut();
        let d = Destroyable(raw.records.insert(Record::new()));
        #[cfg(debug_assertions)]
        if let Some(tracked) = &mut raw.tracked {
            tracked.push(d);
        }
        d
    }

    /// Registers a destructor to run during the scheduled phase of `d`'s
    /// destruction. Destructors run in registration order.
    pub fn register_destructor(
        &self,
        d: Destroyable,
        f: impl FnOnce(Destroyable) + 'static,
    ) -> Result<DestructorToken, LifecycleError> {
        self.register(d, f, false)
    }

    /// Registers a destructor to run synchronously inside `destroy`, before
    /// any work is handed to the scheduler.
    pub fn register_eager_destructor(
        &self,
        d: Destroyable,
        f: impl FnOnce(Destroyable) + 'static,
    ) -> Result<DestructorToken, LifecycleError> {
        self.register(d, f, true)
    }

    fn register(
        &self,
        d: Destroyable,
        f: impl FnOnce(Destroyable) + 'static,
        eager: bool,
    ) -> Result<DestructorToken, LifecycleError> {
        let mut raw = self.raw.borrow_mut();
        let record = raw.live_record(d)?;
        let id = record.next_destructor_id;
        record.next_destructor_id += 1;
        record.destructors.push(DestructorEntry {
            id,
            eager,
            destructor: Destructor::new(f),
        });
        Ok(DestructorToken { owner: d, id })
    }

    /// Removes a previously registered destructor.
    pub fn unregister_destructor(&self, token: DestructorToken) -> Result<(), LifecycleError> {
        let mut raw = self.raw.borrow_mut();
        let record = raw.live_record(token.owner)?;
        let index = record
            .destructors
            .iter()
            .position(|entry| entry.id == token.id)
            .ok_or(LifecycleError::InvalidDestructorRemoval)?;
        record.destructors.remove(index);
        Ok(())
    }

    /// Records a parent/child edge. A child may have any number of parents;
    /// it is destroyed at most once regardless of how many of them are
    /// destroyed. Re-associating an existing edge is a no-op.
    pub fn associate_child(
        &self,
        parent: Destroyable,
        child: Destroyable,
    ) -> Result<(), LifecycleError> {
        let mut raw = self.raw.borrow_mut();
        let record = raw.live_record(parent)?;
        if record.children.contains(&child) {
            return Ok(());
        }
        record.children.push(child);
        if let Some(child_record) = raw.records.get_mut(child.0) {
            child_record.parents.push(parent);
        }
        Ok(())
    }

    /// Begins destruction of `d` and everything reachable through child
    /// edges.
    ///
    /// The whole reachable not-yet-destroying subtree is marked `Destroying`
    /// synchronously and eager destructors run before this returns; the
    /// remaining destructors and the terminal transitions are handed to the
    /// scheduler, children before the parents that own them. No-op when `d`
    /// has already begun destruction.
    pub fn destroy(&self, d: Destroyable) {
        let order = self.mark_subtree(&[d]);
        self.run_destruction(order);
    }

    /// Destroys the children of `d`, leaving `d` itself live.
    pub fn destroy_children(&self, d: Destroyable) {
        let children = {
            let mut raw = self.raw.borrow_mut();
            match raw.records.get_mut(d.0) {
                Some(record) => take(&mut record.children),
                None => return,
            }
        };
        let order = self.mark_subtree(&children);
        self.run_destruction(order);
    }

    /// Returns `true` from the instant destruction of `d` begins, forever.
    /// Unknown handles are not destroying.
    pub fn is_destroying(&self, d: Destroyable) -> bool {
        self.state(d).is_some_and(|state| state >= State::Destroying)
    }

    /// Returns `true` once every destructor of `d` has run and its terminal
    /// transition was performed. Unknown handles are not destroyed.
    pub fn is_destroyed(&self, d: Destroyable) -> bool {
        self.state(d) == Some(State::Destroyed)
    }

    /// Returns `true` while any child is associated with `d`.
    pub fn has_children(&self, d: Destroyable) -> bool {
        self.raw
            .borrow()
            .records
            .get(d.0)
            .is_some_and(|record| !record.children.is_empty())
    }

    fn state(&self, d: Destroyable) -> Option<State> {
        self.raw.borrow().records.get(d.0).map(|record| record.state)
    }

    /// Marks every live node reachable from `roots` as `Destroying` and
    /// returns them post-order: children before the node that owns them.
    fn mark_subtree(&self, roots: &[Destroyable]) -> Vec<Destroyable> {
        let mut raw = self.raw.borrow_mut();
        let mut order = Vec::new();
        for &root in roots {
            mark(&mut raw.records, root, &mut order);
        }
        order
    }

    fn run_destruction(&self, order: Vec<Destroyable>) {
        if order.is_empty() {
            return;
        }
        // Pull the destructors out while the registry is borrowed, then run
        // and schedule with the borrow released so destructors can re-enter.
        #[cfg(feature = "trace")]
        let tracer = self.raw.borrow().tracer.clone();
        let mut eagers = Vec::new();
        let mut queued = Vec::with_capacity(order.len());
        {
            let mut raw = self.raw.borrow_mut();
            for &d in &order {
                let destructors = match raw.records.get_mut(d.0) {
                    Some(record) => take(&mut record.destructors),
                    None => Vec::new(),
                };
                let mut lazies = Vec::new();
                for entry in destructors {
                    if entry.eager {
                        eagers.push((d, entry.destructor));
                    } else {
                        lazies.push(entry.destructor);
                    }
                }
                queued.push((d, lazies));
            }
        }
        #[cfg(feature = "trace")]
        for &d in &order {
            tracer.on_destroy(d);
        }
        for (d, destructor) in eagers {
            destructor.run(d);
        }
        for (d, lazies) in queued {
            for destructor in lazies {
                #[cfg(feature = "trace")]
                tracer.on_destroy_scheduled(d);
                self.scheduler.schedule_destroy(d, destructor);
            }
            let raw = Rc::downgrade(&self.raw);
            self.scheduler.schedule_destroyed(DestroyedNotice::new(move || {
                if let Some(raw) = raw.upgrade() {
                    raw.borrow_mut().finish(d);
                    #[cfg(feature = "trace")]
                    {
                        let tracer = raw.borrow().tracer.clone();
                        tracer.on_destroyed(d);
                    }
                }
            }));
        }
    }

    /// Installs `tracer` as the observer of this registry's activity.
    #[cfg(feature = "trace")]
    pub fn set_tracer(&self, tracer: Rc<dyn crate::trace::Tracer>) {
        self.raw.borrow_mut().tracer = tracer;
    }
}

fn mark(records: &mut SlabMap<Record>, d: Destroyable, order: &mut Vec<Destroyable>) {
    let children = match records.get_mut(d.0) {
        Some(record) if record.state == State::Live => {
            record.state = State::Destroying;
            take(&mut record.children)
        }
        _ => return,
    };
    for &child in &children {
        mark(records, child, order);
    }
    order.push(d);
}

#[cfg(debug_assertions)]
impl DestroyRegistry {
    /// Opens a window recording every destroyable created until
    /// [`assert_destroyed`](Self::assert_destroyed) closes it.
    ///
    /// Debug-build test harness aid; not compiled into release builds.
    pub fn enable_tracking(&self) -> Result<(), LifecycleError> {
        let mut raw = self.raw.borrow_mut();
        if raw.tracked.is_some() {
            return Err(LifecycleError::TrackingWindowMisuse);
        }
        raw.tracked = Some(Vec::new());
        Ok(())
    }

    /// Closes the tracking window, failing with the list of recorded
    /// destroyables that never finished destruction.
    pub fn assert_destroyed(&self) -> Result<(), LifecycleError> {
        let mut raw = self.raw.borrow_mut();
        let tracked = raw
            .tracked
            .take()
            .ok_or(LifecycleError::TrackingWindowMisuse)?;
        let leaked: Vec<Destroyable> = tracked
            .into_iter()
            .filter(|d| {
                raw.records
                    .get(d.0)
                    .is_some_and(|record| record.state != State::Destroyed)
            })
            .collect();
        if leaked.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::LeakDetected { leaked })
        }
    }
}
