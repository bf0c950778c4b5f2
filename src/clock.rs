use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use derive_ex::derive_ex;

use crate::tag::Tag;


/// Snapshot of a [`Clock`].
///
/// Revisions are opaque and only meaningful relative to the clock that
/// produced them: later snapshots compare greater than earlier ones.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Revision(u64);

impl Revision {
    /// Revision of state that never changes.
    pub const CONSTANT: Revision = Revision(0);
    /// Starting revision of a fresh clock and of newly minted mutable tags.
    pub const INITIAL: Revision = Revision(1);
    /// Revision of state that must be treated as changed on every check.
    ///
    /// `VOLATILE` never validates, not even against itself.
    pub const VOLATILE: Revision = Revision(u64::MAX);

    pub fn is_constant(self) -> bool {
        self == Self::CONSTANT
    }
    pub fn is_volatile(self) -> bool {
        self == Self::VOLATILE
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constant() {
            write!(f, "constant")
        } else if self.is_volatile() {
            write!(f, "volatile")
        } else {
            write!(f, "r{}", self.0)
        }
    }
}

/// The revision clock a group of tags is minted from.
///
/// Cheap to clone; clones share the same counter. Independent clocks share
/// nothing, so isolated test runs can each own one.
#[derive_ex(Clone, Default)]
#[default(Self::new())]
pub struct Clock(Rc<RawClock>);

struct RawClock {
    revision: Cell<Revision>,
    frames: RefCell<Vec<Frame>>,
    #[cfg(feature = "trace")]
    tracer: RefCell<Rc<dyn crate::trace::Tracer>>,
}

enum Frame {
    Tracking(Vec<Tag>),
    Untracking,
}

impl Clock {
    pub fn new() -> Self {
        Self(Rc::new(RawClock {
            revision: Cell::new(Revision::INITIAL),
            frames: RefCell::new(Vec::new()),
            #[cfg(feature = "trace")]
            tracer: RefCell::new(Rc::new(crate::trace::NoopTracer)),
        }))
    }

    /// Current revision of this clock.
    pub fn current(&self) -> Revision {
        self.0.revision.get()
    }

    pub(crate) fn advance(&self) -> Revision {
        let next = Revision(self.current().0 + 1);
        debug_assert!(!next.is_volatile());
        self.0.revision.set(next);
        #[cfg(feature = "trace")]
        {
            let tracer = self.0.tracer.borrow().clone();
            tracer.on_advance(next);
        }
        next
    }

    pub(crate) fn ptr_eq(&self, other: &Clock) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Runs `f` with a fresh tracking frame, collecting every tag consumed
    /// inside into the combined tag returned alongside the result.
    pub fn track<T>(&self, f: impl FnOnce() -> T) -> (T, Tag) {
        self.0.frames.borrow_mut().push(Frame::Tracking(Vec::new()));
        let value = f();
        let tags = match self.0.frames.borrow_mut().pop() {
            Some(Frame::Tracking(tags)) => tags,
            _ => unreachable!(),
        };
        (value, self.combine(tags))
    }

    /// Runs `f` with consumption suppressed: tags consumed inside are not
    /// recorded by any enclosing tracking frame.
    pub fn untrack<T>(&self, f: impl FnOnce() -> T) -> T {
        self.0.frames.borrow_mut().push(Frame::Untracking);
        let value = f();
        self.0.frames.borrow_mut().pop();
        value
    }

    /// Records `tag` in the innermost open tracking frame.
    ///
    /// No-op outside [`track`](Self::track) or inside
    /// [`untrack`](Self::untrack).
    pub fn consume(&self, tag: &Tag) {
        if let Some(Frame::Tracking(tags)) = self.0.frames.borrow_mut().last_mut() {
            tags.push(tag.clone());
        }
    }

    /// Installs `tracer` as the observer of this clock's activity.
    #[cfg(feature = "trace")]
    pub fn set_tracer(&self, tracer: Rc<dyn crate::trace::Tracer>) {
        *self.0.tracer.borrow_mut() = tracer;
    }

    #[cfg(feature = "trace")]
    pub(crate) fn trace_dirty(&self, revision: Revision) {
        let tracer = self.0.tracer.borrow().clone();
        tracer.on_dirty(revision);
    }
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Clock").field(&self.current()).finish()
    }
}
