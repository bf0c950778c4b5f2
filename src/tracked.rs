use std::{cell::RefCell, fmt, mem::replace, rc::Rc};

use derive_ex::derive_ex;

use crate::{
    clock::{Clock, Revision},
    tag::{DirtyTag, Tag},
};

#[cfg(test)]
mod tests;

/// A value cell whose reads are tracked and whose writes invalidate.
///
/// Similar to `Rc<RefCell<T>>`, but every read records a dependency in the
/// open tracking frame and every write dirties the cell's tag.
#[derive_ex(Clone, bound())]
pub struct TrackedCell<T: 'static>(Rc<TrackedCellNode<T>>);

struct TrackedCellNode<T> {
    clock: Clock,
    tag: DirtyTag,
    value: RefCell<T>,
}

impl<T: 'static> TrackedCell<T> {
    /// Creates a new cell with the given initial value, tagged on `clock`.
    pub fn new(clock: &Clock, value: T) -> Self {
        Self(Rc::new(TrackedCellNode {
            clock: clock.clone(),
            tag: clock.dirty_tag(),
            value: RefCell::new(value),
        }))
    }

    /// Gets the current value, consuming this cell's tag into the open
    /// tracking frame.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Calls `f` with the current value, consuming this cell's tag into the
    /// open tracking frame.
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        self.0.clock.consume(&self.0.tag.tag());
        f(&self.0.value.borrow())
    }

    /// Sets the value and invalidates.
    pub fn set(&self, value: T) {
        *self.0.value.borrow_mut() = value;
        self.0.tag.dirty();
    }

    /// Sets the value and invalidates, returning the previous value.
    pub fn replace(&self, value: T) -> T {
        let old = replace(&mut *self.0.value.borrow_mut(), value);
        self.0.tag.dirty();
        old
    }

    /// Sets the value and invalidates only if it differs from the current
    /// value.
    pub fn set_eq(&self, value: T)
    where
        T: PartialEq,
    {
        let mut current = self.0.value.borrow_mut();
        if *current != value {
            *current = value;
            drop(current);
            self.0.tag.dirty();
        }
    }

    /// The tag dirtied by writes to this cell.
    pub fn tag(&self) -> Tag {
        self.0.tag.tag()
    }
}

impl<T: fmt::Debug> fmt::Debug for TrackedCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.value.try_borrow() {
            Ok(value) => fmt::Debug::fmt(&*value, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}

/// Auto-tracked memoized computation.
///
/// `compute` runs inside a tracking frame; the tags it consumes are combined
/// and stored, and the value is recomputed only when that combination no
/// longer validates. Reading a memo consumes its stored tag, so an enclosing
/// frame is invalidated whenever the memo is.
pub struct Memo<T, F: FnMut() -> T> {
    clock: Clock,
    compute: F,
    last: Option<MemoState<T>>,
}

struct MemoState<T> {
    tag: Tag,
    revision: Revision,
    value: T,
}

impl<T, F: FnMut() -> T> Memo<T, F> {
    pub fn new(clock: &Clock, compute: F) -> Self {
        Self {
            clock: clock.clone(),
            compute,
            last: None,
        }
    }

    /// Returns the cached value, recomputing when any dependency consumed by
    /// the previous computation has changed.
    pub fn value(&mut self) -> &T {
        let stale = match &self.last {
            Some(state) => !state.tag.validate(state.revision),
            None => true,
        };
        if stale {
            let compute = &mut self.compute;
            let (value, tag) = self.clock.track(|| compute());
            let revision = tag.value();
            self.last = Some(MemoState {
                tag,
                revision,
                value,
            });
        }
        match &self.last {
            Some(state) => {
                self.clock.consume(&state.tag);
                &state.value
            }
            None => unreachable!(),
        }
    }

    /// The combined tag of the last computation's dependencies, if any
    /// computation has happened yet.
    pub fn tag(&self) -> Option<&Tag> {
        self.last.as_ref().map(|state| &state.tag)
    }
}
