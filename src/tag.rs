use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use crate::clock::{Clock, Revision};


/// Identity-bearing handle for the last revision at which some piece of
/// state changed.
///
/// Cheap to clone; clones share the underlying node, so a clone of a
/// combinator shares its memo and a clone of a dirtyable observes its
/// invalidations.
#[derive(Clone)]
pub struct Tag(RawTag);

#[derive(Clone)]
enum RawTag {
    Constant,
    Volatile,
    Current(Clock),
    Dirtyable(Rc<DirtyNode>),
    Updatable(Rc<UpdatableNode>),
    Pair(Rc<PairNode>),
    Combined(Rc<CombinedNode>),
}

struct DirtyNode {
    clock: Clock,
    revision: Cell<Revision>,
}

struct UpdatableNode {
    clock: Clock,
    inner: RefCell<Tag>,
    last_updated: Cell<Revision>,
}

struct PairNode {
    first: Tag,
    second: Tag,
    memo: TagMemo,
}

struct CombinedNode {
    children: Vec<Tag>,
    memo: TagMemo,
}

/// Per-generation memo of a combinator's value: the max-reduce over children
/// reruns only when the clock has advanced since the last check.
struct TagMemo {
    clock: Clock,
    last_checked: Cell<Option<Revision>>,
    last_value: Cell<Revision>,
}

impl TagMemo {
    fn new(clock: Clock) -> Self {
        Self {
            clock,
            last_checked: Cell::new(None),
            last_value: Cell::new(Revision::CONSTANT),
        }
    }
    fn value(&self, compute: impl FnOnce() -> Revision) -> Revision {
        let now = self.clock.current();
        if self.last_checked.get() != Some(now) {
            self.last_checked.set(Some(now));
            self.last_value.set(compute());
        }
        self.last_value.get()
    }
}

impl Tag {
    /// Tag of state that never changes.
    pub fn constant() -> Tag {
        Tag(RawTag::Constant)
    }

    /// Tag of state that must be re-read on every check.
    pub fn volatile() -> Tag {
        Tag(RawTag::Volatile)
    }

    /// Last revision at which the tagged state changed.
    ///
    /// Non-decreasing across calls for a live tag.
    pub fn value(&self) -> Revision {
        match &self.0 {
            RawTag::Constant => Revision::CONSTANT,
            RawTag::Volatile => Revision::VOLATILE,
            RawTag::Current(clock) => clock.current(),
            RawTag::Dirtyable(node) => node.revision.get(),
            RawTag::Updatable(node) => node.last_updated.get().max(node.inner.borrow().value()),
            RawTag::Pair(node) => node
                .memo
                .value(|| node.first.value().max(node.second.value())),
            RawTag::Combined(node) => node.memo.value(|| {
                node.children
                    .iter()
                    .map(Tag::value)
                    .fold(Revision::CONSTANT, |a, b| a.max(b))
            }),
        }
    }

    /// Returns `true` if the tagged state is unchanged since `snapshot` was
    /// taken from this tag.
    ///
    /// A volatile snapshot never validates.
    pub fn validate(&self, snapshot: Revision) -> bool {
        !snapshot.is_volatile() && self.value() == snapshot
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.0, RawTag::Constant)
    }

    /// Identity comparison: `true` only for handles to the same node.
    pub(crate) fn same_tag(&self, other: &Tag) -> bool {
        match (&self.0, &other.0) {
            (RawTag::Constant, RawTag::Constant) => true,
            (RawTag::Volatile, RawTag::Volatile) => true,
            (RawTag::Current(a), RawTag::Current(b)) => a.ptr_eq(b),
            (RawTag::Dirtyable(a), RawTag::Dirtyable(b)) => Rc::ptr_eq(a, b),
            (RawTag::Updatable(a), RawTag::Updatable(b)) => Rc::ptr_eq(a, b),
            (RawTag::Pair(a), RawTag::Pair(b)) => Rc::ptr_eq(a, b),
            (RawTag::Combined(a), RawTag::Combined(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.0 {
            RawTag::Constant => "constant",
            RawTag::Volatile => "volatile",
            RawTag::Current(_) => "current",
            RawTag::Dirtyable(_) => "dirtyable",
            RawTag::Updatable(_) => "updatable",
            RawTag::Pair(_) => "pair",
            RawTag::Combined(_) => "combined",
        };
        write!(f, "Tag({kind}, {})", self.value())
    }
}

/// Write half of a dirtyable tag: the capability to invalidate it.
///
/// Minted by [`Clock::dirty_tag`]. The read half is obtained with
/// [`tag`](Self::tag); readers cannot invalidate.
#[derive(Clone)]
pub struct DirtyTag(Rc<DirtyNode>);

impl DirtyTag {
    /// Marks the tagged state changed at a fresh revision.
    ///
    /// Advances the clock, so every combinator minted from it re-checks its
    /// children on the next read.
    pub fn dirty(&self) {
        let next = self.0.clock.advance();
        self.0.revision.set(next);
        #[cfg(feature = "trace")]
        self.0.clock.trace_dirty(next);
    }

    /// The read half of this handle.
    pub fn tag(&self) -> Tag {
        Tag(RawTag::Dirtyable(self.0.clone()))
    }
}

impl fmt::Debug for DirtyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DirtyTag").field(&self.0.revision.get()).finish()
    }
}

/// Tag wrapping a replaceable inner tag.
///
/// Minted by [`Clock::updatable_tag`].
#[derive(Clone)]
pub struct UpdatableTag(Rc<UpdatableNode>);

impl UpdatableTag {
    /// Swaps the inner tag and marks this one changed at the current clock
    /// value. No-op when `tag` is the same node by identity.
    pub fn update(&self, tag: Tag) {
        if self.0.inner.borrow().same_tag(&tag) {
            return;
        }
        *self.0.inner.borrow_mut() = tag;
        self.0.last_updated.set(self.0.clock.current());
    }

    /// The read half of this handle.
    pub fn tag(&self) -> Tag {
        Tag(RawTag::Updatable(self.0.clone()))
    }
}

impl Clock {
    /// Mints a tag that can be explicitly invalidated through the returned
    /// write handle.
    pub fn dirty_tag(&self) -> DirtyTag {
        DirtyTag(Rc::new(DirtyNode {
            clock: self.clone(),
            revision: Cell::new(Revision::INITIAL),
        }))
    }

    /// Mints a tag wrapping `inner`, replaceable later via
    /// [`UpdatableTag::update`].
    pub fn updatable_tag(&self, inner: Tag) -> UpdatableTag {
        UpdatableTag(Rc::new(UpdatableNode {
            clock: self.clone(),
            inner: RefCell::new(inner),
            last_updated: Cell::new(Revision::INITIAL),
        }))
    }

    /// A tag that invalidates whenever any state of this clock changes.
    pub fn current_tag(&self) -> Tag {
        Tag(RawTag::Current(self.clone()))
    }

    /// Combines `tags` into a single tag that invalidates when any of them
    /// does.
    ///
    /// Constant tags are the neutral element and are filtered out; a volatile
    /// tag is absorbing and makes the whole combination volatile. Zero
    /// remaining tags combine to constant, one to itself.
    pub fn combine(&self, tags: impl IntoIterator<Item = Tag>) -> Tag {
        let mut filtered = Vec::new();
        for tag in tags {
            match &tag.0 {
                RawTag::Constant => {}
                RawTag::Volatile => return Tag::volatile(),
                _ => filtered.push(tag),
            }
        }
        match filtered.len() {
            0 => Tag::constant(),
            1 => filtered.pop().unwrap(),
            2 => {
                let second = filtered.pop().unwrap();
                let first = filtered.pop().unwrap();
                Tag(RawTag::Pair(Rc::new(PairNode {
                    first,
                    second,
                    memo: TagMemo::new(self.clone()),
                })))
            }
            _ => Tag(RawTag::Combined(Rc::new(CombinedNode {
                children: filtered,
                memo: TagMemo::new(self.clone()),
            }))),
        }
    }
}
