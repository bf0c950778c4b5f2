use crate::{clock::Revision, tag::Tag};

#[cfg(test)]
mod tests;

/// Memoized computation guarded by a tag.
///
/// `compute` must be a pure function of the state the tag covers: it runs at
/// most once per tag generation change, never speculatively.
pub struct CachedReference<T, F: FnMut() -> T> {
    tag: Tag,
    compute: F,
    last: Option<(Revision, T)>,
}

impl<T, F: FnMut() -> T> CachedReference<T, F> {
    pub fn new(tag: Tag, compute: F) -> Self {
        Self {
            tag,
            compute,
            last: None,
        }
    }

    /// The tag guarding this reference.
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Returns the cached value, recomputing only on first use or when the
    /// tag no longer validates the snapshot taken at the previous
    /// computation.
    pub fn value(&mut self) -> &T {
        let stale = match &self.last {
            Some((revision, _)) => !self.tag.validate(*revision),
            None => true,
        };
        if stale {
            let value = (self.compute)();
            self.last = Some((self.tag.value(), value));
        }
        match &self.last {
            Some((_, value)) => value,
            None => unreachable!(),
        }
    }
}

/// Result of [`ReferenceCache::revalidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revalidated<T> {
    /// The value is unchanged; downstream work keyed on it can be skipped.
    NotModified,
    /// The value changed since the previous read.
    Changed(T),
}

impl<T> Revalidated<T> {
    pub fn is_modified(&self) -> bool {
        matches!(self, Revalidated::Changed(_))
    }
}

/// Revalidation cursor over a tagged computation.
///
/// On top of [`CachedReference`]'s recomputation rule, `revalidate` suppresses
/// propagation when the recomputed value compares equal to the previous one,
/// so callers driving downstream work can skip it.
pub struct ReferenceCache<T: PartialEq, F: FnMut() -> T> {
    tag: Tag,
    compute: F,
    last: Option<(Revision, T)>,
}

impl<T: PartialEq, F: FnMut() -> T> ReferenceCache<T, F> {
    pub fn new(tag: Tag, compute: F) -> Self {
        Self {
            tag,
            compute,
            last: None,
        }
    }

    /// The tag guarding this cache.
    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    /// Reads the value without the change-suppression protocol, recomputing
    /// when stale. Used for the first read.
    pub fn peek(&mut self) -> &T {
        if self.is_stale() {
            self.recompute();
        }
        match &self.last {
            Some((_, value)) => value,
            None => unreachable!(),
        }
    }

    /// Recomputes when the tag no longer validates, reporting whether the
    /// value actually changed.
    pub fn revalidate(&mut self) -> Revalidated<&T> {
        if !self.is_stale() {
            return Revalidated::NotModified;
        }
        let changed = self.recompute();
        match (&self.last, changed) {
            (Some((_, value)), true) => Revalidated::Changed(value),
            (Some(_), false) => Revalidated::NotModified,
            (None, _) => unreachable!(),
        }
    }

    fn is_stale(&self) -> bool {
        match &self.last {
            Some((revision, _)) => !self.tag.validate(*revision),
            None => true,
        }
    }

    /// Returns `true` if the freshly computed value differs from the cached
    /// one.
    fn recompute(&mut self) -> bool {
        let value = (self.compute)();
        let revision = self.tag.value();
        let changed = match &self.last {
            Some((_, old)) => *old != value,
            None => true,
        };
        self.last = Some((revision, value));
        changed
    }
}
