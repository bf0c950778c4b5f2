use super::*;
use crate::clock::Clock;
use std::{cell::Cell, rc::Rc};

#[test]
fn value_computes_once_until_invalidated() {
    let clock = Clock::new();
    let tag = clock.dirty_tag();
    let count = Rc::new(Cell::new(0));
    let mut reference = CachedReference::new(tag.tag(), {
        let count = count.clone();
        move || {
            count.set(count.get() + 1);
            count.get()
        }
    });

    assert_eq!(*reference.value(), 1);
    assert_eq!(*reference.value(), 1);
    assert_eq!(count.get(), 1);

    tag.dirty();
    assert_eq!(*reference.value(), 2);
    assert_eq!(*reference.value(), 2);
    assert_eq!(count.get(), 2);
}

#[test]
fn constant_reference_computes_exactly_once() {
    let count = Rc::new(Cell::new(0));
    let mut reference = CachedReference::new(Tag::constant(), {
        let count = count.clone();
        move || {
            count.set(count.get() + 1);
        }
    });
    reference.value();
    reference.value();
    assert_eq!(count.get(), 1);
}

#[test]
fn volatile_reference_computes_every_read() {
    let count = Rc::new(Cell::new(0));
    let mut reference = CachedReference::new(Tag::volatile(), {
        let count = count.clone();
        move || {
            count.set(count.get() + 1);
        }
    });
    reference.value();
    reference.value();
    reference.value();
    assert_eq!(count.get(), 3);
}

#[test]
fn unrelated_dirty_does_not_recompute() {
    let clock = Clock::new();
    let tag = clock.dirty_tag();
    let other = clock.dirty_tag();
    let count = Rc::new(Cell::new(0));
    let mut reference = CachedReference::new(tag.tag(), {
        let count = count.clone();
        move || count.set(count.get() + 1)
    });
    reference.value();
    other.dirty();
    reference.value();
    assert_eq!(count.get(), 1);
}

#[test]
fn revalidate_reports_not_modified_while_valid() {
    let clock = Clock::new();
    let tag = clock.dirty_tag();
    let source = Rc::new(Cell::new(10));
    let mut cache = ReferenceCache::new(tag.tag(), {
        let source = source.clone();
        move || source.get()
    });

    assert_eq!(*cache.peek(), 10);
    assert!(matches!(cache.revalidate(), Revalidated::NotModified));
}

#[test]
fn revalidate_suppresses_equal_recomputation() {
    let clock = Clock::new();
    let tag = clock.dirty_tag();
    let source = Rc::new(Cell::new(10));
    let mut cache = ReferenceCache::new(tag.tag(), {
        let source = source.clone();
        move || source.get()
    });

    cache.peek();
    // The tag says "changed" but the value is the same.
    tag.dirty();
    assert!(matches!(cache.revalidate(), Revalidated::NotModified));
}

#[test]
fn revalidate_reports_changed_values() {
    let clock = Clock::new();
    let tag = clock.dirty_tag();
    let source = Rc::new(Cell::new(10));
    let mut cache = ReferenceCache::new(tag.tag(), {
        let source = source.clone();
        move || source.get()
    });

    cache.peek();
    source.set(20);
    tag.dirty();
    match cache.revalidate() {
        Revalidated::Changed(value) => assert_eq!(*value, 20),
        Revalidated::NotModified => panic!("expected a change"),
    }
}

#[test]
fn first_revalidate_reports_the_initial_value() {
    let clock = Clock::new();
    let tag = clock.dirty_tag();
    let mut cache = ReferenceCache::new(tag.tag(), || 7);
    match cache.revalidate() {
        Revalidated::Changed(value) => assert_eq!(*value, 7),
        Revalidated::NotModified => panic!("expected a change"),
    }
}

#[test]
fn peek_never_suppresses() {
    let clock = Clock::new();
    let tag = clock.dirty_tag();
    let source = Rc::new(Cell::new(1));
    let mut cache = ReferenceCache::new(tag.tag(), {
        let source = source.clone();
        move || source.get()
    });
    assert_eq!(*cache.peek(), 1);
    tag.dirty();
    assert_eq!(*cache.peek(), 1);
    source.set(2);
    tag.dirty();
    assert_eq!(*cache.peek(), 2);
}
