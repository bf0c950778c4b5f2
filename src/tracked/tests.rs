use super::*;
use std::{cell::Cell, rc::Rc};

#[test]
fn get_and_set() {
    let clock = Clock::new();
    let cell = TrackedCell::new(&clock, 10);
    assert_eq!(cell.get(), 10);
    cell.set(20);
    assert_eq!(cell.get(), 20);
}

#[test]
fn replace_returns_the_old_value() {
    let clock = Clock::new();
    let cell = TrackedCell::new(&clock, 1);
    assert_eq!(cell.replace(2), 1);
    assert_eq!(cell.get(), 2);
}

#[test]
fn set_invalidates_the_tag() {
    let clock = Clock::new();
    let cell = TrackedCell::new(&clock, 0);
    let tag = cell.tag();
    let snapshot = tag.value();
    cell.set(1);
    assert!(!tag.validate(snapshot));
}

#[test]
fn set_eq_skips_equal_values() {
    let clock = Clock::new();
    let cell = TrackedCell::new(&clock, 5);
    let tag = cell.tag();
    let snapshot = tag.value();
    cell.set_eq(5);
    assert!(tag.validate(snapshot));
    cell.set_eq(6);
    assert!(!tag.validate(snapshot));
    assert_eq!(cell.get(), 6);
}

#[test]
fn reads_consume_into_the_open_frame() {
    let clock = Clock::new();
    let cell = TrackedCell::new(&clock, 1);
    let (_, tag) = clock.track(|| cell.get());
    let snapshot = tag.value();
    cell.set(2);
    assert!(!tag.validate(snapshot));
}

#[test]
fn memo_caches_until_a_dependency_changes() {
    let clock = Clock::new();
    let cell = TrackedCell::new(&clock, 2);
    let count = Rc::new(Cell::new(0));
    let mut doubled = Memo::new(&clock, {
        let cell = cell.clone();
        let count = count.clone();
        move || {
            count.set(count.get() + 1);
            cell.get() * 2
        }
    });

    assert_eq!(*doubled.value(), 4);
    assert_eq!(*doubled.value(), 4);
    assert_eq!(count.get(), 1);

    cell.set(3);
    assert_eq!(*doubled.value(), 6);
    assert_eq!(count.get(), 2);
}

#[test]
fn memo_with_no_dependencies_computes_once() {
    let clock = Clock::new();
    let count = Rc::new(Cell::new(0));
    let mut memo = Memo::new(&clock, {
        let count = count.clone();
        move || {
            count.set(count.get() + 1);
            7
        }
    });
    assert_eq!(*memo.value(), 7);
    // Unrelated clock activity does not invalidate a constant memo.
    clock.dirty_tag().dirty();
    assert_eq!(*memo.value(), 7);
    assert_eq!(count.get(), 1);
}

#[test]
fn memo_retracks_dependencies_each_computation() {
    let clock = Clock::new();
    let flag = TrackedCell::new(&clock, true);
    let a = TrackedCell::new(&clock, 1);
    let b = TrackedCell::new(&clock, 100);
    let count = Rc::new(Cell::new(0));
    let mut memo = Memo::new(&clock, {
        let flag = flag.clone();
        let a = a.clone();
        let b = b.clone();
        let count = count.clone();
        move || {
            count.set(count.get() + 1);
            if flag.get() {
                a.get()
            } else {
                b.get()
            }
        }
    });

    assert_eq!(*memo.value(), 1);
    flag.set(false);
    assert_eq!(*memo.value(), 100);
    assert_eq!(count.get(), 2);

    // `a` is no longer a dependency.
    a.set(2);
    assert_eq!(*memo.value(), 100);
    assert_eq!(count.get(), 2);

    b.set(200);
    assert_eq!(*memo.value(), 200);
    assert_eq!(count.get(), 3);
}

#[test]
fn nested_memo_invalidates_outer() {
    let clock = Clock::new();
    let cell = TrackedCell::new(&clock, 1);
    let inner = Rc::new(RefCell::new(Memo::new(&clock, {
        let cell = cell.clone();
        move || cell.get() + 1
    })));
    let mut outer = Memo::new(&clock, {
        let inner = inner.clone();
        move || *inner.borrow_mut().value() * 10
    });

    assert_eq!(*outer.value(), 20);
    cell.set(5);
    assert_eq!(*outer.value(), 60);
}

#[test]
fn untracked_reads_do_not_become_dependencies() {
    let clock = Clock::new();
    let tracked = TrackedCell::new(&clock, 1);
    let untracked = TrackedCell::new(&clock, 10);
    let count = Rc::new(Cell::new(0));
    let mut memo = Memo::new(&clock, {
        let clock = clock.clone();
        let tracked = tracked.clone();
        let untracked = untracked.clone();
        let count = count.clone();
        move || {
            count.set(count.get() + 1);
            tracked.get() + clock.untrack(|| untracked.get())
        }
    });

    assert_eq!(*memo.value(), 11);
    untracked.set(20);
    assert_eq!(*memo.value(), 11);
    assert_eq!(count.get(), 1);

    tracked.set(2);
    assert_eq!(*memo.value(), 22);
    assert_eq!(count.get(), 2);
}
