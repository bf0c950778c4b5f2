// #![include_doc("../README.md", start)]
//! # tagdrop
//!
//! `tagdrop` is a revision-tag invalidation kernel paired with a destroyable
//! lifecycle registry, designed to be used as the core of incremental-computation
//! and UI runtimes.
//!
//! It answers two questions that recur in any incremental system:
//!
//! - "Has anything this cached value depends on changed since I last computed it?"
//! - "In what order, and exactly once, do I tear down a graph of interdependent
//!   resources?"
//!
//! ## Features
//!
//! - Revision tags with a constant/volatile/dirtyable/updatable/combinator algebra
//! - O(1) amortized validation: combinators memoize per clock generation
//! - Cached references with early cutoff (`NotModified` change suppression)
//! - Automatic dependency tracking (`TrackedCell`, `Memo`)
//! - Ordered, exactly-once destruction of parent/child graphs, with eager and
//!   scheduled destructors and host-controlled flushing
//! - Easy-to-use single-threaded model
//! - Debug-build leak detection for destroyables
//!
//! ## Invalidation
//!
//! State changes are recorded as revisions of a `Clock`; reads are tracked and
//! recomputation happens only when a dependency actually changed:
//!
//! ```rust
//! use tagdrop::{Clock, Memo, TrackedCell};
//!
//! let clock = Clock::new();
//!
//! let a = TrackedCell::new(&clock, 1);
//! let b = TrackedCell::new(&clock, 2);
//! let mut sum = Memo::new(&clock, {
//!     let a = a.clone();
//!     let b = b.clone();
//!     move || a.get() + b.get()
//! });
//!
//! assert_eq!(*sum.value(), 3);
//!
//! a.set(10);
//! assert_eq!(*sum.value(), 12);
//! ```
//!
//! ## Teardown
//!
//! Destroyables form a graph; destroying a node marks its whole subtree
//! synchronously, while the destructors themselves run when the host flushes,
//! children strictly before parents and each exactly once:
//!
//! ```rust
//! use tagdrop::{DestroyRegistry, QueueScheduler};
//!
//! let scheduler = QueueScheduler::new();
//! let registry = DestroyRegistry::new(scheduler.clone());
//!
//! let parent = registry.create();
//! let child = registry.create();
//! registry.associate_child(parent, child).unwrap();
//! registry.register_destructor(child, |_| println!("child torn down")).unwrap();
//! registry.register_destructor(parent, |_| println!("parent torn down")).unwrap();
//!
//! registry.destroy(parent);
//! assert!(registry.is_destroying(child));
//!
//! scheduler.flush(); // prints "child torn down", then "parent torn down"
//! assert!(registry.is_destroyed(parent));
//! ```
//!
//! The scheduler is an injected capability: hosts with a run loop batch
//! destruction into their own queues, tests use `QueueScheduler` and flush
//! deterministically, and `ImmediateScheduler` collapses everything to
//! synchronous execution.
//!
//! ## License
//!
//! This project is dual licensed under Apache-2.0/MIT. See the two LICENSE-\* files for details.
//!
//! ## Contribution
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.
// #![include_doc("../README.md", end)]
