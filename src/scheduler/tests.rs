use super::*;
use assert_call::{call, CallRecorder};

fn destroyable() -> Destroyable {
    crate::destroy::DestroyRegistry::new(ImmediateScheduler).create()
}

#[test]
fn flush_reports_whether_anything_ran() {
    let scheduler = QueueScheduler::new();
    assert!(!scheduler.flush());
    scheduler.schedule_destroyed(DestroyedNotice::new(|| {}));
    assert!(scheduler.flush());
    assert!(!scheduler.flush());
}

#[test]
fn flush_runs_destructors_before_notices() {
    let mut cr = CallRecorder::new();
    let scheduler = QueueScheduler::new();
    let d = destroyable();
    scheduler.schedule_destroyed(DestroyedNotice::new(|| call!("notice")));
    scheduler.schedule_destroy(d, Destructor::new(|_| call!("destructor")));
    scheduler.flush();
    cr.verify(["destructor", "notice"]);
}

#[test]
fn flush_is_fifo_within_a_queue() {
    let mut cr = CallRecorder::new();
    let scheduler = QueueScheduler::new();
    let d = destroyable();
    scheduler.schedule_destroy(d, Destructor::new(|_| call!("1")));
    scheduler.schedule_destroy(d, Destructor::new(|_| call!("2")));
    scheduler.schedule_destroy(d, Destructor::new(|_| call!("3")));
    scheduler.flush();
    cr.verify(["1", "2", "3"]);
}

#[test]
fn work_scheduled_mid_flush_runs_in_the_same_flush() {
    let mut cr = CallRecorder::new();
    let scheduler = QueueScheduler::new();
    let d = destroyable();
    scheduler.schedule_destroy(d, {
        let scheduler = scheduler.clone();
        Destructor::new(move |target| {
            call!("outer");
            scheduler.schedule_destroy(target, Destructor::new(|_| call!("inner")));
        })
    });
    assert!(scheduler.flush());
    cr.verify(["outer", "inner"]);
    assert!(scheduler.is_empty());
}

#[test]
fn is_empty_tracks_both_queues() {
    let scheduler = QueueScheduler::new();
    assert!(scheduler.is_empty());
    scheduler.schedule_destroyed(DestroyedNotice::new(|| {}));
    assert!(!scheduler.is_empty());
    scheduler.flush();
    assert!(scheduler.is_empty());
}
