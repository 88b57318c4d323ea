//! Racing decisions on a shared engine.

use std::sync::{Arc, Barrier};
use std::thread;

use libsignoff::{Engine, ErrorKind, MemoryStore, NewTask, Policy, Status};

#[test]
fn test_racing_approvals_for_one_approver() {
    let engine = Arc::new(Engine::new(MemoryStore::new(), Policy::default()));
    let task = engine
        .create_task(NewTask::new("t", "d", "r").approvers(["a", "b"]))
        .unwrap();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            let id = task.id.clone();
            thread::spawn(move || {
                barrier.wait();
                if i % 2 == 0 {
                    engine.approve_task(&id, "a").map(|_| ())
                } else {
                    engine.reject_task(&id, "a", None).map(|_| ())
                }
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| e.kind() == ErrorKind::Conflict));

    let task = engine.get_task(&task.id).unwrap();
    assert_eq!(task.approved_by().len() + task.rejected_by().len(), 1);
}

#[test]
fn test_readers_see_whole_fan_out() {
    let engine = Arc::new(Engine::new(MemoryStore::new(), Policy::default()));
    let writer = {
        let engine = engine.clone();
        thread::spawn(move || {
            for _ in 0..50 {
                engine
                    .create_task(NewTask::new("t", "d", "r").approvers(["a", "b", "c"]))
                    .unwrap();
            }
        })
    };

    for _ in 0..50 {
        let stats = engine.stats().unwrap();
        assert_eq!(stats.approvals.total, stats.tasks.total * 3);
        assert_eq!(stats.tasks.pending, stats.tasks.total);
        assert_eq!(stats.approvals.pending, stats.approvals.total);
    }
    writer.join().unwrap();

    let stats = engine.stats().unwrap();
    assert_eq!(stats.tasks.total, 50);
    assert!(engine
        .list_tasks()
        .unwrap()
        .iter()
        .all(|t| t.status() == Status::Pending));
}
