//! Mutex and body lock tests.

use granite::{
    BodyCreationSettings, BodyId, LockMode, Mutex, PhysicsSystem, PhysicsSystemSettings,
    SphereShapeSettings,
};

fn world_with_bodies(count: usize) -> (PhysicsSystem, Vec<BodyId>) {
    let system = PhysicsSystem::new(&PhysicsSystemSettings::default()).unwrap();
    let settings = SphereShapeSettings::new(1.0).unwrap();
    let mut result = settings.create().unwrap();
    let shape = result.get().unwrap();
    let bodies = system.body_interface();
    let ids = (0..count)
        .map(|_| {
            let settings = BodyCreationSettings::new(&shape).unwrap();
            bodies.create_and_add_body(&settings).unwrap()
        })
        .collect();
    (system, ids)
}

#[test]
fn test_mutex_lock_unlock() {
    let mutex = Mutex::new().unwrap();
    mutex.lock().unwrap();
    mutex.unlock().unwrap();

    let err = mutex.unlock().unwrap_err();
    assert!(err.is_lock_misuse(), "expected LockMisuse, got {err:?}");
}

#[test]
fn test_mutex_try_lock() {
    let mutex = Mutex::new().unwrap();
    assert!(mutex.try_lock().unwrap());
    assert!(!mutex.try_lock().unwrap(), "second try must fail while held");
    mutex.unlock().unwrap();
    assert!(mutex.try_lock().unwrap());
    mutex.unlock().unwrap();
}

#[test]
fn test_closed_mutex_rejects_lock() {
    let mut mutex = Mutex::new().unwrap();
    mutex.close().unwrap();
    assert!(mutex.lock().is_err());
}

#[test]
fn test_shared_read_locks_coexist() {
    let (system, ids) = world_with_bodies(1);
    let locks = system.body_lock_interface();

    let a = locks.lock_read(ids[0]).unwrap();
    let b = locks.lock_read(ids[0]).unwrap();
    assert_eq!(a.mode(), LockMode::Read);
    assert_eq!(b.body(), ids[0]);

    locks.unlock_read(a).unwrap();
    locks.unlock_read(b).unwrap();
}

#[test]
fn test_write_lock_round_trip() {
    let (system, ids) = world_with_bodies(1);
    let locks = system.body_lock_interface();

    let w = locks.lock_write(ids[0]).unwrap();
    assert_eq!(w.mode(), LockMode::Write);
    locks.unlock_write(w).unwrap();

    // The body is lockable again once the write lock is gone.
    let r = locks.lock_read(ids[0]).unwrap();
    locks.unlock_read(r).unwrap();
}

#[test]
fn test_mismatched_unlock_reports_misuse_but_releases() {
    let (system, ids) = world_with_bodies(1);
    let locks = system.body_lock_interface();

    let w = locks.lock_write(ids[0]).unwrap();
    let err = locks.unlock_read(w).unwrap_err();
    assert!(err.is_lock_misuse(), "expected LockMisuse, got {err:?}");

    // The consumed lock was still released in its true mode.
    let w = locks.lock_write(ids[0]).unwrap();
    locks.unlock_write(w).unwrap();
}

#[test]
fn test_lock_drop_releases() {
    let (system, ids) = world_with_bodies(1);
    let locks = system.body_lock_interface();

    {
        let _w = locks.lock_write(ids[0]).unwrap();
    }
    let w = locks.lock_write(ids[0]).unwrap();
    locks.unlock_write(w).unwrap();
}

#[test]
fn test_read_lock_rejects_writes() {
    let (system, ids) = world_with_bodies(1);
    let locks = system.body_lock_interface();

    let r = locks.lock_read(ids[0]).unwrap();
    assert_eq!(r.position().unwrap(), [0.0, 0.0, 0.0]);
    let err = r.set_position([1.0, 0.0, 0.0]).unwrap_err();
    assert!(err.is_lock_misuse(), "expected LockMisuse, got {err:?}");
    locks.unlock_read(r).unwrap();

    let w = locks.lock_write(ids[0]).unwrap();
    w.set_position([1.0, 0.0, 0.0]).unwrap();
    assert_eq!(w.position().unwrap(), [1.0, 0.0, 0.0]);
    locks.unlock_write(w).unwrap();

    let bodies = system.body_interface();
    assert_eq!(bodies.position(ids[0]).unwrap(), [1.0, 0.0, 0.0]);
}

#[test]
fn test_multi_lock_with_missing_body() {
    let (system, ids) = world_with_bodies(2);
    let bodies = system.body_interface();
    let locks = system.body_lock_interface();

    bodies.remove_and_destroy_body(ids[1]).unwrap();

    let mut batch = locks.lock_read_multi(&[ids[0], ids[1]]).unwrap();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch.get_body(0), Some(ids[0]));
    assert_eq!(batch.get_body(1), None, "destroyed body leaves an empty slot");

    batch.release_locks().unwrap();

    // Everything is released; the surviving body locks again.
    let w = locks.lock_write(ids[0]).unwrap();
    locks.unlock_write(w).unwrap();
}

#[test]
fn test_multi_write_lock_round_trip() {
    let (system, ids) = world_with_bodies(3);
    let locks = system.body_lock_interface();

    let mut batch = locks.lock_write_multi(&ids).unwrap();
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(batch.get_body(i), Some(*id));
        assert_eq!(batch.lock(i).map(|l| l.mode()), Some(LockMode::Write));
    }
    batch.release_locks().unwrap();
}
