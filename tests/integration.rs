//! End-to-end scenarios across systems, shapes, queries, and snapshots.

use granite::{
    AllHitCollector, BodyCreationSettings, Error, MotionType, PhysicsSystem,
    PhysicsSystemSettings, SphereShapeSettings, StateRecorder, StreamOut, TempAllocatorMalloc,
};

#[test]
fn test_simulation_round_trip() {
    let system = PhysicsSystem::new(&PhysicsSystemSettings::default()).unwrap();

    let settings = SphereShapeSettings::new(0.5).unwrap();
    let mut result = settings.create().unwrap();
    assert!(!result.has_error());
    let shape = result.get().unwrap();

    let bodies = system.body_interface();

    let mut falling = BodyCreationSettings::new(&shape).unwrap();
    falling.position = [0.0, 2.0, 0.0];
    falling.motion_type = MotionType::Dynamic;
    let falling = bodies.create_and_add_body(&falling).unwrap();

    let mut floor = BodyCreationSettings::new(&shape).unwrap();
    floor.position = [0.0, -1.0, 0.0];
    let floor = bodies.create_and_add_body(&floor).unwrap();

    assert!(bodies.is_added(falling).unwrap());
    assert!(bodies.is_added(floor).unwrap());

    let temp = TempAllocatorMalloc::new().unwrap();
    let before = bodies.position(falling).unwrap();
    system.update(0.1, &temp).unwrap();
    let after = bodies.position(falling).unwrap();
    assert!(after[1] < before[1], "dynamic body must fall");

    let floor_pos = bodies.position(floor).unwrap();
    assert_eq!(floor_pos, [0.0, -1.0, 0.0], "static body must not move");

    let mut collector = AllHitCollector::new().unwrap();
    system
        .broad_phase_query()
        .collide_point(after, &mut collector)
        .unwrap();
    assert_eq!(collector.hits().len(), 1);
    assert_eq!(collector.hits()[0].body, falling);

    bodies.remove_and_destroy_body(falling).unwrap();
    assert!(!bodies.is_added(falling).unwrap());
    let err = bodies.position(falling).unwrap_err();
    assert!(matches!(err, Error::Native(_)), "expected Native, got {err:?}");
}

#[test]
fn test_body_capacity_exceeded() {
    let system = PhysicsSystem::new(&PhysicsSystemSettings { max_bodies: 2 }).unwrap();
    let settings = SphereShapeSettings::new(0.5).unwrap();
    let mut result = settings.create().unwrap();
    let shape = result.get().unwrap();
    let bodies = system.body_interface();

    let creation = BodyCreationSettings::new(&shape).unwrap();
    bodies.create_and_add_body(&creation).unwrap();
    bodies.create_and_add_body(&creation).unwrap();

    let err = bodies.create_and_add_body(&creation).unwrap_err();
    assert!(
        matches!(&err, Error::Native(msg) if msg.contains("capacity")),
        "expected capacity error, got {err:?}"
    );
}

#[test]
fn test_body_view_accessor() {
    let system = PhysicsSystem::new(&PhysicsSystemSettings::default()).unwrap();
    let settings = SphereShapeSettings::new(0.5).unwrap();
    let mut result = settings.create().unwrap();
    let shape = result.get().unwrap();
    let bodies = system.body_interface();

    let mut creation = BodyCreationSettings::new(&shape).unwrap();
    creation.position = [1.0, 2.0, 3.0];
    let id = bodies.create_and_add_body(&creation).unwrap();

    let body = bodies.body(id);
    assert_eq!(body.id(), id);
    assert!(body.is_added().unwrap());
    assert_eq!(body.position().unwrap(), [1.0, 2.0, 3.0]);
}

#[test]
fn test_save_state_snapshot_layout() {
    let system = PhysicsSystem::new(&PhysicsSystemSettings::default()).unwrap();
    let settings = SphereShapeSettings::new(0.5).unwrap();
    let mut result = settings.create().unwrap();
    let shape = result.get().unwrap();
    let bodies = system.body_interface();

    let mut a = BodyCreationSettings::new(&shape).unwrap();
    a.position = [1.0, 0.0, 0.0];
    let a = bodies.create_and_add_body(&a).unwrap();
    let mut b = BodyCreationSettings::new(&shape).unwrap();
    b.position = [0.0, 5.0, 0.0];
    let b = bodies.create_and_add_body(&b).unwrap();

    let mut recorder = StateRecorder::new().unwrap();
    system.save_state(&mut recorder).unwrap();
    let data = recorder.data().unwrap();

    assert_eq!(data.len(), 4 + 2 * 16);
    let count = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    assert_eq!(count, 2);

    // Entries come in body id order.
    let first_id = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    let second_id = u32::from_le_bytes([data[20], data[21], data[22], data[23]]);
    assert_eq!(first_id, a.0);
    assert_eq!(second_id, b.0);

    let first_x = f32::from_le_bytes([data[8], data[9], data[10], data[11]]);
    assert_eq!(first_x, 1.0);
    let second_y = f32::from_le_bytes([data[28], data[29], data[30], data[31]]);
    assert_eq!(second_y, 5.0);
}

#[test]
fn test_stream_out_encoding() {
    let mut stream = StreamOut::new().unwrap();
    stream.write_int(-7).unwrap();
    stream.write_float(1.5).unwrap();
    stream.write_bytes(b"gr").unwrap();

    let data = stream.data().unwrap();
    assert_eq!(&data[0..4], &(-7i32).to_le_bytes());
    assert_eq!(&data[4..8], &1.5f32.to_le_bytes());
    assert_eq!(&data[8..], b"gr");

    let mut stream = stream;
    stream.close().unwrap();
    assert!(stream.data().is_err());
}

#[test]
fn test_shape_outlives_creator_through_bodies() {
    let system = PhysicsSystem::new(&PhysicsSystemSettings::default()).unwrap();
    let bodies = system.body_interface();

    let id = {
        let settings = SphereShapeSettings::new(0.5).unwrap();
        let mut result = settings.create().unwrap();
        let shape = result.get().unwrap();
        let creation = BodyCreationSettings::new(&shape).unwrap();
        bodies.create_and_add_body(&creation).unwrap()
        // settings, result, and shape wrappers all drop here
    };

    // The body still answers queries, so its shape is still alive.
    let mut collector = AllHitCollector::new().unwrap();
    system
        .broad_phase_query()
        .collide_point([0.0, 0.0, 0.0], &mut collector)
        .unwrap();
    assert_eq!(collector.hits().len(), 1);
    assert_eq!(collector.hits()[0].body, id);
}

#[test]
fn test_engine_version() {
    assert_eq!(granite::engine_version(), "0.1.0");
}
