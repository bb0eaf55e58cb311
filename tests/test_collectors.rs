//! Collector and broad phase query tests.

use granite::{
    AllHitCollector, AnyHitCollector, BodyCreationSettings, BodyId, BroadPhaseHit,
    ClosestHitCollector, Collector, CollectorBase, Error, PhysicsSystem, PhysicsSystemSettings,
    Result, Shape, SphereShapeSettings,
};

fn unit_sphere() -> Shape {
    let settings = SphereShapeSettings::new(1.0).unwrap();
    let mut result = settings.create().unwrap();
    result.get().unwrap()
}

/// System with unit spheres at x = 0.0, 0.5, and 10.0.
fn test_world() -> (PhysicsSystem, Vec<BodyId>) {
    let system = PhysicsSystem::new(&PhysicsSystemSettings::default()).unwrap();
    let shape = unit_sphere();
    let bodies = system.body_interface();
    let ids = [0.0f32, 0.5, 10.0]
        .iter()
        .map(|x| {
            let mut settings = BodyCreationSettings::new(&shape).unwrap();
            settings.position = [*x, 0.0, 0.0];
            bodies.create_and_add_body(&settings).unwrap()
        })
        .collect();
    (system, ids)
}

#[test]
fn test_all_hits_in_body_order() {
    let (system, ids) = test_world();
    let mut collector = AllHitCollector::new().unwrap();

    system
        .broad_phase_query()
        .collide_point([0.25, 0.0, 0.0], &mut collector)
        .unwrap();

    let hits: Vec<BodyId> = collector.hits().iter().map(|h| h.body).collect();
    assert_eq!(hits, vec![ids[0], ids[1]], "far body must not be reported");
    assert!(!collector.base().had_early_out().unwrap());
}

#[test]
fn test_closest_hit_wins_by_fraction() {
    let (system, ids) = test_world();
    let mut collector = ClosestHitCollector::new().unwrap();

    system
        .broad_phase_query()
        .collide_point([0.4, 0.0, 0.0], &mut collector)
        .unwrap();

    let closest = collector.closest().expect("point overlaps two bodies");
    assert_eq!(closest.body, ids[1], "body at x=0.5 is nearer to x=0.4");
}

#[test]
fn test_any_hit_stops_early() {
    let (system, ids) = test_world();
    let mut collector = AnyHitCollector::new().unwrap();

    system
        .broad_phase_query()
        .collide_point([0.25, 0.0, 0.0], &mut collector)
        .unwrap();

    assert_eq!(collector.hit().map(|h| h.body), Some(ids[0]));
    assert!(
        collector.base().had_early_out().unwrap(),
        "early-out must stay observable after the query"
    );
}

#[test]
fn test_reset_rearms_collector() {
    let (system, _ids) = test_world();
    let mut collector = AnyHitCollector::new().unwrap();
    let query = system.broad_phase_query();

    query.collide_point([0.25, 0.0, 0.0], &mut collector).unwrap();
    assert!(collector.hit().is_some());

    collector.reset().unwrap();
    assert!(collector.hit().is_none());
    assert!(!collector.base().had_early_out().unwrap());

    query.collide_point([0.25, 0.0, 0.0], &mut collector).unwrap();
    assert!(collector.hit().is_some());
}

#[test]
fn test_collide_sphere_reaches_farther() {
    let (system, ids) = test_world();
    let mut collector = AllHitCollector::new().unwrap();

    system
        .broad_phase_query()
        .collide_sphere([6.0, 0.0, 0.0], 3.5, &mut collector)
        .unwrap();

    let hits: Vec<BodyId> = collector.hits().iter().map(|h| h.body).collect();
    assert_eq!(hits, vec![ids[2]]);
}

struct RefusingCollector {
    base: CollectorBase,
    calls: usize,
}

impl Collector<BroadPhaseHit> for RefusingCollector {
    fn base(&self) -> &CollectorBase {
        &self.base
    }

    fn add_hit(&mut self, _hit: BroadPhaseHit) -> Result<()> {
        self.calls += 1;
        Err(Error::InvalidState("collector refused the hit".into()))
    }

    fn reset(&mut self) -> Result<()> {
        self.calls = 0;
        self.base.reset()
    }
}

#[test]
fn test_add_hit_error_resurfaces_from_query() {
    let (system, _ids) = test_world();
    let mut collector = RefusingCollector {
        base: CollectorBase::new().unwrap(),
        calls: 0,
    };

    let err = system
        .broad_phase_query()
        .collide_point([0.25, 0.0, 0.0], &mut collector)
        .unwrap_err();

    assert!(err.is_invalid_state(), "expected InvalidState, got {err:?}");
    assert_eq!(collector.calls, 1, "query must stop after the failing hit");
    assert!(collector.base().had_early_out().unwrap());
}
