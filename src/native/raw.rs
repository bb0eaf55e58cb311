//! Engine call surface, one function per operation.
//!
//! Every function validates the incoming address against the object table
//! and fails with a `RawError` code instead of touching freed memory.
//! Users should prefer the safe Rust wrappers in the parent modules.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::lock_api::{RawMutex as _, RawRwLock as _};
use parking_lot::Mutex;

use super::error::RawError;
use super::handles::*;
use super::heap::{
    heap, new_raw_mutex, new_raw_rwlock, BodyLockState, BodyState, CountedRefState, MutexState,
    Object, ResultInner, ResultState, SettingsState, ShapeDesc, ShapeState, ShimState, StreamState,
    SystemState,
};

// Collector shim states
pub const GR_COLLECT_IDLE: u8 = 0;
pub const GR_COLLECT_ACTIVE: u8 = 1;
pub const GR_COLLECT_EARLY_OUT: u8 = 2;

// Motion qualities
pub const GR_MOTION_STATIC: i32 = 0;
pub const GR_MOTION_KINEMATIC: i32 = 1;
pub const GR_MOTION_DYNAMIC: i32 = 2;

// Shape kinds
pub const GR_SHAPE_SPHERE: i32 = 0;
pub const GR_SHAPE_BOX: i32 = 1;

const GRAVITY: f32 = 9.81;

fn lookup(va: u64) -> Result<Object, RawError> {
    if va == 0 {
        return Err(RawError::InvalidHandle);
    }
    heap().get(va).ok_or(RawError::InvalidHandle)
}

fn with_system(h: GrSystem) -> Result<Arc<SystemState>, RawError> {
    match lookup(h.raw())? {
        Object::System(s) => Ok(s),
        _ => Err(RawError::WrongKind),
    }
}

fn with_shape(h: GrShape) -> Result<Arc<ShapeState>, RawError> {
    match lookup(h.raw())? {
        Object::Shape(s) => Ok(s),
        _ => Err(RawError::WrongKind),
    }
}

fn with_settings(h: GrShapeSettings) -> Result<Arc<SettingsState>, RawError> {
    match lookup(h.raw())? {
        Object::ShapeSettings(s) => Ok(s),
        _ => Err(RawError::WrongKind),
    }
}

fn with_result(h: GrResult) -> Result<Arc<ResultState>, RawError> {
    match lookup(h.raw())? {
        Object::CreationResult(r) => Ok(r),
        _ => Err(RawError::WrongKind),
    }
}

fn with_collector(h: GrCollector) -> Result<Arc<ShimState>, RawError> {
    match lookup(h.raw())? {
        Object::Collector(c) => Ok(c),
        _ => Err(RawError::WrongKind),
    }
}

fn with_mutex(h: GrMutex) -> Result<Arc<MutexState>, RawError> {
    match lookup(h.raw())? {
        Object::Mutex(m) => Ok(m),
        _ => Err(RawError::WrongKind),
    }
}

fn with_stream(h: GrStream) -> Result<Arc<StreamState>, RawError> {
    match lookup(h.raw())? {
        Object::Stream(s) => Ok(s),
        _ => Err(RawError::WrongKind),
    }
}

fn with_ref_cell(h: GrRefCell) -> Result<Arc<CountedRefState>, RawError> {
    match lookup(h.raw())? {
        Object::CountedRef(c) => Ok(c),
        _ => Err(RawError::WrongKind),
    }
}

// ---------------------------------------------------------------------------
// Temp allocators

pub fn temp_alloc_new() -> GrTempAlloc {
    GrTempAlloc::from_raw(heap().insert(Object::TempAlloc))
}

pub fn temp_alloc_free(h: GrTempAlloc) -> Result<(), RawError> {
    match lookup(h.raw())? {
        Object::TempAlloc => {}
        _ => return Err(RawError::WrongKind),
    }
    if heap().remove(h.raw()).is_none() {
        return Err(RawError::InvalidHandle);
    }
    Ok(())
}

fn check_temp_alloc(h: GrTempAlloc) -> Result<(), RawError> {
    match lookup(h.raw())? {
        Object::TempAlloc => Ok(()),
        _ => Err(RawError::WrongKind),
    }
}

// ---------------------------------------------------------------------------
// Systems and bodies

pub fn system_new(max_bodies: u32) -> GrSystem {
    let va = heap().insert(Object::System(Arc::new(SystemState::new(max_bodies))));
    GrSystem::from_raw(va)
}

pub fn system_free(h: GrSystem) -> Result<(), RawError> {
    let sys = with_system(h)?;
    if heap().remove(h.raw()).is_none() {
        return Err(RawError::InvalidHandle);
    }
    let bodies = std::mem::take(&mut *sys.bodies.lock());
    for body in bodies.into_values() {
        let _ = object_release(body.shape);
    }
    Ok(())
}

/// Advance the simulation. Takes each dynamic body's write lock, so a
/// caller still holding a lock on one of them blocks the step.
pub fn system_step(h: GrSystem, dt: f32, tmp: GrTempAlloc) -> Result<(), RawError> {
    let sys = with_system(h)?;
    check_temp_alloc(tmp)?;
    if !dt.is_finite() || dt < 0.0 {
        return Err(RawError::InvalidState);
    }
    let bodies: Vec<Arc<BodyState>> = sys.bodies.lock().values().cloned().collect();
    for body in bodies {
        if body.motion != GR_MOTION_DYNAMIC {
            continue;
        }
        body.lock.lock_exclusive();
        body.position.lock()[1] -= GRAVITY * dt * dt;
        unsafe { body.lock.unlock_exclusive() };
    }
    Ok(())
}

pub fn system_save_state(h: GrSystem, out: GrStream) -> Result<(), RawError> {
    let sys = with_system(h)?;
    let stream = with_stream(out)?;
    let bodies = sys.bodies.lock();
    let mut buf = Vec::with_capacity(4 + bodies.len() * 16);
    buf.extend_from_slice(&(bodies.len() as u32).to_le_bytes());
    for (id, body) in bodies.iter() {
        buf.extend_from_slice(&id.to_le_bytes());
        let pos = *body.position.lock();
        for c in pos {
            buf.extend_from_slice(&c.to_le_bytes());
        }
    }
    stream.data.lock().extend_from_slice(&buf);
    Ok(())
}

pub fn body_create(
    h: GrSystem,
    shape: GrShape,
    position: [f32; 3],
    motion: i32,
) -> Result<u32, RawError> {
    let sys = with_system(h)?;
    let shape_state = with_shape(shape)?;
    let mut bodies = sys.bodies.lock();
    if bodies.len() as u32 >= sys.max_bodies {
        return Err(RawError::CapacityExceeded);
    }
    shape_state.refs.fetch_add(1, Ordering::AcqRel);
    let id = sys.next_body.fetch_add(1, Ordering::Relaxed);
    bodies.insert(
        id,
        Arc::new(BodyState {
            id,
            shape: shape.raw(),
            motion,
            position: Mutex::new(position),
            lock: new_raw_rwlock(),
        }),
    );
    Ok(id)
}

pub fn body_destroy(h: GrSystem, id: u32) -> Result<(), RawError> {
    let sys = with_system(h)?;
    let body = sys.bodies.lock().remove(&id).ok_or(RawError::NotFound)?;
    object_release(body.shape)
}

pub fn body_is_added(h: GrSystem, id: u32) -> Result<bool, RawError> {
    let sys = with_system(h)?;
    let found = sys.bodies.lock().contains_key(&id);
    Ok(found)
}

pub fn body_position(h: GrSystem, id: u32) -> Result<[f32; 3], RawError> {
    let sys = with_system(h)?;
    let body = sys.bodies.lock().get(&id).cloned().ok_or(RawError::NotFound)?;
    let pos = *body.position.lock();
    Ok(pos)
}

pub fn body_set_position(h: GrSystem, id: u32, pos: [f32; 3]) -> Result<(), RawError> {
    let sys = with_system(h)?;
    let body = sys.bodies.lock().get(&id).cloned().ok_or(RawError::NotFound)?;
    *body.position.lock() = pos;
    Ok(())
}

// ---------------------------------------------------------------------------
// Shapes and shape settings

pub fn shape_settings_new_sphere(radius: f32) -> GrShapeSettings {
    let va = heap().insert(Object::ShapeSettings(Arc::new(SettingsState {
        desc: ShapeDesc::Sphere { radius },
        refs: AtomicU32::new(1),
    })));
    GrShapeSettings::from_raw(va)
}

pub fn shape_settings_new_box(half_extents: [f32; 3]) -> GrShapeSettings {
    let va = heap().insert(Object::ShapeSettings(Arc::new(SettingsState {
        desc: ShapeDesc::Box { half_extents },
        refs: AtomicU32::new(1),
    })));
    GrShapeSettings::from_raw(va)
}

fn validate(desc: ShapeDesc) -> Result<ShapeDesc, String> {
    match desc {
        ShapeDesc::Sphere { radius } if radius.is_finite() && radius > 0.0 => Ok(desc),
        ShapeDesc::Sphere { .. } => Err("sphere radius must be a positive finite number".into()),
        ShapeDesc::Box { half_extents } if half_extents.iter().all(|e| e.is_finite() && *e > 0.0) => {
            Ok(desc)
        }
        ShapeDesc::Box { .. } => Err("box half extents must be positive finite numbers".into()),
    }
}

/// Build a shape from a recipe. Never fails outright: bad dimensions
/// produce an error-carrying result object instead.
pub fn shape_settings_create(h: GrShapeSettings) -> Result<GrResult, RawError> {
    let settings = with_settings(h)?;
    let inner = match validate(settings.desc) {
        Ok(desc) => ResultInner {
            value: heap().insert(Object::Shape(Arc::new(ShapeState {
                desc,
                refs: AtomicU32::new(1),
            }))),
            error: None,
        },
        Err(msg) => ResultInner {
            value: 0,
            error: Some(msg),
        },
    };
    let va = heap().insert(Object::CreationResult(Arc::new(ResultState {
        inner: Mutex::new(inner),
    })));
    Ok(GrResult::from_raw(va))
}

pub fn shape_kind(h: GrShape) -> Result<i32, RawError> {
    let shape = with_shape(h)?;
    Ok(match shape.desc {
        ShapeDesc::Sphere { .. } => GR_SHAPE_SPHERE,
        ShapeDesc::Box { .. } => GR_SHAPE_BOX,
    })
}

// ---------------------------------------------------------------------------
// Intrusive reference counting

pub fn object_retain(va: u64) -> Result<(), RawError> {
    match lookup(va)? {
        Object::Shape(s) => s.refs.fetch_add(1, Ordering::AcqRel),
        Object::ShapeSettings(s) => s.refs.fetch_add(1, Ordering::AcqRel),
        _ => return Err(RawError::WrongKind),
    };
    Ok(())
}

pub fn object_release(va: u64) -> Result<(), RawError> {
    match lookup(va)? {
        Object::Shape(s) => {
            if s.refs.fetch_sub(1, Ordering::AcqRel) == 1 {
                heap().remove(va);
            }
        }
        Object::ShapeSettings(s) => {
            if s.refs.fetch_sub(1, Ordering::AcqRel) == 1 {
                heap().remove(va);
            }
        }
        _ => return Err(RawError::WrongKind),
    }
    Ok(())
}

pub fn object_ref_count(va: u64) -> Result<u32, RawError> {
    match lookup(va)? {
        Object::Shape(s) => Ok(s.refs.load(Ordering::Acquire)),
        Object::ShapeSettings(s) => Ok(s.refs.load(Ordering::Acquire)),
        _ => Err(RawError::WrongKind),
    }
}

/// Create a reference cell holding one count on `target`.
pub fn ref_new(target: u64) -> Result<GrRefCell, RawError> {
    object_retain(target)?;
    let va = heap().insert(Object::CountedRef(Arc::new(CountedRefState { target })));
    Ok(GrRefCell::from_raw(va))
}

pub fn ref_target(h: GrRefCell) -> Result<u64, RawError> {
    Ok(with_ref_cell(h)?.target)
}

pub fn ref_free(h: GrRefCell) -> Result<(), RawError> {
    let cell = with_ref_cell(h)?;
    if heap().remove(h.raw()).is_none() {
        return Err(RawError::InvalidHandle);
    }
    object_release(cell.target)
}

// ---------------------------------------------------------------------------
// Creation results

pub fn result_is_valid(h: GrResult) -> Result<bool, RawError> {
    let result = with_result(h)?;
    let inner = result.inner.lock();
    Ok(inner.error.is_none() && inner.value != 0)
}

pub fn result_has_error(h: GrResult) -> Result<bool, RawError> {
    let result = with_result(h)?;
    let has_err = result.inner.lock().error.is_some();
    Ok(has_err)
}

pub fn result_error(h: GrResult) -> Result<String, RawError> {
    let result = with_result(h)?;
    let err = result.inner.lock().error.clone().unwrap_or_default();
    Ok(err)
}

/// Move the stored object address out of the result. The result's
/// reference moves with it, so the caller now owns that count.
pub fn result_take_value(h: GrResult) -> Result<u64, RawError> {
    let result = with_result(h)?;
    let mut inner = result.inner.lock();
    if inner.error.is_some() || inner.value == 0 {
        return Err(RawError::InvalidState);
    }
    Ok(std::mem::take(&mut inner.value))
}

pub fn result_free(h: GrResult) -> Result<(), RawError> {
    let result = with_result(h)?;
    if heap().remove(h.raw()).is_none() {
        return Err(RawError::InvalidHandle);
    }
    let value = std::mem::take(&mut result.inner.lock().value);
    if value != 0 {
        let _ = object_release(value);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Collector shims

pub fn collector_new() -> GrCollector {
    let va = heap().insert(Object::Collector(Arc::new(ShimState {
        status: AtomicU8::new(GR_COLLECT_IDLE),
        early_out: AtomicBool::new(false),
    })));
    GrCollector::from_raw(va)
}

pub fn collector_free(h: GrCollector) -> Result<(), RawError> {
    with_collector(h)?;
    if heap().remove(h.raw()).is_none() {
        return Err(RawError::InvalidHandle);
    }
    Ok(())
}

pub fn collector_begin(h: GrCollector) -> Result<(), RawError> {
    let shim = with_collector(h)?;
    if shim.status.load(Ordering::Acquire) == GR_COLLECT_ACTIVE {
        return Err(RawError::InvalidState);
    }
    shim.early_out.store(false, Ordering::Release);
    shim.status.store(GR_COLLECT_ACTIVE, Ordering::Release);
    Ok(())
}

/// End a query. An early-outed shim keeps that status so callers can
/// observe it after the fact; only an active shim returns to idle.
pub fn collector_end(h: GrCollector) -> Result<(), RawError> {
    let shim = with_collector(h)?;
    match shim.status.load(Ordering::Acquire) {
        GR_COLLECT_ACTIVE => {
            shim.status.store(GR_COLLECT_IDLE, Ordering::Release);
            Ok(())
        }
        GR_COLLECT_EARLY_OUT => Ok(()),
        _ => Err(RawError::InvalidState),
    }
}

pub fn collector_reset(h: GrCollector) -> Result<(), RawError> {
    let shim = with_collector(h)?;
    shim.status.store(GR_COLLECT_IDLE, Ordering::Release);
    shim.early_out.store(false, Ordering::Release);
    Ok(())
}

pub fn collector_force_early_out(h: GrCollector) -> Result<(), RawError> {
    let shim = with_collector(h)?;
    shim.early_out.store(true, Ordering::Release);
    shim.status.store(GR_COLLECT_EARLY_OUT, Ordering::Release);
    Ok(())
}

pub fn collector_status(h: GrCollector) -> Result<u8, RawError> {
    let shim = with_collector(h)?;
    Ok(shim.status.load(Ordering::Acquire))
}

// ---------------------------------------------------------------------------
// Mutexes

pub fn mutex_new() -> GrMutex {
    let va = heap().insert(Object::Mutex(Arc::new(MutexState {
        raw: new_raw_mutex(),
        held: AtomicBool::new(false),
    })));
    GrMutex::from_raw(va)
}

pub fn mutex_free(h: GrMutex) -> Result<(), RawError> {
    with_mutex(h)?;
    if heap().remove(h.raw()).is_none() {
        return Err(RawError::InvalidHandle);
    }
    Ok(())
}

pub fn mutex_lock(h: GrMutex) -> Result<(), RawError> {
    let m = with_mutex(h)?;
    m.raw.lock();
    m.held.store(true, Ordering::Release);
    Ok(())
}

pub fn mutex_try_lock(h: GrMutex) -> Result<bool, RawError> {
    let m = with_mutex(h)?;
    if m.raw.try_lock() {
        m.held.store(true, Ordering::Release);
        Ok(true)
    } else {
        Ok(false)
    }
}

pub fn mutex_unlock(h: GrMutex) -> Result<(), RawError> {
    let m = with_mutex(h)?;
    if m.held
        .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return Err(RawError::LockMisuse);
    }
    // The winning exchange above proves this context holds the lock.
    unsafe { m.raw.unlock() };
    Ok(())
}

// ---------------------------------------------------------------------------
// Body locks

pub fn body_lock_acquire(h: GrSystem, id: u32, exclusive: bool) -> Result<GrBodyLock, RawError> {
    let sys = with_system(h)?;
    let body = sys.bodies.lock().get(&id).cloned().ok_or(RawError::NotFound)?;
    if exclusive {
        body.lock.lock_exclusive();
    } else {
        body.lock.lock_shared();
    }
    let va = heap().insert(Object::BodyLock(Arc::new(BodyLockState { body, exclusive })));
    Ok(GrBodyLock::from_raw(va))
}

/// Acquire locks on several bodies at once. The whole batch runs under
/// the system's lock interface mutex, so two overlapping batches cannot
/// interleave and deadlock each other. Missing bodies yield `None` in
/// their slot; the rest of the batch still succeeds.
pub fn body_lock_acquire_multi(
    h: GrSystem,
    ids: &[u32],
    exclusive: bool,
) -> Result<Vec<Option<GrBodyLock>>, RawError> {
    let sys = with_system(h)?;
    let _batch = sys.lock_iface.lock();
    let mut out = Vec::with_capacity(ids.len());
    for &id in ids {
        let body = sys.bodies.lock().get(&id).cloned();
        match body {
            Some(body) => {
                if exclusive {
                    body.lock.lock_exclusive();
                } else {
                    body.lock.lock_shared();
                }
                let va = heap().insert(Object::BodyLock(Arc::new(BodyLockState {
                    body,
                    exclusive,
                })));
                out.push(Some(GrBodyLock::from_raw(va)));
            }
            None => out.push(None),
        }
    }
    Ok(out)
}

pub fn body_lock_release(h: GrBodyLock) -> Result<(), RawError> {
    let state = match lookup(h.raw())? {
        Object::BodyLock(s) => s,
        _ => return Err(RawError::WrongKind),
    };
    if heap().remove(h.raw()).is_none() {
        return Err(RawError::InvalidHandle);
    }
    // The winning remove above proves this lock record is still live.
    unsafe {
        if state.exclusive {
            state.body.lock.unlock_exclusive();
        } else {
            state.body.lock.unlock_shared();
        }
    }
    Ok(())
}

pub fn body_lock_position(h: GrBodyLock) -> Result<[f32; 3], RawError> {
    match lookup(h.raw())? {
        Object::BodyLock(s) => Ok(*s.body.position.lock()),
        _ => Err(RawError::WrongKind),
    }
}

pub fn body_lock_set_position(h: GrBodyLock, position: [f32; 3]) -> Result<(), RawError> {
    let state = match lookup(h.raw())? {
        Object::BodyLock(s) => s,
        _ => return Err(RawError::WrongKind),
    };
    if !state.exclusive {
        return Err(RawError::LockMisuse);
    }
    *state.body.position.lock() = position;
    Ok(())
}

// ---------------------------------------------------------------------------
// Streams

pub fn stream_new() -> GrStream {
    let va = heap().insert(Object::Stream(Arc::new(StreamState {
        data: Mutex::new(Vec::new()),
    })));
    GrStream::from_raw(va)
}

pub fn stream_free(h: GrStream) -> Result<(), RawError> {
    with_stream(h)?;
    if heap().remove(h.raw()).is_none() {
        return Err(RawError::InvalidHandle);
    }
    Ok(())
}

pub fn stream_write(h: GrStream, bytes: &[u8]) -> Result<(), RawError> {
    let stream = with_stream(h)?;
    stream.data.lock().extend_from_slice(bytes);
    Ok(())
}

pub fn stream_data(h: GrStream) -> Result<Vec<u8>, RawError> {
    let stream = with_stream(h)?;
    let data = stream.data.lock().clone();
    Ok(data)
}

// ---------------------------------------------------------------------------
// Broad phase queries

fn body_desc(body: &BodyState) -> Option<ShapeDesc> {
    match heap().get(body.shape) {
        Some(Object::Shape(s)) => Some(s.desc),
        _ => None,
    }
}

fn delta(center: [f32; 3], other: [f32; 3]) -> ([f32; 3], f32) {
    let d = [
        other[0] - center[0],
        other[1] - center[1],
        other[2] - center[2],
    ];
    (d, d[0] * d[0] + d[1] * d[1] + d[2] * d[2])
}

fn point_hit(desc: ShapeDesc, center: [f32; 3], point: [f32; 3]) -> Option<f32> {
    let (d, dist2) = delta(center, point);
    let hit = match desc {
        ShapeDesc::Sphere { radius } => dist2 <= radius * radius,
        ShapeDesc::Box { half_extents: he } => {
            d[0].abs() <= he[0] && d[1].abs() <= he[1] && d[2].abs() <= he[2]
        }
    };
    hit.then_some(dist2)
}

fn sphere_hit(desc: ShapeDesc, center: [f32; 3], probe: [f32; 3], radius: f32) -> Option<f32> {
    let (d, dist2) = delta(center, probe);
    let hit = match desc {
        ShapeDesc::Sphere { radius: r } => {
            let reach = r + radius;
            dist2 <= reach * reach
        }
        ShapeDesc::Box { half_extents: he } => {
            d[0].abs() <= he[0] + radius && d[1].abs() <= he[1] + radius && d[2].abs() <= he[2] + radius
        }
    };
    hit.then_some(dist2)
}

/// Walk bodies in id order, feeding hits to the sink until the shim
/// early-outs. The body list is snapshotted up front so the sink can
/// call back into the table without deadlocking.
fn enumerate_hits(
    sys: &SystemState,
    shim: &ShimState,
    sink: &mut dyn FnMut(u32, f32),
    mut test: impl FnMut(&BodyState) -> Option<f32>,
) -> Result<(), RawError> {
    if shim.status.load(Ordering::Acquire) != GR_COLLECT_ACTIVE {
        return Err(RawError::InvalidState);
    }
    let bodies: Vec<(u32, Arc<BodyState>)> = sys
        .bodies
        .lock()
        .iter()
        .map(|(id, b)| (*id, Arc::clone(b)))
        .collect();
    for (id, body) in bodies {
        if let Some(fraction) = test(&body) {
            sink(id, fraction);
            if shim.early_out.load(Ordering::Acquire) {
                break;
            }
        }
    }
    Ok(())
}

pub fn broad_phase_collide_point(
    h: GrSystem,
    point: [f32; 3],
    shim: GrCollector,
    sink: &mut dyn FnMut(u32, f32),
) -> Result<(), RawError> {
    let sys = with_system(h)?;
    let shim = with_collector(shim)?;
    enumerate_hits(&sys, &shim, sink, |body| {
        let desc = body_desc(body)?;
        let center = *body.position.lock();
        point_hit(desc, center, point)
    })
}

pub fn broad_phase_collide_sphere(
    h: GrSystem,
    center: [f32; 3],
    radius: f32,
    shim: GrCollector,
    sink: &mut dyn FnMut(u32, f32),
) -> Result<(), RawError> {
    let sys = with_system(h)?;
    let shim = with_collector(shim)?;
    enumerate_hits(&sys, &shim, sink, |body| {
        let desc = body_desc(body)?;
        let pos = *body.position.lock();
        sphere_hit(desc, pos, center, radius)
    })
}

#[cfg(test)]
pub(crate) fn object_exists(va: u64) -> bool {
    heap().contains(va)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_are_unique_and_nonzero() {
        let a = temp_alloc_new();
        let b = temp_alloc_new();
        assert!(a.is_valid());
        assert!(b.is_valid());
        assert_ne!(a.raw(), b.raw());
        temp_alloc_free(a).unwrap();
        temp_alloc_free(b).unwrap();
    }

    #[test]
    fn stale_address_is_rejected_not_reused() {
        let a = temp_alloc_new();
        temp_alloc_free(a).unwrap();
        assert_eq!(temp_alloc_free(a), Err(RawError::InvalidHandle));
        let b = temp_alloc_new();
        assert_ne!(a.raw(), b.raw());
        temp_alloc_free(b).unwrap();
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let m = mutex_new();
        let bogus = GrStream::from_raw(m.raw());
        assert_eq!(stream_write(bogus, b"x"), Err(RawError::WrongKind));
        mutex_free(m).unwrap();
    }

    #[test]
    fn shape_refcount_drops_to_zero_frees() {
        let settings = shape_settings_new_sphere(1.0);
        let result = shape_settings_create(settings).unwrap();
        let shape = result_take_value(result).unwrap();
        assert_eq!(object_ref_count(shape), Ok(1));
        object_retain(shape).unwrap();
        assert_eq!(object_ref_count(shape), Ok(2));
        object_release(shape).unwrap();
        object_release(shape).unwrap();
        assert!(!object_exists(shape));
        result_free(result).unwrap();
        object_release(settings.raw()).unwrap();
    }

    #[test]
    fn invalid_dimensions_produce_error_result() {
        let settings = shape_settings_new_sphere(-2.0);
        let result = shape_settings_create(settings).unwrap();
        assert_eq!(result_has_error(result), Ok(true));
        assert_eq!(result_is_valid(result), Ok(false));
        assert!(result_error(result).unwrap().contains("radius"));
        assert_eq!(result_take_value(result), Err(RawError::InvalidState));
        result_free(result).unwrap();
        object_release(settings.raw()).unwrap();
    }

    #[test]
    fn result_free_releases_untaken_value() {
        let settings = shape_settings_new_sphere(1.0);
        let result = shape_settings_create(settings).unwrap();
        let shape = {
            let r = with_result(result).unwrap();
            let va = r.inner.lock().value;
            va
        };
        assert!(object_exists(shape));
        result_free(result).unwrap();
        assert!(!object_exists(shape));
        object_release(settings.raw()).unwrap();
    }

    #[test]
    fn body_capacity_is_enforced() {
        let sys = system_new(1);
        let settings = shape_settings_new_sphere(1.0);
        let result = shape_settings_create(settings).unwrap();
        let shape = GrShape::from_raw(result_take_value(result).unwrap());
        result_free(result).unwrap();

        body_create(sys, shape, [0.0; 3], GR_MOTION_STATIC).unwrap();
        assert_eq!(
            body_create(sys, shape, [0.0; 3], GR_MOTION_STATIC),
            Err(RawError::CapacityExceeded)
        );

        system_free(sys).unwrap();
        object_release(shape.raw()).unwrap();
        object_release(settings.raw()).unwrap();
    }

    #[test]
    fn query_stops_on_early_out() {
        let sys = system_new(16);
        let settings = shape_settings_new_sphere(1.0);
        let result = shape_settings_create(settings).unwrap();
        let shape = GrShape::from_raw(result_take_value(result).unwrap());
        result_free(result).unwrap();

        for _ in 0..3 {
            body_create(sys, shape, [0.0; 3], GR_MOTION_STATIC).unwrap();
        }
        let shim = collector_new();
        collector_begin(shim).unwrap();
        let mut seen = Vec::new();
        broad_phase_collide_point(sys, [0.0; 3], shim, &mut |id, _| {
            seen.push(id);
            collector_force_early_out(shim).unwrap();
        })
        .unwrap();
        collector_end(shim).unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(collector_status(shim), Ok(GR_COLLECT_EARLY_OUT));

        collector_free(shim).unwrap();
        system_free(sys).unwrap();
        object_release(shape.raw()).unwrap();
        object_release(settings.raw()).unwrap();
    }
}
