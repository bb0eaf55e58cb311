//! Process-global object table backing the engine core.
//!
//! Every live engine object occupies one slot keyed by a non-zero virtual
//! address. Addresses are allocated monotonically and never reused, so a
//! stale address can never alias a newer object.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{lock_api, Mutex, RawMutex, RawRwLock};

/// Geometric description shared by shapes and shape settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeDesc {
    Sphere { radius: f32 },
    Box { half_extents: [f32; 3] },
}

/// A finished, immutable collision shape. Intrusively reference counted.
pub struct ShapeState {
    pub desc: ShapeDesc,
    pub refs: AtomicU32,
}

/// Construction recipe for a shape. Validation happens at create time,
/// not here, so a recipe with bad dimensions is still a live object.
pub struct SettingsState {
    pub desc: ShapeDesc,
    pub refs: AtomicU32,
}

/// A reference cell holding exactly one count on its target object.
pub struct CountedRefState {
    pub target: u64,
}

/// Outcome of a fallible construction: either a stored object address
/// (one reference, owned by the result) or an error message.
pub struct ResultState {
    pub inner: Mutex<ResultInner>,
}

pub struct ResultInner {
    /// Address of the constructed object, zero once drained or on error.
    pub value: u64,
    pub error: Option<String>,
}

/// Collector shim state machine driven by the query loop.
pub struct ShimState {
    pub status: AtomicU8,
    pub early_out: AtomicBool,
}

/// Engine-side mutex record. `held` gates unlock so a mismatched unlock
/// is reported instead of corrupting the raw lock.
pub struct MutexState {
    pub raw: RawMutex,
    pub held: AtomicBool,
}

/// A single simulated body.
pub struct BodyState {
    pub id: u32,
    /// Address of the retained shape.
    pub shape: u64,
    pub motion: i32,
    pub position: Mutex<[f32; 3]>,
    pub lock: RawRwLock,
}

/// An outstanding read or write lock on one body. Holds the body alive
/// so release never has to consult the table.
pub struct BodyLockState {
    pub body: Arc<BodyState>,
    pub exclusive: bool,
}

/// Byte sink for state snapshots and serialized data.
pub struct StreamState {
    pub data: Mutex<Vec<u8>>,
}

/// One simulation world.
pub struct SystemState {
    pub max_bodies: u32,
    pub bodies: Mutex<BTreeMap<u32, Arc<BodyState>>>,
    pub next_body: AtomicU32,
    /// Serializes multi-body lock acquisition.
    pub lock_iface: Mutex<()>,
}

impl SystemState {
    pub fn new(max_bodies: u32) -> Self {
        Self {
            max_bodies,
            bodies: Mutex::new(BTreeMap::new()),
            next_body: AtomicU32::new(1),
            lock_iface: Mutex::new(()),
        }
    }
}

pub fn new_raw_mutex() -> RawMutex {
    <RawMutex as lock_api::RawMutex>::INIT
}

pub fn new_raw_rwlock() -> RawRwLock {
    <RawRwLock as lock_api::RawRwLock>::INIT
}

/// A live engine object. Arc payloads let call sites operate on an
/// object after dropping the table lock.
#[derive(Clone)]
pub enum Object {
    TempAlloc,
    System(Arc<SystemState>),
    Shape(Arc<ShapeState>),
    ShapeSettings(Arc<SettingsState>),
    CountedRef(Arc<CountedRefState>),
    CreationResult(Arc<ResultState>),
    Collector(Arc<ShimState>),
    Mutex(Arc<MutexState>),
    BodyLock(Arc<BodyLockState>),
    Stream(Arc<StreamState>),
}

const VA_BASE: u64 = 0x1000;
const VA_STRIDE: u64 = 0x10;

pub struct Heap {
    objects: Mutex<HashMap<u64, Object>>,
    next_va: AtomicU64,
}

impl Heap {
    pub fn insert(&self, obj: Object) -> u64 {
        let va = self.next_va.fetch_add(VA_STRIDE, Ordering::Relaxed);
        self.objects.lock().insert(va, obj);
        va
    }

    pub fn get(&self, va: u64) -> Option<Object> {
        self.objects.lock().get(&va).cloned()
    }

    /// Removing is the one-shot gate for destruction: of two racing
    /// frees, exactly one sees the object.
    pub fn remove(&self, va: u64) -> Option<Object> {
        self.objects.lock().remove(&va)
    }

    #[cfg(test)]
    pub fn contains(&self, va: u64) -> bool {
        self.objects.lock().contains_key(&va)
    }
}

pub fn heap() -> &'static Heap {
    static HEAP: OnceLock<Heap> = OnceLock::new();
    HEAP.get_or_init(|| Heap {
        objects: Mutex::new(HashMap::new()),
        next_va: AtomicU64::new(VA_BASE),
    })
}
