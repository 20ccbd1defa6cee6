use crate::core::math::Affine2;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::{Arc, OnceLock, Weak};

/// Entry count at which dead entries are first pruned, doubles whenever pruning leaves the pool
/// above half of it.
const INITIAL_PRUNE_AT: usize = 64;

/// Bit pattern of the six transform coefficients, used as the interning key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TransformKey([u64; 6]);

impl TransformKey {
    #[inline]
    fn new(t: &Affine2) -> Self {
        TransformKey([
            t.m00.to_bits(),
            t.m10.to_bits(),
            t.m01.to_bits(),
            t.m11.to_bits(),
            t.m02.to_bits(),
            t.m12.to_bits(),
        ])
    }
}

#[derive(Debug)]
struct PoolEntries {
    map: FxHashMap<TransformKey, Weak<Affine2>>,
    prune_at: usize,
}

/// Interning pool for transforms so equal transforms share one allocation.
///
/// Interned transforms are held weakly, an entry lives as long as some caller holds the returned
/// `Arc`. The identity transform always maps to the pool's shared identity instance.
///
/// # Examples
///
/// ```
/// # use geom_arrays::cache::TransformPool;
/// # use geom_arrays::core::math::Affine2;
/// # use std::sync::Arc;
/// let pool = TransformPool::new();
/// let a = pool.intern(&Affine2::scale(2.0, 2.0));
/// let b = pool.intern(&Affine2::scale(2.0, 2.0));
/// assert!(Arc::ptr_eq(&a, &b));
/// assert!(Arc::ptr_eq(&pool.intern(&Affine2::identity()), &pool.identity()));
/// ```
#[derive(Debug)]
pub struct TransformPool {
    identity: Arc<Affine2>,
    entries: Mutex<PoolEntries>,
}

impl Default for TransformPool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TransformPool {
    pub fn new() -> Self {
        TransformPool {
            identity: Arc::new(Affine2::identity()),
            entries: Mutex::new(PoolEntries {
                map: FxHashMap::default(),
                prune_at: INITIAL_PRUNE_AT,
            }),
        }
    }

    /// Process wide pool used by caches created without explicit options.
    pub fn shared() -> Arc<TransformPool> {
        static SHARED: OnceLock<Arc<TransformPool>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(TransformPool::new())))
    }

    /// The shared identity instance.
    #[inline]
    pub fn identity(&self) -> Arc<Affine2> {
        Arc::clone(&self.identity)
    }

    /// Returns the canonical instance equal to `transform`.
    pub fn intern(&self, transform: &Affine2) -> Arc<Affine2> {
        if transform.is_identity() {
            return self.identity();
        }

        let key = TransformKey::new(transform);
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.map.get(&key).and_then(Weak::upgrade) {
            return existing;
        }

        if entries.map.len() >= entries.prune_at {
            entries.map.retain(|_, w| w.strong_count() > 0);
            if entries.map.len() * 2 > entries.prune_at {
                entries.prune_at *= 2;
            }
        }

        let interned = Arc::new(*transform);
        entries.map.insert(key, Arc::downgrade(&interned));
        interned
    }

    /// Number of interned transforms still alive.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .map
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose transform is no longer referenced.
    pub fn prune(&self) {
        self.entries.lock().map.retain(|_, w| w.strong_count() > 0);
    }
}

/// Same allocation or equal value.
#[inline]
pub(crate) fn same_transform(a: &Arc<Affine2>, b: &Arc<Affine2>) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}
