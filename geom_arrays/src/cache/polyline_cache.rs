use super::{transform_pool::same_transform, CacheBudget, TransformPool};
use crate::{
    array::{ArrayData, DecimationSource, OrdinateIter},
    core::math::Affine2,
    path::PathProducer,
};
use parking_lot::Mutex;
use std::{
    fmt,
    sync::{Arc, Weak},
};

/// Options for creating a [PolylineCache].
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Pool used to canonicalize requested transforms.
    pub pool: Arc<TransformPool>,
    /// Memory bound for released buffers, `None` keeps released buffers until invalidated.
    pub budget: Option<Arc<CacheBudget>>,
    /// Rebuilt buffers are shrunk when their physical size is more than `trim_factor` times the
    /// valid length.
    pub trim_factor: usize,
}

impl CacheOptions {
    #[inline]
    pub fn new() -> Self {
        Self {
            pool: TransformPool::shared(),
            budget: None,
            trim_factor: 2,
        }
    }
}

impl Default for CacheOptions {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Counters of how rendering requests were served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Buffers decimated and transformed from source.
    pub rebuilds: u64,
    /// Requests served by the cached buffer as is.
    pub reuses: u64,
    /// Requests served by re-transforming the cached buffer through a delta transform.
    pub delta_updates: u64,
    /// Delta updates abandoned because the recorded transform had no inverse.
    pub inverse_failures: u64,
}

#[derive(Debug)]
enum Retained {
    Absent,
    /// Held for active readers.
    Locked(Arc<ArrayData>),
    /// No reader left, may be dropped by a [CacheBudget].
    Reclaimable(Arc<ArrayData>),
}

#[derive(Debug)]
struct CacheState {
    retained: Retained,
    /// Transform the cached ordinates are expressed in.
    transform: Arc<Affine2>,
    /// Linear decimation resolution of the cached buffer, 0 when not decimated.
    resolution: f64,
    lock_count: usize,
    recomputed: bool,
    reset_pending: bool,
    /// Bumped whenever the retained buffer changes hands, stale reclaim tickets compare against it.
    epoch: u64,
    stats: CacheStats,
}

impl CacheState {
    #[inline]
    fn current(&self) -> Option<&Arc<ArrayData>> {
        match &self.retained {
            Retained::Absent => None,
            Retained::Locked(b) | Retained::Reclaimable(b) => Some(b),
        }
    }

    #[inline]
    fn take(&mut self) -> Option<Arc<ArrayData>> {
        match std::mem::replace(&mut self.retained, Retained::Absent) {
            Retained::Absent => None,
            Retained::Locked(b) | Retained::Reclaimable(b) => Some(b),
        }
    }
}

/// Queued by [CacheBudget] for a buffer released by its last reader.
#[derive(Debug)]
pub(crate) struct ReclaimTicket {
    slot: Weak<Mutex<CacheState>>,
    epoch: u64,
    ordinates: usize,
}

impl ReclaimTicket {
    #[inline]
    pub fn ordinates(&self) -> usize {
        self.ordinates
    }

    /// `true` while the cache still holds the released buffer as reclaimable. A cache busy on
    /// another thread is assumed current.
    pub fn is_current(&self) -> bool {
        let Some(slot) = self.slot.upgrade() else {
            return false;
        };
        let Some(state) = slot.try_lock() else {
            return true;
        };
        state.epoch == self.epoch && matches!(state.retained, Retained::Reclaimable(_))
    }

    /// Drop the buffer if it is still the released one, returns `true` if dropped.
    pub fn reclaim(self) -> bool {
        let Some(slot) = self.slot.upgrade() else {
            return false;
        };
        let mut state = slot.lock();
        if state.epoch != self.epoch || !matches!(state.retained, Retained::Reclaimable(_)) {
            return false;
        }
        state.retained = Retained::Absent;
        state.epoch += 1;
        true
    }
}

/// Buffer handed out by [PolylineCache::get_rendering_array].
///
/// Holds the decimated ordinates expressed in [RenderingArray::transform]. Return it with
/// [PolylineCache::release_rendering_array] once done so the cache can update the buffer in place
/// on the next request.
pub struct RenderingArray {
    buffer: Arc<ArrayData>,
    transform: Arc<Affine2>,
}

impl RenderingArray {
    #[inline]
    pub fn ordinates(&self) -> &[f64] {
        self.buffer.ordinates()
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Physical size of the buffer in ordinates, at least `2 * len()`.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Start point index of each curve in the buffer.
    #[inline]
    pub fn curves(&self) -> &[usize] {
        self.buffer.curves()
    }

    /// Transform applied to the ordinates.
    #[inline]
    pub fn transform(&self) -> &Affine2 {
        &self.transform
    }

    #[inline]
    pub fn iter(&self) -> OrdinateIter<'_> {
        self.buffer.iter()
    }

    /// Drawing commands for the buffer, each curve starts with a move.
    #[inline]
    pub fn path(&self) -> PathProducer<OrdinateIter<'_>> {
        PathProducer::with_breaks(self.iter(), None, self.curves().to_vec())
    }

    /// `true` if both handles share the same buffer.
    #[inline]
    pub fn ptr_eq(&self, other: &RenderingArray) -> bool {
        Arc::ptr_eq(&self.buffer, &other.buffer)
    }
}

impl fmt::Debug for RenderingArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderingArray")
            .field("len", &self.len())
            .field("curves", &self.curves())
            .field("transform", &*self.transform)
            .finish()
    }
}

/// Cache of the decimated and transformed rendering buffer of one polyline.
///
/// Typical use renders the same polyline every frame with a slowly changing transform. A request
/// with the transform of the cached buffer hands the buffer out again. A request with another
/// transform, while no reader holds the buffer, re-transforms the cached ordinates through the
/// delta transform `inverse(old) then new` instead of decimating the source again. If a reader
/// still holds the buffer a new one is built from source and the cache moves on to it.
///
/// The lock count check and the buffer update happen under one mutex, so concurrent rendering
/// threads never observe a partially transformed buffer.
///
/// # Examples
///
/// ```
/// # use geom_arrays::points;
/// # use geom_arrays::cache::*;
/// # use geom_arrays::core::math::Affine2;
/// let line = points![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)];
/// let cache = PolylineCache::new();
///
/// let array = cache.get_rendering_array(&line, 0.0, &Affine2::scale(10.0, 10.0));
/// assert_eq!(array.ordinates(), &[0.0, 0.0, 10.0, 0.0, 20.0, 0.0]);
/// cache.release_rendering_array(array);
/// // negative: the buffer was computed from source during this round
/// assert_eq!(cache.get_point_count(), -3);
///
/// let array = cache.get_rendering_array(&line, 0.0, &Affine2::translation(1.0, 0.0));
/// assert_eq!(array.ordinates(), &[1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
/// cache.release_rendering_array(array);
/// // positive: the cached buffer was updated in place
/// assert_eq!(cache.get_point_count(), 3);
/// ```
#[derive(Debug)]
pub struct PolylineCache {
    slot: Arc<Mutex<CacheState>>,
    options: CacheOptions,
}

impl Default for PolylineCache {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl PolylineCache {
    #[inline]
    pub fn new() -> Self {
        Self::with_options(CacheOptions::new())
    }

    pub fn with_options(options: CacheOptions) -> Self {
        let state = CacheState {
            retained: Retained::Absent,
            transform: options.pool.identity(),
            resolution: 0.0,
            lock_count: 0,
            recomputed: false,
            reset_pending: false,
            epoch: 0,
            stats: CacheStats::default(),
        };
        PolylineCache {
            slot: Arc::new(Mutex::new(state)),
            options,
        }
    }

    #[inline]
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    /// Get the points of `source` decimated at `resolution` and transformed by `transform`.
    ///
    /// Points closer than `resolution` (in source units) to the last kept point are skipped, a
    /// `resolution <= 0` keeps every point. A cached buffer is only reused or re-transformed if it
    /// was decimated at the same resolution. The returned buffer stays locked (will not be
    /// modified) until it is passed to [PolylineCache::release_rendering_array].
    pub fn get_rendering_array<S>(
        &self,
        source: &S,
        resolution: f64,
        transform: &Affine2,
    ) -> RenderingArray
    where
        S: DecimationSource + ?Sized,
    {
        let resolution = if resolution > 0.0 { resolution } else { 0.0 };
        let transform = self.options.pool.intern(transform);
        let mut state = self.slot.lock();
        if state.reset_pending {
            state.recomputed = false;
            state.reset_pending = false;
        }

        let same_resolution = state.resolution == resolution;
        // absent until republished, a rebuild that unwinds leaves nothing cached
        let reusable = match state.take() {
            Some(buffer) if same_resolution && same_transform(&state.transform, &transform) => {
                state.lock_count += 1;
                state.stats.reuses += 1;
                tracing::trace!(readers = state.lock_count, "rendering buffer reused");
                return self.publish(&mut state, buffer, transform);
            }
            Some(mut buffer) if same_resolution && state.lock_count == 0 => {
                match state.transform.inverse() {
                    Ok(inverse) => {
                        let delta = inverse.then(&transform);
                        Arc::make_mut(&mut buffer).apply_transform(&delta);
                        state.transform = Arc::clone(&transform);
                        state.lock_count = 1;
                        state.stats.delta_updates += 1;
                        tracing::trace!(points = buffer.len(), "rendering buffer re-transformed");
                        return self.publish(&mut state, buffer, transform);
                    }
                    Err(error) => {
                        state.stats.inverse_failures += 1;
                        tracing::warn!(%error, "cached transform not invertible, rebuilding from source");
                        Arc::try_unwrap(buffer).unwrap_or_default()
                    }
                }
            }
            Some(buffer) if state.lock_count == 0 => {
                tracing::debug!(
                    from = state.resolution,
                    to = resolution,
                    "rendering resolution changed, rebuilding from source"
                );
                Arc::try_unwrap(buffer).unwrap_or_default()
            }
            Some(locked) => {
                tracing::debug!(
                    readers = state.lock_count,
                    "rendering buffer locked by another reader, rebuilding into a new buffer"
                );
                ArrayData::with_capacity(locked.ordinate_len())
            }
            None => ArrayData::new(),
        };

        let buffer = self.rebuild(reusable, source, resolution, &transform);
        state.transform = Arc::clone(&transform);
        state.resolution = resolution;
        state.lock_count = 1;
        state.recomputed = true;
        state.stats.rebuilds += 1;
        self.publish(&mut state, Arc::new(buffer), transform)
    }

    fn rebuild<S>(
        &self,
        mut buffer: ArrayData,
        source: &S,
        resolution: f64,
        transform: &Affine2,
    ) -> ArrayData
    where
        S: DecimationSource + ?Sized,
    {
        buffer.clear();
        source.to_float_array(&mut buffer, resolution * resolution);
        if !transform.is_identity() {
            buffer.apply_transform(transform);
        }
        if buffer.trim(self.options.trim_factor) {
            tracing::debug!(ordinates = buffer.ordinate_len(), "trimmed rendering buffer");
        }
        tracing::debug!(
            source_points = source.point_count(),
            points = buffer.len(),
            "rebuilt rendering buffer from source"
        );
        buffer
    }

    #[inline]
    fn publish(
        &self,
        state: &mut CacheState,
        buffer: Arc<ArrayData>,
        transform: Arc<Affine2>,
    ) -> RenderingArray {
        state.retained = Retained::Locked(Arc::clone(&buffer));
        state.epoch += 1;
        RenderingArray { buffer, transform }
    }

    /// Return a buffer obtained from [PolylineCache::get_rendering_array].
    ///
    /// Releasing a buffer the cache no longer holds (it moved on to a new one) does nothing.
    pub fn release_rendering_array(&self, array: RenderingArray) {
        let ticket = {
            let mut state = self.slot.lock();
            let is_current = state
                .current()
                .is_some_and(|b| Arc::ptr_eq(b, &array.buffer));
            if !is_current {
                tracing::trace!("released rendering buffer no longer cached");
                return;
            }

            state.lock_count = state.lock_count.saturating_sub(1);
            if state.lock_count > 0 {
                return;
            }

            if let Some(buffer) = state.take() {
                state.retained = Retained::Reclaimable(buffer);
            }
            state.epoch += 1;
            ReclaimTicket {
                slot: Arc::downgrade(&self.slot),
                epoch: state.epoch,
                ordinates: array.buffer.ordinate_len(),
            }
        };

        drop(array);
        if let Some(budget) = &self.options.budget {
            budget.register(ticket);
        }
    }

    /// Signed point count of the cached buffer: negative if it was rebuilt from source during the
    /// current round, positive otherwise (0 if nothing is cached).
    ///
    /// Also ends the round, the next request starts with a clean "rebuilt" state.
    pub fn get_point_count(&self) -> isize {
        let mut state = self.slot.lock();
        let count = state.current().map_or(0, |b| b.len()) as isize;
        state.reset_pending = true;
        if state.recomputed {
            -count
        } else {
            count
        }
    }

    /// Drop the cached buffer, to be called when the source polyline changes. Readers holding the
    /// buffer keep it, their release becomes a no-op.
    pub fn invalidate(&self) {
        let mut state = self.slot.lock();
        state.retained = Retained::Absent;
        state.transform = self.options.pool.identity();
        state.lock_count = 0;
        state.epoch += 1;
    }

    /// Number of readers holding the cached buffer.
    #[inline]
    pub fn lock_count(&self) -> usize {
        self.slot.lock().lock_count
    }

    /// `true` if a buffer is cached (locked or reclaimable).
    #[inline]
    pub fn is_cached(&self) -> bool {
        self.slot.lock().current().is_some()
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        self.slot.lock().stats
    }
}
