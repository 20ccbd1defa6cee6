use super::{
    compression::ByteDeltas, growth_estimate, ArrayData, ArrayIter, CompressionLevel, Cursor,
    DecimationSource, PointIterator, Points,
};
use crate::{
    core::math::{vec2, Vector2},
    ArrayError, Result,
};
use static_aabb2d_index::AABB;
use std::{
    fmt,
    hash::{Hash, Hasher},
    mem,
    sync::Arc,
};

/// Opaque coordinate reference tag attached to a [PointArray].
///
/// Only compared for equality, an array without a tag inherits the reference of its container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrsTag(Arc<str>);

impl CrsTag {
    #[inline]
    pub fn new(id: &str) -> Self {
        CrsTag(Arc::from(id))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CrsTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage representations, `lower..upper` is the ordinate range of the storage in use (views
/// share the storage of the array they were taken from).
#[derive(Debug, Clone)]
enum Backend {
    Dense {
        ordinates: Arc<Vec<f64>>,
        lower: usize,
        upper: usize,
    },
    Floats {
        ordinates: Arc<Vec<f32>>,
        lower: usize,
        upper: usize,
    },
    RelativeBytes {
        data: Arc<ByteDeltas>,
        lower: usize,
        upper: usize,
    },
}

impl Backend {
    #[inline]
    fn range(&self) -> (usize, usize) {
        match *self {
            Backend::Dense { lower, upper, .. }
            | Backend::Floats { lower, upper, .. }
            | Backend::RelativeBytes { lower, upper, .. } => (lower, upper),
        }
    }

    #[inline]
    fn point_count(&self) -> usize {
        let (lower, upper) = self.range();
        (upper - lower) / 2
    }

    #[inline]
    fn compression(&self) -> Option<CompressionLevel> {
        match self {
            Backend::Dense { .. } => None,
            Backend::Floats { .. } => Some(CompressionLevel::DirectAsFloats),
            Backend::RelativeBytes { .. } => Some(CompressionLevel::RelativeAsBytes),
        }
    }

    /// Random access to point `index`, caller checks bounds.
    fn point(&self, index: usize) -> Vector2<f64> {
        match self {
            Backend::Dense {
                ordinates, lower, ..
            } => {
                let i = lower + 2 * index;
                vec2(ordinates[i], ordinates[i + 1])
            }
            Backend::Floats {
                ordinates, lower, ..
            } => {
                let i = lower + 2 * index;
                vec2(f64::from(ordinates[i]), f64::from(ordinates[i + 1]))
            }
            Backend::RelativeBytes { data, lower, .. } => {
                data.position(data.cumulative_at(lower / 2 + index))
            }
        }
    }

    /// Cursor starting at point `index`, caller checks `index <= point_count()`.
    fn cursor(&self, index: usize) -> Cursor<'_> {
        match self {
            Backend::Dense {
                ordinates,
                lower,
                upper,
            } => Cursor::Dense {
                ordinates: &ordinates[*lower..*upper],
                pos: 2 * index,
            },
            Backend::Floats {
                ordinates,
                lower,
                upper,
            } => Cursor::Floats {
                ordinates: &ordinates[*lower..*upper],
                pos: 2 * index,
            },
            Backend::RelativeBytes {
                data,
                lower,
                upper,
            } => {
                // unused once the cursor is at the end
                let cumulative = if index < self.point_count() {
                    data.cumulative_at(lower / 2 + index)
                } else {
                    (0, 0)
                };
                Cursor::RelativeBytes {
                    data,
                    pos: lower + 2 * index,
                    end: *upper,
                    cumulative,
                }
            }
        }
    }

    /// View over points `start..end`, caller checks `start < end <= point_count()`.
    fn slice(&self, start: usize, end: usize) -> Backend {
        match self {
            Backend::Dense {
                ordinates, lower, ..
            } => Backend::Dense {
                ordinates: Arc::clone(ordinates),
                lower: lower + 2 * start,
                upper: lower + 2 * end,
            },
            Backend::Floats {
                ordinates, lower, ..
            } => Backend::Floats {
                ordinates: Arc::clone(ordinates),
                lower: lower + 2 * start,
                upper: lower + 2 * end,
            },
            Backend::RelativeBytes { data, lower, .. } => Backend::RelativeBytes {
                data: Arc::clone(data),
                lower: lower + 2 * start,
                upper: lower + 2 * end,
            },
        }
    }

    /// Bytes of the whole backing storage (shared storage is counted in full by every view).
    fn memory_usage(&self) -> u64 {
        match self {
            Backend::Dense { ordinates, .. } => {
                (ordinates.capacity() * mem::size_of::<f64>()) as u64
            }
            Backend::Floats { ordinates, .. } => {
                (ordinates.capacity() * mem::size_of::<f32>()) as u64
            }
            Backend::RelativeBytes { data, .. } => data.memory_usage(),
        }
    }

    fn floats<I>(points: I) -> Backend
    where
        I: Iterator<Item = Vector2<f64>>,
    {
        let mut ordinates = Vec::with_capacity(2 * points.size_hint().0);
        for p in points {
            ordinates.push(p.x as f32);
            ordinates.push(p.y as f32);
        }
        let upper = ordinates.len();
        Backend::Floats {
            ordinates: Arc::new(ordinates),
            lower: 0,
            upper,
        }
    }
}

/// Sequence of 2D points stored in one of several (optionally compressed) representations.
///
/// A point array starts out "live": it is backed by a dense `f64` buffer and the structural edits
/// ([PointArray::insert_at], [PointArray::reverse]) reuse that buffer. Once finalized through
/// [PointArray::get_final] the array is immutable, edits then return a new live array and leave
/// the finalized one untouched. Edits consume the array and return the result, always use the
/// returned value.
///
/// Sub arrays ([PointArray::subarray]) share storage with the array they are taken from. Storage
/// is copy on write, editing a live array that has outstanding sub arrays copies the buffer first.
///
/// # Examples
///
/// ```
/// # use geom_arrays::points;
/// # use geom_arrays::array::*;
/// let square = points![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
/// let closed = square.insert_at(4, &points![(0.0, 0.0)], false).unwrap();
/// assert_eq!(closed.len(), 5);
///
/// let finalized = closed.get_final(Some(CompressionLevel::DirectAsFloats)).unwrap();
/// assert!(finalized.is_final());
/// let reversed = finalized.clone().reverse();
/// assert_eq!(reversed.get(1).unwrap().y, 1.0);
/// // finalized array is unchanged
/// assert_eq!(finalized.get(1).unwrap().y, 0.0);
/// ```
#[derive(Clone)]
pub struct PointArray {
    backend: Backend,
    is_final: bool,
    crs: Option<CrsTag>,
}

impl Default for PointArray {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl PointArray {
    /// Create a new empty live array.
    #[inline]
    pub fn new() -> Self {
        Self::live(Vec::new(), None)
    }

    #[inline]
    fn live(ordinates: Vec<f64>, crs: Option<CrsTag>) -> Self {
        let upper = ordinates.len();
        PointArray {
            backend: Backend::Dense {
                ordinates: Arc::new(ordinates),
                lower: 0,
                upper,
            },
            is_final: false,
            crs,
        }
    }

    /// Create a live array from `[x0, y0, x1, y1, ...]` ordinates.
    ///
    /// Fails with [ArrayError::BadRange] if the ordinate count is odd.
    pub fn from_ordinates(ordinates: Vec<f64>) -> Result<Self> {
        if ordinates.len() % 2 != 0 {
            return Err(ArrayError::BadRange {
                lower: 0,
                upper: ordinates.len(),
                len: ordinates.len(),
            });
        }
        Ok(Self::live(ordinates, None))
    }

    /// Create a live array from positions.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Vector2<f64>>,
    {
        let points = points.into_iter();
        let mut ordinates = Vec::with_capacity(2 * points.size_hint().0);
        for p in points {
            ordinates.push(p.x);
            ordinates.push(p.y);
        }
        Self::live(ordinates, None)
    }

    /// Create a finalized view over the ordinate range `lower..upper` of a shared buffer.
    ///
    /// Fails with [ArrayError::BadRange] if `upper < lower`, the range goes past the end of the
    /// buffer, or the range holds an odd number of ordinates.
    pub fn from_shared(ordinates: Arc<Vec<f64>>, lower: usize, upper: usize) -> Result<Self> {
        let len = ordinates.len();
        if upper < lower || upper > len || (upper - lower) % 2 != 0 {
            return Err(ArrayError::BadRange { lower, upper, len });
        }
        Ok(PointArray {
            backend: Backend::Dense {
                ordinates,
                lower,
                upper,
            },
            is_final: true,
            crs: None,
        })
    }

    /// Attach a coordinate reference tag (`None` inherits from the container).
    #[inline]
    pub fn with_crs(mut self, crs: Option<CrsTag>) -> Self {
        self.crs = crs;
        self
    }

    #[inline]
    pub fn crs(&self) -> Option<&CrsTag> {
        self.crs.as_ref()
    }

    /// Number of points (half the ordinate count).
    #[inline]
    pub fn len(&self) -> usize {
        self.backend.point_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the array is finalized (immutable).
    #[inline]
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Current storage compression, `None` for dense `f64` storage.
    #[inline]
    pub fn compression(&self) -> Option<CompressionLevel> {
        self.backend.compression()
    }

    /// Estimate of the memory used by this array in bytes. Storage shared with other arrays is
    /// counted in full so the sum over several arrays may double count.
    #[inline]
    pub fn memory_usage(&self) -> u64 {
        mem::size_of::<Self>() as u64 + self.backend.memory_usage()
    }

    /// Get the point at `index`.
    ///
    /// Constant time for float storage. Byte delta storage sums the deltas from the closest stored
    /// checkpoint, at most 63 of them.
    pub fn get(&self, index: usize) -> Result<Vector2<f64>> {
        let len = self.len();
        if index >= len {
            return Err(ArrayError::IndexOutOfBounds { index, len });
        }
        Ok(self.backend.point(index))
    }

    /// Iterator starting at point `index`, `index == len()` is valid and yields nothing.
    pub fn iterator(&self, index: usize) -> Result<ArrayIter<'_>> {
        let len = self.len();
        if index > len {
            return Err(ArrayError::IndexOutOfBounds { index, len });
        }
        Ok(ArrayIter::new(self.backend.cursor(index)))
    }

    /// Iterator over all the points.
    #[inline]
    pub fn iter(&self) -> ArrayIter<'_> {
        ArrayIter::new(self.backend.cursor(0))
    }

    /// Std iterator over all the points.
    #[inline]
    pub fn points(&self) -> Points<ArrayIter<'_>> {
        self.iter().points()
    }

    /// Decode all points into `[x0, y0, x1, y1, ...]` ordinates.
    pub fn to_vec(&self) -> Vec<f64> {
        let mut result = Vec::with_capacity(2 * self.len());
        for p in self.points() {
            result.push(p.x);
            result.push(p.y);
        }
        result
    }

    /// Returns the live buffer for in place edits, `None` if finalized.
    fn live_buffer_mut(&mut self) -> Option<&mut Vec<f64>> {
        if self.is_final {
            return None;
        }
        match &mut self.backend {
            Backend::Dense { ordinates, .. } => Some(Arc::make_mut(ordinates)),
            _ => None,
        }
    }

    fn sync_live_range(&mut self) {
        if let Backend::Dense {
            ordinates,
            lower,
            upper,
        } = &mut self.backend
        {
            *lower = 0;
            *upper = ordinates.len();
        }
    }

    /// Replace the point at `index`.
    ///
    /// Only live arrays can be modified, finalized arrays fail with [ArrayError::Unsupported].
    pub fn set(&mut self, index: usize, position: Vector2<f64>) -> Result<()> {
        let len = self.len();
        let buffer = self.live_buffer_mut().ok_or(ArrayError::Unsupported {
            operation: "set on finalized point array",
        })?;
        if index >= len {
            return Err(ArrayError::IndexOutOfBounds { index, len });
        }
        buffer[2 * index] = position.x;
        buffer[2 * index + 1] = position.y;
        Ok(())
    }

    /// Append a point to a live array, finalized arrays fail with [ArrayError::Unsupported].
    pub fn push(&mut self, position: Vector2<f64>) -> Result<()> {
        let buffer = self.live_buffer_mut().ok_or(ArrayError::Unsupported {
            operation: "push on finalized point array",
        })?;
        buffer.push(position.x);
        buffer.push(position.y);
        self.sync_live_range();
        Ok(())
    }

    /// Returns a view over points `lower..upper` sharing this array's storage, or `None` if the
    /// range is empty.
    ///
    /// Fails with [ArrayError::BadRange] if `upper < lower` or `upper > len()`.
    pub fn subarray(&self, lower: usize, upper: usize) -> Result<Option<PointArray>> {
        let len = self.len();
        if upper < lower || upper > len {
            return Err(ArrayError::BadRange { lower, upper, len });
        }
        if lower == upper {
            return Ok(None);
        }
        Ok(Some(PointArray {
            backend: self.backend.slice(lower, upper),
            is_final: true,
            crs: self.crs.clone(),
        }))
    }

    /// Insert all points of `other` before point `index` (optionally in reverse order).
    ///
    /// A live array is edited in place and returned, a finalized array is left untouched and a new
    /// live array is returned.
    pub fn insert_at(mut self, index: usize, other: &PointArray, reverse: bool) -> Result<Self> {
        let len = self.len();
        if index > len {
            return Err(ArrayError::IndexOutOfBounds { index, len });
        }

        let mut incoming = other.to_vec();
        if reverse {
            reverse_pairs(&mut incoming);
        }

        let at = 2 * index;
        if let Some(buffer) = self.live_buffer_mut() {
            buffer.splice(at..at, incoming);
            self.sync_live_range();
            return Ok(self);
        }

        let mut ordinates = self.to_vec();
        ordinates.splice(at..at, incoming);
        Ok(Self::live(ordinates, self.crs))
    }

    /// Reverse the point order.
    ///
    /// A live array is reversed in place and returned, a finalized array is left untouched and a
    /// new live array is returned.
    pub fn reverse(mut self) -> Self {
        if let Some(buffer) = self.live_buffer_mut() {
            reverse_pairs(buffer);
            return self;
        }

        let mut ordinates = self.to_vec();
        reverse_pairs(&mut ordinates);
        Self::live(ordinates, self.crs)
    }

    /// Returns an immutable version of this array stored with at least `compression`.
    ///
    /// Returns `None` if the array is empty. A finalized array already stored at or beyond the
    /// requested compression is returned as is (sharing storage). Compression is never undone, a
    /// request below the current compression keeps the current one.
    ///
    /// [CompressionLevel::RelativeAsBytes] cannot represent non finite ordinates, such arrays are
    /// stored with [CompressionLevel::DirectAsFloats] instead.
    pub fn get_final(&self, compression: Option<CompressionLevel>) -> Option<PointArray> {
        if self.is_empty() {
            return None;
        }

        let current = self.backend.compression();
        if self.is_final && current >= compression {
            return Some(self.clone());
        }

        let backend = match current.max(compression) {
            None => self.backend.clone(),
            Some(CompressionLevel::DirectAsFloats) => Backend::floats(self.points()),
            Some(CompressionLevel::RelativeAsBytes) => {
                let points: Vec<_> = self.points().collect();
                match ByteDeltas::encode(&points) {
                    Some(data) => {
                        let upper = data.ordinate_count();
                        Backend::RelativeBytes {
                            data: Arc::new(data),
                            lower: 0,
                            upper,
                        }
                    }
                    None => {
                        tracing::debug!(
                            points = points.len(),
                            "non finite ordinates, storing as floats instead of byte deltas"
                        );
                        Backend::floats(points.into_iter())
                    }
                }
            }
        };

        Some(PointArray {
            backend,
            is_final: true,
            crs: self.crs.clone(),
        })
    }

    /// Append the points to `dest` as a new curve, skipping any point whose squared distance to the
    /// last appended point is less than `resolution_squared`.
    ///
    /// A `resolution_squared <= 0` appends every point. Distances are planar, for geographic
    /// ordinates this is an approximation (callers covering large areas should split arrays
    /// first).
    pub fn to_float_array(&self, dest: &mut ArrayData, resolution_squared: f64) {
        if self.is_empty() {
            return;
        }

        let (lower, upper) = self.backend.range();
        dest.begin_curve();
        let offset = dest.ordinate_len();
        let mut src = lower;
        let mut last: Option<Vector2<f64>> = None;
        for p in self.points() {
            let skip = match last {
                Some(last) => resolution_squared > 0.0 && p.dist_squared(last) < resolution_squared,
                None => false,
            };

            if !skip {
                if dest.capacity() < dest.ordinate_len() + 2 {
                    let grow = growth_estimate(lower, upper, src, dest.ordinate_len(), offset);
                    dest.reserve_ordinates(grow);
                }
                dest.write_point(p.x, p.y);
                last = Some(p);
            }

            src += 2;
        }
    }

    /// Bounding box of all the finite points, `None` if there are none.
    pub fn bounds(&self) -> Option<AABB<f64>> {
        let mut finite = self.points().filter(Vector2::is_finite);
        let first = finite.next()?;
        let mut result = AABB::new(first.x, first.y, first.x, first.y);
        for p in finite {
            result.min_x = result.min_x.min(p.x);
            result.min_y = result.min_y.min(p.y);
            result.max_x = result.max_x.max(p.x);
            result.max_y = result.max_y.max(p.y);
        }
        Some(result)
    }
}

/// Reverse the order of `[x, y]` pairs in place.
fn reverse_pairs(ordinates: &mut [f64]) {
    ordinates.reverse();
    for pair in ordinates.chunks_exact_mut(2) {
        pair.swap(0, 1);
    }
}

impl DecimationSource for PointArray {
    #[inline]
    fn point_count(&self) -> usize {
        self.len()
    }

    #[inline]
    fn lower(&self) -> usize {
        self.backend.range().0
    }

    #[inline]
    fn upper(&self) -> usize {
        self.backend.range().1
    }

    #[inline]
    fn to_float_array(&self, dest: &mut ArrayData, resolution_squared: f64) {
        PointArray::to_float_array(self, dest, resolution_squared)
    }
}

/// Equal if both arrays hold the same ordinates bit for bit (so NaN equals an identical NaN),
/// whatever the storage representation. The coordinate reference tag is not compared.
impl PartialEq for PointArray {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.points().zip(other.points()).all(|(a, b)| {
                a.x.to_bits() == b.x.to_bits() && a.y.to_bits() == b.y.to_bits()
            })
    }
}

impl Eq for PointArray {}

/// Fast and weak: only the length and the first point participate.
impl Hash for PointArray {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        if let Some(first) = self.points().next() {
            first.x.to_bits().hash(state);
            first.y.to_bits().hash(state);
        }
    }
}

impl fmt::Debug for PointArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointArray")
            .field("len", &self.len())
            .field("compression", &self.compression())
            .field("is_final", &self.is_final)
            .field("crs", &self.crs)
            .finish()
    }
}
