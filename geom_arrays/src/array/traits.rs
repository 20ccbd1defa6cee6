use super::ArrayData;

/// Source of points that can be decimated into an [ArrayData] buffer.
///
/// This is the contract the rendering cache rebuilds its buffers through, see
/// [PolylineCache](crate::cache::PolylineCache).
pub trait DecimationSource {
    /// Total number of points.
    fn point_count(&self) -> usize;

    /// Lower bound of the ordinate index range iterated, only used to estimate buffer growth.
    fn lower(&self) -> usize;

    /// Upper bound (exclusive) of the ordinate index range iterated, only used to estimate buffer
    /// growth.
    fn upper(&self) -> usize;

    /// Append the points to `dest`, skipping any point closer than `sqrt(resolution_squared)` to
    /// the last point appended. A `resolution_squared <= 0` appends every point.
    fn to_float_array(&self, dest: &mut ArrayData, resolution_squared: f64);
}

/// Each array in the slice becomes its own curve in the destination buffer.
impl<S> DecimationSource for [S]
where
    S: DecimationSource,
{
    #[inline]
    fn point_count(&self) -> usize {
        self.iter().map(DecimationSource::point_count).sum()
    }

    #[inline]
    fn lower(&self) -> usize {
        0
    }

    #[inline]
    fn upper(&self) -> usize {
        self.iter().map(|s| s.upper() - s.lower()).sum()
    }

    fn to_float_array(&self, dest: &mut ArrayData, resolution_squared: f64) {
        for source in self {
            source.to_float_array(dest, resolution_squared);
        }
    }
}
