use super::FuzzyEq;
use static_aabb2d_index::IndexableNum;

/// Trait representing a real number used for positions and transform coefficients.
pub trait Real:
    num_traits::Float + FuzzyEq + Default + std::fmt::Debug + IndexableNum + Send + Sync + 'static
{
    /// Lossy conversion to `f64`, non-representable values become NaN.
    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl Real for f32 {
    #[inline]
    fn to_f64_lossy(self) -> f64 {
        f64::from(self)
    }
}

impl Real for f64 {
    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self
    }
}
