/// Trait for fuzzy equality comparisons with floating point numbers.
///
/// Coordinates that pass through transforms (and back through an inverse transform) rarely come
/// out bit identical, so comparisons of transformed data use a tolerance.
///
/// # Examples
///
/// ```
/// # use geom_arrays::core::traits::*;
/// let a = 0.1 + 0.2;
/// let b = 0.3;
/// assert_ne!(a, b);
/// assert!(a.fuzzy_eq(b));
/// ```
pub trait FuzzyEq: Sized + Copy {
    /// Returns the default epsilon value for fuzzy comparisons.
    fn fuzzy_epsilon() -> Self;

    /// Returns `true` if this value is approximately equal to `other` using `fuzzy_epsilon`.
    fn fuzzy_eq_eps(&self, other: Self, fuzzy_epsilon: Self) -> bool;

    /// Same as [FuzzyEq::fuzzy_eq_eps] using [FuzzyEq::fuzzy_epsilon].
    #[inline]
    fn fuzzy_eq(&self, other: Self) -> bool {
        self.fuzzy_eq_eps(other, Self::fuzzy_epsilon())
    }
}

macro_rules! impl_fuzzy_eq {
    ($ty:ty, $eps:expr) => {
        impl FuzzyEq for $ty {
            #[inline]
            fn fuzzy_epsilon() -> Self {
                $eps
            }

            #[inline]
            fn fuzzy_eq_eps(&self, other: Self, fuzzy_epsilon: Self) -> bool {
                (*self - other).abs() < fuzzy_epsilon
            }
        }
    };
}

impl_fuzzy_eq!(f32, 1.0e-5);
impl_fuzzy_eq!(f64, 1.0e-8);
