use super::{vec2, Vector2};
use crate::{core::traits::Real, ArrayError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 2D affine transform.
///
/// Maps a point `(x, y)` to:
///
/// ```text
/// x' = m00 * x + m01 * y + m02
/// y' = m10 * x + m11 * y + m12
/// ```
///
/// # Examples
///
/// ```
/// # use geom_arrays::core::math::*;
/// let scale = Affine2::scale(2.0, 2.0);
/// let shift = Affine2::translation(1.0, 0.0);
/// // scale first, then shift
/// let both = scale.then(&shift);
/// assert!(both.transform_point(vec2(1.0, 1.0)).fuzzy_eq(vec2(3.0, 2.0)));
/// let inverse = both.inverse().unwrap();
/// assert!(inverse.transform_point(vec2(3.0, 2.0)).fuzzy_eq(vec2(1.0, 1.0)));
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2<T = f64> {
    pub m00: T,
    pub m10: T,
    pub m01: T,
    pub m11: T,
    pub m02: T,
    pub m12: T,
}

impl<T> Default for Affine2<T>
where
    T: Real,
{
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

impl<T> Affine2<T>
where
    T: Real,
{
    #[inline]
    pub fn new(m00: T, m10: T, m01: T, m11: T, m02: T, m12: T) -> Self {
        Affine2 {
            m00,
            m10,
            m01,
            m11,
            m02,
            m12,
        }
    }

    #[inline]
    pub fn identity() -> Self {
        let (zero, one) = (T::zero(), T::one());
        Self::new(one, zero, zero, one, zero, zero)
    }

    #[inline]
    pub fn translation(tx: T, ty: T) -> Self {
        let (zero, one) = (T::zero(), T::one());
        Self::new(one, zero, zero, one, tx, ty)
    }

    #[inline]
    pub fn scale(sx: T, sy: T) -> Self {
        let zero = T::zero();
        Self::new(sx, zero, zero, sy, zero, zero)
    }

    /// Counter clockwise rotation about the origin by `angle` radians.
    #[inline]
    pub fn rotation(angle: T) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c, s, -s, c, T::zero(), T::zero())
    }

    /// Returns `true` if this is exactly the identity transform.
    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    #[inline]
    pub fn determinant(&self) -> T {
        self.m00 * self.m11 - self.m01 * self.m10
    }

    /// Compose with `next`, the result applies `self` first and then `next`.
    pub fn then(&self, next: &Self) -> Self {
        Self::new(
            next.m00 * self.m00 + next.m01 * self.m10,
            next.m10 * self.m00 + next.m11 * self.m10,
            next.m00 * self.m01 + next.m01 * self.m11,
            next.m10 * self.m01 + next.m11 * self.m11,
            next.m00 * self.m02 + next.m01 * self.m12 + next.m02,
            next.m10 * self.m02 + next.m11 * self.m12 + next.m12,
        )
    }

    /// Compute the inverse transform.
    ///
    /// Fails with [ArrayError::NotInvertible] if the determinant is zero or not finite.
    pub fn inverse(&self) -> Result<Self> {
        let det = self.determinant();
        if det == T::zero() || !det.is_finite() {
            return Err(ArrayError::NotInvertible {
                determinant: det.to_f64_lossy(),
            });
        }

        Ok(Self::new(
            self.m11 / det,
            -self.m10 / det,
            -self.m01 / det,
            self.m00 / det,
            (self.m01 * self.m12 - self.m11 * self.m02) / det,
            (self.m10 * self.m02 - self.m00 * self.m12) / det,
        ))
    }

    #[inline]
    pub fn transform_point(&self, p: Vector2<T>) -> Vector2<T> {
        vec2(
            self.m00 * p.x + self.m01 * p.y + self.m02,
            self.m10 * p.x + self.m11 * p.y + self.m12,
        )
    }

    /// Transform a buffer of `[x0, y0, x1, y1, ...]` ordinates in place.
    ///
    /// A trailing unpaired ordinate is left untouched.
    pub fn apply_in_place(&self, ordinates: &mut [T]) {
        for pair in ordinates.chunks_exact_mut(2) {
            let p = self.transform_point(vec2(pair[0], pair[1]));
            pair[0] = p.x;
            pair[1] = p.y;
        }
    }

    /// Fuzzy equal comparison of all coefficients using `fuzzy_epsilon`.
    pub fn fuzzy_eq_eps(&self, other: &Self, fuzzy_epsilon: T) -> bool {
        self.m00.fuzzy_eq_eps(other.m00, fuzzy_epsilon)
            && self.m10.fuzzy_eq_eps(other.m10, fuzzy_epsilon)
            && self.m01.fuzzy_eq_eps(other.m01, fuzzy_epsilon)
            && self.m11.fuzzy_eq_eps(other.m11, fuzzy_epsilon)
            && self.m02.fuzzy_eq_eps(other.m02, fuzzy_epsilon)
            && self.m12.fuzzy_eq_eps(other.m12, fuzzy_epsilon)
    }

    #[inline]
    pub fn fuzzy_eq(&self, other: &Self) -> bool {
        self.fuzzy_eq_eps(other, T::fuzzy_epsilon())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn compose_order() {
        let rotate = Affine2::rotation(FRAC_PI_2);
        let shift = Affine2::translation(10.0, 0.0);
        // rotate (1, 0) to (0, 1) then shift
        let p = rotate.then(&shift).transform_point(vec2(1.0, 0.0));
        assert!(p.fuzzy_eq(vec2(10.0, 1.0)));
        // shift (1, 0) to (11, 0) then rotate
        let p = shift.then(&rotate).transform_point(vec2(1.0, 0.0));
        assert!(p.fuzzy_eq(vec2(0.0, 11.0)));
    }

    #[test]
    fn inverse_round_trip() {
        let t = Affine2::new(2.0, 0.5, -1.0, 3.0, 4.0, -7.0);
        let inv = t.inverse().unwrap();
        assert!(t.then(&inv).fuzzy_eq(&Affine2::identity()));
        assert!(inv.then(&t).fuzzy_eq(&Affine2::identity()));
    }

    #[test]
    fn singular_inverse_fails() {
        let collapse = Affine2::scale(0.0, 1.0);
        assert_eq!(
            collapse.inverse(),
            Err(ArrayError::NotInvertible { determinant: 0.0 })
        );
        let non_finite = Affine2::scale(f64::INFINITY, 1.0);
        assert!(non_finite.inverse().is_err());
    }

    #[test]
    fn apply_in_place_pairs() {
        let mut ordinates = [0.0, 0.0, 1.0, 2.0];
        Affine2::translation(1.0, -1.0).apply_in_place(&mut ordinates);
        assert_eq!(ordinates, [1.0, -1.0, 2.0, 1.0]);
        assert!(Affine2::<f64>::identity().is_identity());
        assert!(!Affine2::translation(0.0, 1e-12).is_identity());
    }
}
