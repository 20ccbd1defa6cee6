use super::OrdinateIter;
use crate::core::math::Affine2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest growth step (in ordinates) taken when filling an [ArrayData].
const MIN_GROWTH: usize = 32;

/// Growable destination buffer of `[x0, y0, x1, y1, ...]` ordinates filled by decimation.
///
/// The physical buffer may be larger than the valid length, growth is driven by
/// [growth_estimate] when the final size is unknown. Each call appending a new curve records the
/// point index where that curve starts (see [ArrayData::curves]).
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayData {
    /// Physical buffer, only `..length` holds valid ordinates.
    ordinates: Vec<f64>,
    /// Valid ordinate count, always even.
    length: usize,
    /// Start point index of each appended curve.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    curves: Vec<usize>,
}

impl ArrayData {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with physical room for `ordinates` ordinates.
    #[inline]
    pub fn with_capacity(ordinates: usize) -> Self {
        ArrayData {
            ordinates: vec![0.0; ordinates],
            length: 0,
            curves: Vec::new(),
        }
    }

    /// Number of valid points.
    #[inline]
    pub fn len(&self) -> usize {
        self.length / 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of valid ordinates (twice [ArrayData::len]).
    #[inline]
    pub fn ordinate_len(&self) -> usize {
        self.length
    }

    /// Physical size of the buffer in ordinates.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ordinates.len()
    }

    #[inline]
    pub fn ordinates(&self) -> &[f64] {
        &self.ordinates[..self.length]
    }

    #[inline]
    pub fn ordinates_mut(&mut self) -> &mut [f64] {
        &mut self.ordinates[..self.length]
    }

    /// Start point index of each curve appended to this buffer.
    #[inline]
    pub fn curves(&self) -> &[usize] {
        &self.curves
    }

    #[inline]
    pub fn iter(&self) -> OrdinateIter<'_> {
        OrdinateIter::new(self.ordinates())
    }

    /// Mark the start of a new curve at the current end of the buffer.
    #[inline]
    pub fn begin_curve(&mut self) {
        let start = self.len();
        if self.curves.last() != Some(&start) {
            self.curves.push(start);
        }
    }

    /// Ensure room for at least `additional` more ordinates past the valid length.
    pub fn reserve_ordinates(&mut self, additional: usize) {
        let required = self.length + additional;
        if required > self.ordinates.len() {
            self.ordinates.resize(required, 0.0);
        }
    }

    /// Append a point, growing by doubling if the buffer is full.
    pub fn push_point(&mut self, x: f64, y: f64) {
        if self.length + 2 > self.ordinates.len() {
            let grow = usize::max(MIN_GROWTH, self.ordinates.len());
            self.reserve_ordinates(grow);
        }
        self.write_point(x, y);
    }

    /// Write a point at the end of the valid range, caller ensures room for it.
    #[inline]
    pub(crate) fn write_point(&mut self, x: f64, y: f64) {
        self.ordinates[self.length] = x;
        self.ordinates[self.length + 1] = y;
        self.length += 2;
    }

    /// Apply `transform` to all valid ordinates in place.
    #[inline]
    pub fn apply_transform(&mut self, transform: &Affine2) {
        transform.apply_in_place(self.ordinates_mut());
    }

    /// Shrink the physical buffer to the valid length if it is more than `factor` times larger.
    ///
    /// Returns `true` if the buffer was trimmed.
    pub fn trim(&mut self, factor: usize) -> bool {
        if self.ordinates.len() <= self.length.saturating_mul(factor.max(1)) {
            return false;
        }

        self.ordinates.truncate(self.length);
        self.ordinates.shrink_to_fit();
        true
    }

    /// Reset valid length and curves, keeping the physical buffer for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.length = 0;
        self.curves.clear();
    }
}

/// Estimate how many more ordinates to allocate while copying a source range of unknown decimated
/// output size.
///
/// `lower..upper` is the fixed source ordinate range being iterated, `src` the current source
/// ordinate index, `dst` the current destination ordinate index and `offset` the destination index
/// the copy started at.
///
/// Before any source is consumed one eighth of the range is guessed. After that the output so far
/// is scaled linearly to the whole range, the missing part is inflated by 12%, floored at 32
/// ordinates, rounded up to even, and capped at the source ordinates left to read.
pub fn growth_estimate(lower: usize, upper: usize, src: usize, dst: usize, offset: usize) -> usize {
    debug_assert!(lower <= src && src <= upper);
    debug_assert!(offset <= dst);
    let range = upper - lower;
    let consumed = src - lower;
    let written = dst - offset;
    let remaining = upper - src;

    let growth = if consumed == 0 {
        range / 8
    } else {
        let guessed_total = (written as u128 * range as u128 / consumed as u128) as usize;
        let missing = guessed_total.saturating_sub(written);
        missing + missing * 12 / 100
    };

    let growth = growth.max(MIN_GROWTH);
    let growth = growth + (growth & 1);
    growth.min(remaining)
}
