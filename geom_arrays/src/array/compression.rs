use crate::core::math::{vec2, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Storage policy applied when finalizing a [PointArray](super::PointArray).
///
/// Levels are ordered from least to most compressed, asking for a level at or below the current
/// storage of an array is a no-op.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompressionLevel {
    /// Store ordinates as single precision floats.
    DirectAsFloats,
    /// Store each point after the first as a signed byte delta from the previous point, scaled
    /// per axis. Lossy, assumes roughly even spacing between consecutive points.
    RelativeAsBytes,
}

/// Per axis steps are quantized to at most this many units (leaves head room inside `i8` for the
/// rounding carried between points).
const MAX_STEP_UNITS: f64 = 120.0;

/// Points between stored cumulative sums, bounds the deltas summed by a random access.
const CHECKPOINT_INTERVAL: usize = 64;

/// Byte delta encoded points.
///
/// The position of point `i` is `origin + cumulative(i) * scale` where `cumulative(i)` is the
/// integer sum of the deltas for points `1..=i`. Deltas are chosen against the reconstructed
/// positions so quantization error stays within half a scale unit and never accumulates.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ByteDeltas {
    origin: Vector2<f64>,
    scale: Vector2<f64>,
    /// Two deltas per point, the first pair is always zero.
    deltas: Vec<i8>,
    /// `cumulative(k * CHECKPOINT_INTERVAL)` for each `k`.
    checkpoints: Vec<(i64, i64)>,
}

impl ByteDeltas {
    /// Encode `points`, returns `None` if empty or any ordinate is not finite.
    pub fn encode(points: &[Vector2<f64>]) -> Option<Self> {
        let first = *points.first()?;
        if !points.iter().all(Vector2::is_finite) {
            return None;
        }

        let mut max_step = Vector2::zero();
        for w in points.windows(2) {
            let step = w[1] - w[0];
            max_step.x = f64::max(max_step.x, step.x.abs());
            max_step.y = f64::max(max_step.y, step.y.abs());
        }

        let scale = vec2(max_step.x / MAX_STEP_UNITS, max_step.y / MAX_STEP_UNITS);
        if !scale.is_finite() {
            return None;
        }

        let quantize = |offset: f64, unit: f64| -> i64 {
            if unit > 0.0 {
                (offset / unit).round() as i64
            } else {
                0
            }
        };

        let mut deltas = Vec::with_capacity(points.len() * 2);
        deltas.extend_from_slice(&[0, 0]);
        let mut cumulative = (0i64, 0i64);
        let mut checkpoints = Vec::with_capacity(points.len() / CHECKPOINT_INTERVAL + 1);
        checkpoints.push(cumulative);
        for (i, p) in points.iter().enumerate().skip(1) {
            let target = (
                quantize(p.x - first.x, scale.x),
                quantize(p.y - first.y, scale.y),
            );
            let dx = clamp_delta(target.0 - cumulative.0);
            let dy = clamp_delta(target.1 - cumulative.1);
            cumulative.0 += i64::from(dx);
            cumulative.1 += i64::from(dy);
            deltas.push(dx);
            deltas.push(dy);
            if i % CHECKPOINT_INTERVAL == 0 {
                checkpoints.push(cumulative);
            }
        }

        Some(ByteDeltas {
            origin: first,
            scale,
            deltas,
            checkpoints,
        })
    }

    /// Number of stored ordinates (two per point).
    #[inline]
    pub fn ordinate_count(&self) -> usize {
        self.deltas.len()
    }

    /// Delta pair stored at ordinate index `ordinate` (must be even).
    #[inline]
    pub fn delta_at(&self, ordinate: usize) -> (i64, i64) {
        (
            i64::from(self.deltas[ordinate]),
            i64::from(self.deltas[ordinate + 1]),
        )
    }

    /// Cumulative delta sum of point `point`, summing at most `CHECKPOINT_INTERVAL - 1` deltas.
    pub fn cumulative_at(&self, point: usize) -> (i64, i64) {
        let k = point / CHECKPOINT_INTERVAL;
        let start = k * CHECKPOINT_INTERVAL;
        (start + 1..=point).fold(self.checkpoints[k], |acc, i| {
            let d = self.delta_at(2 * i);
            (acc.0 + d.0, acc.1 + d.1)
        })
    }

    #[inline]
    pub fn position(&self, cumulative: (i64, i64)) -> Vector2<f64> {
        vec2(
            self.origin.x + cumulative.0 as f64 * self.scale.x,
            self.origin.y + cumulative.1 as f64 * self.scale.y,
        )
    }

    pub fn memory_usage(&self) -> u64 {
        (std::mem::size_of::<Self>()
            + self.deltas.capacity()
            + self.checkpoints.capacity() * std::mem::size_of::<(i64, i64)>()) as u64
    }
}

#[inline]
fn clamp_delta(delta: i64) -> i8 {
    delta.clamp(i64::from(i8::MIN), i64::from(i8::MAX)) as i8
}
