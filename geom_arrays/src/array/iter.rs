use super::compression::ByteDeltas;
use crate::{
    core::math::{vec2, Vector2},
    ArrayError, Result,
};
use std::iter::FusedIterator;

/// Strict forward cursor over `(x, y)` ordinate pairs.
///
/// For each point [PointIterator::next_x] must be called exactly once followed by
/// [PointIterator::next_y]. Calls out of that order fail with [ArrayError::IteratorOrder] and
/// calling [PointIterator::next_x] with no point left fails with [ArrayError::Exhausted].
///
/// Cloning an iterator forks the cursor: the clone continues from the same position and advances
/// independently from the original.
///
/// # Examples
///
/// ```
/// # use geom_arrays::points;
/// # use geom_arrays::array::*;
/// let array = points![(0.0, 0.0), (1.0, 2.0)];
/// let mut iter = array.iter();
/// assert!(iter.has_next());
/// assert_eq!(iter.next_x(), Ok(0.0));
/// assert_eq!(iter.next_y(), Ok(0.0));
/// let mut fork = iter.clone();
/// assert_eq!(iter.next_x(), Ok(1.0));
/// assert_eq!(iter.next_y(), Ok(2.0));
/// assert!(!iter.has_next());
/// // fork still has the last point
/// assert!(fork.has_next());
/// assert_eq!(fork.next_pair().unwrap().y, 2.0);
/// ```
pub trait PointIterator: Clone {
    /// Returns `true` if the point under the cursor has not been fully read.
    fn has_next(&self) -> bool;

    /// Read the x ordinate of the next point.
    fn next_x(&mut self) -> Result<f64>;

    /// Read the y ordinate of the point whose x ordinate was just read.
    fn next_y(&mut self) -> Result<f64>;

    /// Number of points not yet started.
    fn remaining(&self) -> usize;

    /// Read both ordinates of the next point.
    #[inline]
    fn next_pair(&mut self) -> Result<Vector2<f64>> {
        let x = self.next_x()?;
        let y = self.next_y()?;
        Ok(vec2(x, y))
    }

    /// Removal through the iterator is not supported by any point source.
    #[inline]
    fn remove(&mut self) -> Result<()> {
        Err(ArrayError::Unsupported {
            operation: "remove through point iterator",
        })
    }

    /// Adapt into a std [Iterator] of positions.
    #[inline]
    fn points(self) -> Points<Self>
    where
        Self: Sized,
    {
        Points { inner: self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitX,
    AwaitY,
}

/// Std [Iterator] adaptor over a [PointIterator], see [PointIterator::points].
#[derive(Debug, Clone)]
pub struct Points<I> {
    inner: I,
}

impl<I> Points<I> {
    /// Release the wrapped cursor.
    #[inline]
    pub fn into_inner(self) -> I {
        self.inner
    }
}

impl<I> Iterator for Points<I>
where
    I: PointIterator,
{
    type Item = Vector2<f64>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if !self.inner.has_next() {
            return None;
        }
        self.inner.next_pair().ok()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.inner.remaining();
        (remaining, Some(remaining))
    }
}

impl<I> ExactSizeIterator for Points<I> where I: PointIterator {}

impl<I> FusedIterator for Points<I> where I: PointIterator {}

/// [PointIterator] over a plain `[x0, y0, x1, y1, ...]` ordinate slice.
#[derive(Debug, Clone)]
pub struct OrdinateIter<'a> {
    ordinates: &'a [f64],
    pos: usize,
    phase: Phase,
}

impl<'a> OrdinateIter<'a> {
    /// Create from an ordinate slice, a trailing unpaired ordinate is ignored.
    #[inline]
    pub fn new(ordinates: &'a [f64]) -> Self {
        let even = ordinates.len() & !1;
        Self {
            ordinates: &ordinates[..even],
            pos: 0,
            phase: Phase::AwaitX,
        }
    }
}

impl PointIterator for OrdinateIter<'_> {
    #[inline]
    fn has_next(&self) -> bool {
        self.pos < self.ordinates.len()
    }

    fn next_x(&mut self) -> Result<f64> {
        if self.phase == Phase::AwaitY {
            return Err(ArrayError::IteratorOrder { expected: "next_y" });
        }
        let x = *self.ordinates.get(self.pos).ok_or(ArrayError::Exhausted)?;
        self.phase = Phase::AwaitY;
        Ok(x)
    }

    fn next_y(&mut self) -> Result<f64> {
        if self.phase == Phase::AwaitX {
            return Err(ArrayError::IteratorOrder { expected: "next_x" });
        }
        let y = self.ordinates[self.pos + 1];
        self.pos += 2;
        self.phase = Phase::AwaitX;
        Ok(y)
    }

    #[inline]
    fn remaining(&self) -> usize {
        let started = usize::from(self.phase == Phase::AwaitY);
        (self.ordinates.len() - self.pos) / 2 - started
    }
}

/// Backend specific read position of an [ArrayIter].
#[derive(Debug, Clone)]
pub(crate) enum Cursor<'a> {
    Dense {
        ordinates: &'a [f64],
        pos: usize,
    },
    Floats {
        ordinates: &'a [f32],
        pos: usize,
    },
    RelativeBytes {
        data: &'a ByteDeltas,
        /// Ordinate index of the next point to yield.
        pos: usize,
        end: usize,
        /// Cumulative delta sum of the point at `pos`.
        cumulative: (i64, i64),
    },
}

impl Cursor<'_> {
    #[inline]
    fn remaining(&self) -> usize {
        match self {
            Cursor::Dense { ordinates, pos } => (ordinates.len() - pos) / 2,
            Cursor::Floats { ordinates, pos } => (ordinates.len() - pos) / 2,
            Cursor::RelativeBytes { pos, end, .. } => (end - pos) / 2,
        }
    }

    fn advance(&mut self) -> Option<Vector2<f64>> {
        match self {
            Cursor::Dense { ordinates, pos } => {
                let p = ordinates.get(*pos..*pos + 2)?;
                *pos += 2;
                Some(vec2(p[0], p[1]))
            }
            Cursor::Floats { ordinates, pos } => {
                let p = ordinates.get(*pos..*pos + 2)?;
                *pos += 2;
                Some(vec2(f64::from(p[0]), f64::from(p[1])))
            }
            Cursor::RelativeBytes {
                data,
                pos,
                end,
                cumulative,
            } => {
                if *pos >= *end {
                    return None;
                }
                let p = data.position(*cumulative);
                *pos += 2;
                if *pos < *end {
                    let d = data.delta_at(*pos);
                    cumulative.0 += d.0;
                    cumulative.1 += d.1;
                }
                Some(p)
            }
        }
    }
}

/// [PointIterator] over a [PointArray](super::PointArray), created by
/// [PointArray::iter](super::PointArray::iter) or [PointArray::iterator](super::PointArray::iterator).
#[derive(Debug, Clone)]
pub struct ArrayIter<'a> {
    cursor: Cursor<'a>,
    phase: Phase,
    pending_y: f64,
}

impl<'a> ArrayIter<'a> {
    #[inline]
    pub(crate) fn new(cursor: Cursor<'a>) -> Self {
        Self {
            cursor,
            phase: Phase::AwaitX,
            pending_y: f64::NAN,
        }
    }
}

impl PointIterator for ArrayIter<'_> {
    #[inline]
    fn has_next(&self) -> bool {
        self.phase == Phase::AwaitY || self.cursor.remaining() > 0
    }

    fn next_x(&mut self) -> Result<f64> {
        if self.phase == Phase::AwaitY {
            return Err(ArrayError::IteratorOrder { expected: "next_y" });
        }
        let p = self.cursor.advance().ok_or(ArrayError::Exhausted)?;
        self.pending_y = p.y;
        self.phase = Phase::AwaitY;
        Ok(p.x)
    }

    fn next_y(&mut self) -> Result<f64> {
        if self.phase == Phase::AwaitX {
            return Err(ArrayError::IteratorOrder { expected: "next_x" });
        }
        self.phase = Phase::AwaitX;
        Ok(self.pending_y)
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.cursor.remaining()
    }
}
