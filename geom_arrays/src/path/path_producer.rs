use crate::{
    array::PointIterator,
    core::math::{Affine2, Vector2},
};
use std::iter::FusedIterator;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Single drawing instruction produced by [PathProducer].
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "kind", rename_all = "camelCase")
)]
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathCommand {
    /// Start a new sub path at the position.
    MoveTo(Vector2<f64>),
    /// Straight segment from the current position.
    LineTo(Vector2<f64>),
    /// End of the path.
    Close,
}

impl PathCommand {
    /// Position of the command, `None` for [PathCommand::Close].
    #[inline]
    pub fn position(&self) -> Option<Vector2<f64>> {
        match self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(*p),
            PathCommand::Close => None,
        }
    }

    #[inline]
    pub fn is_move(&self) -> bool {
        matches!(self, PathCommand::MoveTo(_))
    }
}

/// Lazy producer of [PathCommand]s from a [PointIterator].
///
/// The first point always starts with [PathCommand::MoveTo], following points are joined with
/// [PathCommand::LineTo]. A point with a non-finite ordinate is a hole: it produces no command and
/// the next finite point starts a new sub path. Once the source is drained a single
/// [PathCommand::Close] ends the sequence, an empty source produces only that close.
///
/// The producer consumes its source and cannot be restarted.
///
/// # Examples
///
/// ```
/// # use geom_arrays::points;
/// # use geom_arrays::core::math::vec2;
/// # use geom_arrays::path::*;
/// let array = points![(0.0, 0.0), (f64::NAN, f64::NAN), (1.0, 1.0)];
/// let commands: Vec<_> = PathProducer::new(array.iter(), None).collect();
/// assert_eq!(
///     commands,
///     vec![
///         PathCommand::MoveTo(vec2(0.0, 0.0)),
///         PathCommand::MoveTo(vec2(1.0, 1.0)),
///         PathCommand::Close
///     ]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PathProducer<I> {
    source: I,
    transform: Option<Affine2>,
    /// Sorted point indexes forced to start a new sub path.
    breaks: Vec<usize>,
    next_break: usize,
    point_index: usize,
    restart: bool,
    finished: bool,
}

impl<I> PathProducer<I>
where
    I: PointIterator,
{
    /// Create a producer over `source`, applying `transform` to every point if given.
    #[inline]
    pub fn new(source: I, transform: Option<Affine2>) -> Self {
        Self::with_breaks(source, transform, Vec::new())
    }

    /// Same as [PathProducer::new] but also starting a new sub path at each point index in
    /// `breaks` (index relative to the source's current position).
    pub fn with_breaks(source: I, transform: Option<Affine2>, mut breaks: Vec<usize>) -> Self {
        breaks.sort_unstable();
        breaks.dedup();
        PathProducer {
            source,
            transform: transform.filter(|t| !t.is_identity()),
            breaks,
            next_break: 0,
            point_index: 0,
            restart: true,
            finished: false,
        }
    }

    #[inline]
    fn at_break(&mut self) -> bool {
        while self
            .breaks
            .get(self.next_break)
            .is_some_and(|&b| b < self.point_index)
        {
            self.next_break += 1;
        }
        self.breaks.get(self.next_break) == Some(&self.point_index)
    }
}

impl<I> Iterator for PathProducer<I>
where
    I: PointIterator,
{
    type Item = PathCommand;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while self.source.has_next() {
            let Ok(point) = self.source.next_pair() else {
                break;
            };

            if self.at_break() {
                self.restart = true;
            }
            self.point_index += 1;

            if !point.is_finite() {
                self.restart = true;
                continue;
            }

            let point = match &self.transform {
                Some(t) => t.transform_point(point),
                None => point,
            };

            if std::mem::replace(&mut self.restart, false) {
                return Some(PathCommand::MoveTo(point));
            }
            return Some(PathCommand::LineTo(point));
        }

        self.finished = true;
        Some(PathCommand::Close)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        (1, Some(self.source.remaining() + 1))
    }
}

impl<I> FusedIterator for PathProducer<I> where I: PointIterator {}
