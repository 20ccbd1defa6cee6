//! Point arrays, their iterators, and the decimation destination buffer.
mod array_data;
mod compression;
mod iter;
mod point_array;
mod traits;

pub use array_data::*;
pub use compression::CompressionLevel;
pub use iter::{ArrayIter, OrdinateIter, PointIterator, Points};
pub use point_array::*;
pub use traits::*;

pub(crate) use iter::Cursor;
