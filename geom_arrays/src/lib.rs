//! Point arrays with dense, float and byte-delta backends, and a per-polyline cache of decimated,
//! transformed rendering buffers.
//!
//! - [array] holds [PointArray](array::PointArray), its [PointIterator](array::PointIterator)
//!   cursors and the [ArrayData](array::ArrayData) decimation buffer.
//! - [cache] holds [PolylineCache](cache::PolylineCache) which hands out rendering buffers and
//!   updates them in place through delta transforms.
//! - [path] turns point iterators into drawing commands.
extern crate static_aabb2d_index;

#[macro_use]
mod macros;
mod error;

pub mod array;
pub mod cache;
pub mod core;
pub mod path;

pub use static_aabb2d_index::AABB;

pub use crate::error::{ArrayError, Result};
