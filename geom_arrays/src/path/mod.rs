//! Drawing commands produced from point iterators.
mod path_producer;

pub use path_producer::*;
