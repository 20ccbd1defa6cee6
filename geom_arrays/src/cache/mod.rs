//! Cache of decimated, transformed rendering buffers.
mod budget;
mod polyline_cache;
mod transform_pool;

pub use budget::CacheBudget;
pub use polyline_cache::{CacheOptions, CacheStats, PolylineCache, RenderingArray};
pub use transform_pool::TransformPool;
