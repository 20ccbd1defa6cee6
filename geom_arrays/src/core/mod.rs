//! Core module has the shared numeric traits and math types.
pub mod math;
pub mod traits;
