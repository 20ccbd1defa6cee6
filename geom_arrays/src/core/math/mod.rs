//! Positions and 2D affine transforms.
mod affine2;
mod vector2;

pub use affine2::*;
pub use vector2::*;
