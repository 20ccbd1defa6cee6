//! Core/common numeric traits.
mod fuzzy_eq;
mod real;

pub use fuzzy_eq::FuzzyEq;
pub use real::Real;
