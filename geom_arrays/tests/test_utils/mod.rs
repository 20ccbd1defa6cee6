#![allow(dead_code)]
pub mod logging;
pub mod ordinates;

pub use logging::init_logging;
pub use ordinates::*;
