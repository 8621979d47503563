//! Residual table codec.

pub mod bits;

pub use bits::*;
