//! Fit-and-quantize engine.
//!
//! Responsibilities:
//!
//! - search the smallest shift width that satisfies each fit's acceptance rule
//! - quantize real least-squares fits into integer coefficients
//! - produce bounded, non-negative residual tables where the fit is not exact

pub mod exact;
pub mod level;
pub mod search;
pub mod sextic;

pub use exact::*;
pub use level::*;
pub use search::{DUAL_SHIFT_MAX_SHIFT, EXACT_MAX_SHIFT, LEVEL_MAX_SHIFT, SEXTIC_MAX_SHIFT};
pub use sextic::*;
