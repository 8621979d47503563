//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - coefficient sets for every fit kind (`LevelCoefficients`, `SexticCoefficients`, ...)
//! - calendar event rows (`LunarRow`, `SolarRow`)
//! - the run configuration (`RunConfig`)

pub mod types;

pub use types::*;
