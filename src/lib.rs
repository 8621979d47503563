//! `nongli-fit` library crate.
//!
//! The binary (`nlfit`) is a thin wrapper around this library so that:
//!
//! - the fit engine is testable without spawning processes
//! - the engine and codec are reusable without the CSV/CLI layers
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod pack;
pub mod report;
