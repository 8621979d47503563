//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - window slicing, paging and byte accounting of residual tables (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
