//! Location domain entities.

pub mod model;

pub use model::LocationSample;
