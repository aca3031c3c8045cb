//! Emergency alert domain entities.

pub mod model;

pub use model::{AlertKind, EmergencyAlert};
