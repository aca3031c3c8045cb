//! Traits implemented by the Beacon adapter crates.

pub mod cache;
pub mod location;

pub use cache::CacheProvider;
pub use location::{
    AccuracyProfile, FixStream, LocationProvider, PermissionGrant, RawFix, SubscriptionOptions,
};
