//! Roster member domain entities.

pub mod model;
pub mod phone;

pub use model::{FamilyMember, MemberDraft};
pub use phone::normalize_phone;
