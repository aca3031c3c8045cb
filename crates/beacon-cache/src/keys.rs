//! Cache key builders for all Beacon presence-cache entries.
//!
//! Centralising key construction prevents typos and makes it easy
//! to find every key the application uses.

use beacon_core::types::UserId;

/// Key for the sharing session flag (`"true"` / `"false"`).
pub fn is_location_sharing() -> &'static str {
    "isLocationSharing"
}

/// Key for the serialized roster snapshot map.
pub fn family_members() -> &'static str {
    "familyMembers"
}

/// Key for the current user's own last-known location record.
pub fn user_location(user_id: &UserId) -> String {
    format!("user_location_{user_id}")
}

/// Key for the fallback pseudo-identity used when unauthenticated.
pub fn user_id() -> &'static str {
    "userId"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_keys() {
        assert_eq!(is_location_sharing(), "isLocationSharing");
        assert_eq!(family_members(), "familyMembers");
        assert_eq!(user_id(), "userId");
    }

    #[test]
    fn test_user_location_key() {
        let uid = UserId::new("u-17");
        assert_eq!(user_location(&uid), "user_location_u-17");
    }
}
