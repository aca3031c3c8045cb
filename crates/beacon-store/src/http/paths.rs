//! Document path builders for the roster store API.
//!
//! Centralising path construction prevents typos and makes it easy to
//! find every endpoint the adapter touches.

use beacon_core::types::{MemberId, UserId};

/// Path of a user document.
pub fn user_doc(base: &str, user: &UserId) -> String {
    format!("{base}/users/{user}")
}

/// Path of the family sub-collection, ordered by creation time.
pub fn family_collection(base: &str, user: &UserId) -> String {
    format!("{base}/users/{user}/family")
}

/// Path of one roster entry document.
pub fn family_doc(base: &str, user: &UserId, member: &MemberId) -> String {
    format!("{base}/users/{user}/family/{member}")
}

/// Path of the alert sub-collection.
pub fn alerts_collection(base: &str, user: &UserId) -> String {
    format!("{base}/users/{user}/alerts")
}

/// Path of the service health endpoint.
pub fn health(base: &str) -> String {
    format!("{base}/health")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let uid = UserId::new("u1");
        let mid = MemberId::new("m1");
        assert_eq!(user_doc("http://s/v1", &uid), "http://s/v1/users/u1");
        assert_eq!(
            family_doc("http://s/v1", &uid, &mid),
            "http://s/v1/users/u1/family/m1"
        );
        assert_eq!(
            alerts_collection("http://s/v1", &uid),
            "http://s/v1/users/u1/alerts"
        );
    }
}
