//! Phone number normalization.

/// Normalize a phone number to its digits.
///
/// The roster persists phones digits-only so that lookups and dialer
/// handoff do not depend on how the number was typed.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_formatting() {
        assert_eq!(normalize_phone("+1 (555) 123-4567"), "15551234567");
    }

    #[test]
    fn test_plain_digits_pass_through() {
        assert_eq!(normalize_phone("5551112222"), "5551112222");
    }

    #[test]
    fn test_non_numeric_input_yields_empty() {
        assert_eq!(normalize_phone("n/a"), "");
    }
}
