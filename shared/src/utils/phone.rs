//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// `+`, a non-zero leading digit, then 1 to 14 more ASCII digits
static E164_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9][0-9]{1,14}$").expect("E.164 pattern is valid")
});

/// Check whether `phone` is already in E.164 shape.
///
/// No normalization is applied: spaces, dashes or a missing `+` make the
/// number invalid.
pub fn is_valid_e164(phone: &str) -> bool {
    E164_REGEX.is_match(phone)
}

/// Mask a phone number for logging, keeping only the last 4 digits.
///
/// ```
/// use otp_shared::phone::mask_phone;
/// assert_eq!(mask_phone("+573001234567"), "***4567");
/// ```
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 4 {
        return "***".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_e164_numbers() {
        assert!(is_valid_e164("+573001234567"));
        assert!(is_valid_e164("+14155552671"));
        assert!(is_valid_e164("+8613812345678"));
        // shortest and longest accepted shapes
        assert!(is_valid_e164("+12"));
        assert!(is_valid_e164("+123456789012345"));
    }

    #[test]
    fn test_invalid_e164_numbers() {
        assert!(!is_valid_e164(""));
        assert!(!is_valid_e164("+"));
        assert!(!is_valid_e164("+1"));
        assert!(!is_valid_e164("573001234567"));
        assert!(!is_valid_e164("+0573001234567"));
        assert!(!is_valid_e164("+1234567890123456"));
        assert!(!is_valid_e164("+57 300 123 4567"));
        assert!(!is_valid_e164("+57-300-1234567"));
        assert!(!is_valid_e164("+57300abc4567"));
    }

    #[test]
    fn test_non_ascii_digits_rejected() {
        // Arabic-Indic and fullwidth digits
        assert!(!is_valid_e164("+57\u{0663}\u{0660}\u{0660}1234567"));
        assert!(!is_valid_e164("+\u{FF11}4155552671"));
        assert!(!is_valid_e164("+1\u{0966}\u{0967}"));
    }

    #[test]
    fn test_mask_phone() {
        assert_eq!(mask_phone("+573001234567"), "***4567");
        assert_eq!(mask_phone("+12"), "***");
        assert_eq!(mask_phone("1234"), "***");
        assert_eq!(mask_phone("12345"), "***2345");
    }
}
