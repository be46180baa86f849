//! Profile name and metadata validation

use crate::error::{ProfileError, ProfileResult};

/// Maximum profile name length, in characters
pub const MAX_NAME_LEN: usize = 50;

/// Minimum profile name length after trimming, in characters
pub const MIN_NAME_LEN: usize = 2;

/// Maximum description length, in characters
pub const MAX_DESCRIPTION_LEN: usize = 200;

/// Characters that are reserved in file names on common platforms
pub const FORBIDDEN_NAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Validate a profile name
///
/// # Errors
/// Returns `InvalidName` if the name is blank, if its trimmed length is
/// outside [`MIN_NAME_LEN`]..=[`MAX_NAME_LEN`], or if it contains one of
/// [`FORBIDDEN_NAME_CHARS`]
pub fn validate_name(name: &str) -> ProfileResult<()> {
    let trimmed_len = name.trim().chars().count();
    if trimmed_len == 0 {
        return Err(ProfileError::InvalidName("name cannot be empty".to_string()));
    }

    if trimmed_len < MIN_NAME_LEN {
        return Err(ProfileError::InvalidName(format!(
            "name must be at least {MIN_NAME_LEN} characters"
        )));
    }

    if trimmed_len > MAX_NAME_LEN {
        return Err(ProfileError::InvalidName(format!(
            "name must be at most {MAX_NAME_LEN} characters"
        )));
    }

    if let Some(c) = name.chars().find(|c| FORBIDDEN_NAME_CHARS.contains(c)) {
        return Err(ProfileError::InvalidName(format!(
            "name cannot contain '{c}'"
        )));
    }

    Ok(())
}

/// Validate an optional description
///
/// # Errors
/// Returns `InvalidConfiguration` if longer than [`MAX_DESCRIPTION_LEN`]
pub fn validate_description(description: Option<&str>) -> ProfileResult<()> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LEN => {
            Err(ProfileError::InvalidConfiguration(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_validate_name_normal() {
        assert!(validate_name("My Profile").is_ok());
        assert!(validate_name("work-claude_2").is_ok());
        assert!(validate_name("ab").is_ok());
    }

    #[test]
    fn test_validate_name_rejects_blank() {
        assert!(matches!(validate_name(""), Err(ProfileError::InvalidName(_))));
        assert!(matches!(validate_name("   "), Err(ProfileError::InvalidName(_))));
    }

    #[test]
    fn test_validate_name_rejects_single_char() {
        assert!(validate_name("a").is_err());
        assert!(validate_name(" a ").is_err());
    }

    #[test]
    fn test_validate_name_length_boundary() {
        assert!(validate_name(&"x".repeat(50)).is_ok());
        assert!(validate_name(&"x".repeat(51)).is_err());
        // Counted in characters, not bytes
        assert!(validate_name(&"é".repeat(50)).is_ok());
    }

    #[test]
    fn test_validate_name_bounds_use_trimmed_length() {
        assert!(validate_name(&format!("  {}  ", "x".repeat(49))).is_ok());
        assert!(validate_name(&format!("  {}  ", "x".repeat(50))).is_ok());
        assert!(validate_name(&format!(" {} ", "x".repeat(51))).is_err());
    }

    #[test]
    fn test_validate_name_rejects_forbidden_chars() {
        for c in FORBIDDEN_NAME_CHARS {
            let name = format!("my{c}profile");
            assert!(validate_name(&name).is_err(), "accepted {name}");
        }
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description(None).is_ok());
        assert!(validate_description(Some(&"d".repeat(200))).is_ok());
        assert!(matches!(
            validate_description(Some(&"d".repeat(201))),
            Err(ProfileError::InvalidConfiguration(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_plain_names_accepted(name in "[A-Za-z0-9 _-]{2,60}") {
            let trimmed_len = name.trim().chars().count();
            prop_assume!((MIN_NAME_LEN..=MAX_NAME_LEN).contains(&trimmed_len));
            prop_assert!(validate_name(&name).is_ok());
        }

        #[test]
        fn prop_forbidden_char_always_rejected(
            prefix in "[a-z]{1,20}",
            idx in 0usize..FORBIDDEN_NAME_CHARS.len(),
        ) {
            let name = format!("{prefix}{}", FORBIDDEN_NAME_CHARS[idx]);
            prop_assert!(validate_name(&name).is_err());
        }
    }
}
