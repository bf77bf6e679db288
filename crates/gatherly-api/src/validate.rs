// Request validation
//
// Field constraints live on the request DTOs as `#[validate(...)]`
// attributes; `check` runs them and folds the failures into the shared
// Validation error. Custom validators here cover what the derive
// attributes cannot express.

use gatherly_core::{Error, Result};
use validator::{Validate, ValidationError, ValidationErrors};

pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Validate a request DTO, flattening field failures into one message
pub fn check(req: &impl Validate) -> Result<()> {
    req.validate().map_err(into_error)
}

fn into_error(errors: ValidationErrors) -> Error {
    let mut details: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: {}", e.code),
            })
        })
        .collect();
    details.sort();
    Error::validation(details.join("; "))
}

/// At least 8 characters with an upper-case letter, a lower-case letter and
/// a digit
pub fn password_strength(value: &str) -> std::result::Result<(), ValidationError> {
    let strong = value.len() >= 8
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_digit());
    if strong {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_strength");
        err.message = Some(
            "must be at least 8 characters and contain upper-case, lower-case and a digit".into(),
        );
        Err(err)
    }
}

pub fn username_charset(value: &str) -> std::result::Result<(), ValidationError> {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        let mut err = ValidationError::new("username_charset");
        err.message = Some("may only contain letters, digits and underscores".into());
        Err(err)
    }
}

/// Listing offset; rejects page numbers whose offset cannot be represented
pub fn offset(page: i64, limit: i64) -> Result<i64> {
    page.checked_sub(1)
        .and_then(|p| p.checked_mul(limit))
        .filter(|offset| *offset >= 0)
        .ok_or_else(|| Error::validation("page is out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct SampleRequest {
        #[validate(email(message = "invalid email address"))]
        email: String,
        #[validate(custom = "password_strength")]
        password: String,
    }

    #[test]
    fn check_flattens_field_failures() {
        let ok = SampleRequest {
            email: "sarah@example.com".into(),
            password: "Password123".into(),
        };
        assert!(check(&ok).is_ok());

        let bad = SampleRequest {
            email: "nope".into(),
            password: "short".into(),
        };
        let err = check(&bad).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("email: invalid email address"), "{msg}");
        assert!(msg.contains("password:"), "{msg}");
    }

    #[test]
    fn password_strength_rules() {
        assert!(password_strength("Password123").is_ok());
        assert!(password_strength("password123").is_err());
        assert!(password_strength("PASSWORD123").is_err());
        assert!(password_strength("Passwords").is_err());
        assert!(password_strength("Pw1").is_err());
    }

    #[test]
    fn username_charset_rules() {
        assert!(username_charset("sarah_kim").is_ok());
        assert!(username_charset("sarah kim").is_err());
        assert!(username_charset("sarah-kim").is_err());
    }

    #[test]
    fn offset_for_ordinary_pages() {
        assert_eq!(offset(1, 20).unwrap(), 0);
        assert_eq!(offset(3, 20).unwrap(), 40);
    }

    #[test]
    fn offset_rejects_unrepresentable_pages() {
        // Huge page numbers must fail cleanly instead of wrapping the
        // multiplication into a negative OFFSET
        assert!(offset(i64::MAX, 50).is_err());
        assert!(offset(i64::MAX, 1).is_ok());
        assert!(offset(i64::MAX / 2, 3).is_err());
    }
}
