//! Partial-update helpers shared by the services.

use super::error::ServiceError;

/// Trimmed `value`, rejected when nothing is left.
pub(crate) fn required_text(value: String, field: &'static str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ConstraintViolation(field));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn optional_text(value: String) -> String {
    value.trim().to_string()
}

/// Replace `field` with the trimmed `value` when it is non-blank and differs.
pub(crate) fn apply_text(field: &mut String, value: Option<String>) -> bool {
    let Some(value) = value else {
        return false;
    };
    let value = value.trim();
    if value.is_empty() || value == field.as_str() {
        return false;
    }
    *field = value.to_string();
    true
}

/// Replace `field` with a `value` that is zero or more and differs from it.
/// Negative values leave the field unchanged.
pub(crate) fn apply_non_negative<T>(field: &mut T, value: Option<T>) -> bool
where
    T: Copy + PartialOrd + Default,
{
    match value {
        Some(value) if value >= T::default() && value != *field => {
            *field = value;
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_ignored() {
        let mut name = String::from("Name");
        assert!(!apply_text(&mut name, Some(String::new())));
        assert!(!apply_text(&mut name, Some("   ".into())));
        assert!(!apply_text(&mut name, None));
        assert!(!apply_text(&mut name, Some(" Name ".into())));
        assert!(apply_text(&mut name, Some("  Other ".into())));
        assert_eq!(name, "Other");
    }

    #[test]
    fn negative_numbers_are_ignored() {
        let mut quantity = 5;
        assert!(!apply_non_negative(&mut quantity, Some(-1)));
        assert!(apply_non_negative(&mut quantity, Some(0)));
        assert_eq!(quantity, 0);

        let mut price: i64 = 1999;
        assert!(apply_non_negative(&mut price, Some(2500)));
        assert_eq!(price, 2500);
    }

    #[test]
    fn required_text_is_trimmed() {
        assert!(matches!(
            required_text("  ".into(), "name"),
            Err(ServiceError::ConstraintViolation("name"))
        ));
        assert_eq!(required_text(" Name ".into(), "name").ok().as_deref(), Some("Name"));
        assert_eq!(optional_text(" 1b22\n".into()), "1b22");
    }
}
