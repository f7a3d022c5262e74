//! Validation Utilities

use validator::ValidationErrors;

use super::error::{AppError, FieldError};

/// Convert validation errors to AppError
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
            })
        })
        .collect();

    let message = field_errors
        .first()
        .map(|e| format!("{}: {}", e.field, e.message))
        .unwrap_or_else(|| "Validation failed".into());

    AppError::Validation(message)
}

/// Coerce a query-string boolean.
///
/// Query parameters arrive as strings; `"true"`/`"1"` and `"false"`/`"0"`
/// map to the obvious values, anything else is treated as absent.
pub fn coerce_bool_param(raw: Option<&str>) -> Option<bool> {
    match raw {
        Some("true") | Some("1") => Some(true),
        Some("false") | Some("0") => Some(false),
        _ => None,
    }
}

/// Check that a slug is URL-safe: lowercase alphanumerics and hyphens,
/// starting and ending with an alphanumeric.
pub fn is_valid_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.starts_with('-') || slug.ends_with('-') {
        return false;
    }
    slug.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Some("true"), Some(true))]
    #[test_case(Some("1"), Some(true))]
    #[test_case(Some("false"), Some(false))]
    #[test_case(Some("0"), Some(false))]
    #[test_case(Some("yes"), None)]
    #[test_case(Some(""), None)]
    #[test_case(None, None)]
    fn test_coerce_bool_param(raw: Option<&str>, expected: Option<bool>) {
        assert_eq!(coerce_bool_param(raw), expected);
    }

    #[test_case("logo-design", true)]
    #[test_case("seo-audit-2024", true)]
    #[test_case("a", true)]
    #[test_case("", false)]
    #[test_case("-leading", false)]
    #[test_case("trailing-", false)]
    #[test_case("Upper-Case", false)]
    #[test_case("with space", false)]
    fn test_is_valid_slug(slug: &str, expected: bool) {
        assert_eq!(is_valid_slug(slug), expected);
    }
}
