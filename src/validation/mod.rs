//! Input validation and sanitization for caller-supplied values.
//!
//! Every function here is pure and runs before any network I/O. A failure
//! aborts the tool invocation with a [`ValidationError`] whose message is
//! shown to the caller verbatim.
//!
//! Limits are named constants so that each call site states which
//! ceiling applies to which field.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

/// Maximum length of project, repository, branch and similar names.
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum length of a work item title.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum length of a pull request title.
pub const MAX_PR_TITLE_LENGTH: usize = 500;

/// Maximum length of a pull request description.
pub const MAX_PR_DESCRIPTION_LENGTH: usize = 4000;

/// Maximum length of WIQL queries, descriptions, comments and wiki content.
pub const MAX_LARGE_TEXT_LENGTH: usize = 32_000;

/// Length ceiling applied when a call site names none.
pub const DEFAULT_MAX_STRING_LENGTH: usize = 1000;

/// Largest accepted numeric identifier (`i32::MAX`).
pub const MAX_ID: u32 = 2_147_483_647;

/// Substrings rejected in path identifiers.
const TRAVERSAL_SEQUENCES: [&str; 3] = ["..", "\\\\", "//"];

#[allow(clippy::expect_used)]
static ORGANIZATION_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]$").expect("valid organization regex")
});

#[allow(clippy::expect_used)]
static BRANCH_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._\-/]+$").expect("valid branch regex"));

/// Validates a project name used as a URL path segment.
///
/// Spaces are allowed. `..`, a doubled backslash and `//` are not.
///
/// # Errors
///
/// Returns [`ValidationError::Required`] if empty or blank,
/// [`ValidationError::TooLong`] past [`MAX_NAME_LENGTH`] characters, and
/// [`ValidationError::PathTraversal`] if a traversal sequence is present.
///
/// # Example
///
/// ```
/// use azure_devops_mcp::validation::validate_project_name;
///
/// assert!(validate_project_name("My Project").is_ok());
/// assert!(validate_project_name("../secrets").is_err());
/// ```
pub fn validate_project_name(project: &str) -> Result<(), ValidationError> {
    const FIELD: &str = "Project name";

    if project.trim().is_empty() {
        return Err(ValidationError::Required {
            field: FIELD.to_string(),
        });
    }
    check_length(project, FIELD, MAX_NAME_LENGTH)?;
    if TRAVERSAL_SEQUENCES.iter().any(|seq| project.contains(seq)) {
        return Err(ValidationError::PathTraversal {
            field: "project name".to_string(),
        });
    }
    Ok(())
}

/// Validates a non-project identifier used as a URL path segment
/// (repository, wiki, team and similar names).
///
/// # Errors
///
/// As [`validate_project_name`], with `label` naming the field.
pub fn validate_path_segment(value: &str, label: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: label.to_string(),
        });
    }
    check_length(value, label, MAX_NAME_LENGTH)?;
    if TRAVERSAL_SEQUENCES.iter().any(|seq| value.contains(seq)) {
        return Err(ValidationError::PathTraversal {
            field: label.to_lowercase(),
        });
    }
    Ok(())
}

/// Validates the length of a free-text value.
///
/// Length is counted in characters, not bytes. Empty strings pass.
///
/// # Errors
///
/// Returns [`ValidationError::TooLong`] if `value` exceeds `max_len`.
pub fn validate_string_input(value: &str, label: &str, max_len: usize) -> Result<(), ValidationError> {
    check_length(value, label, max_len)
}

/// Like [`validate_string_input`], but also rejects empty or blank values.
///
/// # Errors
///
/// Returns [`ValidationError::Required`] if `value` is blank, otherwise as
/// [`validate_string_input`].
pub fn validate_required_string(
    value: &str,
    label: &str,
    max_len: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: label.to_string(),
        });
    }
    check_length(value, label, max_len)
}

/// Validates an optional free-text value; `None` passes.
///
/// # Errors
///
/// As [`validate_string_input`].
pub fn validate_optional_string(
    value: Option<&str>,
    label: &str,
    max_len: usize,
) -> Result<(), ValidationError> {
    value.map_or(Ok(()), |v| check_length(v, label, max_len))
}

/// Validates a numeric identifier and narrows it to `u32`.
///
/// Identifiers arrive as JSON numbers, so fractional and negative values
/// must be rejected here.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidId`] unless `id` is a positive
/// integer, and [`ValidationError::IdTooLarge`] above [`MAX_ID`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn validate_id(id: f64, label: &str) -> Result<u32, ValidationError> {
    if !id.is_finite() || id.fract() != 0.0 || id <= 0.0 {
        return Err(ValidationError::InvalidId {
            field: label.to_string(),
        });
    }
    if id > f64::from(MAX_ID) {
        return Err(ValidationError::IdTooLarge {
            field: capitalize(label),
        });
    }
    Ok(id as u32)
}

/// Validates a work item identifier.
///
/// # Errors
///
/// As [`validate_id`].
///
/// # Example
///
/// ```
/// use azure_devops_mcp::validation::validate_work_item_id;
///
/// assert_eq!(validate_work_item_id(42.0), Ok(42));
/// assert!(validate_work_item_id(3.5).is_err());
/// ```
pub fn validate_work_item_id(id: f64) -> Result<u32, ValidationError> {
    validate_id(id, "work item ID")
}

/// Validates an organization name.
///
/// Alphanumerics and hyphens, starting and ending with an alphanumeric.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidFormat`] on mismatch.
pub fn validate_organization_name(organization: &str) -> Result<(), ValidationError> {
    if ORGANIZATION_NAME.is_match(organization) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "organization name".to_string(),
            reason: "use letters, digits and hyphens, starting and ending with a letter or digit"
                .to_string(),
        })
    }
}

/// Validates a git branch name.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidFormat`] if the name contains
/// anything but letters, digits, `.`, `_`, `-` and `/`.
pub fn validate_branch_name(branch: &str) -> Result<(), ValidationError> {
    if BRANCH_NAME.is_match(branch) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "branch name".to_string(),
            reason: "only letters, digits, '.', '_', '-' and '/' are allowed".to_string(),
        })
    }
}

/// Escapes a value for embedding inside a single-quoted WIQL literal.
///
/// Not idempotent: escaping twice doubles the quotes twice.
///
/// ```
/// use azure_devops_mcp::validation::escape_query_literal;
///
/// assert_eq!(escape_query_literal("O'Brien"), "O''Brien");
/// ```
#[must_use]
pub fn escape_query_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Escapes text for inclusion in an XML element or attribute.
#[must_use]
pub fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn check_length(value: &str, label: &str, max_len: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max_len {
        return Err(ValidationError::TooLong {
            field: label.to_string(),
            max: max_len,
        });
    }
    Ok(())
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use test_case::test_case;

    // ========================================================================
    // Project names
    // ========================================================================

    #[test_case("My Project" ; "spaces")]
    #[test_case("Proj-1" ; "hyphen and digit")]
    #[test_case("a.b" ; "single dot")]
    #[test_case("a/b" ; "single slash")]
    fn test_project_name_accepted(name: &str) {
        assert!(validate_project_name(name).is_ok());
    }

    #[test_case("../secrets" ; "parent dir")]
    #[test_case("a//b" ; "double slash")]
    #[test_case("a\\\\b" ; "double backslash")]
    fn test_project_name_traversal_rejected(name: &str) {
        assert!(matches!(
            validate_project_name(name),
            Err(ValidationError::PathTraversal { .. })
        ));
    }

    #[test]
    fn test_project_name_empty() {
        let err = validate_project_name("").unwrap_err();
        assert_eq!(err.to_string(), "Project name is required");
    }

    #[test_case("   " ; "spaces")]
    #[test_case("\t\n" ; "tab and newline")]
    fn test_project_name_blank(name: &str) {
        assert!(matches!(
            validate_project_name(name),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_project_name_length_boundary() {
        assert!(validate_project_name(&"p".repeat(255)).is_ok());
        let err = validate_project_name(&"p".repeat(256)).unwrap_err();
        assert_eq!(err.to_string(), "Project name too long (max 255 characters)");
    }

    #[test]
    fn test_project_name_single_backslash_allowed() {
        assert!(validate_project_name("a\\b").is_ok());
    }

    #[test]
    fn test_path_segment() {
        assert!(validate_path_segment("my-repo", "Repository name").is_ok());
        assert_eq!(
            validate_path_segment(" ", "Repository name").unwrap_err().to_string(),
            "Repository name is required"
        );
        assert_eq!(
            validate_path_segment("../x", "Repository name").unwrap_err().to_string(),
            "Invalid repository name: path traversal sequences are not allowed"
        );
        assert!(validate_path_segment(&"r".repeat(256), "Wiki identifier").is_err());
    }

    // ========================================================================
    // Strings
    // ========================================================================

    #[test]
    fn test_string_input_boundary() {
        assert!(validate_string_input(&"x".repeat(1000), "Title", 1000).is_ok());
        let err = validate_string_input(&"x".repeat(1001), "Title", 1000).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLong {
                field: "Title".into(),
                max: 1000
            }
        );
    }

    #[test]
    fn test_string_input_counts_chars_not_bytes() {
        let accented = "é".repeat(10);
        assert_eq!(accented.len(), 20);
        assert!(validate_string_input(&accented, "Title", 10).is_ok());
    }

    #[test]
    fn test_string_input_empty_passes() {
        assert!(validate_string_input("", "Description", DEFAULT_MAX_STRING_LENGTH).is_ok());
    }

    #[test_case("" ; "empty")]
    #[test_case("   " ; "blank")]
    fn test_required_string_rejects_blank(value: &str) {
        let err = validate_required_string(value, "Title", MAX_TITLE_LENGTH).unwrap_err();
        assert_eq!(err.to_string(), "Title is required");
    }

    #[test]
    fn test_optional_string() {
        assert!(validate_optional_string(None, "Description", 5).is_ok());
        assert!(validate_optional_string(Some("short"), "Description", 5).is_ok());
        assert!(validate_optional_string(Some("longer"), "Description", 5).is_err());
    }

    // ========================================================================
    // Ids
    // ========================================================================

    #[test_case(1.0, 1 ; "one")]
    #[test_case(42.0, 42 ; "typical")]
    #[test_case(2_147_483_647.0, 2_147_483_647 ; "i32 max")]
    fn test_work_item_id_accepted(input: f64, expected: u32) {
        assert_eq!(validate_work_item_id(input), Ok(expected));
    }

    #[test_case(0.0 ; "zero")]
    #[test_case(-5.0 ; "negative")]
    #[test_case(3.5 ; "fractional")]
    #[test_case(f64::NAN ; "nan")]
    #[test_case(f64::INFINITY ; "infinity")]
    fn test_work_item_id_invalid(input: f64) {
        let err = validate_work_item_id(input).unwrap_err();
        assert_eq!(err.to_string(), "Invalid work item ID");
    }

    #[test]
    fn test_work_item_id_too_large() {
        let err = validate_work_item_id(2_147_483_648.0).unwrap_err();
        assert_eq!(err.to_string(), "Work item ID too large");
    }

    #[test]
    fn test_generic_id_label() {
        let err = validate_id(0.0, "build ID").unwrap_err();
        assert_eq!(err.to_string(), "Invalid build ID");
    }

    // ========================================================================
    // Organization and branch names
    // ========================================================================

    #[test_case("contoso-org" ; "hyphenated")]
    #[test_case("Contoso2" ; "mixed case")]
    #[test_case("ab" ; "two chars")]
    fn test_organization_accepted(name: &str) {
        assert!(validate_organization_name(name).is_ok());
    }

    #[test_case("-contoso" ; "leading hyphen")]
    #[test_case("contoso-" ; "trailing hyphen")]
    #[test_case("con toso" ; "space")]
    #[test_case("" ; "empty")]
    #[test_case("a" ; "single char")]
    fn test_organization_rejected(name: &str) {
        assert!(matches!(
            validate_organization_name(name),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test_case("main" ; "simple")]
    #[test_case("feature/login-page" ; "nested")]
    #[test_case("release_1.2" ; "dots and underscores")]
    fn test_branch_accepted(name: &str) {
        assert!(validate_branch_name(name).is_ok());
    }

    #[test_case("feature login" ; "space")]
    #[test_case("main;rm" ; "semicolon")]
    #[test_case("" ; "empty")]
    #[test_case("a?b" ; "query char")]
    fn test_branch_rejected(name: &str) {
        assert!(validate_branch_name(name).is_err());
    }

    // ========================================================================
    // Escaping
    // ========================================================================

    #[test]
    fn test_escape_query_literal() {
        assert_eq!(escape_query_literal("O'Brien"), "O''Brien");
        assert_eq!(escape_query_literal("plain"), "plain");
        assert_eq!(escape_query_literal("''"), "''''");
    }

    #[test]
    fn test_escape_query_literal_not_idempotent() {
        let once = escape_query_literal("it's");
        let twice = escape_query_literal(&once);
        assert_ne!(once, twice);
        assert_eq!(twice, "it''''s");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(
            escape_xml(r#"Click <OK> & "go" 'now'"#),
            "Click &lt;OK&gt; &amp; &quot;go&quot; &apos;now&apos;"
        );
        assert_eq!(escape_xml("plain"), "plain");
    }

    proptest! {
        #[test]
        fn prop_escaped_literal_has_even_quote_runs(s in ".*") {
            let escaped = escape_query_literal(&s);
            let original_quotes = s.matches('\'').count();
            prop_assert_eq!(escaped.matches('\'').count(), original_quotes * 2);
            prop_assert_eq!(escaped.replace("''", "'"), s);
        }

        #[test]
        fn prop_positive_integers_round_trip(n in 1u32..=MAX_ID) {
            prop_assert_eq!(validate_id(f64::from(n), "id"), Ok(n));
        }

        #[test]
        fn prop_traversal_always_rejected(prefix in "[a-z ]{0,20}", suffix in "[a-z ]{0,20}") {
            let name = format!("{prefix}..{suffix}");
            prop_assert!(validate_project_name(&name).is_err());
        }
    }
}
