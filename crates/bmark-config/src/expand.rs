//! Environment variable expansion for configuration strings.
//!
//! Supports:
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default

use crate::ConfigError;

/// Expand environment variable references in a string.
///
/// Returns the original string unchanged if no `${}` patterns are present.
/// Bare `$VAR` syntax is not expanded (only `${VAR}` with braces).
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, LookupError> {
        match std::env::var(var) {
            Ok(found) => Ok(Some(found)),
            Err(_) => Err(LookupError {
                var_name: var.to_owned(),
            }),
        }
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{0}}} not set", e.cause.var_name),
    })
}

/// Expand an optional value.
pub(crate) fn expand_env_opt(
    value: Option<&str>,
    field: &str,
) -> Result<Option<String>, ConfigError> {
    value.map(|v| expand_env(v, field)).transpose()
}

/// Error returned when environment variable lookup fails.
struct LookupError {
    var_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("BMARK_TEST_SIMPLE", "hello");
        }
        let result = expand_env("${BMARK_TEST_SIMPLE}", "options.container_class").unwrap();
        assert_eq!(result, "hello");
        unsafe {
            std::env::remove_var("BMARK_TEST_SIMPLE");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("BMARK_TEST_UNSET");
        }
        let result = expand_env(
            "${BMARK_TEST_UNSET:-https://github.com}/{u}",
            "options.gh_mentions_link",
        )
        .unwrap();
        assert_eq!(result, "https://github.com/{u}");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("BMARK_TEST_MISSING");
        }
        let err = expand_env("${BMARK_TEST_MISSING}", "options.relative_path_base_url").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("BMARK_TEST_MISSING"));
        assert!(err.to_string().contains("options.relative_path_base_url"));
    }

    #[test]
    fn test_placeholder_braces_unchanged() {
        let result = expand_env("https://github.com/{u}", "options.gh_mentions_link").unwrap();
        assert_eq!(result, "https://github.com/{u}");
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("https://example.com/$path", "test.url").unwrap();
        assert_eq!(result, "https://example.com/$path");
    }

    #[test]
    fn test_expand_opt_none() {
        assert_eq!(expand_env_opt(None, "test.field").unwrap(), None);
    }
}
