//! Input validation shared by the workflows.
//!
//! Validators accumulate every failure into a list so a caller sees all
//! problems with a request at once, not only the first.

use crate::error::{Result, SocialError};

/// Collects validation failures for one request.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<String>,
}

impl Validator {
    /// Creates an empty validator.
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Requires `value` to be non-blank and at most `max` characters.
    pub fn required(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        if value.trim().is_empty() {
            self.errors.push(format!("{field} must not be empty"));
        } else {
            self.max_len(field, value, max);
        }
        self
    }

    /// Requires `value`, if present, to be at most `max` characters.
    pub fn optional(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(value) = value {
            self.max_len(field, value, max);
        }
        self
    }

    /// Requires `value` to contain only ASCII letters, digits, `_`, `.` or `-`.
    pub fn identifier(&mut self, field: &str, value: &str) -> &mut Self {
        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        {
            self.errors.push(format!(
                "{field} may only contain letters, digits, '_', '.' and '-'"
            ));
        }
        self
    }

    fn max_len(&mut self, field: &str, value: &str, max: usize) {
        let len = value.chars().count();
        if len > max {
            self.errors
                .push(format!("{field} must be at most {max} characters (got {len})"));
        }
    }

    /// Returns `Ok` if nothing failed, otherwise a [`SocialError::Validation`].
    ///
    /// # Errors
    ///
    /// Returns every collected failure.
    pub fn finish(&mut self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(SocialError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_valid_input() {
        let result = Validator::new()
            .required("name", "Hikers", 10)
            .optional("description", Some("hills"), 10)
            .optional("bio", None, 1)
            .finish();
        assert!(result.is_ok());
    }

    #[test]
    fn blank_required_field_fails() {
        let err = Validator::new().required("name", "   ", 10).finish().unwrap_err();
        assert_eq!(err.messages(), vec!["name must not be empty".to_string()]);
    }

    #[test]
    fn collects_all_failures() {
        let err = Validator::new()
            .required("name", "", 10)
            .optional("bio", Some("abcdef"), 3)
            .identifier("username", "bad name!")
            .finish()
            .unwrap_err();
        assert_eq!(err.messages().len(), 3);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let result = Validator::new().required("name", "ééé", 3).finish();
        assert!(result.is_ok());
    }

    #[test]
    fn oversized_reports_length() {
        let err = Validator::new().required("post", "hello", 3).finish().unwrap_err();
        assert_eq!(
            err.messages(),
            vec!["post must be at most 3 characters (got 5)".to_string()]
        );
    }
}
