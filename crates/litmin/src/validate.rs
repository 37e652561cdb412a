//! Checks that keep the placeholder round trip honest.

use litmin_literals::Part;

use crate::placeholder::Placeholder;
use crate::{Error, Result};

/// Validates the placeholder protocol for one template.
///
/// Both checks are fatal: returning an error aborts the whole invocation.
pub trait Validator: Send + Sync {
    /// Called before combining.
    fn ensure_placeholder_valid(&self, placeholder: &Placeholder) -> Result<()>;

    /// Called after splitting.
    fn ensure_parts_valid(&self, parts: &[Part], minified_parts: &[String]) -> Result<()>;
}

/// Rejects empty tokens and part count mismatches.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultValidator;

impl Validator for DefaultValidator {
    fn ensure_placeholder_valid(&self, placeholder: &Placeholder) -> Result<()> {
        if placeholder.tokens().iter().any(String::is_empty) {
            return Err(Error::EmptyPlaceholder);
        }
        Ok(())
    }

    fn ensure_parts_valid(&self, parts: &[Part], minified_parts: &[String]) -> Result<()> {
        if parts.len() != minified_parts.len() {
            return Err(Error::PartCountMismatch {
                expected: parts.len(),
                actual: minified_parts.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_single_token() {
        let err = DefaultValidator
            .ensure_placeholder_valid(&Placeholder::Single(String::new()))
            .unwrap_err();
        assert!(matches!(err, Error::EmptyPlaceholder));
    }

    #[test]
    fn test_empty_ordered_token() {
        let placeholder = Placeholder::Ordered(vec!["var(--a)".into(), String::new()]);
        assert!(DefaultValidator.ensure_placeholder_valid(&placeholder).is_err());
    }

    #[test]
    fn test_no_tokens_is_valid() {
        // A template without expressions has nothing to substitute
        assert!(
            DefaultValidator
                .ensure_placeholder_valid(&Placeholder::Ordered(vec![]))
                .is_ok()
        );
    }

    #[test]
    fn test_part_count_mismatch() {
        let parts = vec![Part::new("<p>", 0, 3), Part::new("</p>", 7, 11)];
        let err = DefaultValidator
            .ensure_parts_valid(&parts, &["<p></p>".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PartCountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_part_count_match() {
        let parts = vec![Part::new("<p>", 0, 3), Part::new("</p>", 7, 11)];
        let minified = vec!["<p>".to_string(), "".to_string()];
        assert!(DefaultValidator.ensure_parts_valid(&parts, &minified).is_ok());
    }
}
