//! Field-level validation errors shared by every collection.

use serde::Serialize;

/// A single failed rule on a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path to the field, e.g. `items.0.quantity`.
    pub field: String,
    pub message: String,
}

/// All rule failures for one write, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record a failure.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record "This field is required." for `field`.
    pub fn required(&mut self, field: impl Into<String>) {
        self.push(field, "This field is required.");
    }

    /// Require a non-blank string and return it trimmed.
    pub fn require_text(&mut self, field: &str, value: Option<String>) -> Option<String> {
        match value.map(|v| v.trim().to_owned()) {
            Some(v) if !v.is_empty() => Some(v),
            _ => {
                self.required(field);
                None
            }
        }
    }

    /// Require a present value.
    pub fn require<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.required(field);
        }
        value
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// First message recorded for `field`.
    #[must_use]
    pub fn first(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Fields that failed, deduplicated, in first-seen order.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for error in &self.0 {
            if !fields.contains(&error.field.as_str()) {
                fields.push(&error.field);
            }
        }
        fields
    }

    /// Summary line used as the top-level error message.
    #[must_use]
    pub fn summary(&self) -> String {
        let fields = self.fields();
        match fields.as_slice() {
            [] => "Invalid request".to_owned(),
            [one] => format!("The following field is invalid: {one}"),
            many => format!("The following fields are invalid: {}", many.join(", ")),
        }
    }

    /// `Ok(value)` if nothing failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one rule failed.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.summary(), "Invalid request");

        errors.required("name");
        assert_eq!(errors.summary(), "The following field is invalid: name");

        errors.push("name", "too short");
        errors.required("sku");
        assert_eq!(
            errors.summary(),
            "The following fields are invalid: name, sku"
        );
        assert_eq!(errors.errors().len(), 3);
        assert_eq!(errors.first("name"), Some("This field is required."));
        assert_eq!(errors.first("price"), None);
    }

    #[test]
    fn test_require_text_trims_and_rejects_blank() {
        let mut errors = ValidationErrors::new();
        assert_eq!(
            errors.require_text("name", Some("  Mug ".to_owned())),
            Some("Mug".to_owned())
        );
        assert_eq!(errors.require_text("sku", Some("   ".to_owned())), None);
        assert_eq!(errors.require_text("slug", None), None);
        assert_eq!(errors.fields(), vec!["sku", "slug"]);
    }

    #[test]
    fn test_finish() {
        assert_eq!(ValidationErrors::new().finish(|| 5), Ok(5));
        let mut errors = ValidationErrors::new();
        errors.required("x");
        assert!(errors.finish(|| 5).is_err());
    }
}
