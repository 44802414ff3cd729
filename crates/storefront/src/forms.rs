//! Login and registration form inputs.
//!
//! The same structs deserialize from the JSON bodies posted by
//! `static/js/auth.js` and from plain `application/x-www-form-urlencoded`
//! posts, so the pages work with scripting disabled.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer};

use crate::services::auth::{MIN_PASSWORD_LENGTH, Registration};
use crate::validation::ValidationErrors;

/// Loose shape check applied before the stricter `Email::parse`.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("Invalid regex")
});

/// Accept a JSON bool or an HTML checkbox value (`on`, `true`, `1`).
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Checkbox {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Checkbox>::deserialize(deserializer)? {
        Some(Checkbox::Bool(b)) => b,
        Some(Checkbox::Text(s)) => matches!(s.as_str(), "on" | "true" | "1" | "yes"),
        None => false,
    })
}

fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Login form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// True when both fields were supplied.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        present(&self.email) && !self.password.is_empty()
    }

    /// Field-level checks for the HTML page.
    ///
    /// # Errors
    ///
    /// Returns an error per blank field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !present(&self.email) {
            errors.push("email", "Email is required");
        }
        if self.password.is_empty() {
            errors.push("password", "Password is required");
        }
        errors.finish(|| ())
    }
}

/// Registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    /// Only the HTML page sends a confirmation.
    pub confirm_password: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    #[serde(deserialize_with = "checkbox")]
    pub accepted_terms: bool,
    #[serde(deserialize_with = "checkbox")]
    pub subscribe_to_newsletter: bool,
}

impl RegisterForm {
    /// True when every required field was supplied and the terms accepted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        present(&self.email)
            && !self.password.is_empty()
            && present(&self.first_name)
            && present(&self.last_name)
            && self.accepted_terms
    }

    /// Field-level checks for the HTML page, with the page's messages.
    ///
    /// # Errors
    ///
    /// Returns every failed field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !present(&self.first_name) {
            errors.push("firstName", "First name is required");
        }
        if !present(&self.last_name) {
            errors.push("lastName", "Last name is required");
        }

        if !present(&self.email) {
            errors.push("email", "Email is required");
        } else if !EMAIL_RE.is_match(self.email.trim()) {
            errors.push("email", "Invalid email address");
        }

        if self.password.is_empty() {
            errors.push("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }

        match self.confirm_password.as_deref() {
            Some("") => errors.push("confirmPassword", "Please confirm your password"),
            Some(confirm) if confirm != self.password => {
                errors.push("confirmPassword", "Passwords do not match");
            }
            _ => {}
        }

        if !self.accepted_terms {
            errors.push("acceptedTerms", "You must accept the terms and conditions");
        }

        errors.finish(|| ())
    }

    /// Hand the form to the auth service.
    #[must_use]
    pub fn into_registration(self) -> Registration {
        Registration {
            email: self.email,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
            accepted_terms: self.accepted_terms,
            subscribe_to_newsletter: self.subscribe_to_newsletter,
        }
    }
}
