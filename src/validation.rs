//! Schema validation for procedure and form input
//!
//! Every input type implements [`Validate`]. Validation collects all issues
//! instead of stopping at the first, so forms can highlight every bad field.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static COLOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("color pattern is valid"));

pub const MAX_SKILLS: usize = 25;
pub const MAX_SKILL_LEN: usize = 40;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// A single field-level problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// All problems found in one input value
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", self.summary())]
pub struct ValidationErrors {
    issues: Vec<FieldIssue>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record the outcome of a single check
    pub fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<FieldIssue> {
        self.issues
    }

    /// Message for the first issue for `field`, if any
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.issues
            .iter()
            .find(|issue| issue.field == field)
            .map(|issue| issue.message.as_str())
    }

    pub fn summary(&self) -> String {
        match self.issues.as_slice() {
            [] => "input is valid".to_string(),
            [only] => format!("{}: {}", only.field, only.message),
            [first, rest @ ..] => format!(
                "{}: {} (and {} more)",
                first.field,
                first.message,
                rest.len()
            ),
        }
    }

    /// `Ok(())` when no issues were recorded
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Implemented by every input type accepted by a procedure or form
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for () {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn required(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err("is required".to_string())
    } else {
        Ok(())
    }
}

/// Character-count bounds on the trimmed value
pub fn length(value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.trim().chars().count();
    if len < min {
        if min == 1 {
            Err("is required".to_string())
        } else {
            Err(format!("must be at least {} characters", min))
        }
    } else if len > max {
        Err(format!("must be at most {} characters", max))
    } else {
        Ok(())
    }
}

pub fn optional_length(value: Option<&str>, max: usize) -> Result<(), String> {
    match value {
        Some(v) => length(v, 0, max),
        None => Ok(()),
    }
}

pub fn email(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.len() > 254 || !EMAIL_RE.is_match(value) {
        Err("must be a valid email address".to_string())
    } else {
        Ok(())
    }
}

pub fn password(value: &str) -> Result<(), String> {
    let len = value.chars().count();
    if len < MIN_PASSWORD_LEN {
        Err(format!("must be at least {} characters", MIN_PASSWORD_LEN))
    } else if len > MAX_PASSWORD_LEN {
        Err(format!("must be at most {} characters", MAX_PASSWORD_LEN))
    } else {
        Ok(())
    }
}

/// Absolute http(s) URL, or absent. Empty strings count as absent.
pub fn optional_url(value: Option<&str>) -> Result<(), String> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(());
    };
    match url::Url::parse(raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some() => {
            Ok(())
        }
        Ok(_) => Err("must be an http or https URL".to_string()),
        Err(_) => Err("must be a valid URL".to_string()),
    }
}

pub fn skills(values: &[String]) -> Result<(), String> {
    if values.is_empty() {
        return Err("must list at least one skill".to_string());
    }
    if values.len() > MAX_SKILLS {
        return Err(format!("must list at most {} skills", MAX_SKILLS));
    }
    for skill in values {
        let len = skill.trim().chars().count();
        if len == 0 || len > MAX_SKILL_LEN {
            return Err(format!(
                "each skill must be 1 to {} characters",
                MAX_SKILL_LEN
            ));
        }
    }
    Ok(())
}

/// Trim skills and drop case-insensitive duplicates, keeping first spelling
pub fn normalize_skills(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Split a comma-separated form field into skills
pub fn parse_skill_list(raw: &str) -> Vec<String> {
    normalize_skills(
        &raw.split(',')
            .map(|s| s.to_string())
            .collect::<Vec<_>>(),
    )
}

/// `#rrggbb`, or absent. Empty strings count as absent.
pub fn optional_color(value: Option<&str>) -> Result<(), String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(color) if !COLOR_RE.is_match(color) => Err("must be a color like #2f855a".to_string()),
        _ => Ok(()),
    }
}

/// Treat blank optional strings as absent
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_optional_color() {
        assert!(optional_color(None).is_ok());
        assert!(optional_color(Some(" ")).is_ok());
        assert!(optional_color(Some("#2F855a")).is_ok());
        assert!(optional_color(Some("green")).is_err());
        assert!(optional_color(Some("#2f855")).is_err());
    }

    #[test]
    fn test_email_accepts_common_forms() {
        assert!(email("ada@example.com").is_ok());
        assert!(email("  ada.lovelace+talent@mail.example.co.uk ").is_ok());
    }

    #[test]
    fn test_email_rejects_garbage() {
        for bad in ["", "ada", "ada@", "@example.com", "ada@example", "a b@example.com"] {
            assert!(email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_optional_url() {
        assert!(optional_url(None).is_ok());
        assert!(optional_url(Some("")).is_ok());
        assert!(optional_url(Some("https://github.com/ada")).is_ok());
        assert!(optional_url(Some("ftp://example.com")).is_err());
        assert!(optional_url(Some("not a url")).is_err());
        assert!(optional_url(Some("javascript:alert(1)")).is_err());
    }

    #[test]
    fn test_length_messages() {
        assert_eq!(length("", 1, 10), Err("is required".to_string()));
        assert_eq!(
            length("abc", 5, 10),
            Err("must be at least 5 characters".to_string())
        );
        assert_eq!(
            length("abcdefghijk", 1, 10),
            Err("must be at most 10 characters".to_string())
        );
        assert!(length("  abc  ", 3, 3).is_ok());
    }

    #[test]
    fn test_skills_rules() {
        assert!(skills(&[]).is_err());
        assert!(skills(&["rust".to_string()]).is_ok());
        assert!(skills(&["   ".to_string()]).is_err());
        let too_many: Vec<String> = (0..=MAX_SKILLS).map(|i| format!("s{i}")).collect();
        assert!(skills(&too_many).is_err());
    }

    #[test]
    fn test_normalize_skills_dedupes_case_insensitively() {
        let raw = vec![
            " Rust ".to_string(),
            "rust".to_string(),
            "Go".to_string(),
            "".to_string(),
        ];
        assert_eq!(normalize_skills(&raw), vec!["Rust", "Go"]);
        assert_eq!(parse_skill_list("Rust, Postgres,,rust"), vec!["Rust", "Postgres"]);
    }

    #[test]
    fn test_validation_errors_collects_all() {
        let mut errors = ValidationErrors::new();
        errors.check("email", email("nope"));
        errors.check("password", password("short"));
        errors.check("name", required("Ada"));
        assert_eq!(errors.issues().len(), 2);
        assert_eq!(
            errors.message_for("password"),
            Some("must be at least 8 characters")
        );
        assert!(errors.summary().contains("(and 1 more)"));
        assert!(errors.into_result().is_err());
    }

    proptest! {
        #[test]
        fn prop_normalized_skills_are_unique(raw in prop::collection::vec("[a-zA-Z ]{0,8}", 0..30)) {
            let normalized = normalize_skills(&raw);
            let lowered: HashSet<String> = normalized.iter().map(|s| s.to_lowercase()).collect();
            prop_assert_eq!(lowered.len(), normalized.len());
            prop_assert!(normalized.iter().all(|s| !s.is_empty() && s.trim() == s));
        }

        #[test]
        fn prop_normalize_email_is_idempotent(raw in "[ A-Za-z0-9@.]{0,30}") {
            let once = normalize_email(&raw);
            prop_assert_eq!(normalize_email(&once), once.clone());
        }
    }
}
