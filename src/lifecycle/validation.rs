use crate::config::ValidationSettings;
use crate::error::{HelpdeskError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]{3,64}$").expect("username pattern is valid"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

/// Trimmed title within the configured bounds
pub(super) fn title(raw: &str, limits: &ValidationSettings) -> Result<String> {
    let title = raw.trim();
    let len = title.chars().count();
    if len < limits.title_min || len > limits.title_max {
        return Err(HelpdeskError::validation(format!(
            "Title must be between {} and {} characters",
            limits.title_min, limits.title_max
        )));
    }
    Ok(title.to_string())
}

pub(super) fn description(raw: &str, limits: &ValidationSettings) -> Result<String> {
    let description = raw.trim();
    if description.chars().count() < limits.description_min {
        return Err(HelpdeskError::validation(format!(
            "Description must be at least {} characters",
            limits.description_min
        )));
    }
    Ok(description.to_string())
}

pub(super) fn comment(raw: &str, limits: &ValidationSettings) -> Result<String> {
    let text = raw.trim();
    if text.chars().count() < limits.comment_min {
        return Err(HelpdeskError::validation(format!(
            "Comment must be at least {} characters",
            limits.comment_min
        )));
    }
    Ok(text.to_string())
}

pub(super) fn username(raw: &str) -> Result<String> {
    let username = raw.trim();
    if !USERNAME_RE.is_match(username) {
        return Err(HelpdeskError::validation(
            "Username must be 3-64 characters of letters, digits, '.', '_' or '-'",
        ));
    }
    Ok(username.to_string())
}

pub(super) fn email(raw: &str) -> Result<String> {
    let email = raw.trim();
    if !EMAIL_RE.is_match(email) {
        return Err(HelpdeskError::validation(format!("Invalid email address: {email}")));
    }
    Ok(email.to_string())
}

/// Required personal name field
pub(super) fn name(raw: &str, field: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() || name.chars().count() > 50 {
        return Err(HelpdeskError::validation(format!(
            "{field} must be between 1 and 50 characters"
        )));
    }
    Ok(name.to_string())
}
