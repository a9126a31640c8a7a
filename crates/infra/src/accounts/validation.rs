//! Input shape rules shared by registration and administration.

use std::sync::LazyLock;

use regex::Regex;

use rxconsole_core::{DomainError, DomainResult};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_USERNAME_LEN: usize = 64;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub fn username(value: &str) -> DomainResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("username is required"));
    }
    if trimmed != value {
        return Err(DomainError::validation("username must not have surrounding whitespace"));
    }
    if value.chars().count() > MAX_USERNAME_LEN {
        return Err(DomainError::validation(format!(
            "username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn full_name(value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation("fullName is required"));
    }
    Ok(())
}

pub fn email(value: &str) -> DomainResult<()> {
    if !EMAIL_REGEX.is_match(value) {
        return Err(DomainError::validation("email is not well-formed"));
    }
    Ok(())
}

pub fn password(value: &str) -> DomainResult<()> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn organization_name(value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation("organization name is required"));
    }
    Ok(())
}
