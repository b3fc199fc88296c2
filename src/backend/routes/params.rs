//! Query string helpers shared by the list endpoints
//!
//! Paging parameters arrive as raw strings so a bad value can be reported as a
//! field error instead of a bare extractor rejection.

use serde::Deserialize;
use uuid::Uuid;

use crate::backend::error::{BackendError, FieldError};

/// Largest page size any list endpoint accepts
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageParams {
    /// Parse into `(page, limit)`, 1-based, collecting every field error
    pub fn parse(&self, default_limit: u32) -> Result<(u32, u32), BackendError> {
        parse_page(self.page.as_deref(), self.limit.as_deref(), default_limit)
    }
}

pub fn parse_page(page: Option<&str>, limit: Option<&str>, default_limit: u32) -> Result<(u32, u32), BackendError> {
    let mut errors = Vec::new();

    let page = match page.map(str::trim) {
        None | Some("") => Some(1),
        Some(raw) => raw.parse::<u32>().ok().filter(|p| *p >= 1),
    };
    if page.is_none() {
        errors.push(FieldError::new("page", "Page must be a positive integer"));
    }

    let limit = match limit.map(str::trim) {
        None | Some("") => Some(default_limit),
        Some(raw) => raw.parse::<u32>().ok().filter(|l| (1..=MAX_LIMIT).contains(l)),
    };
    if limit.is_none() {
        errors.push(FieldError::new("limit", format!("Limit must be between 1 and {}", MAX_LIMIT)));
    }

    match (page, limit) {
        (Some(page), Some(limit)) => Ok((page, limit)),
        _ => Err(BackendError::ValidationError { errors }),
    }
}

/// Lenient boolean flag: `true`/`1` are true, anything else is false
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("true") | Some("1"))
}

/// Path id that must be a UUID; anything else is a 400 on `field`
pub fn parse_id(raw: &str, field: &str) -> Result<Uuid, BackendError> {
    Uuid::parse_str(raw.trim()).map_err(|_| BackendError::validation(field, format!("Invalid {}", field)))
}
