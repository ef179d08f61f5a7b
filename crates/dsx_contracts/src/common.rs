#![forbid(unsafe_code)]

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ContractViolation {
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
    InvalidRange {
        field: &'static str,
        min: f64,
        max: f64,
        got: f64,
    },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractViolation::InvalidValue { field, reason } => {
                write!(f, "invalid value for {field}: {reason}")
            }
            ContractViolation::InvalidRange {
                field,
                min,
                max,
                got,
            } => write!(f, "{field} out of range: got {got}, expected {min}..={max}"),
        }
    }
}

impl std::error::Error for ContractViolation {}

pub trait Validate {
    fn validate(&self) -> Result<(), ContractViolation>;
}

/// Identifiers the connector stores verbatim (`@id` values, participant ids).
pub fn validate_identifier(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<(), ContractViolation> {
    if value.trim().is_empty() {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must not be empty",
        });
    }
    if value.trim() != value {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must not have leading or trailing whitespace",
        });
    }
    if value.len() > max_len {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "exceeds max length",
        });
    }
    if value.chars().any(char::is_control) {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must not contain control characters",
        });
    }
    Ok(())
}

pub fn validate_http_url(field: &'static str, value: &str) -> Result<(), ContractViolation> {
    let parsed = url::Url::parse(value).map_err(|_| ContractViolation::InvalidValue {
        field,
        reason: "must be an absolute URL",
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must use http or https",
        });
    }
    if parsed.host_str().is_none() {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must include a host",
        });
    }
    Ok(())
}
