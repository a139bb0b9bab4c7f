//! Local schema validation for profile drafts
//!
//! Value objects trim display names and email addresses and reject anything
//! the backend schema would refuse. A draft that fails here is
//! never sent to the gateway.

use account_config::ProfileLimits;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::error::{Field, ValidationError, ValidationIssue};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("email pattern compiles")
});

/// Username value object
///
/// Only the length is checked. The value is sent exactly as edited, so a
/// stored username the editor would not produce itself still round-trips.
/// May be empty (the account has not picked one yet).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub fn parse(
        raw: impl AsRef<str>,
        max_len: usize,
    ) -> Result<Self, ValidationError> {
        let username = raw.as_ref();

        if username.chars().count() > max_len {
            return Err(ValidationError::new(
                Field::Username,
                ValidationIssue::TooLong { max: max_len },
            ));
        }

        Ok(Self(username.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display name value object: trimmed, non-empty, bounded length, no control
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn parse(
        raw: impl AsRef<str>,
        max_len: usize,
    ) -> Result<Self, ValidationError> {
        let name = raw.as_ref().trim();

        if name.is_empty() {
            return Err(ValidationError::required(Field::DisplayName));
        }

        if name.chars().count() > max_len {
            return Err(ValidationError::new(
                Field::DisplayName,
                ValidationIssue::TooLong { max: max_len },
            ));
        }

        if name.chars().any(|c| c.is_control()) {
            return Err(ValidationError::new(
                Field::DisplayName,
                ValidationIssue::InvalidCharacters,
            ));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(
        raw: impl AsRef<str>,
        field: Field,
        max_len: usize,
    ) -> Result<Self, ValidationError> {
        let address = raw.as_ref().trim();

        if address.is_empty() {
            return Err(ValidationError::required(field));
        }

        if address.len() > max_len {
            return Err(ValidationError::new(
                field,
                ValidationIssue::TooLong { max: max_len },
            ));
        }

        if !EMAIL_PATTERN.is_match(address) {
            return Err(ValidationError::new(field, ValidationIssue::InvalidEmail));
        }

        Ok(Self(address.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn validate_bio(bio: &str, limits: &ProfileLimits) -> Result<(), ValidationError> {
    match limits.bio_max {
        Some(max) if bio.chars().count() > max => Err(ValidationError::new(
            Field::Bio,
            ValidationIssue::TooLong { max },
        )),
        _ => Ok(()),
    }
}
