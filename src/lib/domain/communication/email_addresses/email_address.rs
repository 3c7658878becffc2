//! Email Address

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]{2,}$").expect("email regex is valid");
}

use std::fmt;

use thiserror::Error;

use EmailAddressError::*;

/// An error that can occur when creating an email address
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmailAddressError {
    /// The email address is empty
    #[error("email is empty")]
    EmptyEmailAddress,

    /// The email address is invalid
    #[error("email is invalid")]
    InvalidEmailAddress,
}

/// An email address
///
/// Deserializing goes through [`EmailAddress::new_unchecked`], so values read
/// off the wire must still pass [`EmailAddress::is_valid`] before dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new email address
    pub fn new(raw: &str) -> Result<Self, EmailAddressError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(EmptyEmailAddress);
        }

        if !EMAIL_REGEX.is_match(trimmed) {
            return Err(InvalidEmailAddress);
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Create an email address without checking its syntax
    pub fn new_unchecked(raw: &str) -> Self {
        Self(raw.to_string())
    }

    /// Whether the address is syntactically valid
    pub fn is_valid(&self) -> bool {
        EMAIL_REGEX.is_match(self.0.trim())
    }

    /// The domain part of the address, if any
    pub fn domain(&self) -> Option<&str> {
        self.0.rsplit_once('@').map(|(_, domain)| domain)
    }

    /// The address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.0
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_email_address_display() -> TestResult {
        let email = EmailAddress::new("email@example.com")?;

        assert_eq!(format!("{}", email), "email@example.com".to_string());

        Ok(())
    }

    #[test]
    fn test_empty_email_address_is_invalid() {
        let result = EmailAddress::new("   ");
        assert!(matches!(result.unwrap_err(), EmptyEmailAddress));
    }

    #[test]
    fn test_email_address_without_at_symbol_is_invalid() {
        let result = EmailAddress::new("email");
        assert!(matches!(result.unwrap_err(), InvalidEmailAddress));
    }

    #[test]
    fn test_email_address_without_tld_is_invalid() {
        assert!(EmailAddress::new("email@localhost").is_err());
        assert!(EmailAddress::new("email@example.c").is_err());
    }

    #[test]
    fn test_unchecked_address_can_be_validated_later() {
        assert!(!EmailAddress::new_unchecked("not an email").is_valid());
        assert!(EmailAddress::new_unchecked("user@example.com").is_valid());
    }

    #[test]
    fn test_domain() -> TestResult {
        let email = EmailAddress::new("user@mail.example.com")?;

        assert_eq!(email.domain(), Some("mail.example.com"));

        Ok(())
    }
}
