//! Client-side form validation.
//!
//! Forms carry raw text as typed by the user. `validate` either produces the
//! API payload or reports every failing field at once, without a network
//! round-trip.

mod auth;
mod records;

use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use time::Date;

use crate::models::parse_date;

pub use auth::{ForgotPasswordForm, LoginForm, RegisterForm, ResetPasswordForm};
pub use records::{BillForm, CategoryForm, ContributionForm, GoalForm, PlanItemForm, TransactionForm};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Field name to message, one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first message recorded for a field.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// First message, for single-line notices.
    pub fn first_message(&self) -> Option<&str> {
        self.fields.values().next().map(String::as_str)
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(v) if self.is_empty() => Ok(v),
            _ => Err(self),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

lazy_static! {
    static ref MONTH_RE: Regex = Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").unwrap();
}

pub(crate) fn is_valid_month(month: &str) -> bool {
    MONTH_RE.is_match(month)
}

/// Trimmed text, `None` when blank.
fn optional(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn required(errors: &mut ValidationErrors, field: &'static str, raw: &str, label: &str) -> Option<String> {
    let v = raw.trim();
    if v.is_empty() {
        errors.add(field, format!("{label} is required"));
        None
    } else {
        Some(v.to_string())
    }
}

fn amount(errors: &mut ValidationErrors, field: &'static str, raw: &str, allow_zero: bool) -> Option<f64> {
    let v = raw.trim();
    if v.is_empty() {
        errors.add(field, "Amount is required");
        return None;
    }
    match v.parse::<f64>() {
        Ok(n) if !n.is_finite() => {
            errors.add(field, "Enter a valid number");
            None
        }
        Ok(n) if allow_zero && n < 0.0 => {
            errors.add(field, "Amount cannot be negative");
            None
        }
        Ok(n) if !allow_zero && n <= 0.0 => {
            errors.add(field, "Amount must be greater than 0");
            None
        }
        Ok(n) => Some(n),
        Err(_) => {
            errors.add(field, "Enter a valid number");
            None
        }
    }
}

fn date(errors: &mut ValidationErrors, field: &'static str, raw: &str) -> Option<Date> {
    let v = raw.trim();
    if v.is_empty() {
        errors.add(field, "Date is required");
        return None;
    }
    let parsed = parse_date(v).filter(|_| v.len() == 10);
    if parsed.is_none() {
        errors.add(field, "Use the format YYYY-MM-DD");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rule_matches_simple_addresses() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example@x.io"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn month_rule() {
        assert!(is_valid_month("2024-05"));
        assert!(!is_valid_month("2024-13"));
        assert!(!is_valid_month("2024-5"));
    }

    #[test]
    fn keeps_first_message_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("amount", "first");
        errors.add("amount", "second");
        errors.add("name", "missing");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("amount"), Some("first"));
        assert_eq!(errors.to_string(), "amount: first; name: missing");
    }

    #[test]
    fn amount_parsing() {
        let mut errors = ValidationErrors::new();
        assert_eq!(amount(&mut errors, "a", " 12.50 ", false), Some(12.5));
        assert_eq!(amount(&mut errors, "b", "0", false), None);
        assert_eq!(amount(&mut errors, "c", "0", true), Some(0.0));
        assert_eq!(amount(&mut errors, "d", "abc", true), None);
        assert_eq!(amount(&mut errors, "e", "NaN", true), None);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn date_requires_full_iso_day() {
        let mut errors = ValidationErrors::new();
        assert!(date(&mut errors, "d", "2024-01-01").is_some());
        assert!(date(&mut errors, "e", "2024-01-01T10:00:00Z").is_none());
        assert_eq!(errors.get("e"), Some("Use the format YYYY-MM-DD"));
    }
}
