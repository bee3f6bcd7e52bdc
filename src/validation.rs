//! Local input schemas checked before any flow transition
//!
//! Each schema implements `validator::Validate`, mostly through the derive;
//! [`PaymentForm`] holds a file and is checked by hand. [`Schema::check`] runs it and, on
//! failure, returns every issue in field declaration order so the caller can
//! show a message next to each field.

use std::borrow::Cow;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::api::ProofFile;
use crate::error::{Error, Result};

/// Time slots offered on the booking form
pub const TIME_SLOTS: &[&str] = &["09:00", "10:00", "11:00"];

/// Cities the service currently covers
pub const CITIES: &[&str] = &[
    "Jakarta",
    "Surabaya",
    "Bandung",
    "Medan",
    "Semarang",
    "Palembang",
    "Makassar",
    "Batam",
    "Pekanbaru",
    "Bogor",
    "Bandar Lampung",
    "Padang",
    "Denpasar",
    "Malang",
    "Samarinda",
    "Yogyakarta",
    "Manado",
    "Pontianak",
    "Banjarmasin",
    "Balikpapan",
];

/// Date format of `schedule_at`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Name of the offending field
    pub path: String,
    /// Message to show next to it
    pub message: String,
}

impl Issue {
    /// Create a new issue
    pub fn new(path: &str, message: &str) -> Self {
        Self {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}

/// All issues found in one validation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Issues(Vec<Issue>);

impl Issues {
    /// First issue reported for `field`, if any
    pub fn for_field(&self, field: &str) -> Option<&Issue> {
        self.0.iter().find(|issue| issue.path == field)
    }

    /// Iterate over the issues in report order
    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.0.iter()
    }

    /// Number of issues
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no issues
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names with at least one issue, in report order, without repeats
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for issue in &self.0 {
            if !fields.contains(&issue.path.as_str()) {
                fields.push(&issue.path);
            }
        }
        fields
    }
}

impl From<Vec<Issue>> for Issues {
    fn from(issues: Vec<Issue>) -> Self {
        Issues(issues)
    }
}

impl IntoIterator for Issues {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Issues {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", issue.path, issue.message)?;
        }
        Ok(())
    }
}

/// A `validator` schema with a fixed field order for reporting
pub trait Schema: Validate + Clone {
    /// Field names in the order issues are reported
    const FIELDS: &'static [&'static str];

    /// Validate and return a copy of the accepted value
    fn check(&self) -> Result<Self> {
        match self.validate() {
            Ok(()) => Ok(self.clone()),
            Err(errors) => Err(Error::Validation(collect_issues(&errors, Self::FIELDS))),
        }
    }
}

fn collect_issues(errors: &ValidationErrors, order: &[&str]) -> Issues {
    let mut by_field: Vec<(&str, &Vec<ValidationError>)> =
        errors.field_errors().into_iter().collect();
    by_field.sort_by_key(|(field, _)| {
        order
            .iter()
            .position(|known| known == field)
            .unwrap_or(order.len())
    });

    let mut issues = Vec::new();
    for (field, field_errors) in by_field {
        for err in field_errors {
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.code.to_string());
            issues.push(Issue::new(field, &message));
        }
    }
    Issues(issues)
}

fn rejection(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn validate_time_slot(value: &str) -> std::result::Result<(), ValidationError> {
    if value.is_empty() {
        return Err(rejection("required", "Time is required"));
    }
    if !TIME_SLOTS.contains(&value) {
        return Err(rejection("time_slot", "Please choose one of the available times"));
    }
    Ok(())
}

fn validate_schedule(value: &str) -> std::result::Result<(), ValidationError> {
    if value.is_empty() {
        return Err(rejection("required", "Schedule date is required"));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| rejection("date", "Schedule date must be a valid date"))
}

fn validate_city(value: &str) -> std::result::Result<(), ValidationError> {
    if value.is_empty() {
        return Err(rejection("required", "City is required"));
    }
    if !CITIES.contains(&value) {
        return Err(rejection("city", "Please choose a city from the list"));
    }
    Ok(())
}

/// The in-progress booking form, persisted under `bookingData`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BookingDraft {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone: String,

    #[validate(custom = "validate_time_slot")]
    pub started_time: String,

    #[validate(custom = "validate_schedule")]
    pub schedule_at: String,

    #[validate(length(min = 1, message = "Post code is required"))]
    pub post_code: String,

    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,

    #[validate(custom = "validate_city")]
    pub city: String,
}

impl Schema for BookingDraft {
    const FIELDS: &'static [&'static str] = &[
        "name",
        "email",
        "phone",
        "started_time",
        "schedule_at",
        "post_code",
        "address",
        "city",
    ];
}

impl BookingDraft {
    /// A blank form with `schedule_at` set to the day after `today`
    pub fn seeded(today: NaiveDate) -> Self {
        let tomorrow = today.succ_opt().unwrap_or(today);
        Self {
            schedule_at: tomorrow.format(DATE_FORMAT).to_string(),
            ..Self::default()
        }
    }
}

/// Lookup of an existing booking, also the `/check-booking` request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct BookingLookup {
    #[validate(length(min = 1, message = "Booking TRX ID is required"))]
    pub booking_trx_id: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

impl Schema for BookingLookup {
    const FIELDS: &'static [&'static str] = &["booking_trx_id", "email"];
}

impl BookingLookup {
    /// Create a new lookup request
    pub fn new(booking_trx_id: &str, email: &str) -> Self {
        Self {
            booking_trx_id: booking_trx_id.to_string(),
            email: email.to_string(),
        }
    }
}

/// Proof of payment plus the services being paid for
#[derive(Debug, Clone, Default)]
pub struct PaymentForm {
    pub proof: Option<ProofFile>,
    pub service_ids: Vec<i64>,
}

impl Validate for PaymentForm {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.proof.is_none() {
            errors.add("proof", rejection("required", "Proof of payment is required"));
        }
        if self.service_ids.is_empty() {
            errors.add(
                "service_ids",
                rejection("length", "At least one service is required"),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Schema for PaymentForm {
    const FIELDS: &'static [&'static str] = &["proof", "service_ids"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn valid_draft() -> BookingDraft {
        BookingDraft {
            name: "Jane".into(),
            email: "jane@x.com".into(),
            phone: "0811".into(),
            started_time: "09:00".into(),
            schedule_at: "2025-01-02".into(),
            post_code: "12345".into(),
            address: "Jl. A".into(),
            city: "Jakarta".into(),
        }
    }

    fn issues_of(err: Error) -> Issues {
        match err {
            Error::Validation(issues) => issues,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_booking_passes_unchanged() {
        let draft = valid_draft();
        assert_eq!(draft.check().unwrap(), draft);
    }

    #[test]
    fn test_invalid_email_rejected() {
        let draft = BookingDraft {
            email: "not-an-email".into(),
            ..valid_draft()
        };
        let err = draft.check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let issues = issues_of(err);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues.for_field("email").unwrap().message, "Invalid email address");
    }

    #[test]
    fn test_blank_form_reports_every_field_in_order() {
        let issues = issues_of(BookingDraft::default().check().unwrap_err());
        assert_eq!(issues.fields(), BookingDraft::FIELDS.to_vec());
        assert_eq!(issues.for_field("city").unwrap().message, "City is required");
    }

    #[test]
    fn test_unknown_slot_city_and_bad_date() {
        let draft = BookingDraft {
            started_time: "13:00".into(),
            schedule_at: "02/01/2025".into(),
            city: "Atlantis".into(),
            ..valid_draft()
        };
        let issues = issues_of(draft.check().unwrap_err());
        assert_eq!(issues.fields(), vec!["started_time", "schedule_at", "city"]);
        assert_eq!(
            issues.for_field("schedule_at").unwrap().message,
            "Schedule date must be a valid date"
        );
    }

    #[test]
    fn test_seeded_draft_schedules_tomorrow() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let draft = BookingDraft::seeded(today);
        assert_eq!(draft.schedule_at, "2025-01-01");
        assert!(draft.name.is_empty());
        assert!(draft.city.is_empty());
    }

    #[test]
    fn test_lookup_schema() {
        assert!(BookingLookup::new("TRX1", "jane@x.com").check().is_ok());
        let issues = issues_of(BookingLookup::new("", "jane").check().unwrap_err());
        assert_eq!(issues.fields(), vec!["booking_trx_id", "email"]);
    }

    #[test]
    fn test_payment_schema() {
        let issues = issues_of(PaymentForm::default().check().unwrap_err());
        assert_eq!(issues.fields(), vec!["proof", "service_ids"]);
        assert_eq!(
            issues.for_field("proof").unwrap().message,
            "Proof of payment is required"
        );
        assert_eq!(
            issues.for_field("service_ids").unwrap().message,
            "At least one service is required"
        );

        let issues = issues_of(
            PaymentForm {
                proof: None,
                service_ids: vec![4],
            }
            .check()
            .unwrap_err(),
        );
        assert_eq!(issues.fields(), vec!["proof"]);

        let form = PaymentForm {
            proof: Some(ProofFile::new("transfer.png", vec![1, 2, 3])),
            service_ids: vec![4],
        };
        assert!(form.check().is_ok());
    }

    #[test]
    fn test_issues_display() {
        let issues = Issues::from(vec![
            Issue::new("name", "Name is required"),
            Issue::new("email", "Invalid email address"),
        ]);
        assert_eq!(issues.to_string(), "name: Name is required; email: Invalid email address");
    }
}
