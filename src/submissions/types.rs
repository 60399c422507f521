use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SiteError;
use crate::validators::{
    MAX_MESSAGE_LENGTH, MAX_SHORT_TEXT_LENGTH, collect_errors, validate_email, validate_name,
    validate_optional_text, validate_phone, validate_required_text,
};

pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Student,
    Support,
    Contact,
}

impl SubmissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Support => "support",
            Self::Contact => "contact",
        }
    }
}

impl fmt::Display for SubmissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionKind {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "support" => Ok(Self::Support),
            "contact" => Ok(Self::Contact),
            other => Err(SiteError::InvalidParameters(format!(
                "unknown submission type '{other}'"
            ))),
        }
    }
}

/// Triage state set by an admin. New submissions start as `New`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    New,
    InProgress,
    Resolved,
    Archived,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "archived" => Ok(Self::Archived),
            other => Err(SiteError::InvalidParameters(format!(
                "unknown status '{other}'"
            ))),
        }
    }
}

/// Application for a course or open-workshop slot.
///
/// Required fields default to empty so a missing one is reported by
/// `validate` like a blank one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentApplication {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Offer to volunteer, donate or sponsor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub support_type: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// A public form payload, not yet stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NewSubmission {
    Student(StudentApplication),
    Support(SupportRequest),
    Contact(ContactMessage),
}

impl NewSubmission {
    pub fn kind(&self) -> SubmissionKind {
        match self {
            Self::Student(_) => SubmissionKind::Student,
            Self::Support(_) => SubmissionKind::Support,
            Self::Contact(_) => SubmissionKind::Contact,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Student(s) => &s.name,
            Self::Support(s) => &s.name,
            Self::Contact(c) => &c.name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Self::Student(s) => &s.email,
            Self::Support(s) => &s.email,
            Self::Contact(c) => &c.email,
        }
    }

    /// Every failed field check, in form order. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        match self {
            Self::Student(s) => collect_errors([
                validate_name(&s.name),
                validate_email(&s.email),
                validate_phone(s.phone.as_deref()),
                validate_required_text("Program", &s.program, MAX_SHORT_TEXT_LENGTH),
                validate_optional_text("Experience", s.experience.as_deref(), MAX_MESSAGE_LENGTH),
                validate_optional_text("Message", s.message.as_deref(), MAX_MESSAGE_LENGTH),
            ]),
            Self::Support(s) => collect_errors([
                validate_name(&s.name),
                validate_email(&s.email),
                validate_phone(s.phone.as_deref()),
                validate_optional_text(
                    "Organization",
                    s.organization.as_deref(),
                    MAX_SHORT_TEXT_LENGTH,
                ),
                validate_required_text("Support type", &s.support_type, MAX_SHORT_TEXT_LENGTH),
                validate_required_text("Message", &s.message, MAX_MESSAGE_LENGTH),
            ]),
            Self::Contact(c) => collect_errors([
                validate_name(&c.name),
                validate_email(&c.email),
                validate_optional_text("Subject", c.subject.as_deref(), MAX_SHORT_TEXT_LENGTH),
                validate_required_text("Message", &c.message, MAX_MESSAGE_LENGTH),
            ]),
        }
    }

    /// Kind-specific fields, stored as a JSON object next to name and email.
    pub fn details(&self) -> serde_json::Value {
        match self {
            Self::Student(s) => serde_json::json!({
                "phone": s.phone,
                "program": s.program.trim(),
                "experience": s.experience,
                "message": s.message,
            }),
            Self::Support(s) => serde_json::json!({
                "phone": s.phone,
                "organization": s.organization,
                "support_type": s.support_type.trim(),
                "message": s.message,
            }),
            Self::Contact(c) => serde_json::json!({
                "subject": c.subject,
                "message": c.message,
            }),
        }
    }
}

/// A stored submission as the admin dashboard sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub kind: SubmissionKind,
    pub status: SubmissionStatus,
    pub name: String,
    pub email: String,
    pub details: serde_json::Value,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw `?type=&status=&limit=&offset=` values before parsing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionQuery {
    pub kind: Option<SubmissionKind>,
    pub status: Option<SubmissionStatus>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for SubmissionQuery {
    fn default() -> Self {
        Self {
            kind: None,
            status: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl SubmissionQuery {
    /// Blank values count as absent. Anything unparseable is
    /// [`SiteError::InvalidParameters`].
    pub fn from_params(params: &ListParams) -> Result<Self, SiteError> {
        fn present(value: Option<&String>) -> Option<&str> {
            value.map(|v| v.trim()).filter(|v| !v.is_empty())
        }

        let kind: Option<SubmissionKind> = present(params.kind.as_ref())
            .map(str::parse)
            .transpose()?;
        let status: Option<SubmissionStatus> = present(params.status.as_ref())
            .map(str::parse)
            .transpose()?;

        let limit = match present(params.limit.as_ref()) {
            None => DEFAULT_PAGE_SIZE,
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|limit| (1..=MAX_PAGE_SIZE).contains(limit))
                .ok_or_else(|| {
                    SiteError::InvalidParameters(format!(
                        "limit must be between 1 and {MAX_PAGE_SIZE}"
                    ))
                })?,
        };

        let offset = match present(params.offset.as_ref()) {
            None => 0,
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                SiteError::InvalidParameters("offset must be a non-negative integer".to_owned())
            })?,
        };

        Ok(Self {
            kind,
            status,
            limit,
            offset,
        })
    }

    pub fn matches(&self, submission: &Submission) -> bool {
        self.kind.is_none_or(|kind| submission.kind == kind)
            && self.status.is_none_or(|status| submission.status == status)
    }
}

/// Admin edit. At least one field must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionUpdate {
    #[serde(default)]
    pub status: Option<SubmissionStatus>,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

impl SubmissionUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.admin_notes.is_none()
    }

    pub fn validate(&self) -> Result<(), SiteError> {
        if self.is_empty() {
            return Err(SiteError::InvalidParameters(
                "no fields to update".to_owned(),
            ));
        }

        validate_optional_text("Admin notes", self.admin_notes.as_deref(), MAX_MESSAGE_LENGTH)
            .map_err(|err| SiteError::Validation(vec![err.to_string()]))
    }

    pub(crate) fn apply(&self, submission: &mut Submission, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            submission.status = status;
        }
        if let Some(notes) = &self.admin_notes {
            submission.admin_notes = Some(notes.clone());
        }
        submission.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, email: &str, message: &str) -> NewSubmission {
        NewSubmission::Contact(ContactMessage {
            name: name.to_owned(),
            email: email.to_owned(),
            subject: None,
            message: message.to_owned(),
        })
    }

    #[test]
    fn test_valid_contact_has_no_errors() {
        let submission = contact("Ada", "ada@example.com", "Do you have a laser cutter?");
        assert!(submission.validate().is_empty());
        assert_eq!(submission.kind(), SubmissionKind::Contact);
    }

    #[test]
    fn test_validation_collects_every_error() {
        let submission = contact("", "not-an-email", "");
        assert_eq!(
            submission.validate(),
            vec![
                "Name is required",
                "Invalid email format",
                "Message is required"
            ]
        );
    }

    #[test]
    fn test_student_requires_program() {
        let submission = NewSubmission::Student(StudentApplication {
            name: "Grace".to_owned(),
            email: "grace@example.com".to_owned(),
            phone: Some("12".to_owned()),
            program: " ".to_owned(),
            experience: None,
            message: None,
        });
        assert_eq!(
            submission.validate(),
            vec!["Invalid phone number", "Program is required"]
        );
    }

    #[test]
    fn test_support_details() {
        let submission = NewSubmission::Support(SupportRequest {
            name: "Fab Co".to_owned(),
            email: "hello@fab.example".to_owned(),
            phone: None,
            organization: Some("Fab Co".to_owned()),
            support_type: "sponsorship".to_owned(),
            message: "We'd like to donate filament.".to_owned(),
        });
        let details = submission.details();
        assert_eq!(details["support_type"], "sponsorship");
        assert_eq!(details["organization"], "Fab Co");
    }

    #[test]
    fn test_tagged_deserialization() {
        let json = r#"{"type":"contact","name":"Ada","email":"ada@example.com","message":"hi"}"#;
        let submission: NewSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.kind(), SubmissionKind::Contact);
    }

    #[test]
    fn test_missing_required_fields_reach_validation() {
        let form: ContactMessage =
            serde_json::from_str(r#"{"email":"ada@example.com","message":"hi"}"#).unwrap();
        assert_eq!(
            NewSubmission::Contact(form).validate(),
            vec!["Name is required"]
        );

        let form: SupportRequest = serde_json::from_str(r#"{"name":"Fab Co"}"#).unwrap();
        assert_eq!(
            NewSubmission::Support(form).validate(),
            vec![
                "Email is required",
                "Support type is required",
                "Message is required"
            ]
        );
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            SubmissionStatus::New,
            SubmissionStatus::InProgress,
            SubmissionStatus::Resolved,
            SubmissionStatus::Archived,
        ] {
            assert_eq!(status.as_str().parse::<SubmissionStatus>().unwrap(), status);
        }
        assert!("done".parse::<SubmissionStatus>().is_err());
    }

    #[test]
    fn test_query_defaults() {
        let query = SubmissionQuery::from_params(&ListParams::default()).unwrap();
        assert_eq!(query, SubmissionQuery::default());
        assert_eq!(query.limit, 50);
    }

    #[test]
    fn test_query_parses_filters() {
        let params = ListParams {
            kind: Some("support".to_owned()),
            status: Some("in_progress".to_owned()),
            limit: Some("10".to_owned()),
            offset: Some("20".to_owned()),
        };
        let query = SubmissionQuery::from_params(&params).unwrap();
        assert_eq!(query.kind, Some(SubmissionKind::Support));
        assert_eq!(query.status, Some(SubmissionStatus::InProgress));
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset, 20);
    }

    #[test]
    fn test_query_rejects_bad_values() {
        let bad = [
            ListParams {
                limit: Some("0".to_owned()),
                ..ListParams::default()
            },
            ListParams {
                limit: Some("101".to_owned()),
                ..ListParams::default()
            },
            ListParams {
                offset: Some("-1".to_owned()),
                ..ListParams::default()
            },
            ListParams {
                kind: Some("newsletter".to_owned()),
                ..ListParams::default()
            },
        ];

        for params in bad {
            assert!(matches!(
                SubmissionQuery::from_params(&params),
                Err(SiteError::InvalidParameters(_))
            ));
        }
    }

    #[test]
    fn test_empty_update_is_rejected() {
        assert!(matches!(
            SubmissionUpdate::default().validate(),
            Err(SiteError::InvalidParameters(_))
        ));

        let update = SubmissionUpdate {
            status: Some(SubmissionStatus::Resolved),
            admin_notes: None,
        };
        assert!(update.validate().is_ok());
    }
}
