//! Typed records exchanged with the validation endpoints.

use serde::Deserialize;
use std::fmt;

/// Validation outcome for a single email address.
///
/// One element of the response to [`validate_email`](crate::Client::validate_email).
/// Everything beyond `email` and `is_valid` is populated only when the API
/// reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailValidation {
    /// The address this outcome applies to.
    pub email: String,
    /// Whether the address passed validation.
    pub is_valid: bool,
    /// Why the address failed, when it did.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Coarse validation status, e.g. `valid` or `invalid`.
    #[serde(default)]
    pub status: Option<String>,
    /// Finer-grained status, e.g. `mailbox_not_found`.
    #[serde(default)]
    pub sub_status: Option<String>,
    /// Whether the address belongs to a free-mail provider.
    #[serde(default)]
    pub free_email: Option<bool>,
    /// Local part of the address.
    #[serde(default)]
    pub account: Option<String>,
    /// Domain part of the address.
    #[serde(default)]
    pub domain: Option<String>,
    /// SMTP provider serving the domain.
    #[serde(default)]
    pub smtp_provider: Option<String>,
    /// Whether MX records were found for the domain.
    #[serde(default)]
    pub mx_found: Option<bool>,
    /// The MX records found, when any.
    #[serde(default)]
    pub mx_record: Option<Vec<String>>,
}

/// Receipt returned when a file of addresses is accepted for validation.
///
/// `file_id` is the job handle: pass it to the status, download, and polling
/// calls.
#[derive(Debug, Clone, Deserialize)]
pub struct FileUpload {
    /// Server-assigned identifier of the validation job.
    pub file_id: String,
    /// Initial job state echoed by the upload endpoint.
    #[serde(default)]
    pub status: Option<String>,
    /// Name the server recorded for the uploaded file.
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Lifecycle state of an uploaded validation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
    /// A state this crate does not know about. Treated as non-terminal, so
    /// polling keeps going until the attempt budget runs out.
    Other,
}

impl<'de> Deserialize<'de> for JobState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let state = String::deserialize(deserializer)?;
        Ok(match state.as_str() {
            "pending" => JobState::Pending,
            "processing" => JobState::Processing,
            "completed" => JobState::Completed,
            "failed" => JobState::Failed,
            _ => JobState::Other,
        })
    }
}

impl JobState {
    /// Completed and failed jobs never change state again.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Pending => "pending",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Other => "unknown",
        };
        f.write_str(name)
    }
}

/// Point-in-time snapshot of a validation job.
///
/// A fresh snapshot is fetched on every status check; nothing here is cached
/// between polls.
#[derive(Debug, Clone, Deserialize)]
pub struct FileStatus {
    /// Identifier of the job the snapshot describes.
    #[serde(default)]
    pub file_id: Option<String>,
    /// Current lifecycle state.
    pub status: JobState,
    /// Failure reason, populated when the job failed.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Total addresses in the uploaded file.
    #[serde(default)]
    pub total_emails: Option<u64>,
    /// Addresses processed so far.
    #[serde(default)]
    pub processed_emails: Option<u64>,
    /// Addresses found valid so far.
    #[serde(default)]
    pub valid_emails: Option<u64>,
    /// Addresses found invalid so far.
    #[serde(default)]
    pub invalid_emails: Option<u64>,
}

/// One or many addresses accepted by the validate call.
///
/// Built from a single address or any common collection of them, so
/// `validate_email("a@b.example")` and `validate_email(vec![...])` both work.
#[derive(Debug, Clone)]
pub struct Emails(pub(crate) Vec<String>);

impl From<&str> for Emails {
    fn from(email: &str) -> Self {
        Emails(vec![email.to_string()])
    }
}

impl From<String> for Emails {
    fn from(email: String) -> Self {
        Emails(vec![email])
    }
}

impl From<Vec<String>> for Emails {
    fn from(emails: Vec<String>) -> Self {
        Emails(emails)
    }
}

impl From<Vec<&str>> for Emails {
    fn from(emails: Vec<&str>) -> Self {
        Emails(emails.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Emails {
    fn from(emails: &[&str]) -> Self {
        Emails(emails.iter().map(|e| e.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Emails {
    fn from(emails: [&str; N]) -> Self {
        Emails(emails.iter().map(|e| e.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_a_full_validation_record() {
        let value = json!({
            "email": "invalid@example.com",
            "is_valid": false,
            "status": "invalid",
            "sub_status": "mailbox_not_found",
            "error_message": "Mailbox not found",
            "free_email": true,
            "account": "invalid",
            "domain": "example.com",
            "smtp_provider": "Google",
            "mx_found": true,
            "mx_record": ["example-com.mail.protection.outlook.com"],
        });

        let record: EmailValidation = serde_json::from_value(value).unwrap();
        assert_eq!(record.email, "invalid@example.com");
        assert!(!record.is_valid);
        assert_eq!(record.sub_status.as_deref(), Some("mailbox_not_found"));
        assert_eq!(record.mx_record.unwrap().len(), 1);
    }

    #[test]
    fn deserializes_a_sparse_validation_record() {
        let value = json!({ "email": "valid@example.com", "is_valid": true });
        let record: EmailValidation = serde_json::from_value(value).unwrap();
        assert!(record.is_valid);
        assert!(record.status.is_none());
        assert!(record.error_message.is_none());
    }

    #[test]
    fn job_states_parse_from_lowercase_names() {
        let status: FileStatus = serde_json::from_value(json!({
            "file_id": "file_12345",
            "status": "processing",
            "total_emails": 100,
            "processed_emails": 50,
        }))
        .unwrap();
        assert_eq!(status.status, JobState::Processing);
        assert!(!status.status.is_terminal());
        assert_eq!(status.processed_emails, Some(50));
    }

    #[test]
    fn unknown_job_state_is_non_terminal() {
        let status: FileStatus =
            serde_json::from_value(json!({ "status": "archived" })).unwrap();
        assert_eq!(status.status, JobState::Other);
        assert!(!status.status.is_terminal());
    }

    #[test]
    fn terminal_states_are_exactly_completed_and_failed() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Processing.is_terminal());
        assert!(!JobState::Other.is_terminal());
    }

    #[test]
    fn emails_accepts_one_or_many() {
        assert_eq!(Emails::from("a@example.com").0, vec!["a@example.com"]);
        assert_eq!(
            Emails::from(["a@example.com", "b@example.com"]).0.len(),
            2
        );
        assert_eq!(
            Emails::from(vec!["a@example.com".to_string()]).0.len(),
            1
        );
    }
}
