use std::fmt;

/// Failure family of an [`Error`].
///
/// Every API rejection, transport fault, and local failure in this crate is
/// classified into exactly one of these kinds, so callers can match on the
/// kind instead of parsing message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The API key was rejected (HTTP 401).
    Auth,
    /// Request quota exceeded (HTTP 429).
    RateLimit,
    /// The account balance does not cover the request (HTTP 402, or 403
    /// mentioning insufficient credit).
    PaymentRequired,
    /// The request was malformed (HTTP 400 or 422).
    Validation,
    /// The requested resource does not exist (HTTP 404), or a local file
    /// passed to an upload was missing.
    NotFound,
    /// The API failed on its side (HTTP 500-599).
    Server,
    /// The request never completed at the transport level (DNS, TLS,
    /// connection reset).
    Connection,
    /// A request deadline or polling budget elapsed without an outcome.
    Timeout,
    /// Any other failure, including unparsable result payloads.
    Api,
}

/// Error type for all fallible operations in this crate.
///
/// One struct with an [`ErrorKind`] discriminant rather than a type per
/// failure family. The HTTP status and machine-readable error code reported
/// by the API are preserved when the server supplied them, and the `Display`
/// form embeds both.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    status_code: Option<u16>,
    error_code: Option<String>,
    details: Option<serde_json::Value>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            error_code: None,
            details: None,
        }
    }

    pub(crate) fn api(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Api, message)
    }

    pub(crate) fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    /// A single request exceeded the configured timeout.
    pub(crate) fn request_timeout(timeout_secs: u64) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("Request timed out (after {}s)", timeout_secs),
        )
    }

    /// The polling budget was exhausted without a terminal job state.
    pub(crate) fn poll_timeout(budget_secs: u64) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("File processing timed out after {} seconds", budget_secs),
        )
    }

    pub(crate) fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub(crate) fn with_error_code(mut self, code: Option<String>) -> Self {
        self.error_code = code;
        self
    }

    pub(crate) fn with_details(mut self, details: Option<serde_json::Value>) -> Self {
        self.details = details;
        self
    }

    /// Which failure family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The bare human-readable message, without the status/code suffixes.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status of the failed exchange, when the failure came from one.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Machine-readable error code reported by the API, when present.
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    /// Structured error details reported by the API, when present.
    pub fn details(&self) -> Option<&serde_json::Value> {
        self.details.as_ref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == ErrorKind::PaymentRequired {
            let lower = self.message.to_lowercase();
            if lower.contains("insufficient") || lower.contains("credits") {
                return write!(
                    f,
                    "{} - Please add credits to your account at https://validiz.com/",
                    self.message
                );
            }
        }

        write!(f, "{}", self.message)?;
        if let Some(status) = self.status_code {
            write!(f, " (HTTP {})", status)?;
        }
        if let Some(code) = &self.error_code {
            write!(f, " [Error code: {}]", code)?;
        }

        match self.kind {
            ErrorKind::RateLimit => write!(
                f,
                " - Please wait before making more requests or consider upgrading your plan."
            ),
            ErrorKind::Server => write!(
                f,
                " - This is a server-side error. Please try again later or contact support if it persists."
            ),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = if err.kind() == std::io::ErrorKind::NotFound {
            ErrorKind::NotFound
        } else {
            ErrorKind::Api
        };
        Self::new(kind, err.to_string())
    }
}
