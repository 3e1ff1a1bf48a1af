//! A Rust client for the Validiz email validation API.
//!
//! This crate implements the `validiz`-style flow in both blocking and async
//! form: validate addresses directly, or upload a file of addresses, poll
//! until the job completes, then materialize the results as a table.
//!
//! ## Quick start
//! - Configure authentication via an explicit key, environment variables
//!   (`VALIDIZ_API_KEY`, `VALIDIZ_API_URL`), or a `.validizrc` file
//!   (supported in the current directory and in your home directory).
//! - Call [`Client::validate_email`] for ad-hoc checks, or
//!   [`Client::upload_file`] followed by
//!   [`Client::poll_file_until_complete`] for batches.
//!
//! ```no_run
//! use validiz::{Client, PollOptions, PollOutcome};
//!
//! fn main() -> validiz::Result<()> {
//!     let client = Client::from_env()?;
//!
//!     let results = client.validate_email("user@example.com")?;
//!     for outcome in &results {
//!         println!("{}: valid={}", outcome.email, outcome.is_valid);
//!     }
//!
//!     let upload = client.upload_file("emails.csv")?;
//!     let outcome = client.poll_file_until_complete(
//!         &upload.file_id,
//!         &PollOptions::new().with_interval(5).with_max_attempts(60),
//!     )?;
//!     if let PollOutcome::Table(table) = outcome {
//!         println!("validated {} addresses", table.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The async variant exposes the same surface on [`AsyncClient`]; its poll
//! waits suspend instead of blocking, so concurrent jobs interleave on one
//! runtime and dropping a pending call cancels it immediately.
//!
//! ## Errors
//! Every failure is an [`Error`] carrying an [`ErrorKind`], the
//! human-readable message, and (when the API supplied them) the HTTP status
//! and machine-readable error code.

#![forbid(unsafe_code)]

mod async_client;
mod client;
mod config;
mod error;
mod models;
mod poll;
mod response;
mod table;
mod util;

pub use async_client::AsyncClient;
pub use client::Client;
pub use config::{ClientConfig, DEFAULT_API_URL};
pub use error::{Error, ErrorKind};
pub use models::{EmailValidation, Emails, FileStatus, FileUpload, JobState};
pub use poll::{PollOptions, PollOutcome};
pub use table::{DataTable, TableFormat};

/// Result type alias for Validiz operations.
pub type Result<T> = std::result::Result<T, Error>;
