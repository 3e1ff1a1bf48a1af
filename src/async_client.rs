use reqwest::Client as HttpClient;
use reqwest::RequestBuilder;
use reqwest::header::{CONTENT_TYPE, HeaderMap, USER_AGENT};
use reqwest::multipart::{Form, Part};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::{DEFAULT_TIMEOUT_SECS, user_agent};
use crate::config::{API_KEY_HEADER, load_config};
use crate::error::{Error, ErrorKind};
use crate::models::{EmailValidation, Emails, FileStatus, FileUpload};
use crate::poll::{self, PollOptions, PollOutcome};
use crate::response::{self, ApiBody};
use crate::table::DataTable;
use crate::util::{join_url, results_filename};

/// Async client for the Validiz API.
///
/// The surface mirrors [`Client`](crate::Client), but every operation is a
/// future, and the waits inside
/// [`poll_file_until_complete`](AsyncClient::poll_file_until_complete)
/// suspend instead of blocking, so multiple polls interleave on one runtime.
/// Dropping a pending future cancels it immediately, mid-wait included.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct AsyncClient {
    url: String,
    key: String,
    timeout: Duration,
    http: HttpClient,
}

impl AsyncClient {
    /// Creates a client using environment variables and/or `.validizrc`.
    ///
    /// This is equivalent to `AsyncClient::new(None, None)`.
    pub fn from_env() -> crate::Result<Self> {
        Self::new(None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `api_key`/`api_url` arguments
    /// - environment variables `VALIDIZ_API_KEY` / `VALIDIZ_API_URL`
    /// - config file from `VALIDIZ_RC` or `.validizrc`
    pub fn new(api_key: Option<String>, api_url: Option<String>) -> crate::Result<Self> {
        let cfg = load_config(api_key, api_url)?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, user_agent());
        let http = HttpClient::builder()
            .default_headers(default_headers)
            .build()
            .map_err(|e| Error::api(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: cfg.url,
            key: cfg.key,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            http,
        })
    }

    /// Sets the per-request timeout (default 30 seconds).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates one or more email addresses.
    ///
    /// Returns one [`EmailValidation`] per submitted address.
    pub async fn validate_email(
        &self,
        emails: impl Into<Emails>,
    ) -> crate::Result<Vec<EmailValidation>> {
        let emails = emails.into();
        let body = json!({ "emails": emails.0 });

        let value = self
            .post_json("validate/email", &body)
            .await?
            .into_json()
            .filter(|v| v.is_array())
            .ok_or_else(|| Error::api("Expected a list response from the validation endpoint"))?;

        serde_json::from_value(value)
            .map_err(|e| Error::api(format!("Unexpected validation response: {}", e)))
    }

    /// Uploads a file of addresses for batch validation.
    ///
    /// The path is checked locally first; a missing file fails before any
    /// network call is made.
    pub async fn upload_file(&self, file_path: impl AsRef<Path>) -> crate::Result<FileUpload> {
        let file_path = file_path.as_ref();
        if !file_path.exists() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("File not found: {}", file_path.display()),
            ));
        }

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let bytes = tokio::fs::read(file_path).await?;
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));

        let value = self
            .post_multipart("validate/file", form)
            .await?
            .into_json()
            .ok_or_else(|| Error::api("Unexpected upload response"))?;

        serde_json::from_value(value)
            .map_err(|e| Error::api(format!("Unexpected upload response: {}", e)))
    }

    /// Fetches the current status of a validation job.
    pub async fn get_file_status(&self, file_id: &str) -> crate::Result<FileStatus> {
        let value = self
            .get(&format!("validate/file/{}/status", file_id))
            .await?
            .into_json()
            .ok_or_else(|| Error::api("Unexpected status response"))?;

        serde_json::from_value(value)
            .map_err(|e| Error::api(format!("Unexpected status response: {}", e)))
    }

    /// Downloads finished results and saves them to disk.
    ///
    /// With no `output_path` the file lands in the current directory under a
    /// name derived from the job id and the declared content type. Returns
    /// the path written to.
    pub async fn download_file(
        &self,
        file_id: &str,
        output_path: Option<&Path>,
    ) -> crate::Result<PathBuf> {
        match self
            .get(&format!("validate/file/{}/download", file_id))
            .await?
        {
            ApiBody::Binary {
                content,
                content_type,
            } => {
                let target = match output_path {
                    Some(p) => p.to_path_buf(),
                    None => PathBuf::from(results_filename(file_id, &content_type)),
                };
                if let Some(parent) = target.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
                tokio::fs::write(&target, &content).await?;
                Ok(target)
            }
            ApiBody::Json(_) => Err(Error::api("Downloaded content is not of type bytes")),
        }
    }

    /// Fetches finished results into memory without touching the file system.
    pub async fn get_file_content(&self, file_id: &str) -> crate::Result<Vec<u8>> {
        match self
            .get(&format!("validate/file/{}/download", file_id))
            .await?
        {
            ApiBody::Binary { content, .. } => Ok(content),
            ApiBody::Json(_) => Err(Error::api("Downloaded content is not of type bytes")),
        }
    }

    /// Polls a validation job until it reaches a terminal state, then fetches
    /// and resolves the results per `options`.
    ///
    /// Semantics match the blocking
    /// [`poll_file_until_complete`](crate::Client::poll_file_until_complete);
    /// the waits are `tokio::time::sleep` suspension points.
    pub async fn poll_file_until_complete(
        &self,
        file_id: &str,
        options: &PollOptions,
    ) -> crate::Result<PollOutcome> {
        poll::run_async(
            options,
            || self.get_file_status(file_id),
            || self.finish_poll(file_id, options),
            tokio::time::sleep,
        )
        .await
    }

    async fn finish_poll(
        &self,
        file_id: &str,
        options: &PollOptions,
    ) -> crate::Result<PollOutcome> {
        if let Some(path) = &options.output_path {
            let saved = self.download_file(file_id, Some(path)).await?;
            if options.return_table {
                let bytes = tokio::fs::read(&saved).await?;
                DataTable::parse_file(&saved, &bytes).map(PollOutcome::Table)
            } else {
                Ok(PollOutcome::Saved(saved))
            }
        } else {
            let content = self.get_file_content(file_id).await?;
            if options.return_table {
                DataTable::parse(&content, None).map(PollOutcome::Table)
            } else {
                Ok(PollOutcome::Content(content))
            }
        }
    }

    /// Drops the client, releasing its pooled connections.
    pub fn close(self) {}

    async fn get(&self, path: &str) -> crate::Result<ApiBody> {
        self.send(self.http.get(join_url(&self.url, path))).await
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> crate::Result<ApiBody> {
        self.send(self.http.post(join_url(&self.url, path)).json(body))
            .await
    }

    async fn post_multipart(&self, path: &str, form: Form) -> crate::Result<ApiBody> {
        self.send(self.http.post(join_url(&self.url, path)).multipart(form))
            .await
    }

    async fn send(&self, req: RequestBuilder) -> crate::Result<ApiBody> {
        let resp = req
            .header(API_KEY_HEADER, self.key.as_str())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().await.map_err(|e| self.transport_error(e))?;

        response::interpret(status, content_type.as_deref(), body.to_vec())
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::request_timeout(self.timeout.as_secs())
        } else {
            Error::connection(format!("Connection error: {}", err))
        }
    }
}
