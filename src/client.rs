use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client as HttpClient;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::json;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::config::{API_KEY_HEADER, load_config};
use crate::error::{Error, ErrorKind};
use crate::models::{EmailValidation, Emails, FileStatus, FileUpload};
use crate::poll::{self, PollOptions, PollOutcome};
use crate::response::{self, ApiBody};
use crate::table::DataTable;
use crate::util::{join_url, results_filename};

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Blocking client for the Validiz API.
///
/// Every call, including the waits inside
/// [`poll_file_until_complete`](Client::poll_file_until_complete), blocks the
/// calling thread. Run independent operations from separate threads, each
/// with its own client; see [`AsyncClient`](crate::AsyncClient) for the
/// cooperative variant.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    url: String,
    key: String,
    timeout: Duration,
    progress: bool,
    http: HttpClient,
}

impl Client {
    /// Creates a client using environment variables and/or `.validizrc`.
    ///
    /// This is equivalent to `Client::new(None, None)`.
    pub fn from_env() -> crate::Result<Self> {
        Self::new(None, None)
    }

    /// Creates a client using (in order of precedence):
    /// - explicit `api_key`/`api_url` arguments
    /// - environment variables `VALIDIZ_API_KEY` / `VALIDIZ_API_URL`
    /// - config file from `VALIDIZ_RC` or `.validizrc`
    pub fn new(api_key: Option<String>, api_url: Option<String>) -> crate::Result<Self> {
        let cfg = load_config(api_key, api_url)?;
        let http = build_http()?;

        Ok(Self {
            url: cfg.url,
            key: cfg.key,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            progress: true,
            http,
        })
    }

    /// Sets the per-request timeout (default 30 seconds).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Toggles the progress bar drawn while downloading results.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Validates one or more email addresses.
    ///
    /// Returns one [`EmailValidation`] per submitted address.
    pub fn validate_email(&self, emails: impl Into<Emails>) -> crate::Result<Vec<EmailValidation>> {
        let emails = emails.into();
        let body = json!({ "emails": emails.0 });

        let value = self
            .post_json("validate/email", &body)?
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
    pub fn upload_file(&self, file_path: impl AsRef<Path>) -> crate::Result<FileUpload> {
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
        let bytes = fs::read(file_path)?;
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));

        let value = self
            .post_multipart("validate/file", form)?
            .into_json()
            .ok_or_else(|| Error::api("Unexpected upload response"))?;

        serde_json::from_value(value)
            .map_err(|e| Error::api(format!("Unexpected upload response: {}", e)))
    }

    /// Fetches the current status of a validation job.
    pub fn get_file_status(&self, file_id: &str) -> crate::Result<FileStatus> {
        let value = self
            .get(&format!("validate/file/{}/status", file_id))?
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
    pub fn download_file(
        &self,
        file_id: &str,
        output_path: Option<&Path>,
    ) -> crate::Result<PathBuf> {
        let url = join_url(&self.url, &format!("validate/file/{}/download", file_id));
        let resp = self
            .http
            .get(url)
            .header(API_KEY_HEADER, self.key.as_str())
            .timeout(self.timeout)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body = resp.bytes().map_err(|e| self.transport_error(e))?;
            return Err(response::classify_error(status, &body));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let target = match output_path {
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(results_filename(file_id, &content_type)),
        };
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let pb = if self.progress {
            resp.content_length().map(|len| {
                let pb = ProgressBar::new(len);
                pb.set_style(
                    ProgressStyle::with_template(
                        "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
                    )
                    .unwrap()
                    .progress_chars("=>-"),
                );
                pb
            })
        } else {
            None
        };

        let mut resp = resp;
        let mut out = fs::File::create(&target)?;
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = resp
                .read(&mut buf)
                .map_err(|e| Error::connection(format!("Connection error: {}", e)))?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
            if let Some(pb) = &pb {
                pb.inc(n as u64);
            }
        }
        out.flush()?;
        if let Some(pb) = &pb {
            pb.finish_and_clear();
        }

        Ok(target)
    }

    /// Fetches finished results into memory without touching the file system.
    pub fn get_file_content(&self, file_id: &str) -> crate::Result<Vec<u8>> {
        match self.get(&format!("validate/file/{}/download", file_id))? {
            ApiBody::Binary { content, .. } => Ok(content),
            ApiBody::Json(_) => Err(Error::api("Downloaded content is not of type bytes")),
        }
    }

    /// Polls a validation job until it reaches a terminal state, then fetches
    /// and resolves the results per `options`.
    ///
    /// The job is checked at most `options.max_attempts` times, sleeping
    /// `options.interval` seconds between checks. A failed job surfaces its
    /// error message immediately; a job that never finishes within the
    /// attempt budget fails with a timeout error naming the total seconds
    /// budgeted.
    pub fn poll_file_until_complete(
        &self,
        file_id: &str,
        options: &PollOptions,
    ) -> crate::Result<PollOutcome> {
        poll::run_blocking(
            options,
            || self.get_file_status(file_id),
            || self.finish_poll(file_id, options),
            thread::sleep,
        )
    }

    fn finish_poll(&self, file_id: &str, options: &PollOptions) -> crate::Result<PollOutcome> {
        if let Some(path) = &options.output_path {
            let saved = self.download_file(file_id, Some(path))?;
            if options.return_table {
                DataTable::read_file(&saved).map(PollOutcome::Table)
            } else {
                Ok(PollOutcome::Saved(saved))
            }
        } else {
            let content = self.get_file_content(file_id)?;
            if options.return_table {
                DataTable::parse(&content, None).map(PollOutcome::Table)
            } else {
                Ok(PollOutcome::Content(content))
            }
        }
    }

    /// Drops the client, releasing its pooled connections.
    pub fn close(self) {}

    fn get(&self, path: &str) -> crate::Result<ApiBody> {
        self.send(self.http.get(join_url(&self.url, path)))
    }

    fn post_json(&self, path: &str, body: &serde_json::Value) -> crate::Result<ApiBody> {
        self.send(self.http.post(join_url(&self.url, path)).json(body))
    }

    fn post_multipart(&self, path: &str, form: Form) -> crate::Result<ApiBody> {
        self.send(self.http.post(join_url(&self.url, path)).multipart(form))
    }

    fn send(&self, req: RequestBuilder) -> crate::Result<ApiBody> {
        let resp = req
            .header(API_KEY_HEADER, self.key.as_str())
            .timeout(self.timeout)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.bytes().map_err(|e| self.transport_error(e))?;

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

pub(crate) fn user_agent() -> HeaderValue {
    HeaderValue::from_str(&format!("validiz-rs/{}", env!("CARGO_PKG_VERSION")))
        .unwrap_or(HeaderValue::from_static("validiz-rs"))
}

fn build_http() -> crate::Result<HttpClient> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(USER_AGENT, user_agent());

    HttpClient::builder()
        .default_headers(default_headers)
        .build()
        .map_err(|e| Error::api(format!("failed to build HTTP client: {}", e)))
}
