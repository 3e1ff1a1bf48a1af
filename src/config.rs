use std::path::{Path, PathBuf};

use crate::error::Error;

/// Default base URL for the hosted API.
pub const DEFAULT_API_URL: &str = "https://api.validiz.com/v1";

/// Header carrying the API key on every request.
pub(crate) const API_KEY_HEADER: &str = "X-API-Key";

/// Resolved connection settings for a client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base API URL.
    pub url: String,
    /// API key sent with every request.
    pub key: String,
}

#[derive(Debug, Default)]
struct RcConfig {
    url: Option<String>,
    key: Option<String>,
}

/// Resolves configuration using (in order of precedence):
/// - explicit `key`/`url` arguments
/// - environment variables `VALIDIZ_API_KEY` / `VALIDIZ_API_URL`
/// - config file from `VALIDIZ_RC`, `./.validizrc`, or `~/.validizrc`
///
/// The URL falls back to [`DEFAULT_API_URL`]; a key must come from one of
/// the three sources.
pub(crate) fn load_config(key: Option<String>, url: Option<String>) -> crate::Result<ClientConfig> {
    let mut key = key.or_else(|| std::env::var("VALIDIZ_API_KEY").ok());
    let mut url = url.or_else(|| std::env::var("VALIDIZ_API_URL").ok());

    if key.is_none() || url.is_none() {
        for rc_path in rc_candidates() {
            if rc_path.exists() {
                let cfg = read_rc(&rc_path)?;
                if key.is_none() {
                    key = cfg.key;
                }
                if url.is_none() {
                    url = cfg.url;
                }
                break;
            }
        }
    }

    let Some(key) = key else {
        return Err(Error::api(
            "Missing configuration: key (pass an API key, set VALIDIZ_API_KEY, or create .validizrc)",
        ));
    };

    Ok(ClientConfig {
        url: url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        key,
    })
}

fn read_rc(path: &Path) -> crate::Result<RcConfig> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::api(format!(
            "failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let mut cfg = RcConfig::default();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((k, v)) = line.split_once(':') {
            let v = strip_quotes(v.trim());
            match k.trim() {
                "url" if !v.is_empty() => cfg.url = Some(v.to_string()),
                "key" if !v.is_empty() => cfg.key = Some(v.to_string()),
                _ => {}
            }
        }
    }

    Ok(cfg)
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"') && s.len() >= 2)
        || (s.starts_with('\'') && s.ends_with('\'') && s.len() >= 2)
    {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn rc_candidates() -> Vec<PathBuf> {
    // Search order: explicit override, execution directory, home directory.
    if let Ok(p) = std::env::var("VALIDIZ_RC") {
        return vec![PathBuf::from(p)];
    }

    let mut v = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        v.push(cwd.join(".validizrc"));
    }
    if let Some(home) = dirs::home_dir() {
        v.push(home.join(".validizrc"));
    }
    v
}
