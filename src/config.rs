use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // PanLex
    pub panlex_api_url: String,
    pub api_timeout_secs: u64,

    // Views
    pub base_href: String,
    pub url_root: String,

    // Filesystem
    pub i18n_dir: PathBuf,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", 3000)?,

            panlex_api_url: std::env::var("PANLEX_API_URL")
                .unwrap_or_else(|_| "https://api.panlex.org".to_string()),
            api_timeout_secs: parse_var("API_TIMEOUT_SECS", 30)?,

            base_href: std::env::var("BASE_HREF").unwrap_or_else(|_| "/".to_string()),
            url_root: url_root_var()?,

            i18n_dir: std::env::var("I18N_DIR")
                .unwrap_or_else(|_| "i18n".to_string())
                .into(),
            static_dir: std::env::var("STATIC_DIR")
                .unwrap_or_else(|_| "public".to_string())
                .into(),
        })
    }
}

/// `URL_ROOT` is the mount prefix: empty, or an absolute path without a
/// trailing slash
fn url_root_var() -> Result<String> {
    let raw = std::env::var("URL_ROOT").unwrap_or_else(|_| "/demo".to_string());
    let root = raw.trim().trim_end_matches('/');
    if !root.is_empty() && !root.starts_with('/') {
        bail!("URL_ROOT must start with '/', got {:?}", raw);
    }
    Ok(root.to_string())
}

/// Read a numeric variable, falling back to `default` only when it is unset
fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number, got {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}
