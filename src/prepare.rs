//! Per-request preparation: display language, query-string builder, and the
//! trimmed form fields each operation accepts.

use crate::error::{Result as AppResult, TeraDictError};
use crate::i18n::{LocalizationBundle, DEFAULT_LANGUAGE};
use crate::normalize::trimmed;
use crate::server::AppState;
use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::response::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

/// Name of the query parameter that selects the display language
pub const LANGUAGE_PARAM: &str = "lg";

/// The original query parameters of a request, in order.
///
/// Builds links back to the current page with some parameters changed, e.g.
/// to switch the display language while keeping everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    params: Vec<(String, String)>,
}

impl QueryString {
    /// Parse a raw query (without the leading `?`)
    pub fn parse(raw: &str) -> Self {
        let params = serde_urlencoded::from_str::<Vec<(String, String)>>(raw).unwrap_or_else(|e| {
            warn!("Ignoring unparseable query string {:?}: {}", raw, e);
            Vec::new()
        });
        Self { params }
    }

    /// First value of `key`, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The original query string, `?`-prefixed when non-empty
    pub fn build(&self) -> String {
        encode(&self.params)
    }

    /// The original query string with overrides applied.
    ///
    /// `None` deletes the key; `Some(value)` replaces it in place, or appends
    /// it when the key was not present.
    pub fn with_overrides<K, V>(&self, overrides: &[(K, Option<V>)]) -> String
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = self.params.clone();

        for (key, value) in overrides {
            let key = key.as_ref();
            match value {
                None => params.retain(|(k, _)| k != key),
                Some(value) => {
                    let value = value.as_ref().to_string();
                    match params.iter().position(|(k, _)| k == key) {
                        Some(first) => {
                            params[first].1 = value;
                            let mut index = 0;
                            params.retain(|(k, _)| {
                                let keep = k != key || index == first;
                                index += 1;
                                keep
                            });
                        }
                        None => params.push((key.to_string(), value)),
                    }
                }
            }
        }

        encode(&params)
    }
}

fn encode(params: &[(String, String)]) -> String {
    match serde_urlencoded::to_string(params) {
        Ok(text) if !text.is_empty() => format!("?{}", text),
        _ => String::new(),
    }
}

/// Everything the pipeline attaches to a request before the route handler runs.
///
/// Extraction resolves the `lg` parameter against the localization store. An
/// unknown code rejects the request with the error page, so the handler
/// never runs without a bundle.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub bundle: Arc<LocalizationBundle>,
    pub query: QueryString,
}

impl Prepared {
    pub fn subheading(&self) -> &str {
        self.bundle.subheading()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Prepared {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let query = QueryString::parse(parts.uri.query().unwrap_or_default());
        let code = query.get(LANGUAGE_PARAM).unwrap_or(DEFAULT_LANGUAGE);

        match state.locales.get(code) {
            Some(bundle) => Ok(Self { bundle, query }),
            None => {
                warn!("Rejecting request for unknown language {:?}", code);
                let err = TeraDictError::UnknownLanguage(code.to_string());
                Err(state.views.error_response(&err, None))
            }
        }
    }
}

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Decode a submitted form body.
///
/// A missing body, or one that is not url-encoded, counts as a form with
/// every field absent. A url-encoded body that does not decode is an error.
pub fn parse_form<T>(content_type: Option<&str>, body: &[u8]) -> AppResult<T>
where
    T: DeserializeOwned + Default,
{
    let is_form = content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE));

    if !is_form || body.is_empty() {
        return Ok(T::default());
    }

    serde_urlencoded::from_bytes(body).map_err(|e| TeraDictError::MalformedForm(e.to_string()))
}

/// Form body extractor that reports failures through the error page
#[derive(Debug, Clone, Default)]
pub struct FormFields<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for FormFields<T>
where
    T: DeserializeOwned + Default + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let parsed = match Bytes::from_request(req, state).await {
            Ok(body) => parse_form(content_type.as_deref(), &body),
            Err(rejection) => Err(TeraDictError::MalformedForm(rejection.body_text())),
        };

        parsed
            .map(FormFields)
            .map_err(|err| state.views.error_response(&err, None))
    }
}

/// Form fields accepted by `POST /1`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupForm {
    #[serde(default)]
    pub et0: Option<String>,
}

impl LookupForm {
    /// Trimmed fields, with blanks dropped
    pub fn trimmed(&self) -> Self {
        Self {
            et0: trimmed(self.et0.as_deref()).map(str::to_string),
        }
    }
}

/// Form fields accepted by `POST /2`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpandForm {
    #[serde(default)]
    pub et0: Option<String>,
    #[serde(default)]
    pub ex0: Option<String>,
    #[serde(default)]
    pub lv1: Option<String>,
}

impl ExpandForm {
    /// Trimmed fields, with blanks dropped
    pub fn trimmed(&self) -> Self {
        Self {
            et0: trimmed(self.et0.as_deref()).map(str::to_string),
            ex0: trimmed(self.ex0.as_deref()).map(str::to_string),
            lv1: trimmed(self.lv1.as_deref()).map(str::to_string),
        }
    }
}
