//! Client for the PanLex lexical translation API.
//!
//! Every query is a JSON `POST` to `<base_url><endpoint>`. A successful
//! response carries `resultNum` and an ordered `result` list; an application
//! failure comes back as `{"status": "error", "error": "..."}`.

use crate::error::{Result, TeraDictError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub type ExpressionId = i64;
pub type VarietyId = i64;

/// A lexical expression (one word form in one variety)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub ex: ExpressionId,
    pub tt: String,
}

/// A lexical variety (a language or dialect).
///
/// Fields PanLex returns beyond the ones named here are kept in `extra`, so
/// a variety serialized into a form field comes back intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variety {
    pub lv: VarietyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vc: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tt: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Variety {
    /// PanLex uniform identifier, e.g. `eng-000`
    pub fn uid(&self) -> Option<String> {
        match (&self.lc, self.vc) {
            (Some(lc), Some(vc)) => Some(lcvc_uid(lc, vc)),
            _ => None,
        }
    }
}

/// Format a language code and variety code as a PanLex uid
pub fn lcvc_uid(lc: &str, vc: u32) -> String {
    format!("{}-{:03}", lc, vc)
}

/// A translation of an expression into a target variety
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub ex: ExpressionId,
    pub tt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lv: Option<VarietyId>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Parsed result of a successful query
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub result_num: usize,
    pub result: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "resultNum")]
    result_num: usize,
    #[serde(default)]
    result: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct ExpressionQuery<'a> {
    lv: [VarietyId; 1],
    tt: [&'a str; 1],
}

#[derive(Debug, Serialize)]
struct VarietyQuery {
    tr: [ExpressionId; 1],
    sort: &'static [&'static str],
}

#[derive(Debug, Serialize)]
struct TranslationQuery {
    ex: [ExpressionId; 1],
    lv: [VarietyId; 1],
    sort: &'static [&'static str],
}

#[derive(Debug, Clone)]
pub struct PanlexClient {
    http: reqwest::Client,
    base_url: String,
}

impl PanlexClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Expressions in variety `lv` whose text is exactly `text`
    pub async fn find_expressions(
        &self,
        lv: VarietyId,
        text: &str,
    ) -> Result<ApiResponse<Expression>> {
        let body = ExpressionQuery { lv: [lv], tt: [text] };
        self.query("/ex", &body).await
    }

    /// Varieties holding translations of expression `ex`, sorted by
    /// language code then variety code
    pub async fn find_varieties_with_translations(
        &self,
        ex: ExpressionId,
    ) -> Result<ApiResponse<Variety>> {
        let body = VarietyQuery {
            tr: [ex],
            sort: &["lc", "vc"],
        };
        self.query("/lv", &body).await
    }

    /// Translations of expression `ex` into variety `lv`, sorted by text
    pub async fn find_translations(
        &self,
        ex: ExpressionId,
        lv: VarietyId,
    ) -> Result<ApiResponse<Translation>> {
        let body = TranslationQuery {
            ex: [ex],
            lv: [lv],
            sort: &["tt"],
        };
        self.query("/tr", &body).await
    }

    async fn query<B, T>(&self, endpoint: &str, body: &B) -> Result<ApiResponse<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("PanLex query {}", url);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("PanLex request to {} failed: {}", endpoint, e);
                TeraDictError::Transport(e)
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!("PanLex {} returned status {}", endpoint, status);
            return Err(TeraDictError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let envelope: Envelope = serde_json::from_slice(&bytes)?;

        if envelope.status.as_deref() == Some("error") {
            let message = envelope
                .error
                .unwrap_or_else(|| "unspecified error".to_string());
            warn!("PanLex {} reported an error: {}", endpoint, message);
            return Err(TeraDictError::Api(message));
        }

        let result = envelope
            .result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<T>, _>>()?;

        debug!(
            "PanLex {} returned {} of {} results",
            endpoint,
            result.len(),
            envelope.result_num
        );

        Ok(ApiResponse {
            result_num: envelope.result_num,
            result,
        })
    }
}
