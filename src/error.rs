use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TeraDictError {
    #[error("TeraDict error: unknown language \"{0}\"")]
    UnknownLanguage(String),

    #[error("TeraDict error: missing required parameter")]
    MissingParameter,

    #[error("TeraDict error: invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("TeraDict error: malformed form body: {0}")]
    MalformedForm(String),

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error: got status code {0}")]
    Status(u16),

    #[error("PanLex API error: {0}")]
    Api(String),

    #[error("PanLex API error: malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Render(#[from] minijinja::Error),
}

impl TeraDictError {
    /// HTTP status used when this error is rendered as the error page
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnknownLanguage(_)
            | Self::MissingParameter
            | Self::InvalidParameter { .. }
            | Self::MalformedForm(_) => StatusCode::BAD_REQUEST,
            Self::Transport(_) | Self::Status(_) | Self::Api(_) | Self::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, TeraDictError>;
