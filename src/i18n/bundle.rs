//! A single language's localization bundle.

use crate::panlex::VarietyId;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Message keys every bundle must define.
///
/// These are the strings the request pipeline reads directly; anything else
/// in the file is only consumed by templates.
pub const REQUIRED_MESSAGES: &[&str] = &["teradict_description", "ex_not_found", "tr_not_found"];

/// Display strings and lexical variety for one language code.
///
/// In templates a bundle shows up as `lg`, a flat map of its messages plus
/// `lc` (the language code) and `lv` (the variety id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizationBundle {
    /// Language code, taken from the file name (e.g. "eng")
    #[serde(rename = "lc")]
    code: String,

    /// PanLex lexical variety that source text in this language is looked up in
    lv: VarietyId,

    #[serde(flatten)]
    messages: BTreeMap<String, String>,
}

impl LocalizationBundle {
    /// Parse a bundle from the JSON content of a localization file.
    ///
    /// The document must be an object with an integer `lv` field. Every other
    /// field must be a string, and all of [`REQUIRED_MESSAGES`] must be
    /// present.
    pub fn from_json(code: &str, content: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(content).context("Invalid JSON")?;

        let serde_json::Value::Object(fields) = value else {
            bail!("Expected a JSON object at the top level");
        };

        let mut lv = None;
        let mut messages = BTreeMap::new();

        for (key, value) in fields {
            if key == "lv" {
                lv = Some(
                    value
                        .as_i64()
                        .context("Field \"lv\" must be an integer")?,
                );
                continue;
            }
            // The code is always the file name
            if key == "lc" {
                continue;
            }

            match value {
                serde_json::Value::String(text) => {
                    messages.insert(key, text);
                }
                other => bail!("Message {:?} must be a string, got {}", key, other),
            }
        }

        let lv = lv.context("Missing field \"lv\"")?;

        for required in REQUIRED_MESSAGES {
            if !messages.contains_key(*required) {
                bail!("Missing message {:?}", required);
            }
        }

        Ok(Self {
            code: code.to_string(),
            lv,
            messages,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn lv(&self) -> VarietyId {
        self.lv
    }

    pub fn message(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    /// Subheading shown on the input form by default
    pub fn subheading(&self) -> &str {
        self.required("teradict_description")
    }

    /// Subheading shown when the source text matches no expression
    pub fn expression_not_found(&self) -> &str {
        self.required("ex_not_found")
    }

    /// Subheading shown when the expression has no translations
    pub fn translations_not_found(&self) -> &str {
        self.required("tr_not_found")
    }

    // Guaranteed present by from_json
    fn required(&self, key: &str) -> &str {
        self.message(key).unwrap_or_default()
    }
}
