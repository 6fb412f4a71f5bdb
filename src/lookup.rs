//! The two translation operations, as sequences of dependent PanLex calls.

use crate::error::{Result, TeraDictError};
use crate::i18n::LocalizationBundle;
use crate::normalize::{normalize_text, trimmed};
use crate::panlex::{ExpressionId, PanlexClient, Translation, Variety};
use tracing::{debug, info};

/// User input for one lookup, validated and normalized
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationQuery {
    /// Normalized source text
    pub text: String,
    /// Source expression chosen by a previous lookup
    pub expression: Option<ExpressionId>,
    /// Target variety to expand translations into
    pub target: Option<Variety>,
}

impl TranslationQuery {
    /// Query for operation 1. `None` when the text is blank after normalization.
    pub fn source_text(et0: Option<&str>) -> Option<Self> {
        let text = normalize_text(trimmed(et0)?);
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text,
            expression: None,
            target: None,
        })
    }

    /// Query for operation 2; all three fields are required
    pub fn expansion(et0: Option<&str>, ex0: Option<&str>, lv1: Option<&str>) -> Result<Self> {
        let (Some(et0), Some(ex0), Some(lv1)) = (trimmed(et0), trimmed(ex0), trimmed(lv1)) else {
            return Err(TeraDictError::MissingParameter);
        };

        let expression = ex0
            .parse::<ExpressionId>()
            .map_err(|e| TeraDictError::InvalidParameter {
                name: "ex0",
                reason: e.to_string(),
            })?;

        let target: Variety =
            serde_json::from_str(lv1).map_err(|e| TeraDictError::InvalidParameter {
                name: "lv1",
                reason: e.to_string(),
            })?;

        Ok(Self {
            text: normalize_text(et0),
            expression: Some(expression),
            target: Some(target),
        })
    }
}

/// Result of looking up source text (operation 1)
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// No expression in the source variety has this text
    ExpressionNotFound,
    /// The expression exists but has no translations
    NoTranslations { ex: ExpressionId },
    /// Varieties holding translations, in API order
    Found {
        ex: ExpressionId,
        varieties: Vec<Variety>,
    },
}

/// Find the expression for the query text in the bundle's variety, then the
/// varieties that hold translations of it.
pub async fn lookup_source_text(
    api: &PanlexClient,
    bundle: &LocalizationBundle,
    query: &TranslationQuery,
) -> Result<LookupOutcome> {
    info!("Looking up {:?} in lv {}", query.text, bundle.lv());

    let expressions = api.find_expressions(bundle.lv(), &query.text).await?;
    let Some(first) = expressions.result.first() else {
        info!("No expression found for {:?}", query.text);
        return Ok(LookupOutcome::ExpressionNotFound);
    };
    let ex = first.ex;
    debug!("Using expression {} ({} candidates)", ex, expressions.result.len());

    let varieties = api.find_varieties_with_translations(ex).await?;
    if varieties.result.is_empty() {
        info!("No translations found for expression {}", ex);
        return Ok(LookupOutcome::NoTranslations { ex });
    }

    info!("Found translations in {} varieties", varieties.result.len());
    Ok(LookupOutcome::Found {
        ex,
        varieties: varieties.result,
    })
}

/// Translations of the query's expression into its target variety (operation 2)
pub async fn expand_translation(
    api: &PanlexClient,
    query: &TranslationQuery,
) -> Result<Vec<Translation>> {
    let (Some(ex), Some(target)) = (query.expression, query.target.as_ref()) else {
        return Err(TeraDictError::MissingParameter);
    };

    info!("Expanding expression {} into lv {}", ex, target.lv);
    let translations = api.find_translations(ex, target.lv).await?;
    info!("Found {} translations", translations.result.len());

    Ok(translations.result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Helper Functions ====================

    fn english() -> LocalizationBundle {
        LocalizationBundle::from_json(
            "eng",
            r#"{"lv": 187, "teradict_description": "d", "ex_not_found": "nf", "tr_not_found": "tnf"}"#,
        )
        .unwrap()
    }

    fn client(server: &MockServer) -> PanlexClient {
        PanlexClient::new(server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn ok(result: serde_json::Value) -> ResponseTemplate {
        let count = result.as_array().map(|a| a.len()).unwrap_or(0);
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "resultNum": count, "result": result }))
    }

    // ==================== TranslationQuery Tests ====================

    #[test]
    fn test_source_text_normalizes() {
        let query = TranslationQuery::source_text(Some("  big\u{00A0} house ")).unwrap();
        assert_eq!(query.text, "big house");
        assert_eq!(query.expression, None);
        assert_eq!(query.target, None);
    }

    #[test]
    fn test_source_text_blank_is_none() {
        assert!(TranslationQuery::source_text(None).is_none());
        assert!(TranslationQuery::source_text(Some("   ")).is_none());
        assert!(TranslationQuery::source_text(Some("\u{200B}")).is_none());
    }

    #[test]
    fn test_expansion_parses_fields() {
        let query =
            TranslationQuery::expansion(Some("house"), Some(" 42 "), Some(r#"{"lv":7}"#)).unwrap();
        assert_eq!(query.expression, Some(42));
        assert_eq!(query.target.unwrap().lv, 7);
    }

    #[test]
    fn test_expansion_missing_any_field() {
        let lv1 = Some(r#"{"lv":7}"#);
        for (et0, ex0, lv1) in [
            (None, Some("42"), lv1),
            (Some("house"), None, lv1),
            (Some("house"), Some("42"), None),
            (Some("house"), Some(""), lv1),
        ] {
            let err = TranslationQuery::expansion(et0, ex0, lv1).unwrap_err();
            assert!(matches!(err, TeraDictError::MissingParameter));
        }
    }

    #[test]
    fn test_expansion_invalid_expression_id() {
        let err = TranslationQuery::expansion(Some("house"), Some("abc"), Some(r#"{"lv":7}"#))
            .unwrap_err();
        assert!(matches!(err, TeraDictError::InvalidParameter { name: "ex0", .. }));
    }

    #[test]
    fn test_expansion_invalid_variety() {
        let err =
            TranslationQuery::expansion(Some("house"), Some("42"), Some(r#"{"lc":"spa"}"#))
                .unwrap_err();
        assert!(matches!(err, TeraDictError::InvalidParameter { name: "lv1", .. }));
    }

    // ==================== lookup_source_text Tests ====================

    #[tokio::test]
    async fn test_lookup_expression_not_found_skips_second_call() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ex"))
            .respond_with(ok(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/lv"))
            .respond_with(ok(serde_json::json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let query = TranslationQuery::source_text(Some("house")).unwrap();
        let outcome = lookup_source_text(&client(&server), &english(), &query)
            .await
            .unwrap();
        assert_eq!(outcome, LookupOutcome::ExpressionNotFound);
    }

    #[tokio::test]
    async fn test_lookup_uses_first_expression() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ex"))
            .respond_with(ok(serde_json::json!([
                { "ex": 42, "tt": "house" },
                { "ex": 43, "tt": "house" }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/lv"))
            .and(body_json(serde_json::json!({ "tr": [42], "sort": ["lc", "vc"] })))
            .respond_with(ok(serde_json::json!([
                { "lv": 666, "lc": "spa", "vc": 0 }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let query = TranslationQuery::source_text(Some("house")).unwrap();
        let outcome = lookup_source_text(&client(&server), &english(), &query)
            .await
            .unwrap();

        match outcome {
            LookupOutcome::Found { ex, varieties } => {
                assert_eq!(ex, 42);
                assert_eq!(varieties.len(), 1);
                assert_eq!(varieties[0].lv, 666);
            }
            other => panic!("Expected Found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lookup_no_translations() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ex"))
            .respond_with(ok(serde_json::json!([{ "ex": 42, "tt": "house" }])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/lv"))
            .respond_with(ok(serde_json::json!([])))
            .mount(&server)
            .await;

        let query = TranslationQuery::source_text(Some("house")).unwrap();
        let outcome = lookup_source_text(&client(&server), &english(), &query)
            .await
            .unwrap();
        assert_eq!(outcome, LookupOutcome::NoTranslations { ex: 42 });
    }

    #[tokio::test]
    async fn test_lookup_first_call_error_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/ex"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let query = TranslationQuery::source_text(Some("house")).unwrap();
        let err = lookup_source_text(&client(&server), &english(), &query)
            .await
            .unwrap_err();
        assert!(matches!(err, TeraDictError::Status(500)));
    }

    // ==================== expand_translation Tests ====================

    #[tokio::test]
    async fn test_expand_translation_returns_api_order() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/tr"))
            .and(body_json(serde_json::json!({ "ex": [42], "lv": [7], "sort": ["tt"] })))
            .respond_with(ok(serde_json::json!([
                { "ex": 2, "tt": "zeta" },
                { "ex": 1, "tt": "alpha" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let query =
            TranslationQuery::expansion(Some("house"), Some("42"), Some(r#"{"lv":7}"#)).unwrap();
        let translations = expand_translation(&client(&server), &query).await.unwrap();

        // Not re-sorted locally
        let texts: Vec<&str> = translations.iter().map(|t| t.tt.as_str()).collect();
        assert_eq!(texts, vec!["zeta", "alpha"]);
    }

    #[tokio::test]
    async fn test_expand_translation_requires_expression_and_target() {
        let server = MockServer::start().await;
        let query = TranslationQuery::source_text(Some("house")).unwrap();

        let err = expand_translation(&client(&server), &query).await.unwrap_err();
        assert!(matches!(err, TeraDictError::MissingParameter));
    }
}
