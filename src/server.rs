//! HTTP surface: routes, shared state, and the handlers that connect the
//! request pipeline to the lookup operations and views.

use crate::i18n::LocalizationStore;
use crate::lookup::{self, LookupOutcome, TranslationQuery};
use crate::panlex::PanlexClient;
use crate::prepare::{ExpandForm, FormFields, LookupForm, Prepared};
use crate::views::{self, PageContext, Views};
use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared, read-only state handed to every request
#[derive(Debug, Clone)]
pub struct AppState {
    pub locales: Arc<LocalizationStore>,
    pub views: Arc<Views>,
    pub api: PanlexClient,
}

impl AppState {
    pub fn new(locales: LocalizationStore, views: Views, api: PanlexClient) -> Self {
        Self {
            locales: Arc::new(locales),
            views: Arc::new(views),
            api,
        }
    }
}

/// Build the application router, mounted under `url_root` (e.g. `/demo`).
///
/// Paths without a route are served from `static_dir`. An empty or `/` root
/// mounts everything at the top level.
pub fn router(state: AppState, static_dir: impl AsRef<Path>, url_root: &str) -> Router {
    let app = Router::new()
        .route("/", get(index))
        .route("/1", post(lookup_source))
        .route("/2", post(expand_target))
        .fallback_service(ServeDir::new(static_dir));

    let url_root = url_root.trim_end_matches('/');
    let app = if url_root.is_empty() {
        app
    } else {
        Router::new().nest(url_root, app)
    };

    app.layer(SetResponseHeaderLayer::overriding(
        header::EXPIRES,
        HeaderValue::from_static("0"),
    ))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// GET / - the empty input form
async fn index(State(state): State<AppState>, prepared: Prepared) -> Response {
    let ctx = PageContext::for_request(&prepared).with("et0", "");
    state.views.page(views::INDEX, &ctx)
}

/// POST /1 - look up source text and list varieties with translations
async fn lookup_source(
    State(state): State<AppState>,
    prepared: Prepared,
    FormFields(form): FormFields<LookupForm>,
) -> Response {
    let form = form.trimmed();
    let ctx = PageContext::for_request(&prepared).with_field("et0", form.et0.as_deref());

    let Some(query) = TranslationQuery::source_text(form.et0.as_deref()) else {
        info!("Blank source text, showing input form");
        return state.views.page(views::INDEX, &ctx);
    };

    match lookup::lookup_source_text(&state.api, &prepared.bundle, &query).await {
        Ok(LookupOutcome::ExpressionNotFound) => {
            let ctx = ctx.with("subheading", prepared.bundle.expression_not_found());
            state.views.page(views::INDEX, &ctx)
        }
        Ok(LookupOutcome::NoTranslations { .. }) => {
            let ctx = ctx.with("subheading", prepared.bundle.translations_not_found());
            state.views.page(views::INDEX, &ctx)
        }
        Ok(LookupOutcome::Found { ex, varieties }) => {
            let ctx = ctx.with("result", &varieties).with("ex0", ex);
            state.views.page(views::LOOKUP_RESULT, &ctx)
        }
        Err(err) => state.views.error_response(&err, Some(prepared.bundle.as_ref())),
    }
}

/// POST /2 - translations of the chosen expression in the chosen variety
async fn expand_target(
    State(state): State<AppState>,
    prepared: Prepared,
    FormFields(form): FormFields<ExpandForm>,
) -> Response {
    let form = form.trimmed();

    let query = match TranslationQuery::expansion(
        form.et0.as_deref(),
        form.ex0.as_deref(),
        form.lv1.as_deref(),
    ) {
        Ok(query) => query,
        Err(err) => return state.views.error_response(&err, Some(prepared.bundle.as_ref())),
    };

    let ctx = PageContext::for_request(&prepared)
        .with_field("et0", form.et0.as_deref())
        .with_field("ex0", form.ex0.as_deref())
        .with("lv1", &query.target);

    match lookup::expand_translation(&state.api, &query).await {
        Ok(translations) => {
            let ctx = ctx.with("result", &translations);
            state.views.page(views::EXPAND_RESULT, &ctx)
        }
        Err(err) => state.views.error_response(&err, Some(prepared.bundle.as_ref())),
    }
}
