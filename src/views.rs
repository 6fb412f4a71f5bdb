//! Server-side page rendering with embedded minijinja templates.

use crate::error::{Result, TeraDictError};
use crate::i18n::LocalizationBundle;
use crate::panlex::Variety;
use crate::prepare::{Prepared, QueryString};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use minijinja::value::{Value, ViaDeserialize};
use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, warn};

pub const INDEX: &str = "index.html";
pub const LOOKUP_RESULT: &str = "op1.html";
pub const EXPAND_RESULT: &str = "op2.html";
pub const ERROR: &str = "error.html";

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    (INDEX, include_str!("../templates/index.html")),
    (LOOKUP_RESULT, include_str!("../templates/op1.html")),
    (EXPAND_RESULT, include_str!("../templates/op2.html")),
    (ERROR, include_str!("../templates/error.html")),
];

/// Variables handed to a template.
///
/// Starts from the values the request pipeline attaches (`lg`, `subheading`,
/// `qs`) and is extended by each handler.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    vars: BTreeMap<String, Value>,
}

impl PageContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a request that made it through preparation
    pub fn for_request(prepared: &Prepared) -> Self {
        Self::new()
            .with("lg", prepared.bundle.as_ref())
            .with("subheading", prepared.subheading())
            .with_value("qs", query_function(&prepared.query))
    }

    pub fn with(self, key: &str, value: impl Serialize) -> Self {
        self.with_value(key, Value::from_serialize(value))
    }

    pub fn with_value(mut self, key: &str, value: Value) -> Self {
        self.vars.insert(key.to_string(), value);
        self
    }

    /// Set `key` only when a value is present
    pub fn with_field(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }
}

/// Expose a query string to templates as `qs()` / `qs({"lg": "spa"})`.
///
/// A `none` (or undefined) value in the override map deletes the key.
fn query_function(query: &QueryString) -> Value {
    let query = Arc::new(query.clone());
    Value::from_function(move |overrides: Option<Value>| apply_overrides(&query, overrides))
}

fn apply_overrides(
    query: &QueryString,
    overrides: Option<Value>,
) -> std::result::Result<String, minijinja::Error> {
    let Some(overrides) = overrides.filter(|v| !v.is_undefined() && !v.is_none()) else {
        return Ok(query.build());
    };

    let mut changes: Vec<(String, Option<String>)> = Vec::new();
    for key in overrides.try_iter()? {
        let value = overrides.get_item(&key)?;
        let key = key.as_str().map(str::to_string).unwrap_or_else(|| key.to_string());
        if value.is_none() || value.is_undefined() {
            changes.push((key, None));
        } else {
            changes.push((key, Some(value.to_string())));
        }
    }

    Ok(query.with_overrides(&changes))
}

/// Template function formatting a variety as `lc-vvv`
fn lcvc_uid_function(
    variety: ViaDeserialize<Variety>,
) -> std::result::Result<String, minijinja::Error> {
    variety.uid().ok_or_else(|| {
        minijinja::Error::new(
            ErrorKind::InvalidOperation,
            "lcvc_uid needs a variety with lc and vc",
        )
    })
}

/// The template environment plus app-wide globals
#[derive(Debug)]
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    /// `base_href` becomes the page's `<base href>`; `url_root` prefixes form
    /// actions and links, with `home` as the mounted index page
    pub fn new(base_href: &str, url_root: &str) -> Result<Self> {
        let mut env = Environment::new();
        // Pages render without `lg` when the language itself was rejected
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        for (name, source) in TEMPLATES {
            env.add_template(*name, *source)?;
        }
        let url_root = url_root.trim_end_matches('/');
        let home = if url_root.is_empty() { "/" } else { url_root };
        env.add_global("base", base_href.to_string());
        env.add_global("urlroot", url_root.to_string());
        env.add_global("home", home.to_string());
        env.add_function("lcvc_uid", lcvc_uid_function);
        Ok(Self { env })
    }

    pub fn render(&self, name: &str, ctx: &PageContext) -> Result<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(&ctx.vars)?)
    }

    /// Render a page, falling back to the error page if rendering fails
    pub fn page(&self, name: &str, ctx: &PageContext) -> Response {
        match self.render(name, ctx) {
            Ok(html) => Html(html).into_response(),
            Err(err) => self.error_response(&err, None),
        }
    }

    /// Render the error page for `err`.
    ///
    /// `bundle` is the request's display language when it was resolved; the
    /// page falls back to untranslated chrome without it.
    pub fn error_response(
        &self,
        err: &TeraDictError,
        bundle: Option<&LocalizationBundle>,
    ) -> Response {
        let status = err.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", err);
        } else {
            warn!("Request rejected: {}", err);
        }

        let mut ctx = PageContext::new().with("error", err.to_string());
        if let Some(bundle) = bundle {
            ctx = ctx.with("lg", bundle);
        }

        match self.render(ERROR, &ctx) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(render_err) => {
                error!("Failed to render error page: {}", render_err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        }
    }
}
