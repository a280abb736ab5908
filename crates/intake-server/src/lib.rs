//! HTTP server and import job for the submission intake engine.
//!
//! Mounts [`intake_api::api_router`] under `/api` behind HTTP Basic auth,
//! backed by any [`SubmissionStore`].

pub mod auth;
pub mod error;
pub mod inbox;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use intake_core::store::SubmissionStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `INTAKE_*`
/// environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Only required by `serve`; the import job runs without credentials.
  pub auth_username:      Option<String>,
  pub auth_password_hash: Option<String>,
}

impl ServerConfig {
  /// Credentials for the API, if both halves are configured.
  pub fn auth(&self) -> Option<AuthConfig> {
    Some(AuthConfig {
      username:      self.auth_username.clone()?,
      password_hash: self.auth_password_hash.clone()?,
    })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: unauthenticated `/health`, and the JSON
/// API under `/api` behind Basic auth.
pub fn router<S>(store: Arc<S>, auth: Arc<AuthConfig>) -> Router
where
  S: SubmissionStore + 'static,
{
  let api = intake_api::api_router(store)
    .layer(middleware::from_fn_with_state(auth, require_auth));

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
