//! JSON REST API for the submission intake engine.
//!
//! Exposes an axum [`Router`] backed by any
//! [`intake_core::store::SubmissionStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", intake_api::api_router(store.clone()))
//! ```

pub mod attachments;
pub mod error;
pub mod submissions;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use intake_core::store::SubmissionStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: SubmissionStore + 'static,
{
  Router::new()
    // Submissions
    .route(
      "/submissions",
      get(submissions::list::<S>).post(submissions::create::<S>),
    )
    .route("/submissions/import", post(submissions::import::<S>))
    .route("/submissions/summary", get(submissions::summary::<S>))
    .route(
      "/submissions/{id}",
      get(submissions::get_one::<S>).delete(submissions::delete_one::<S>),
    )
    .route("/submissions/{id}/approve", post(submissions::approve::<S>))
    .route("/submissions/{id}/reject", post(submissions::reject::<S>))
    .route("/submissions/{id}/voucher", post(submissions::link_voucher::<S>))
    // Attachments
    .route("/attachments/{id}", get(attachments::get_one::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
