//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error. Payload problems the backend reports through
  /// [`intake_core::Error`] (anywhere in the source chain) are the caller's
  /// fault; everything else is a storage failure.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    let mut cause: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(e) = cause {
      if e.downcast_ref::<intake_core::Error>().is_some() {
        return ApiError::BadRequest(e.to_string());
      }
      cause = e.source();
    }
    ApiError::Store(Box::new(err))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Error)]
  enum Backend {
    #[error("core: {0}")]
    Core(#[from] intake_core::Error),
    #[error("disk on fire")]
    Io,
  }

  fn decode_error() -> intake_core::Error {
    let source = intake_core::attachment::EncodedAttachment {
      filename:    "x".into(),
      mime_type:   None,
      data_base64: "%".into(),
    }
    .decode()
    .unwrap_err();
    intake_core::Error::AttachmentDecode { item: 2, attachment: 0, source }
  }

  #[test]
  fn core_errors_in_the_chain_are_bad_requests() {
    let err = ApiError::store(Backend::from(decode_error()));
    match err {
      ApiError::BadRequest(msg) => assert!(msg.contains("submission 2"), "{msg}"),
      other => panic!("expected bad request, got {other:?}"),
    }
  }

  #[test]
  fn other_errors_are_store_failures() {
    assert!(matches!(ApiError::store(Backend::Io), ApiError::Store(_)));
  }
}
