//! Handler for `GET /attachments/{id}` — raw attachment download.
//!
//! The body is the stored payload, byte for byte. A strong ETag (SHA-256 over
//! the payload) lets clients cache scans; attachments never change, so a
//! matching `If-None-Match` always yields 304.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use bytes::Bytes;
use intake_core::{attachment::AttachmentId, store::SubmissionStore};
use sha2::{Digest, Sha256};

use crate::error::ApiError;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Quoted hex SHA-256 of `data`.
pub fn compute_etag(data: &[u8]) -> String {
  format!("\"{}\"", hex::encode(Sha256::digest(data)))
}

/// `GET /attachments/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<AttachmentId>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: SubmissionStore,
{
  let attachment = store
    .get_attachment(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("attachment {id} not found")))?;

  let etag = compute_etag(&attachment.data);

  if if_none_match(&headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  let content_type = attachment
    .mime_type
    .clone()
    .filter(|m| !m.trim().is_empty())
    .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_owned());
  let disposition = format!(
    "attachment; filename=\"{}\"",
    sanitize_filename(&attachment.filename)
  );

  Ok(
    (
      StatusCode::OK,
      [
        (header::CONTENT_TYPE, content_type),
        (header::CONTENT_DISPOSITION, disposition),
        (header::ETAG, etag),
      ],
      Bytes::from(attachment.data),
    )
      .into_response(),
  )
}

/// Whether `If-None-Match` lists `etag` (or `*`). Weak validators compare
/// equal to their strong form.
fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  let Some(value) = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
  else {
    return false;
  };

  value.split(',').map(str::trim).any(|candidate| {
    candidate == "*"
      || candidate.trim_start_matches("W/").trim_matches('"') == etag.trim_matches('"')
  })
}

/// Keep the filename usable inside a quoted header parameter.
fn sanitize_filename(name: &str) -> String {
  name
    .chars()
    .map(|c| match c {
      '"' | '\\' => '_',
      c if c.is_ascii_graphic() || c == ' ' => c,
      _ => '_',
    })
    .collect()
}
