//! Handlers for `/submissions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/submissions` | Optional `status`, `limit`, `offset` |
//! | `POST`   | `/submissions` | Body: [`CreateBody`]; returns 201 + `{"id":…}` |
//! | `POST`   | `/submissions/import` | Body: [`ImportBatch`] |
//! | `GET`    | `/submissions/summary` | Counts by status |
//! | `GET`    | `/submissions/{id}` | 404 if not found |
//! | `DELETE` | `/submissions/{id}` | `{"ok":…}` |
//! | `POST`   | `/submissions/{id}/approve` | Body: [`ReviewBody`] |
//! | `POST`   | `/submissions/{id}/reject` | Body: [`ReviewBody`] |
//! | `POST`   | `/submissions/{id}/voucher` | Body: [`LinkBody`] |
//!
//! Unmet preconditions (already reviewed, unknown id) come back as
//! `200 {"ok":false}`, not as errors.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use intake_core::{
  import::{ImportBatch, ImportOutcome, ImportSubmission},
  store::{ListQuery, Page, SubmissionStore, Summary},
  submission::{Submission, SubmissionId, SubmissionStatus, VoucherId},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Response body of every conditional write.
#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
  pub ok: bool,
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /submissions[?status=pending][&limit=…][&offset=…]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page>, ApiError>
where
  S: SubmissionStore,
{
  let page = store.list(query).await.map_err(ApiError::store)?;
  Ok(Json(page))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /submissions/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<SubmissionId>,
) -> Result<Json<Submission>, ApiError>
where
  S: SubmissionStore,
{
  let submission = store
    .get(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("submission {id} not found")))?;
  Ok(Json(submission))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /submissions`: the same shape as one import
/// item, except that `type` is required.
pub type CreateBody = ImportSubmission;

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
  pub id: SubmissionId,
}

/// `POST /submissions` — returns 201 + the new id.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: SubmissionStore,
{
  if body.kind.is_none() {
    return Err(ApiError::BadRequest("missing field `type`".to_owned()));
  }
  let input = body.decode(0).map_err(ApiError::store)?;
  let attachments = input.attachments.len();
  let id = store.create(input).await.map_err(ApiError::store)?;
  tracing::info!(id, attachments, "submission created");
  Ok((StatusCode::CREATED, Json(Created { id })))
}

// ─── Import ───────────────────────────────────────────────────────────────────

/// `POST /submissions/import` — all or nothing. Undecodable attachments are
/// reported as 400 and nothing is written.
pub async fn import<S>(
  State(store): State<Arc<S>>,
  Json(batch): Json<ImportBatch>,
) -> Result<Json<ImportOutcome>, ApiError>
where
  S: SubmissionStore,
{
  let outcome = store.import(batch).await.map_err(ApiError::store)?;
  tracing::info!(imported = outcome.imported, "import batch applied");
  Ok(Json(outcome))
}

// ─── Summary ──────────────────────────────────────────────────────────────────

/// `GET /submissions/summary`
pub async fn summary<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Summary>, ApiError>
where
  S: SubmissionStore,
{
  let summary = store.summary().await.map_err(ApiError::store)?;
  Ok(Json(summary))
}

// ─── Review ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ReviewBody {
  pub reviewer_notes: Option<String>,
}

/// `POST /submissions/{id}/approve` — body: `{"reviewer_notes":"…"}` (optional).
pub async fn approve<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<SubmissionId>,
  body: Option<Json<ReviewBody>>,
) -> Result<Json<Ack>, ApiError>
where
  S: SubmissionStore,
{
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let ok = store
    .approve(id, body.reviewer_notes)
    .await
    .map_err(ApiError::store)?;
  log_review(id, SubmissionStatus::Approved, ok);
  Ok(Json(Ack { ok }))
}

/// `POST /submissions/{id}/reject` — body: `{"reviewer_notes":"…"}` (optional).
pub async fn reject<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<SubmissionId>,
  body: Option<Json<ReviewBody>>,
) -> Result<Json<Ack>, ApiError>
where
  S: SubmissionStore,
{
  let body = body.map(|Json(b)| b).unwrap_or_default();
  let ok = store
    .reject(id, body.reviewer_notes)
    .await
    .map_err(ApiError::store)?;
  log_review(id, SubmissionStatus::Rejected, ok);
  Ok(Json(Ack { ok }))
}

fn log_review(id: SubmissionId, target: SubmissionStatus, ok: bool) {
  if ok {
    tracing::info!(id, status = ?target, "submission reviewed");
  } else {
    tracing::debug!(id, status = ?target, "review ignored: missing or already reviewed");
  }
}

// ─── Voucher link ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LinkBody {
  pub voucher_id: VoucherId,
}

/// `POST /submissions/{id}/voucher` — body: `{"voucher_id":77}`.
pub async fn link_voucher<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<SubmissionId>,
  Json(body): Json<LinkBody>,
) -> Result<Json<Ack>, ApiError>
where
  S: SubmissionStore,
{
  let status = store
    .link_to_voucher(id, body.voucher_id)
    .await
    .map_err(ApiError::store)?;

  match status {
    Some(SubmissionStatus::Approved) => {
      tracing::info!(id, voucher_id = body.voucher_id, "voucher linked");
    }
    // Linking is permitted in any status; flag the unusual case.
    Some(status) => {
      tracing::warn!(id, voucher_id = body.voucher_id, ?status, "voucher linked to unapproved submission");
    }
    None => {}
  }

  Ok(Json(Ack { ok: status.is_some() }))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /submissions/{id}`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<SubmissionId>,
) -> Result<Json<Ack>, ApiError>
where
  S: SubmissionStore,
{
  let ok = store.delete(id).await.map_err(ApiError::store)?;
  if ok {
    tracing::info!(id, "submission deleted");
  }
  Ok(Json(Ack { ok }))
}
