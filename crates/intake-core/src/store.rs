//! The `SubmissionStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `intake-store-sqlite`).
//! Higher layers (`intake-api`, `intake-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  attachment::{Attachment, AttachmentId},
  import::{ImportBatch, ImportOutcome},
  submission::{NewSubmission, Submission, SubmissionId, SubmissionStatus, VoucherId},
};

/// Page size used by [`ListQuery`] when the caller gives none.
pub const DEFAULT_LIST_LIMIT: usize = 100;

// ─── Query / result types ────────────────────────────────────────────────────

/// Parameters for [`SubmissionStore::list`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ListQuery {
  pub status: Option<SubmissionStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

impl ListQuery {
  pub fn with_status(status: SubmissionStatus) -> Self {
    Self { status: Some(status), ..Self::default() }
  }

  pub fn limit(&self) -> usize { self.limit.unwrap_or(DEFAULT_LIST_LIMIT) }

  pub fn offset(&self) -> usize { self.offset.unwrap_or(0) }
}

/// One page of submissions plus the size of the whole filtered set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
  pub rows:  Vec<Submission>,
  /// Number of submissions matching the filter, ignoring pagination.
  pub total: u64,
}

/// Counts by review status across all submissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
  pub pending:  u64,
  pub approved: u64,
  pub rejected: u64,
  /// Always `pending + approved + rejected`.
  pub total:    u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a submission store backend.
///
/// Absent rows are reported as `None` and unmet preconditions as `false`;
/// `Err` is reserved for storage failures, which abort the whole operation.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SubmissionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Newest submissions first, optionally filtered by status.
  fn list(
    &self,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page, Self::Error>> + Send + '_;

  /// Retrieve a submission with its attachment metadata. Returns `None` if
  /// not found.
  fn get(
    &self,
    id: SubmissionId,
  ) -> impl Future<Output = Result<Option<Submission>, Self::Error>> + Send + '_;

  /// Retrieve a single attachment including its payload.
  fn get_attachment(
    &self,
    id: AttachmentId,
  ) -> impl Future<Output = Result<Option<Attachment>, Self::Error>> + Send + '_;

  fn summary(&self)
  -> impl Future<Output = Result<Summary, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Persist a submission and all of its attachments atomically. The new
  /// submission is always `pending`.
  fn create(
    &self,
    input: NewSubmission,
  ) -> impl Future<Output = Result<SubmissionId, Self::Error>> + Send + '_;

  /// Persist a whole batch atomically: either every submission and
  /// attachment is written, or none is.
  fn import(
    &self,
    batch: ImportBatch,
  ) -> impl Future<Output = Result<ImportOutcome, Self::Error>> + Send + '_;

  // ── Review ────────────────────────────────────────────────────────────

  /// Move a pending submission to `approved`. Returns `false` when the
  /// submission is missing or was already reviewed. Exactly one of several
  /// concurrent reviewers wins.
  fn approve(
    &self,
    id: SubmissionId,
    reviewer_notes: Option<String>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Move a pending submission to `rejected`; same guarantees as
  /// [`approve`](Self::approve).
  fn reject(
    &self,
    id: SubmissionId,
    reviewer_notes: Option<String>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Record the ledger voucher a submission was turned into. No status
  /// precondition; returns the submission's status as of the write, or
  /// `None` if the submission does not exist.
  fn link_to_voucher(
    &self,
    id: SubmissionId,
    voucher_id: VoucherId,
  ) -> impl Future<Output = Result<Option<SubmissionStatus>, Self::Error>> + Send + '_;

  /// Hard-delete a submission and its attachments. Returns `false` if it did
  /// not exist.
  fn delete(
    &self,
    id: SubmissionId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
