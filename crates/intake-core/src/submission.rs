//! Submission types — externally sourced financial documents awaiting review.
//!
//! A submission enters the store as `pending` and is reviewed exactly once.
//! Only the review fields and the voucher link ever change after creation.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::attachment::{AttachmentMeta, NewAttachment};

/// Store-assigned surrogate key of a submission.
pub type SubmissionId = i64;

/// Identifier of a voucher in the external ledger.
pub type VoucherId = i64;

// ─── Classification ──────────────────────────────────────────────────────────

/// Direction of the money flow the document represents.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
  In,
  /// Imports that omit the direction are treated as expenses.
  #[default]
  Out,
}

/// Accounting sphere hint. Advisory only until the document becomes a voucher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sphere {
  Ideell,
  Zweck,
  Vermoegen,
  Wgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
  Bar,
  Bank,
}

// ─── Review status ───────────────────────────────────────────────────────────

/// Review state of a submission.
///
/// `Pending` is the only state with outgoing transitions; `Approved` and
/// `Rejected` are terminal.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

impl SubmissionStatus {
  pub fn is_pending(&self) -> bool { matches!(self, Self::Pending) }
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// A persisted submission together with the metadata of its attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
  pub id:             SubmissionId,
  /// Caller-supplied correlation key; not unique.
  pub external_id:    Option<String>,
  /// Business date of the underlying document.
  pub date:           NaiveDate,
  #[serde(rename = "type")]
  pub kind:           Direction,
  pub sphere:         Option<Sphere>,
  pub payment_method: Option<PaymentMethod>,
  pub description:    Option<String>,
  pub category_hint:  Option<String>,
  pub counterparty:   Option<String>,
  pub gross_amount:   Decimal,
  pub submitted_by:   String,
  /// Server-assigned timestamp; never changes after creation.
  pub submitted_at:   DateTime<Utc>,
  pub status:         SubmissionStatus,
  pub reviewed_at:    Option<DateTime<Utc>>,
  pub reviewer_notes: Option<String>,
  pub voucher_id:     Option<VoucherId>,
  pub attachments:    Vec<AttachmentMeta>,
}

// ─── NewSubmission ───────────────────────────────────────────────────────────

/// Input to [`crate::store::SubmissionStore::create`].
/// `id`, `submitted_at` and `status` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewSubmission {
  pub external_id:    Option<String>,
  pub date:           NaiveDate,
  pub kind:           Direction,
  pub sphere:         Option<Sphere>,
  pub payment_method: Option<PaymentMethod>,
  pub description:    Option<String>,
  pub category_hint:  Option<String>,
  pub counterparty:   Option<String>,
  pub gross_amount:   Decimal,
  pub submitted_by:   String,
  pub attachments:    Vec<NewAttachment>,
}

impl NewSubmission {
  /// Convenience constructor with all optional fields left empty.
  pub fn new(
    date: NaiveDate,
    kind: Direction,
    gross_amount: Decimal,
    submitted_by: impl Into<String>,
  ) -> Self {
    Self {
      external_id: None,
      date,
      kind,
      sphere: None,
      payment_method: None,
      description: None,
      category_hint: None,
      counterparty: None,
      gross_amount,
      submitted_by: submitted_by.into(),
      attachments: Vec::new(),
    }
  }

  /// Builder-style helper to append an attachment.
  pub fn with_attachment(mut self, attachment: NewAttachment) -> Self {
    self.attachments.push(attachment);
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn enums_use_wire_spelling() {
    assert_eq!(serde_json::to_string(&Direction::Out).unwrap(), "\"OUT\"");
    assert_eq!(serde_json::to_string(&Sphere::Vermoegen).unwrap(), "\"VERMOEGEN\"");
    assert_eq!(serde_json::to_string(&PaymentMethod::Bank).unwrap(), "\"BANK\"");
    assert_eq!(
      serde_json::to_string(&SubmissionStatus::Rejected).unwrap(),
      "\"rejected\""
    );
  }

  #[test]
  fn direction_defaults_to_out() {
    assert_eq!(Direction::default(), Direction::Out);
  }

  #[test]
  fn only_pending_is_pending() {
    assert!(SubmissionStatus::Pending.is_pending());
    assert!(!SubmissionStatus::Approved.is_pending());
    assert!(!SubmissionStatus::Rejected.is_pending());
  }
}
