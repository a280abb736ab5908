//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width so
//! that `ORDER BY` on the text column is chronological. Business dates use
//! `YYYY-MM-DD`; amounts use the exact decimal string.

use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use intake_core::{
  attachment::{Attachment, AttachmentMeta},
  submission::{Direction, PaymentMethod, Sphere, Submission, SubmissionStatus},
};
use rust_decimal::Decimal;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

pub fn encode_amount(d: Decimal) -> String { d.to_string() }

pub fn decode_amount(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

// ─── Direction ───────────────────────────────────────────────────────────────

pub fn encode_direction(d: Direction) -> &'static str {
  match d {
    Direction::In => "IN",
    Direction::Out => "OUT",
  }
}

pub fn decode_direction(s: &str) -> Result<Direction> {
  match s {
    "IN" => Ok(Direction::In),
    "OUT" => Ok(Direction::Out),
    other => Err(unknown("type", other)),
  }
}

// ─── Sphere ──────────────────────────────────────────────────────────────────

pub fn encode_sphere(s: Sphere) -> &'static str {
  match s {
    Sphere::Ideell => "IDEELL",
    Sphere::Zweck => "ZWECK",
    Sphere::Vermoegen => "VERMOEGEN",
    Sphere::Wgb => "WGB",
  }
}

pub fn decode_sphere(s: &str) -> Result<Sphere> {
  match s {
    "IDEELL" => Ok(Sphere::Ideell),
    "ZWECK" => Ok(Sphere::Zweck),
    "VERMOEGEN" => Ok(Sphere::Vermoegen),
    "WGB" => Ok(Sphere::Wgb),
    other => Err(unknown("sphere", other)),
  }
}

// ─── PaymentMethod ───────────────────────────────────────────────────────────

pub fn encode_payment_method(p: PaymentMethod) -> &'static str {
  match p {
    PaymentMethod::Bar => "BAR",
    PaymentMethod::Bank => "BANK",
  }
}

pub fn decode_payment_method(s: &str) -> Result<PaymentMethod> {
  match s {
    "BAR" => Ok(PaymentMethod::Bar),
    "BANK" => Ok(PaymentMethod::Bank),
    other => Err(unknown("payment_method", other)),
  }
}

// ─── SubmissionStatus ────────────────────────────────────────────────────────

pub fn encode_status(s: SubmissionStatus) -> &'static str {
  match s {
    SubmissionStatus::Pending => "pending",
    SubmissionStatus::Approved => "approved",
    SubmissionStatus::Rejected => "rejected",
  }
}

pub fn decode_status(s: &str) -> Result<SubmissionStatus> {
  match s {
    "pending" => Ok(SubmissionStatus::Pending),
    "approved" => Ok(SubmissionStatus::Approved),
    "rejected" => Ok(SubmissionStatus::Rejected),
    other => Err(unknown("status", other)),
  }
}

fn unknown(column: &'static str, value: &str) -> Error {
  Error::UnknownDiscriminant { column, value: value.to_owned() }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawSubmission::from_row`].
pub const SUBMISSION_COLUMNS: &str = "id, external_id, date, type, sphere, \
   payment_method, description, category_hint, counterparty, gross_amount, \
   submitted_by, submitted_at, status, reviewed_at, reviewer_notes, voucher_id";

/// Raw values read directly from a `submissions` row.
pub struct RawSubmission {
  pub id:             i64,
  pub external_id:    Option<String>,
  pub date:           String,
  pub kind:           String,
  pub sphere:         Option<String>,
  pub payment_method: Option<String>,
  pub description:    Option<String>,
  pub category_hint:  Option<String>,
  pub counterparty:   Option<String>,
  pub gross_amount:   String,
  pub submitted_by:   String,
  pub submitted_at:   String,
  pub status:         String,
  pub reviewed_at:    Option<String>,
  pub reviewer_notes: Option<String>,
  pub voucher_id:     Option<i64>,
  /// Filled by a second query against `submission_attachments`.
  pub attachments:    Vec<AttachmentMeta>,
}

impl RawSubmission {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      external_id:    row.get(1)?,
      date:           row.get(2)?,
      kind:           row.get(3)?,
      sphere:         row.get(4)?,
      payment_method: row.get(5)?,
      description:    row.get(6)?,
      category_hint:  row.get(7)?,
      counterparty:   row.get(8)?,
      gross_amount:   row.get(9)?,
      submitted_by:   row.get(10)?,
      submitted_at:   row.get(11)?,
      status:         row.get(12)?,
      reviewed_at:    row.get(13)?,
      reviewer_notes: row.get(14)?,
      voucher_id:     row.get(15)?,
      attachments:    Vec::new(),
    })
  }

  pub fn into_submission(self) -> Result<Submission> {
    Ok(Submission {
      id:             self.id,
      external_id:    self.external_id,
      date:           decode_date(&self.date)?,
      kind:           decode_direction(&self.kind)?,
      sphere:         self.sphere.as_deref().map(decode_sphere).transpose()?,
      payment_method: self
        .payment_method
        .as_deref()
        .map(decode_payment_method)
        .transpose()?,
      description:    self.description,
      category_hint:  self.category_hint,
      counterparty:   self.counterparty,
      gross_amount:   decode_amount(&self.gross_amount)?,
      submitted_by:   self.submitted_by,
      submitted_at:   decode_dt(&self.submitted_at)?,
      status:         decode_status(&self.status)?,
      reviewed_at:    self.reviewed_at.as_deref().map(decode_dt).transpose()?,
      reviewer_notes: self.reviewer_notes,
      voucher_id:     self.voucher_id,
      attachments:    self.attachments,
    })
  }
}

/// Raw values read directly from a `submission_attachments` row.
pub struct RawAttachment {
  pub id:            i64,
  pub submission_id: i64,
  pub filename:      String,
  pub mime_type:     Option<String>,
  pub data:          Vec<u8>,
  pub created_at:    String,
}

impl RawAttachment {
  pub fn into_attachment(self) -> Result<Attachment> {
    Ok(Attachment {
      id:            self.id,
      submission_id: self.submission_id,
      filename:      self.filename,
      mime_type:     self.mime_type,
      data:          self.data,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let earlier = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
    let later = earlier + chrono::Duration::microseconds(1500);
    let (a, b) = (encode_dt(earlier), encode_dt(later));
    assert_eq!(a.len(), b.len());
    assert!(a < b);
    assert_eq!(decode_dt(&b).unwrap(), later);
  }

  #[test]
  fn amount_keeps_scale() {
    let d = decode_amount("42.50").unwrap();
    assert_eq!(encode_amount(d), "42.50");
    assert_eq!(decode_amount("-3").unwrap(), Decimal::from(-3));
  }

  #[test]
  fn unknown_status_is_reported() {
    assert!(matches!(
      decode_status("archived"),
      Err(Error::UnknownDiscriminant { column: "status", .. })
    ));
  }
}
