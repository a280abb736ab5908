//! [`SqliteStore`] — the SQLite implementation of [`SubmissionStore`].

use std::path::Path;

use chrono::Utc;
use intake_core::{
  attachment::{Attachment, AttachmentId, AttachmentMeta, NewAttachment},
  import::{ImportBatch, ImportOutcome},
  store::{ListQuery, Page, SubmissionStore, Summary},
  submission::{NewSubmission, Submission, SubmissionId, SubmissionStatus, VoucherId},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use crate::{
  Result,
  encode::{
    RawAttachment, RawSubmission, SUBMISSION_COLUMNS, decode_status, encode_amount,
    encode_date, encode_direction, encode_dt, encode_payment_method, encode_sphere,
    encode_status,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A submission store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Several
/// stores (e.g. a server and an import job) may open the same file.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Conditional pending → `target` transition. A single guarded `UPDATE`,
  /// so concurrent reviewers cannot both succeed.
  async fn review(
    &self,
    id: SubmissionId,
    target: SubmissionStatus,
    reviewer_notes: Option<String>,
  ) -> Result<bool> {
    let status_str = encode_status(target);
    let at_str     = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE submissions
           SET status = ?1, reviewed_at = ?2, reviewer_notes = ?3
           WHERE id = ?4 AND status = 'pending'",
          rusqlite::params![status_str, at_str, reviewer_notes, id],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// A [`NewSubmission`] with every column already encoded, ready to move onto
/// the connection thread.
struct SubmissionRow {
  external_id:    Option<String>,
  date:           String,
  kind:           &'static str,
  sphere:         Option<&'static str>,
  payment_method: Option<&'static str>,
  description:    Option<String>,
  category_hint:  Option<String>,
  counterparty:   Option<String>,
  gross_amount:   String,
  submitted_by:   String,
  attachments:    Vec<NewAttachment>,
}

impl From<NewSubmission> for SubmissionRow {
  fn from(input: NewSubmission) -> Self {
    Self {
      external_id:    input.external_id,
      date:           encode_date(input.date),
      kind:           encode_direction(input.kind),
      sphere:         input.sphere.map(encode_sphere),
      payment_method: input.payment_method.map(encode_payment_method),
      description:    input.description,
      category_hint:  input.category_hint,
      counterparty:   input.counterparty,
      gross_amount:   encode_amount(input.gross_amount),
      submitted_by:   input.submitted_by,
      attachments:    input.attachments,
    }
  }
}

/// Insert one submission and its attachments. Must run inside a transaction
/// owned by the caller; any error leaves the rollback to that transaction.
fn insert_submission(
  conn: &rusqlite::Connection,
  row: &SubmissionRow,
  now: &str,
) -> rusqlite::Result<SubmissionId> {
  conn.execute(
    "INSERT INTO submissions (
       external_id, date, type, sphere, payment_method,
       description, category_hint, counterparty, gross_amount,
       submitted_by, submitted_at, status
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'pending')",
    rusqlite::params![
      row.external_id,
      row.date,
      row.kind,
      row.sphere,
      row.payment_method,
      row.description,
      row.category_hint,
      row.counterparty,
      row.gross_amount,
      row.submitted_by,
      now,
    ],
  )?;
  let id = conn.last_insert_rowid();

  let mut stmt = conn.prepare_cached(
    "INSERT INTO submission_attachments (
       submission_id, filename, mime_type, data, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5)",
  )?;
  for att in &row.attachments {
    stmt.execute(rusqlite::params![id, att.filename, att.mime_type, att.data, now])?;
  }

  Ok(id)
}

/// Attachment metadata for one submission, oldest first. Never reads `data`.
fn attachment_meta(
  conn: &rusqlite::Connection,
  submission_id: SubmissionId,
) -> rusqlite::Result<Vec<AttachmentMeta>> {
  let mut stmt = conn.prepare_cached(
    "SELECT id, filename, mime_type, length(data)
     FROM submission_attachments
     WHERE submission_id = ?1
     ORDER BY id",
  )?;
  let metas = stmt
    .query_map(rusqlite::params![submission_id], |row| {
      Ok(AttachmentMeta {
        id:         row.get(0)?,
        filename:   row.get(1)?,
        mime_type:  row.get(2)?,
        size_bytes: row.get(3)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(metas)
}

// ─── SubmissionStore impl ────────────────────────────────────────────────────

impl SubmissionStore for SqliteStore {
  type Error = crate::Error;

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn list(&self, query: ListQuery) -> Result<Page> {
    let status_str = query.status.map(encode_status);
    let limit_val  = i64::try_from(query.limit()).unwrap_or(i64::MAX);
    let offset_val = i64::try_from(query.offset()).unwrap_or(i64::MAX);

    let (raws, total): (Vec<RawSubmission>, i64) = self
      .conn
      .call(move |conn| {
        // Count and page come from one snapshot so `total` matches `rows`.
        let tx = conn.transaction()?;

        let total: i64 = tx.query_row(
          "SELECT COUNT(*) FROM submissions WHERE (?1 IS NULL OR status = ?1)",
          rusqlite::params![status_str],
          |r| r.get(0),
        )?;

        let sql = format!(
          "SELECT {SUBMISSION_COLUMNS}
           FROM submissions
           WHERE (?1 IS NULL OR status = ?1)
           ORDER BY submitted_at DESC, id DESC
           LIMIT ?2 OFFSET ?3"
        );
        let mut rows = {
          let mut stmt = tx.prepare(&sql)?;
          let rows = stmt
            .query_map(
              rusqlite::params![status_str, limit_val, offset_val],
              RawSubmission::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          rows
        };
        for row in &mut rows {
          row.attachments = attachment_meta(&tx, row.id)?;
        }

        tx.commit()?;
        Ok((rows, total))
      })
      .await?;

    let rows = raws
      .into_iter()
      .map(RawSubmission::into_submission)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page { rows, total: total.max(0) as u64 })
  }

  async fn get(&self, id: SubmissionId) -> Result<Option<Submission>> {
    let raw: Option<RawSubmission> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = ?1");
        let raw = conn
          .query_row(&sql, rusqlite::params![id], RawSubmission::from_row)
          .optional()?;

        Ok(match raw {
          Some(mut raw) => {
            raw.attachments = attachment_meta(conn, raw.id)?;
            Some(raw)
          }
          None => None,
        })
      })
      .await?;

    raw.map(RawSubmission::into_submission).transpose()
  }

  async fn get_attachment(&self, id: AttachmentId) -> Result<Option<Attachment>> {
    let raw: Option<RawAttachment> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, submission_id, filename, mime_type, data, created_at
             FROM submission_attachments WHERE id = ?1",
            rusqlite::params![id],
            |row| {
              Ok(RawAttachment {
                id:            row.get(0)?,
                submission_id: row.get(1)?,
                filename:      row.get(2)?,
                mime_type:     row.get(3)?,
                data:          row.get(4)?,
                created_at:    row.get(5)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAttachment::into_attachment).transpose()
  }

  async fn summary(&self) -> Result<Summary> {
    let counts: Vec<(String, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT status, COUNT(*) FROM submissions GROUP BY status")?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut summary = Summary::default();
    for (status, count) in counts {
      let count = count.max(0) as u64;
      match decode_status(&status)? {
        SubmissionStatus::Pending => summary.pending = count,
        SubmissionStatus::Approved => summary.approved = count,
        SubmissionStatus::Rejected => summary.rejected = count,
      }
    }
    summary.total = summary.pending + summary.approved + summary.rejected;
    Ok(summary)
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn create(&self, input: NewSubmission) -> Result<SubmissionId> {
    let row = SubmissionRow::from(input);
    let now = encode_dt(Utc::now());

    let id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = insert_submission(&tx, &row, &now)?;
        tx.commit()?;
        Ok(id)
      })
      .await?;

    Ok(id)
  }

  async fn import(&self, batch: ImportBatch) -> Result<ImportOutcome> {
    // Decode every payload before touching the database.
    let rows: Vec<SubmissionRow> =
      batch.decode()?.into_iter().map(SubmissionRow::from).collect();
    let now = encode_dt(Utc::now());

    let ids = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let ids = rows
          .iter()
          .map(|row| insert_submission(&tx, row, &now))
          .collect::<rusqlite::Result<Vec<_>>>()?;
        tx.commit()?;
        Ok(ids)
      })
      .await?;

    Ok(ImportOutcome { imported: ids.len(), ids })
  }

  // ── Review ────────────────────────────────────────────────────────────────

  async fn approve(&self, id: SubmissionId, reviewer_notes: Option<String>) -> Result<bool> {
    self.review(id, SubmissionStatus::Approved, reviewer_notes).await
  }

  async fn reject(&self, id: SubmissionId, reviewer_notes: Option<String>) -> Result<bool> {
    self.review(id, SubmissionStatus::Rejected, reviewer_notes).await
  }

  async fn link_to_voucher(
    &self,
    id: SubmissionId,
    voucher_id: VoucherId,
  ) -> Result<Option<SubmissionStatus>> {
    // The status comes back from the same statement that writes the link.
    let status: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "UPDATE submissions SET voucher_id = ?1 WHERE id = ?2 RETURNING status",
            rusqlite::params![voucher_id, id],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;

    status.as_deref().map(decode_status).transpose()
  }

  async fn delete(&self, id: SubmissionId) -> Result<bool> {
    // Attachments follow through `ON DELETE CASCADE`.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM submissions WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;

    Ok(changed == 1)
  }
}
