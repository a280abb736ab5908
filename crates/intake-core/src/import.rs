//! Batch import payloads.
//!
//! An import batch is the transport form of many submissions at once, as
//! produced by a file-drop or mailbox collector. Attachment payloads arrive as
//! base64 text and are decoded up front by [`ImportBatch::decode`], so a bad
//! payload is reported before anything is written.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  attachment::EncodedAttachment,
  submission::{Direction, NewSubmission, PaymentMethod, Sphere, SubmissionId},
};

/// A batch of submissions applied as one unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportBatch {
  #[serde(default)]
  pub submissions: Vec<ImportSubmission>,
}

/// One submission inside an [`ImportBatch`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSubmission {
  pub external_id:    Option<String>,
  pub date:           NaiveDate,
  /// Defaults to [`Direction::Out`] when omitted.
  #[serde(rename = "type", default)]
  pub kind:           Option<Direction>,
  pub sphere:         Option<Sphere>,
  pub payment_method: Option<PaymentMethod>,
  pub description:    Option<String>,
  pub category_hint:  Option<String>,
  pub counterparty:   Option<String>,
  pub gross_amount:   Decimal,
  pub submitted_by:   String,
  #[serde(default)]
  pub attachments:    Vec<EncodedAttachment>,
}

impl ImportSubmission {
  /// Decode attachment payloads. `item` is this submission's batch position
  /// and only feeds the error report.
  pub fn decode(self, item: usize) -> Result<NewSubmission> {
    let attachments = self
      .attachments
      .into_iter()
      .enumerate()
      .map(|(attachment, enc)| {
        enc
          .decode()
          .map_err(|source| Error::AttachmentDecode { item, attachment, source })
      })
      .collect::<Result<Vec<_>>>()?;

    Ok(NewSubmission {
      external_id: self.external_id,
      date: self.date,
      kind: self.kind.unwrap_or_default(),
      sphere: self.sphere,
      payment_method: self.payment_method,
      description: self.description,
      category_hint: self.category_hint,
      counterparty: self.counterparty,
      gross_amount: self.gross_amount,
      submitted_by: self.submitted_by,
      attachments,
    })
  }
}

impl ImportBatch {
  /// Decode every item, failing on the first undecodable attachment.
  pub fn decode(self) -> Result<Vec<NewSubmission>> {
    self
      .submissions
      .into_iter()
      .enumerate()
      .map(|(item, sub)| sub.decode(item))
      .collect()
  }
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
  pub imported: usize,
  /// Newly assigned ids, in batch order.
  pub ids:      Vec<SubmissionId>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_type_defaults_to_out() {
    let batch: ImportBatch = serde_json::from_value(serde_json::json!({
      "submissions": [{
        "date": "2024-03-01",
        "gross_amount": "12.30",
        "submitted_by": "mailbox"
      }]
    }))
    .unwrap();

    let decoded = batch.decode().unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].kind, Direction::Out);
    assert_eq!(decoded[0].gross_amount, Decimal::new(1230, 2));
  }

  #[test]
  fn explicit_type_is_kept() {
    let batch: ImportBatch = serde_json::from_value(serde_json::json!({
      "submissions": [{
        "date": "2024-03-01",
        "type": "IN",
        "gross_amount": 100,
        "submitted_by": "mailbox"
      }]
    }))
    .unwrap();
    assert_eq!(batch.decode().unwrap()[0].kind, Direction::In);
  }

  #[test]
  fn decode_error_names_item_and_attachment() {
    let good = EncodedAttachment {
      filename:    "ok.txt".into(),
      mime_type:   None,
      data_base64: "b2s=".into(),
    };
    let bad = EncodedAttachment {
      filename:    "bad.txt".into(),
      mime_type:   None,
      data_base64: "%%%".into(),
    };
    let item = |attachments: Vec<EncodedAttachment>| ImportSubmission {
      external_id: None,
      date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
      kind: None,
      sphere: None,
      payment_method: None,
      description: None,
      category_hint: None,
      counterparty: None,
      gross_amount: Decimal::ONE,
      submitted_by: "x".into(),
      attachments,
    };
    let batch = ImportBatch {
      submissions: vec![item(vec![good.clone()]), item(vec![good, bad])],
    };

    match batch.decode() {
      Err(Error::AttachmentDecode { item, attachment, .. }) => {
        assert_eq!(item, 1);
        assert_eq!(attachment, 1);
      }
      other => panic!("expected decode error, got {other:?}"),
    }
  }
}
