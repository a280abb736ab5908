//! Attachment types — binary files owned by exactly one submission.
//!
//! Attachments are immutable: they are written together with their owning
//! submission and never updated afterwards.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::submission::SubmissionId;

/// Store-assigned surrogate key of an attachment.
pub type AttachmentId = i64;

/// A stored attachment including its binary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
  pub id:            AttachmentId,
  pub submission_id: SubmissionId,
  pub filename:      String,
  pub mime_type:     Option<String>,
  pub data:          Vec<u8>,
  pub created_at:    DateTime<Utc>,
}

/// Lightweight attachment description returned alongside submissions.
/// Never carries the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMeta {
  pub id:         AttachmentId,
  pub filename:   String,
  pub mime_type:  Option<String>,
  pub size_bytes: i64,
}

/// A binary attachment to be written with a new submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
  pub filename:  String,
  pub mime_type: Option<String>,
  pub data:      Vec<u8>,
}

impl NewAttachment {
  pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
    Self { filename: filename.into(), mime_type: None, data: data.into() }
  }

  pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
    self.mime_type = Some(mime_type.into());
    self
  }
}

/// An attachment whose payload travels as standard base64 text, as used by
/// import batches and JSON bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedAttachment {
  pub filename:    String,
  pub mime_type:   Option<String>,
  pub data_base64: String,
}

impl EncodedAttachment {
  pub fn decode(self) -> Result<NewAttachment, base64::DecodeError> {
    let data = B64.decode(self.data_base64.trim())?;
    Ok(NewAttachment { filename: self.filename, mime_type: self.mime_type, data })
  }

  pub fn encode(attachment: &NewAttachment) -> Self {
    Self {
      filename:    attachment.filename.clone(),
      mime_type:   attachment.mime_type.clone(),
      data_base64: B64.encode(&attachment.data),
    }
  }
}
