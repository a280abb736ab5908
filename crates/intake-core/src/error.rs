//! Error types for `intake-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An attachment's transport text could not be decoded to bytes.
  /// `item` is the position of the submission within its batch.
  #[error("submission {item}, attachment {attachment}: invalid base64 payload: {source}")]
  AttachmentDecode {
    item:       usize,
    attachment: usize,
    #[source]
    source:     base64::DecodeError,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
