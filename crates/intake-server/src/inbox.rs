//! File-drop importer.
//!
//! Collectors (mailbox scrapers, scanner shares) drop JSON import batches into
//! an inbox directory. Each file is applied as one atomic batch and renamed to
//! `<name>.imported` afterwards so a second run skips it. Failed files stay in
//! place for inspection; the remaining files are still processed.

use std::{
  ffi::OsString,
  io,
  path::{Path, PathBuf},
};

use intake_core::{
  import::{ImportBatch, ImportOutcome},
  store::SubmissionStore,
};

/// Suffix appended to a batch file once it has been imported.
pub const IMPORTED_SUFFIX: &str = "imported";

/// Per-file results of one inbox run.
#[derive(Debug, Default)]
pub struct InboxReport {
  pub imported: Vec<(PathBuf, ImportOutcome)>,
  /// Files that were not imported, or were imported but could not be marked.
  pub failed:   Vec<(PathBuf, String)>,
}

impl InboxReport {
  pub fn submissions(&self) -> usize {
    self.imported.iter().map(|(_, o)| o.imported).sum()
  }
}

/// Import `path`, which is either a single batch file or a directory of
/// `*.json` batch files (processed in file-name order).
///
/// Only listing the inbox can fail the whole run; per-file problems end up in
/// [`InboxReport::failed`].
pub async fn import_path<S>(store: &S, path: &Path) -> io::Result<InboxReport>
where
  S: SubmissionStore,
{
  let files = if tokio::fs::metadata(path).await?.is_dir() {
    batch_files(path).await?
  } else {
    vec![path.to_path_buf()]
  };

  let mut report = InboxReport::default();
  for file in files {
    match import_file(store, &file).await {
      Ok(outcome) => {
        tracing::info!(file = %file.display(), imported = outcome.imported, "batch imported");
        report.imported.push((file, outcome));
      }
      Err(message) => {
        tracing::error!(file = %file.display(), error = %message, "batch rejected");
        report.failed.push((file, message));
      }
    }
  }
  Ok(report)
}

/// Import one file and mark it. The marker name must be free beforehand, so a
/// committed batch can always be renamed out of the inbox.
async fn import_file<S>(store: &S, file: &Path) -> Result<ImportOutcome, String>
where
  S: SubmissionStore,
{
  let marked = imported_name(file);
  match tokio::fs::try_exists(&marked).await {
    Ok(false) => {}
    Ok(true) => return Err(format!("{} already exists", marked.display())),
    Err(e) => return Err(format!("cannot check {}: {e}", marked.display())),
  }

  let raw = tokio::fs::read(file).await.map_err(|e| format!("read failed: {e}"))?;
  let batch: ImportBatch =
    serde_json::from_slice(&raw).map_err(|e| format!("malformed batch: {e}"))?;
  let outcome = store.import(batch).await.map_err(|e| e.to_string())?;

  tokio::fs::rename(file, &marked).await.map_err(|e| {
    format!(
      "imported as ids {:?} but could not be marked ({e}); move it out of the inbox before the next run",
      outcome.ids
    )
  })?;
  Ok(outcome)
}

async fn batch_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
  let mut files = Vec::new();
  let mut entries = tokio::fs::read_dir(dir).await?;
  while let Some(entry) = entries.next_entry().await? {
    let path = entry.path();
    if entry.file_type().await?.is_file()
      && path.extension().is_some_and(|ext| ext == "json")
    {
      files.push(path);
    }
  }
  files.sort();
  Ok(files)
}

fn imported_name(file: &Path) -> PathBuf {
  let mut name = OsString::from(file.as_os_str());
  name.push(".");
  name.push(IMPORTED_SUFFIX);
  PathBuf::from(name)
}
