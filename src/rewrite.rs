// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Apply one EditSet to every file of one identity, writing edited copies into a mirrored destination tree
// role: processing/engine
// inputs: RewriteRequest (identity, files, edits, source and destination roots); optional progress sender
// outputs: RunResult with processed/succeeded/failed counts and typed per-file / per-field failures
// side_effects: Creates destination directories and files; never opens a source file for writing
// invariants:
// - at most one run per engine; the run state returns to idle on every exit path (guard)
// - cancel() only lands on an active run; it never leaks into the next one
// - processed counter is reset at run start and incremented exactly once per attempted file
// - one Progress message per processed file; the last one has current == total unless cancelled
// - a per-field set failure leaves that field as it was and does not fail the file
// errors: InvalidState / AlreadyRunning before any I/O; Pool if the worker pool cannot be built
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::Sender;

use rayon::prelude::*;

use crate::error::{RelabelError, Result};
use crate::model::{EditSet, FailureKind, FieldFailure, FileFailure, FileOutcome, Progress, RunResult};
use crate::record::{ReadDepth, Record, RecordCodec};
use crate::util;

#[derive(Debug, Clone, Copy)]
pub struct RewriteRequest<'a> {
  /// Identity currently selected by the caller; `None` means nothing was selected.
  pub identity: Option<&'a str>,
  pub files: &'a [PathBuf],
  pub edits: &'a EditSet,
  pub source_root: &'a Path,
  pub dest_root: &'a Path,
}

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLING: u8 = 2;

pub struct RewriteEngine<C> {
  codec: C,
  workers: usize,
  /// IDLE, RUNNING or CANCELLING; one word so start, cancel and finish cannot interleave.
  state: AtomicU8,
  processed: AtomicUsize,
}

/// Puts the engine back to idle when the run ends, however it ends.
struct RunGuard<'a>(&'a AtomicU8);

impl Drop for RunGuard<'_> {
  fn drop(&mut self) {
    self.0.store(IDLE, Ordering::SeqCst);
  }
}

/// Root checks shared by the engine and its callers; no filesystem access beyond canonicalization.
pub(crate) fn check_roots(source_root: &Path, dest_root: &Path) -> Result<()> {
  if source_root.as_os_str().is_empty() || dest_root.as_os_str().is_empty() {
    return Err(RelabelError::InvalidState("source and destination folders are required".into()));
  }
  if util::canonicalize_lossy(source_root) == util::canonicalize_lossy(dest_root) {
    return Err(RelabelError::InvalidState(
      "destination folder must differ from the source folder".into(),
    ));
  }
  Ok(())
}

impl<C: RecordCodec> RewriteEngine<C> {
  pub fn new(codec: C) -> Self {
    Self::with_workers(codec, util::default_worker_count())
  }

  pub fn with_workers(codec: C, workers: usize) -> Self {
    Self {
      codec,
      workers: workers.max(1),
      state: AtomicU8::new(IDLE),
      processed: AtomicUsize::new(0),
    }
  }

  pub fn codec(&self) -> &C {
    &self.codec
  }

  pub fn workers(&self) -> usize {
    self.workers
  }

  pub fn is_running(&self) -> bool {
    self.state.load(Ordering::SeqCst) != IDLE
  }

  /// Files processed so far in the current (or last) run.
  pub fn processed(&self) -> usize {
    self.processed.load(Ordering::SeqCst)
  }

  /// Ask the current run to stop; files not yet started are skipped.
  ///
  /// Returns false when no run was active; nothing is remembered for later runs.
  pub fn cancel(&self) -> bool {
    self
      .state
      .compare_exchange(RUNNING, CANCELLING, Ordering::SeqCst, Ordering::SeqCst)
      .is_ok()
  }

  fn is_cancelling(&self) -> bool {
    self.state.load(Ordering::SeqCst) == CANCELLING
  }

  fn check_request(req: &RewriteRequest) -> Result<()> {
    check_roots(req.source_root, req.dest_root)?;
    if req.identity.is_none() {
      return Err(RelabelError::InvalidState("no identity selected".into()));
    }
    Ok(())
  }

  pub fn rewrite(&self, req: &RewriteRequest, progress: Option<Sender<Progress>>) -> Result<RunResult> {
    Self::check_request(req)?;
    if self
      .state
      .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
      .is_err()
    {
      return Err(RelabelError::AlreadyRunning);
    }
    let _guard = RunGuard(&self.state);
    self.processed.store(0, Ordering::SeqCst);

    let total = req.files.len();
    let identity = req.identity.unwrap_or_default();
    tracing::info!(identity, files = total, workers = self.workers, "rewrite started");

    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(self.workers)
      .thread_name(|i| format!("relabel-worker-{i}"))
      .build()?;

    let outcomes: Vec<FileOutcome> = pool.install(|| {
      req
        .files
        .par_iter()
        .with_max_len(1)
        .map(|path| {
          if self.is_cancelling() {
            return FileOutcome::Skipped(path.clone());
          }
          let outcome = self.rewrite_one(path, req);
          let current = self.processed.fetch_add(1, Ordering::SeqCst) + 1;
          if let Some(tx) = &progress {
            let _ = tx.send(Progress { current, total });
          }
          outcome
        })
        .collect()
    });

    let result = RunResult::from_outcomes(outcomes, self.is_cancelling());
    tracing::info!(
      identity,
      processed = result.processed,
      succeeded = result.succeeded,
      failed = result.failed,
      skipped = result.skipped,
      "rewrite finished"
    );
    Ok(result)
  }

  fn rewrite_one(&self, source: &Path, req: &RewriteRequest) -> FileOutcome {
    let fail = |kind: FailureKind, message: String| {
      tracing::warn!(path = %source.display(), ?kind, error = %message, "file not rewritten");
      FileOutcome::Failed(FileFailure {
        path: source.to_path_buf(),
        kind,
        message,
      })
    };

    let dest = match util::reroot(source, req.source_root, req.dest_root) {
      Some(d) => d,
      None => return fail(FailureKind::Destination, "file is outside the source folder".into()),
    };
    if let Some(parent) = dest.parent() {
      if let Err(e) = std::fs::create_dir_all(parent) {
        return fail(FailureKind::Destination, e.to_string());
      }
    }

    let mut record = match self.codec.decode(source, ReadDepth::Full) {
      Ok(r) => r,
      Err(e) => return fail(FailureKind::Decode, e.message),
    };

    let mut field_errors = Vec::new();
    for (field, value) in req.edits.iter() {
      if !record.has(field) {
        continue;
      }
      if let Err(e) = record.set(field, value) {
        tracing::debug!(path = %source.display(), %field, error = %e.message, "field left unchanged");
        field_errors.push(FieldFailure {
          path: source.to_path_buf(),
          field,
          message: e.message,
        });
      }
    }

    if let Err(e) = record.encode(&dest) {
      return fail(FailureKind::Encode, e.message);
    }
    tracing::debug!(source = %source.display(), dest = %dest.display(), "file rewritten");
    FileOutcome::Written {
      source: source.to_path_buf(),
      dest,
      field_errors,
    }
  }
}
