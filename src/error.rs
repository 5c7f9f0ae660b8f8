// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Error taxonomy for scanning, selection, rewrite preconditions and per-file record operations
// role: errors
// outputs: RelabelError (call-level, fatal to the call) and DecodeError/SetError/EncodeError (per file or field, contained)
// invariants:
// - per-file errors never escape a worker; they are folded into RunResult entries
// - precondition variants are produced before any filesystem access
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::PathBuf;

use thiserror::Error;

use crate::fields::Field;

pub type Result<T> = std::result::Result<T, RelabelError>;

#[derive(Debug, Error)]
pub enum RelabelError {
  /// Source root (or a directory below it) could not be read.
  #[error("cannot scan {path}: {source}")]
  Scan {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("invalid state: {0}")]
  InvalidState(String),

  #[error("a rewrite run is already in progress")]
  AlreadyRunning,

  #[error("identity not found or already processed: {0}")]
  NotFound(String),

  #[error("no files found for identity {0}")]
  NoFiles(String),

  #[error("cannot build worker pool: {0}")]
  Pool(#[from] rayon::ThreadPoolBuildError),

  #[error(transparent)]
  Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, Error)]
#[error("cannot decode {path}: {message}")]
pub struct DecodeError {
  pub path: PathBuf,
  pub message: String,
}

#[derive(Debug, Clone, Error)]
#[error("cannot set {field}: {message}")]
pub struct SetError {
  pub field: Field,
  pub message: String,
}

#[derive(Debug, Clone, Error)]
#[error("cannot write {path}: {message}")]
pub struct EncodeError {
  pub path: PathBuf,
  pub message: String,
}
