// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Values passed across component boundaries: field values, edit sets, progress ticks and run results
// role: model/types
// outputs: Serializable structs with stable field names used by the JSON output
// invariants:
// - RunResult: succeeded + failed == processed; processed + skipped == number of submitted files
// - EditSet values are in native (record) encoding
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::fields::Field;

/// Display-form values for the six fields, keyed by field.
pub type FieldValues = BTreeMap<Field, String>;

/// Field edits in native encoding, applied to every member of one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditSet {
  values: BTreeMap<Field, String>,
}

impl EditSet {
  /// Builds the edit set from form (display) values, encoding dates and times.
  pub fn from_display(values: &FieldValues) -> Self {
    let values = values.iter().map(|(f, v)| (*f, f.to_native(v))).collect();
    Self { values }
  }

  /// Takes values that are already in native encoding.
  pub fn from_native<I>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (Field, String)>,
  {
    Self {
      values: pairs.into_iter().collect(),
    }
  }

  pub fn get(&self, field: Field) -> Option<&str> {
    self.values.get(&field).map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
    self.values.iter().map(|(f, v)| (*f, v.as_str()))
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
  pub current: usize,
  pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
  /// Destination directory could not be created.
  Destination,
  Decode,
  Encode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
  pub path: PathBuf,
  pub kind: FailureKind,
  pub message: String,
}

/// A field that the record exposed but refused to take; the file itself still counts as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
  pub path: PathBuf,
  pub field: Field,
  pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunResult {
  pub processed: usize,
  pub succeeded: usize,
  pub failed: usize,
  #[serde(skip_serializing_if = "is_zero")]
  pub skipped: usize,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub cancelled: bool,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub failures: Vec<FileFailure>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub field_errors: Vec<FieldFailure>,
}

/// One completed run as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
  pub identity: String,
  pub result: RunResult,
}

fn is_zero(n: &usize) -> bool {
  *n == 0
}

/// Per-file result produced by one unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
  Written {
    source: PathBuf,
    dest: PathBuf,
    field_errors: Vec<FieldFailure>,
  },
  Failed(FileFailure),
  /// Not attempted because the run was cancelled first.
  Skipped(PathBuf),
}

impl RunResult {
  pub fn from_outcomes(outcomes: Vec<FileOutcome>, cancelled: bool) -> Self {
    let mut result = RunResult {
      cancelled,
      ..Default::default()
    };
    for outcome in outcomes {
      match outcome {
        FileOutcome::Written { field_errors, .. } => {
          result.processed += 1;
          result.succeeded += 1;
          result.field_errors.extend(field_errors);
        }
        FileOutcome::Failed(failure) => {
          result.processed += 1;
          result.failed += 1;
          result.failures.push(failure);
        }
        FileOutcome::Skipped(_) => result.skipped += 1,
      }
    }
    result
  }
}
