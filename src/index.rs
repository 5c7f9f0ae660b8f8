// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: One-pass scan of a source tree into identity → (exemplar, ordered members)
// role: indexing
// inputs: RecordCodec, source root, IdentityNormalization
// outputs: Index (identities in first-seen order) and the slow-path member re-derivation
// side_effects: Reads directory entries and record headers; never writes
// invariants:
// - walk order is deterministic (entries sorted by file name within each directory)
// - an identity is inserted together with its first member; member lists are never empty
// - exemplar == members[0]
// - files that fail header decoding are counted in `skipped` and appear in no member list
// errors: RelabelError::Scan for unreadable root or directories; per-file decode errors are contained
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{RelabelError, Result};
use crate::fields::Field;
use crate::record::{ReadDepth, Record, RecordCodec};
use crate::util::has_record_extension;

/// Key used for records without a patient name.
pub const UNKNOWN_IDENTITY: &str = "UNKNOWN";

/// How a raw patient name becomes an identity key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdentityNormalization {
  /// Upper-case only; `"Doe  John"` and `"DOE JOHN"` stay distinct.
  #[default]
  Upper,
  /// Upper-case, trim, and collapse whitespace runs to a single space.
  UpperCollapsed,
}

impl IdentityNormalization {
  pub fn identity_of(self, raw: Option<&str>) -> String {
    let raw = match raw {
      Some(r) if !r.trim().is_empty() => r,
      _ => return UNKNOWN_IDENTITY.to_string(),
    };
    match self {
      IdentityNormalization::Upper => raw.to_uppercase(),
      IdentityNormalization::UpperCollapsed => raw.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
  pub exemplar: PathBuf,
  pub members: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct Index {
  order: Vec<String>,
  entries: HashMap<String, IndexEntry>,
  skipped: usize,
}

impl Index {
  fn insert(&mut self, identity: String, path: PathBuf) {
    match self.entries.get_mut(&identity) {
      Some(entry) => entry.members.push(path),
      None => {
        self.order.push(identity.clone());
        self.entries.insert(
          identity,
          IndexEntry {
            exemplar: path.clone(),
            members: vec![path],
          },
        );
      }
    }
  }

  /// Identities in first-seen order.
  pub fn identities(&self) -> &[String] {
    &self.order
  }

  pub fn get(&self, identity: &str) -> Option<&IndexEntry> {
    self.entries.get(identity)
  }

  pub fn contains(&self, identity: &str) -> bool {
    self.entries.contains_key(identity)
  }

  pub fn members(&self, identity: &str) -> Option<&[PathBuf]> {
    self.entries.get(identity).map(|e| e.members.as_slice())
  }

  /// Candidate files that could not be decoded.
  pub fn skipped(&self) -> usize {
    self.skipped
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  pub fn file_count(&self) -> usize {
    self.entries.values().map(|e| e.members.len()).sum()
  }
}

/// Every `*.dcm` file below `root`, in deterministic order.
fn candidate_files(root: &Path) -> Result<Vec<PathBuf>> {
  let mut files = Vec::new();
  for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
    let entry = entry.map_err(|source| RelabelError::Scan {
      path: source.path().unwrap_or(root).to_path_buf(),
      source,
    })?;
    if entry.file_type().is_file() && has_record_extension(entry.path()) {
      files.push(entry.into_path());
    }
  }
  Ok(files)
}

fn identity_at<C: RecordCodec>(codec: &C, path: &Path, normalization: IdentityNormalization) -> Option<String> {
  match codec.decode(path, ReadDepth::HeaderOnly) {
    Ok(record) => Some(normalization.identity_of(record.get(Field::PatientName).as_deref())),
    Err(e) => {
      tracing::debug!(path = %path.display(), error = %e.message, "skipping undecodable file");
      None
    }
  }
}

pub fn build<C: RecordCodec>(codec: &C, source_root: &Path, normalization: IdentityNormalization) -> Result<Index> {
  let mut index = Index::default();
  for path in candidate_files(source_root)? {
    match identity_at(codec, &path, normalization) {
      Some(identity) => index.insert(identity, path),
      None => index.skipped += 1,
    }
  }
  tracing::info!(
    root = %source_root.display(),
    identities = index.len(),
    files = index.file_count(),
    skipped = index.skipped,
    "index built"
  );
  Ok(index)
}

/// Slow path: walks the whole tree again and keeps files whose decoded identity matches.
pub fn rescan_members<C: RecordCodec>(
  codec: &C,
  source_root: &Path,
  identity: &str,
  normalization: IdentityNormalization,
) -> Result<Vec<PathBuf>> {
  let members = candidate_files(source_root)?
    .into_iter()
    .filter(|p| identity_at(codec, p, normalization).as_deref() == Some(identity))
    .collect();
  Ok(members)
}
