// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Track the scanned index, the identities still pending this session, and the current selection
// role: state/session
// inputs: Index from one scan; identity selections; run completions
// outputs: Pending identity list; exemplar field values in display form
// side_effects: select() reads the exemplar's header
// invariants:
// - pending ⊆ index identities, in discovery order
// - complete() removes exactly one identity, whatever the per-file outcome of its run
// - selected is always an identity that was pending when selected
// errors: NotFound for unknown or already-completed identities; Decode when the exemplar became unreadable
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use crate::error::{RelabelError, Result};
use crate::fields::Field;
use crate::index::{self, Index, IdentityNormalization};
use crate::model::FieldValues;
use crate::record::{ReadDepth, Record, RecordCodec};

#[derive(Debug, Clone)]
pub struct Session {
  source_root: PathBuf,
  index: Index,
  pending: Vec<String>,
  selected: Option<String>,
}

impl Session {
  pub fn new(source_root: PathBuf, index: Index) -> Self {
    let pending = index.identities().to_vec();
    Self {
      source_root,
      index,
      pending,
      selected: None,
    }
  }

  /// Scan `source_root` and start a fresh session over it.
  pub fn scan<C: RecordCodec>(codec: &C, source_root: &Path, normalization: IdentityNormalization) -> Result<Self> {
    let index = index::build(codec, source_root, normalization)?;
    Ok(Self::new(source_root.to_path_buf(), index))
  }

  pub fn source_root(&self) -> &Path {
    &self.source_root
  }

  pub fn index(&self) -> &Index {
    &self.index
  }

  pub fn pending(&self) -> &[String] {
    &self.pending
  }

  pub fn has_pending(&self) -> bool {
    !self.pending.is_empty()
  }

  pub fn is_pending(&self, identity: &str) -> bool {
    self.pending.iter().any(|p| p == identity)
  }

  pub fn selected(&self) -> Option<&str> {
    self.selected.as_deref()
  }

  pub fn members(&self, identity: &str) -> Option<&[PathBuf]> {
    self.index.members(identity)
  }

  /// Select a pending identity and return its exemplar's current values for display.
  pub fn select<C: RecordCodec>(&mut self, codec: &C, identity: &str) -> Result<FieldValues> {
    let entry = match self.index.get(identity) {
      Some(e) if self.is_pending(identity) => e,
      _ => return Err(RelabelError::NotFound(identity.to_string())),
    };
    let record = codec.decode(&entry.exemplar, ReadDepth::HeaderOnly)?;
    let values = Field::ALL
      .iter()
      .map(|f| (*f, f.to_display(&record.get(*f).unwrap_or_default())))
      .collect();
    self.selected = Some(identity.to_string());
    Ok(values)
  }

  /// Mark `identity` as attempted; it leaves the pending list for good.
  pub fn complete(&mut self, identity: &str) {
    self.pending.retain(|p| p != identity);
    if self.selected.as_deref() == Some(identity) {
      self.selected = None;
    }
  }
}
