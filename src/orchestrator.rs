// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Sequence scan → identity selection → field editing → rewrite → bookkeeping, behind a Form boundary
// role: processing/orchestrator
// inputs: RunConfig (roots, identity normalization); a Form implementation supplying choices and edits
// outputs: Pending identity lists, exemplar values, RunResult per run, SessionOutcome per interactive session
// side_effects: Scans the source tree; drives the rewrite engine; drains progress on the calling thread
// invariants:
// - identities() never rescans; scan() always does and resets the pending set
// - an identity is completed only after its run returned a RunResult
// - progress callbacks run on the caller's thread, never on a worker
// - run() checks roots before touching the member files or rescanning
// - interact() keeps the reports of completed runs even when a later step fails
// errors: InvalidState before the first scan or without a selection; NoFiles when neither index nor rescan finds files
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::PathBuf;
use std::sync::mpsc;

use crate::error::{RelabelError, Result};
use crate::index::{self, IdentityNormalization};
use crate::model::{EditSet, FieldValues, Progress, RunReport, RunResult};
use crate::record::RecordCodec;
use crate::rewrite::{self, RewriteEngine, RewriteRequest};
use crate::session::Session;

/// The user-facing side of a session: whatever collects choices and shows results.
pub trait Form {
  /// Pick one of the pending identities; `None` ends the session.
  fn choose_identity(&mut self, pending: &[String]) -> Option<String>;
  /// Return the values to write, starting from the exemplar's current display values.
  fn edit_fields(&mut self, identity: &str, current: &FieldValues) -> FieldValues;
  fn progress(&mut self, progress: Progress);
  fn finished(&mut self, identity: &str, result: &RunResult);
  /// The identity could not be run; it stays pending unless it vanished from the index.
  fn failed(&mut self, identity: &str, error: &RelabelError);
  fn continue_with_next(&mut self) -> bool;
  fn nothing_pending(&mut self) {}
}

#[derive(Debug, Clone, Default)]
pub struct RunConfig {
  pub source_root: PathBuf,
  pub dest_root: PathBuf,
  pub normalization: IdentityNormalization,
}

/// What an interactive session got done.
#[derive(Debug)]
pub struct SessionOutcome {
  pub runs: Vec<RunReport>,
  /// Why the session stopped early, if it did; `runs` still lists everything completed before.
  pub error: Option<RelabelError>,
}

pub struct Orchestrator<C> {
  engine: RewriteEngine<C>,
  config: RunConfig,
  session: Option<Session>,
}

fn not_scanned() -> RelabelError {
  RelabelError::InvalidState("source folder has not been scanned".into())
}

impl<C: RecordCodec> Orchestrator<C> {
  pub fn new(engine: RewriteEngine<C>, config: RunConfig) -> Self {
    Self {
      engine,
      config,
      session: None,
    }
  }

  pub fn engine(&self) -> &RewriteEngine<C> {
    &self.engine
  }

  pub fn config(&self) -> &RunConfig {
    &self.config
  }

  pub fn session(&self) -> Option<&Session> {
    self.session.as_ref()
  }

  /// Rebuild the index from disk and reset the pending set.
  pub fn scan(&mut self) -> Result<&[String]> {
    if self.config.source_root.as_os_str().is_empty() {
      return Err(RelabelError::InvalidState("source folder is required".into()));
    }
    let session = Session::scan(self.engine.codec(), &self.config.source_root, self.config.normalization)?;
    Ok(self.session.insert(session).pending())
  }

  /// Pending identities from the last scan.
  pub fn identities(&self) -> Result<&[String]> {
    self.session.as_ref().map(Session::pending).ok_or_else(not_scanned)
  }

  pub fn has_pending(&self) -> bool {
    self.session.as_ref().is_some_and(Session::has_pending)
  }

  pub fn select(&mut self, identity: &str) -> Result<FieldValues> {
    let session = self.session.as_mut().ok_or_else(not_scanned)?;
    session.select(self.engine.codec(), identity)
  }

  /// Cached members, unless none of them exist any more; then a full rescan.
  fn resolve_files(&self, session: &Session, identity: &str) -> Result<Vec<PathBuf>> {
    let cached = session.members(identity).unwrap_or_default();
    if cached.iter().any(|p| p.exists()) {
      return Ok(cached.to_vec());
    }
    tracing::warn!(identity, cached = cached.len(), "indexed files missing; rescanning source folder");
    let found = index::rescan_members(
      self.engine.codec(),
      session.source_root(),
      identity,
      self.config.normalization,
    )?;
    if !found.is_empty() {
      tracing::warn!(
        identity,
        cached = cached.len(),
        found = found.len(),
        "index diverged from disk; using rescanned files"
      );
    }
    Ok(found)
  }

  /// Rewrite every file of the selected identity with `display` values, then mark it done.
  ///
  /// `on_progress` is called on this thread once per processed file.
  pub fn run<F>(&mut self, display: &FieldValues, mut on_progress: F) -> Result<RunResult>
  where
    F: FnMut(Progress),
  {
    rewrite::check_roots(&self.config.source_root, &self.config.dest_root)?;
    let session = self.session.as_ref().ok_or_else(not_scanned)?;
    let identity = session
      .selected()
      .ok_or_else(|| RelabelError::InvalidState("no identity selected".into()))?
      .to_string();
    let files = self.resolve_files(session, &identity)?;
    if files.is_empty() {
      return Err(RelabelError::NoFiles(identity));
    }

    let edits = EditSet::from_display(display);
    let request = RewriteRequest {
      identity: Some(&identity),
      files: &files,
      edits: &edits,
      source_root: &self.config.source_root,
      dest_root: &self.config.dest_root,
    };
    let engine = &self.engine;
    let (tx, rx) = mpsc::channel();
    let result = std::thread::scope(|s| {
      let worker = s.spawn(move || engine.rewrite(&request, Some(tx)));
      for p in rx {
        on_progress(p);
      }
      match worker.join() {
        Ok(r) => r,
        Err(panic) => std::panic::resume_unwind(panic),
      }
    })?;

    if let Some(session) = self.session.as_mut() {
      session.complete(&identity);
    }
    Ok(result)
  }

  /// Drive a whole session through `form` until it stops or nothing is pending.
  pub fn interact<F: Form>(&mut self, form: &mut F, rescan: bool) -> SessionOutcome {
    let mut runs = Vec::new();
    let error = self.interact_into(form, rescan, &mut runs).err();
    SessionOutcome { runs, error }
  }

  fn interact_into<F: Form>(&mut self, form: &mut F, rescan: bool, reports: &mut Vec<RunReport>) -> Result<()> {
    if rescan || self.session.is_none() {
      self.scan()?;
    }
    loop {
      let pending = self.identities()?.to_vec();
      if pending.is_empty() {
        form.nothing_pending();
        break;
      }
      let Some(identity) = form.choose_identity(&pending) else {
        break;
      };

      let outcome = self
        .select(&identity)
        .and_then(|current| {
          let edited = form.edit_fields(&identity, &current);
          self.run(&edited, |p| form.progress(p))
        });
      match outcome {
        Ok(result) => {
          form.finished(&identity, &result);
          reports.push(RunReport { identity, result });
        }
        Err(e @ (RelabelError::NotFound(_) | RelabelError::NoFiles(_) | RelabelError::Decode(_))) => {
          tracing::warn!(identity = %identity, error = %e, "identity not processed");
          form.failed(&identity, &e);
        }
        Err(e) => return Err(e),
      }

      if !self.has_pending() {
        form.nothing_pending();
        break;
      }
      if !form.continue_with_next() {
        break;
      }
    }
    Ok(())
  }
}
