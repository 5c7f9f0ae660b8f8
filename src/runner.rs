// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Execute one CLI invocation: list identities, rewrite one patient, or run the interactive loop
// role: processing/runner
// inputs: EffectiveConfig
// outputs: Pretty JSON on stdout: {identities, skipped} for --list, {runs: [{identity, result}]} otherwise
// side_effects: Scans the source tree; writes edited copies under --dest; prompts on stdin/stderr in interactive mode
// invariants:
// - stdout carries exactly one JSON document per successful invocation; an interactive session that fails still prints its completed runs
// - single-patient overrides are merged over the exemplar's values; fields not given keep their value
// errors: Propagates library errors with context naming the root or patient
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::{EffectiveConfig, Mode};
use crate::index::Index;
use crate::model::{FieldValues, RunReport};
use crate::orchestrator::{Orchestrator, RunConfig};
use crate::record::{DicomCodec, RecordCodec};
use crate::rewrite::RewriteEngine;
use crate::terminal::TerminalForm;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityListing {
  pub identity: String,
  pub files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
  pub identities: Vec<IdentityListing>,
  /// Candidate files that could not be decoded.
  pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct RunsReport {
  pub runs: Vec<RunReport>,
}

pub fn listing(index: &Index) -> Listing {
  let identities = index
    .identities()
    .iter()
    .map(|id| IdentityListing {
      identity: id.clone(),
      files: index.members(id).map_or(0, <[_]>::len),
    })
    .collect();
  Listing {
    identities,
    skipped: index.skipped(),
  }
}

/// Scan, select `patient`, apply `overrides` over the exemplar's values and run once.
pub fn run_single<C: RecordCodec>(
  orch: &mut Orchestrator<C>,
  patient: &str,
  overrides: &FieldValues,
) -> Result<RunReport> {
  let identity = orch.config().normalization.identity_of(Some(patient));
  let root = orch.config().source_root.clone();
  orch
    .scan()
    .with_context(|| format!("scanning {}", root.display()))?;
  let mut values = orch
    .select(&identity)
    .with_context(|| format!("selecting patient {identity}"))?;
  values.extend(overrides.iter().map(|(f, v)| (*f, v.clone())));
  let result = orch
    .run(&values, |p| tracing::debug!(current = p.current, total = p.total, "progress"))
    .with_context(|| format!("rewriting patient {identity}"))?;
  Ok(RunReport { identity, result })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

pub fn process(cfg: &EffectiveConfig) -> Result<()> {
  let engine = RewriteEngine::with_workers(DicomCodec, cfg.workers);
  let mut orch = Orchestrator::new(
    engine,
    RunConfig {
      source_root: cfg.source.clone(),
      dest_root: cfg.dest.clone().unwrap_or_default(),
      normalization: cfg.normalization,
    },
  );

  match &cfg.mode {
    Mode::List => {
      orch
        .scan()
        .with_context(|| format!("scanning {}", cfg.source.display()))?;
      let session = orch.session().context("no index after scan")?;
      print_json(&listing(session.index()))
    }
    Mode::Single { patient, overrides } => {
      let report = run_single(&mut orch, patient, overrides)?;
      print_json(&RunsReport { runs: vec![report] })
    }
    Mode::Interactive => {
      let stdin = std::io::stdin();
      let mut form = TerminalForm::new(stdin.lock(), std::io::stderr());
      let outcome = orch.interact(&mut form, true);
      // runs that already wrote files are reported even when the session ended on an error
      print_json(&RunsReport { runs: outcome.runs })?;
      match outcome.error {
        Some(e) => Err(e).with_context(|| format!("processing {}", cfg.source.display())),
        None => Ok(()),
      }
    }
  }
}
