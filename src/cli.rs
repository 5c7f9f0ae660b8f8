// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Command-line surface and its normalization into an EffectiveConfig
// role: config/cli
// inputs: argv (+ RELABEL_JOBS env)
// outputs: EffectiveConfig with canonical roots, a Mode, a worker count and the identity normalization
// invariants:
// - run modes always carry a destination that differs from the source
// - field overrides are only accepted together with --patient
// errors: anyhow bail! with a one-line message naming the offending flags
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use anyhow::{bail, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::fields::Field;
use crate::index::IdentityNormalization;
use crate::model::FieldValues;
use crate::util;

#[derive(Parser, Debug)]
#[command(
    name = "dicom-relabel",
    version,
    about = "Edit patient and study tags for one patient across a DICOM tree, writing a mirrored copy",
    long_about = None
)]
pub struct Cli {
  /// Folder scanned (recursively) for *.dcm files; never modified
  #[arg(long)]
  pub source: Option<PathBuf>,

  /// Folder receiving the edited copies, same relative layout as --source
  #[arg(long)]
  pub dest: Option<PathBuf>,

  /// Print the patients found under --source as JSON and exit
  #[arg(long)]
  pub list: bool,

  /// Rewrite this patient (as printed by --list) without prompting
  #[arg(long)]
  pub patient: Option<String>,

  /// New patient name (upper-cased on write)
  #[arg(long)]
  pub name: Option<String>,

  /// New patient ID
  #[arg(long)]
  pub id: Option<String>,

  /// New birth date, DD/MM/YYYY
  #[arg(long)]
  pub birth_date: Option<String>,

  /// New patient sex
  #[arg(long)]
  pub sex: Option<String>,

  /// New study date, DD/MM/YYYY
  #[arg(long)]
  pub study_date: Option<String>,

  /// New study time, HH:MM:SS
  #[arg(long)]
  pub study_time: Option<String>,

  /// Worker threads per run (default: 5 per CPU, between 4 and 32)
  #[arg(long, env = "RELABEL_JOBS", value_parser = clap::value_parser!(u16).range(1..=256))]
  pub jobs: Option<u16>,

  /// Treat names differing only in spacing as the same patient
  #[arg(long)]
  pub collapse_whitespace: bool,

  /// More log output on stderr (-v info, -vv debug); RUST_LOG overrides
  #[arg(short, long, action = ArgAction::Count)]
  pub verbose: u8,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  /// Print identities and exit.
  List,
  /// One identity; `overrides` replace the exemplar's values, other fields are kept.
  Single { patient: String, overrides: FieldValues },
  /// Prompt on the terminal until the user stops or nothing is pending.
  Interactive,
}

#[derive(Debug, Clone)]
pub struct EffectiveConfig {
  pub source: PathBuf, // absolute path for stability
  pub dest: Option<PathBuf>,
  pub mode: Mode,
  pub workers: usize,
  pub normalization: IdentityNormalization,
}

fn overrides_of(cli: &Cli) -> FieldValues {
  [
    (Field::PatientName, &cli.name),
    (Field::PatientId, &cli.id),
    (Field::PatientBirthDate, &cli.birth_date),
    (Field::PatientSex, &cli.sex),
    (Field::StudyDate, &cli.study_date),
    (Field::StudyTime, &cli.study_time),
  ]
  .into_iter()
  .filter_map(|(f, v)| v.clone().map(|v| (f, v)))
  .collect()
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let Some(source) = cli.source.as_deref() else {
    bail!("--source is required")
  };
  let source = util::canonicalize_lossy(source);
  let overrides = overrides_of(&cli);

  let mode = match (cli.list, cli.patient.clone()) {
    (true, Some(_)) => bail!("--list cannot be combined with --patient"),
    (true, None) => Mode::List,
    (false, Some(patient)) => Mode::Single { patient, overrides },
    (false, None) => Mode::Interactive,
  };
  if !matches!(mode, Mode::Single { .. }) && !overrides_of(&cli).is_empty() {
    bail!("field flags (--name, --id, --birth-date, --sex, --study-date, --study-time) require --patient");
  }

  let dest = cli.dest.as_deref().map(util::canonicalize_lossy);
  match (&mode, &dest) {
    (Mode::List, _) => {}
    (_, None) => bail!("--dest is required unless --list is given"),
    (_, Some(d)) if *d == source => bail!("--dest must differ from --source"),
    _ => {}
  }

  let workers = match cli.jobs {
    Some(n) => usize::from(n),
    None => util::default_worker_count(),
  };
  let normalization = if cli.collapse_whitespace {
    IdentityNormalization::UpperCollapsed
  } else {
    IdentityNormalization::Upper
  };

  Ok(EffectiveConfig {
    source,
    dest,
    mode,
    workers,
    normalization,
  })
}
