// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for paths, worker sizing, logging setup and man page rendering
// role: utilities/helpers
// inputs: Paths; CPU count; verbosity; clap CommandFactory
// outputs: Canonicalized paths, re-rooted destination paths, worker counts, man page text
// side_effects: init_logging installs the global tracing subscriber (binary only)
// invariants:
// - reroot(p, src, dst) == dst.join(p.strip_prefix(src)); None when p is outside src
// - worker_count_for(n) is always within [MIN_WORKERS, MAX_WORKERS]
// errors: render_man_page surfaces IO errors from the renderer
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use clap::CommandFactory;
use tracing_subscriber::EnvFilter;

pub const MIN_WORKERS: usize = 4;
pub const MAX_WORKERS: usize = 32;
/// Rewrites block on disk far more than on CPU, so the pool over-subscribes cores.
pub const WORKERS_PER_CPU: usize = 5;

pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> PathBuf {
  let p = p.as_ref();
  match std::fs::canonicalize(p) {
    Ok(x) => x,
    Err(_) => match std::env::current_dir() {
      Ok(cwd) => cwd.join(p),
      Err(_) => PathBuf::from(p),
    },
  }
}

/// Maps `path` (below `source_root`) to the same relative location below `dest_root`.
pub fn reroot(path: &Path, source_root: &Path, dest_root: &Path) -> Option<PathBuf> {
  path.strip_prefix(source_root).ok().map(|rel| dest_root.join(rel))
}

/// True when the file name ends in `.dcm`, any case.
pub fn has_record_extension(path: &Path) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|e| e.eq_ignore_ascii_case("dcm"))
}

pub fn worker_count_for(cpus: usize) -> usize {
  cpus.saturating_mul(WORKERS_PER_CPU).clamp(MIN_WORKERS, MAX_WORKERS)
}

pub fn default_worker_count() -> usize {
  let cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
  worker_count_for(cpus)
}

/// Install the stderr subscriber. `RUST_LOG` wins over the verbosity count.
pub fn init_logging(verbosity: u8) {
  let fallback = match verbosity {
    0 => "warn",
    1 => "info",
    _ => "debug",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .try_init();
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
