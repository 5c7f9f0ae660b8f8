// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Line-oriented Form over any reader/writer pair (stdin/stderr in the binary)
// role: ui/terminal
// inputs: User lines: list numbers or names, field values, y/n answers
// outputs: Prompts, a progress line and completion messages on the writer
// side_effects: Reads the input stream; writes prompts (never to stdout, which carries JSON)
// invariants:
// - Enter keeps the current value; a lone "-" clears the field
// - end of input behaves like "stop": no identity, keep values, do not continue
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::fmt;
use std::io::{BufRead, Write};

use crate::error::RelabelError;
use crate::fields::Field;
use crate::model::{FieldValues, Progress, RunResult};
use crate::orchestrator::Form;

const CLEAR: &str = "-";

pub struct TerminalForm<R, W> {
  input: R,
  out: W,
}

impl<R: BufRead, W: Write> TerminalForm<R, W> {
  pub fn new(input: R, out: W) -> Self {
    Self { input, out }
  }

  pub fn into_inner(self) -> (R, W) {
    (self.input, self.out)
  }

  // Prompt output is best effort; a closed terminal shows up as EOF on the next read.
  fn say(&mut self, args: fmt::Arguments<'_>) {
    let _ = self.out.write_fmt(args);
    let _ = self.out.flush();
  }

  /// Next input line without its newline; `None` at end of input.
  fn read_line(&mut self) -> Option<String> {
    let mut line = String::new();
    match self.input.read_line(&mut line) {
      Ok(0) | Err(_) => None,
      Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
    }
  }
}

impl<R: BufRead, W: Write> Form for TerminalForm<R, W> {
  fn choose_identity(&mut self, pending: &[String]) -> Option<String> {
    self.say(format_args!("\nPatients pending:\n"));
    for (i, identity) in pending.iter().enumerate() {
      self.say(format_args!("  {:>3}. {}\n", i + 1, identity));
    }
    loop {
      self.say(format_args!("Choose a patient (number or name, empty to quit): "));
      let answer = self.read_line()?;
      let answer = answer.trim();
      if answer.is_empty() {
        return None;
      }
      if let Ok(n) = answer.parse::<usize>() {
        if let Some(identity) = n.checked_sub(1).and_then(|i| pending.get(i)) {
          return Some(identity.clone());
        }
      }
      if let Some(identity) = pending.iter().find(|p| p.eq_ignore_ascii_case(answer)) {
        return Some(identity.clone());
      }
      self.say(format_args!("No such patient: {answer}\n"));
    }
  }

  fn edit_fields(&mut self, identity: &str, current: &FieldValues) -> FieldValues {
    self.say(format_args!(
      "\nEditing {identity}. Enter keeps the value shown, \"{CLEAR}\" clears it.\n"
    ));
    let mut edited = FieldValues::new();
    for field in Field::ALL {
      let shown = current.get(&field).cloned().unwrap_or_default();
      self.say(format_args!("  {} [{}]: ", field.label(), shown));
      let value = match self.read_line() {
        Some(line) if line.trim() == CLEAR => String::new(),
        Some(line) if !line.trim().is_empty() => line.trim().to_string(),
        _ => shown,
      };
      edited.insert(field, value);
    }
    edited
  }

  fn progress(&mut self, progress: Progress) {
    self.say(format_args!("\r  {}/{} files", progress.current, progress.total));
    if progress.current == progress.total {
      self.say(format_args!("\n"));
    }
  }

  fn finished(&mut self, identity: &str, result: &RunResult) {
    self.say(format_args!(
      "Copied and edited {} files of {}",
      result.succeeded, identity
    ));
    if result.failed > 0 {
      self.say(format_args!(" ({} failed)", result.failed));
    }
    if result.cancelled {
      self.say(format_args!(" (cancelled, {} skipped)", result.skipped));
    }
    self.say(format_args!("\n"));
  }

  fn failed(&mut self, identity: &str, error: &RelabelError) {
    self.say(format_args!("Could not process {identity}: {error}\n"));
  }

  fn continue_with_next(&mut self) -> bool {
    self.say(format_args!("Edit another patient? [y/N]: "));
    matches!(
      self.read_line().map(|l| l.trim().to_ascii_lowercase()).as_deref(),
      Some("y" | "yes")
    )
  }

  fn nothing_pending(&mut self) {
    self.say(format_args!("No patients left to process.\n"));
  }
}
