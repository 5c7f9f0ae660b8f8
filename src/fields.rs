// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Catalogue of the six editable fields and the date/time codec between native DICOM text and display text
// role: codec/fields
// inputs: Native DA/TM strings from records; DD/MM/YYYY and HH:MM:SS strings from the form
// outputs: Converted strings; Field metadata (tag, kind, key, label)
// invariants:
// - every codec function is total: unparseable input is returned verbatim
// - encode_date(decode_date(d)) == d for every valid 8-digit date; same for 6-digit times
// - Field::ALL order is the form order
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use chrono::{NaiveDate, NaiveTime};
use dicom_core::Tag;
use dicom_dictionary_std::tags;
use serde::{Deserialize, Serialize};

const NATIVE_DATE: &str = "%Y%m%d";
const DISPLAY_DATE: &str = "%d/%m/%Y";
const NATIVE_TIME: &str = "%H%M%S";
const DISPLAY_TIME: &str = "%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
  Text,
  Date,
  Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
  PatientName,
  PatientId,
  PatientBirthDate,
  PatientSex,
  StudyDate,
  StudyTime,
}

impl Field {
  pub const ALL: [Field; 6] = [
    Field::PatientName,
    Field::PatientId,
    Field::PatientBirthDate,
    Field::PatientSex,
    Field::StudyDate,
    Field::StudyTime,
  ];

  pub fn tag(self) -> Tag {
    match self {
      Field::PatientName => tags::PATIENT_NAME,
      Field::PatientId => tags::PATIENT_ID,
      Field::PatientBirthDate => tags::PATIENT_BIRTH_DATE,
      Field::PatientSex => tags::PATIENT_SEX,
      Field::StudyDate => tags::STUDY_DATE,
      Field::StudyTime => tags::STUDY_TIME,
    }
  }

  pub fn kind(self) -> FieldKind {
    match self {
      Field::PatientBirthDate | Field::StudyDate => FieldKind::Date,
      Field::StudyTime => FieldKind::Time,
      _ => FieldKind::Text,
    }
  }

  /// Stable snake_case key, same as the serde representation.
  pub fn key(self) -> &'static str {
    match self {
      Field::PatientName => "patient_name",
      Field::PatientId => "patient_id",
      Field::PatientBirthDate => "patient_birth_date",
      Field::PatientSex => "patient_sex",
      Field::StudyDate => "study_date",
      Field::StudyTime => "study_time",
    }
  }

  /// Human label shown by the form.
  pub fn label(self) -> &'static str {
    match self {
      Field::PatientName => "Patient name",
      Field::PatientId => "Patient ID",
      Field::PatientBirthDate => "Birth date (DD/MM/YYYY)",
      Field::PatientSex => "Sex",
      Field::StudyDate => "Study date (DD/MM/YYYY)",
      Field::StudyTime => "Study time (HH:MM:SS)",
    }
  }

  pub fn to_display(self, native: &str) -> String {
    match self.kind() {
      FieldKind::Date => decode_date(native),
      FieldKind::Time => decode_time(native),
      FieldKind::Text => native.to_string(),
    }
  }

  /// Converts a form value to the record's native encoding.
  ///
  /// Patient names are upper-cased so the edited copies group under the same
  /// identity key they will be indexed with next time.
  pub fn to_native(self, display: &str) -> String {
    match self.kind() {
      FieldKind::Date => encode_date(display),
      FieldKind::Time => encode_time(display),
      FieldKind::Text if self == Field::PatientName => display.to_uppercase(),
      FieldKind::Text => display.to_string(),
    }
  }
}

impl std::fmt::Display for Field {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.key())
  }
}

fn all_digits(s: &str, len: usize) -> bool {
  s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

/// `YYYYMMDD` → `DD/MM/YYYY`; anything else is returned unchanged.
pub fn decode_date(native: &str) -> String {
  if !all_digits(native, 8) {
    return native.to_string();
  }
  match NaiveDate::parse_from_str(native, NATIVE_DATE) {
    Ok(d) => d.format(DISPLAY_DATE).to_string(),
    Err(_) => native.to_string(),
  }
}

/// `DD/MM/YYYY` → `YYYYMMDD`; anything else is returned unchanged.
pub fn encode_date(display: &str) -> String {
  match NaiveDate::parse_from_str(display, DISPLAY_DATE) {
    Ok(d) => d.format(NATIVE_DATE).to_string(),
    Err(_) => display.to_string(),
  }
}

/// `HHMMSS[.ffffff]` → `HH:MM:SS`; anything else is returned unchanged.
pub fn decode_time(native: &str) -> String {
  let head = native.split('.').next().unwrap_or_default();
  if !all_digits(head, 6) {
    return native.to_string();
  }
  match NaiveTime::parse_from_str(head, NATIVE_TIME) {
    Ok(t) => t.format(DISPLAY_TIME).to_string(),
    Err(_) => native.to_string(),
  }
}

/// `HH:MM:SS` → `HHMMSS`; anything else is returned unchanged.
pub fn encode_time(display: &str) -> String {
  match NaiveTime::parse_from_str(display, DISPLAY_TIME) {
    Ok(t) => t.format(NATIVE_TIME).to_string(),
    Err(_) => display.to_string(),
  }
}
