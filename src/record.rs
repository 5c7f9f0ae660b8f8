// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Record capability (decode / get / set / encode) and its DICOM Part 10 implementation
// role: io/record
// inputs: File paths; ReadDepth; Field + native string values
// outputs: Record handles; new files written at destination paths
// side_effects: Reads source files; encode() creates or truncates the destination file only
// invariants:
// - HeaderOnly decoding stops before Pixel Data
// - set() keeps the element's existing VR and never adds elements the record lacks
// - get() strips DICOM trailing padding (space / NUL)
// errors: DecodeError, SetError, EncodeError carry the path or field plus the library message
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::Path;

use dicom_core::{DataElement, PrimitiveValue, VR};
use dicom_dictionary_std::tags;
use dicom_object::{DefaultDicomObject, OpenFileOptions};

use crate::error::{DecodeError, EncodeError, SetError};
use crate::fields::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadDepth {
  /// Metadata only; enough for indexing and form pre-fill.
  HeaderOnly,
  /// Everything, payload included; required before re-encoding.
  Full,
}

/// One decoded record.
pub trait Record {
  fn has(&self, field: Field) -> bool;
  fn get(&self, field: Field) -> Option<String>;
  fn set(&mut self, field: Field, value: &str) -> Result<(), SetError>;
  fn encode(&self, path: &Path) -> Result<(), EncodeError>;
}

/// Source of records. Shared by every worker of a run, hence `Sync`.
pub trait RecordCodec: Send + Sync {
  type Record: Record;

  fn decode(&self, path: &Path, depth: ReadDepth) -> Result<Self::Record, DecodeError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DicomCodec;

pub struct DicomRecord {
  obj: DefaultDicomObject,
}

impl RecordCodec for DicomCodec {
  type Record = DicomRecord;

  fn decode(&self, path: &Path, depth: ReadDepth) -> Result<DicomRecord, DecodeError> {
    let opened = match depth {
      ReadDepth::HeaderOnly => OpenFileOptions::new().read_until(tags::PIXEL_DATA).open_file(path),
      ReadDepth::Full => OpenFileOptions::new().open_file(path),
    };
    opened.map(|obj| DicomRecord { obj }).map_err(|e| DecodeError {
      path: path.to_path_buf(),
      message: e.to_string(),
    })
  }
}

fn strip_padding(s: &str) -> &str {
  s.trim_end_matches(|c: char| c == ' ' || c == '\0')
}

impl Record for DicomRecord {
  fn has(&self, field: Field) -> bool {
    matches!(self.obj.element_opt(field.tag()), Ok(Some(_)))
  }

  fn get(&self, field: Field) -> Option<String> {
    let elem = self.obj.element_opt(field.tag()).ok()??;
    let text = elem.to_str().ok()?;
    Some(strip_padding(&text).to_string())
  }

  fn set(&mut self, field: Field, value: &str) -> Result<(), SetError> {
    let vr = match self.obj.element_opt(field.tag()) {
      Ok(Some(elem)) => elem.vr(),
      Ok(None) => {
        return Err(SetError {
          field,
          message: "element not present".into(),
        })
      }
      Err(e) => {
        return Err(SetError {
          field,
          message: e.to_string(),
        })
      }
    };
    if vr == VR::SQ {
      return Err(SetError {
        field,
        message: "element is a sequence".into(),
      });
    }
    self
      .obj
      .put(DataElement::new(field.tag(), vr, PrimitiveValue::from(value.to_string())));
    Ok(())
  }

  fn encode(&self, path: &Path) -> Result<(), EncodeError> {
    self.obj.write_to_file(path).map_err(|e| EncodeError {
      path: path.to_path_buf(),
      message: e.to_string(),
    })
  }
}
