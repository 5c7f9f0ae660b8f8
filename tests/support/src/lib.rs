//! test-support: helpers shared by unit and integration tests.
//!
//! Add as a dev-dependency in the top-level `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test_support = { path = "tests/support" }
//! ```
//!
//! Then in tests:
//! ```rust,no_run
//! use test_support::{init_tracing, tempdir, write_record, RecordSpec};
//!
//! init_tracing();
//! let td = tempdir();
//! write_record(&td.path().join("study1/img001.dcm"), &RecordSpec::new("John Doe"));
//! ```

use once_cell::sync::Lazy;
use tracing_subscriber::{fmt, EnvFilter};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use dicom_core::{DataElement, PrimitiveValue, Tag, VR};
use dicom_dictionary_std::{tags, uids};
use dicom_object::{open_file, FileMetaTableBuilder, InMemDicomObject};

/// Initialize `tracing` once, honoring `RUST_LOG` and writing via the test writer.
///
/// Safe to call from multiple tests; only the first call configures the global subscriber.
pub fn init_tracing() {
    static INIT: Lazy<()> = Lazy::new(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("warn,dicom_relabel=info"))
            .unwrap();
        // with_test_writer() causes logs to appear alongside failing tests only (cargo/nextest)
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
    Lazy::force(&INIT);
}

/// Create a temp directory that deletes on drop.
pub fn tempdir() -> tempfile::TempDir {
    tempfile::tempdir().expect("create tempdir")
}

/// Run a binary target with `assert_cmd`, returning the ready-to-run `Command`.
pub fn cmd_bin(bin: &str) -> assert_cmd::Command {
    init_tracing();
    assert_cmd::Command::cargo_bin(bin).expect("binary target not found")
}

/// Payload written into Pixel Data unless a spec says otherwise.
pub const DEFAULT_PIXELS: [u8; 4] = [1, 2, 3, 4];

static NEXT_INSTANCE: AtomicUsize = AtomicUsize::new(1);

/// Description of one fixture record. Absent fields are not written at all.
#[derive(Debug, Clone)]
pub struct RecordSpec {
    pub name: Option<String>,
    pub patient_id: Option<String>,
    pub birth_date: Option<String>,
    pub sex: Option<String>,
    pub study_date: Option<String>,
    pub study_time: Option<String>,
    pub pixels: Vec<u8>,
}

impl RecordSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            patient_id: None,
            birth_date: None,
            sex: None,
            study_date: None,
            study_time: None,
            pixels: DEFAULT_PIXELS.to_vec(),
        }
    }

    /// A record with no Patient Name element.
    pub fn anonymous() -> Self {
        Self {
            name: None,
            ..Self::new("")
        }
    }

    pub fn patient_id(mut self, v: &str) -> Self {
        self.patient_id = Some(v.to_string());
        self
    }

    pub fn birth_date(mut self, v: &str) -> Self {
        self.birth_date = Some(v.to_string());
        self
    }

    pub fn sex(mut self, v: &str) -> Self {
        self.sex = Some(v.to_string());
        self
    }

    pub fn study_date(mut self, v: &str) -> Self {
        self.study_date = Some(v.to_string());
        self
    }

    pub fn study_time(mut self, v: &str) -> Self {
        self.study_time = Some(v.to_string());
        self
    }

    pub fn pixels(mut self, bytes: &[u8]) -> Self {
        self.pixels = bytes.to_vec();
        self
    }
}

fn put_text(obj: &mut InMemDicomObject, tag: Tag, vr: VR, value: &Option<String>) {
    if let Some(v) = value {
        obj.put(DataElement::new(tag, vr, PrimitiveValue::from(v.as_str())));
    }
}

/// Write a Part 10 file (explicit VR little endian) at `path`, creating parent directories.
pub fn write_record(path: &Path, spec: &RecordSpec) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|e| panic!("failed to create {}: {e}", parent.display()));
    }
    let n = NEXT_INSTANCE.fetch_add(1, Ordering::SeqCst);
    let instance_uid = format!("1.2.826.0.1.3680043.9.7433.{}.{n}", std::process::id());

    let mut obj = InMemDicomObject::new_empty();
    obj.put(DataElement::new(
        tags::SOP_CLASS_UID,
        VR::UI,
        PrimitiveValue::from(uids::SECONDARY_CAPTURE_IMAGE_STORAGE),
    ));
    obj.put(DataElement::new(
        tags::SOP_INSTANCE_UID,
        VR::UI,
        PrimitiveValue::from(instance_uid.as_str()),
    ));
    put_text(&mut obj, tags::PATIENT_NAME, VR::PN, &spec.name);
    put_text(&mut obj, tags::PATIENT_ID, VR::LO, &spec.patient_id);
    put_text(&mut obj, tags::PATIENT_BIRTH_DATE, VR::DA, &spec.birth_date);
    put_text(&mut obj, tags::PATIENT_SEX, VR::CS, &spec.sex);
    put_text(&mut obj, tags::STUDY_DATE, VR::DA, &spec.study_date);
    put_text(&mut obj, tags::STUDY_TIME, VR::TM, &spec.study_time);
    obj.put(DataElement::new(
        tags::PIXEL_DATA,
        VR::OB,
        PrimitiveValue::from(spec.pixels.clone()),
    ));

    let file = obj
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(uids::SECONDARY_CAPTURE_IMAGE_STORAGE)
                .media_storage_sop_instance_uid(instance_uid),
        )
        .expect("valid file meta");
    file.write_to_file(path)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
}

/// Write bytes that no DICOM reader accepts.
pub fn write_corrupt(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, b"this is not a DICOM file").expect("write corrupt file");
}

/// Read a text element, without DICOM padding; `None` when the element is absent.
pub fn read_text(path: &Path, tag: Tag) -> Option<String> {
    let obj = open_file(path).unwrap_or_else(|e| panic!("failed to open {}: {e}", path.display()));
    let elem = obj.element_opt(tag).expect("element lookup")?;
    let text = elem.to_str().expect("text element");
    Some(text.trim_end_matches(|c: char| c == ' ' || c == '\0').to_string())
}

/// Pixel Data bytes of the record at `path`.
pub fn read_pixels(path: &Path) -> Vec<u8> {
    let obj = open_file(path).unwrap_or_else(|e| panic!("failed to open {}: {e}", path.display()));
    let elem = obj.element(tags::PIXEL_DATA).expect("pixel data present");
    elem.to_bytes().expect("pixel bytes").into_owned()
}

/// Two studies of "John Doe" and one of "Jane Roe":
///
/// ```text
/// study1/img001.dcm  John Doe  20230115
/// study1/img002.dcm  John Doe  20230115
/// study2/img001.dcm  Jane Roe
/// study2/img002.dcm  Jane Roe
/// study3/img001.dcm  John Doe
/// ```
pub fn scenario_tree(root: &Path) -> Vec<PathBuf> {
    let john = RecordSpec::new("John Doe")
        .patient_id("PID-001")
        .sex("M")
        .study_date("20230115")
        .study_time("101530");
    let jane = RecordSpec::new("Jane Roe").patient_id("PID-002").sex("F");
    let layout = [
        ("study1/img001.dcm", &john),
        ("study1/img002.dcm", &john),
        ("study2/img001.dcm", &jane),
        ("study2/img002.dcm", &jane),
        ("study3/img001.dcm", &john),
    ];
    layout
        .iter()
        .map(|(rel, spec)| {
            let path = root.join(rel);
            write_record(&path, spec);
            path
        })
        .collect()
}
