use assert_cmd::Command;
use dicom_dictionary_std::tags;
use predicates::prelude::*;
use test_support::{cmd_bin, read_text, scenario_tree, tempdir};

const BIN: &str = "dicom-relabel";

#[test]
fn gen_man_outputs_troff() {
  let mut cmd = Command::cargo_bin(BIN).unwrap();
  let out = cmd.args(["--gen-man"]).output().unwrap();
  assert!(out.status.success());
  let text = String::from_utf8_lossy(&out.stdout);
  assert!(text.starts_with(".TH"), "expected troff man header");
  assert!(text.contains("dicom-relabel"));
}

#[test]
fn source_is_required() {
  cmd_bin(BIN)
    .args(["--list"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--source is required"));
}

#[test]
fn destination_must_differ_from_source() {
  let src = tempdir();
  cmd_bin(BIN)
    .arg("--source")
    .arg(src.path())
    .arg("--dest")
    .arg(src.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("must differ"));
}

#[test]
fn single_patient_run_prints_counts_and_writes_copies() {
  let src = tempdir();
  let dst = tempdir();
  scenario_tree(src.path());

  let out = cmd_bin(BIN)
    .arg("--source")
    .arg(src.path())
    .arg("--dest")
    .arg(dst.path())
    .args(["--patient", "john doe", "--study-date", "20/03/2024", "--jobs", "2"])
    .output()
    .unwrap();
  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(v["runs"][0]["identity"], "JOHN DOE");
  assert_eq!(v["runs"][0]["result"]["succeeded"], 3);
  assert_eq!(v["runs"][0]["result"]["failed"], 0);

  let copy = dst.path().join("study3/img001.dcm");
  assert_eq!(read_text(&copy, tags::STUDY_DATE).as_deref(), Some("20240320"));
  // fields not given on the command line keep the exemplar's values
  assert_eq!(read_text(&copy, tags::PATIENT_ID).as_deref(), Some("PID-001"));
  assert_eq!(read_text(&copy, tags::PATIENT_NAME).as_deref(), Some("JOHN DOE"));
}

#[test]
fn unknown_patient_fails() {
  let src = tempdir();
  let dst = tempdir();
  scenario_tree(src.path());
  cmd_bin(BIN)
    .arg("--source")
    .arg(src.path())
    .arg("--dest")
    .arg(dst.path())
    .args(["--patient", "NOBODY"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("NOBODY"));
}

#[test]
fn interactive_session_edits_the_chosen_patient() {
  let src = tempdir();
  let dst = tempdir();
  scenario_tree(src.path());

  // patient 2, keep name/id/birth date, sex O, keep study date/time, then stop
  let out = cmd_bin(BIN)
    .arg("--source")
    .arg(src.path())
    .arg("--dest")
    .arg(dst.path())
    .write_stdin("2\n\n\n\nO\n\n\nn\n")
    .output()
    .unwrap();
  assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

  let stderr = String::from_utf8_lossy(&out.stderr);
  assert!(stderr.contains("Copied and edited 2 files of JANE ROE"), "{stderr}");
  assert!(stderr.contains("Edit another patient?"));

  let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
  assert_eq!(v["runs"].as_array().unwrap().len(), 1);
  assert_eq!(v["runs"][0]["identity"], "JANE ROE");
  assert_eq!(
    read_text(&dst.path().join("study2/img002.dcm"), tags::PATIENT_SEX).as_deref(),
    Some("O")
  );
  assert!(!dst.path().join("study1").exists());
}
