use dicom_relabel::index::{self, IdentityNormalization, UNKNOWN_IDENTITY};
use dicom_relabel::{DicomCodec, RelabelError};
use test_support::{init_tracing, scenario_tree, tempdir, write_corrupt, write_record, RecordSpec};

#[test]
fn groups_scenario_tree_by_patient_in_walk_order() {
  init_tracing();
  let src = tempdir();
  let files = scenario_tree(src.path());

  let idx = index::build(&DicomCodec, src.path(), IdentityNormalization::Upper).unwrap();
  assert_eq!(idx.identities(), &["JOHN DOE".to_string(), "JANE ROE".to_string()]);
  let john = idx.get("JOHN DOE").unwrap();
  assert_eq!(john.exemplar, files[0]);
  assert_eq!(john.members, vec![files[0].clone(), files[1].clone(), files[4].clone()]);
  assert_eq!(idx.members("JANE ROE").unwrap(), &files[2..4]);
  assert_eq!(idx.file_count(), 5);
  assert_eq!(idx.skipped(), 0);
}

#[test]
fn skips_undecodable_and_foreign_files() {
  let src = tempdir();
  write_record(&src.path().join("a/1.dcm"), &RecordSpec::new("Doe^John"));
  write_record(&src.path().join("a/2.DCM"), &RecordSpec::new("doe^john"));
  write_corrupt(&src.path().join("a/3.dcm"));
  std::fs::write(src.path().join("a/notes.txt"), "not a record").unwrap();
  write_record(&src.path().join("b/anon.dcm"), &RecordSpec::anonymous());

  let idx = index::build(&DicomCodec, src.path(), IdentityNormalization::Upper).unwrap();
  assert_eq!(idx.identities(), &["DOE^JOHN".to_string(), UNKNOWN_IDENTITY.to_string()]);
  assert_eq!(idx.members("DOE^JOHN").unwrap().len(), 2);
  assert_eq!(idx.skipped(), 1);
}

#[test]
fn spacing_variants_merge_only_when_collapsed() {
  let src = tempdir();
  write_record(&src.path().join("1.dcm"), &RecordSpec::new("Doe  John"));
  write_record(&src.path().join("2.dcm"), &RecordSpec::new("DOE JOHN"));

  let plain = index::build(&DicomCodec, src.path(), IdentityNormalization::Upper).unwrap();
  assert_eq!(plain.len(), 2);
  let collapsed = index::build(&DicomCodec, src.path(), IdentityNormalization::UpperCollapsed).unwrap();
  assert_eq!(collapsed.identities(), &["DOE JOHN".to_string()]);
  assert_eq!(collapsed.members("DOE JOHN").unwrap().len(), 2);
}

#[test]
fn empty_tree_has_no_identities() {
  let src = tempdir();
  let idx = index::build(&DicomCodec, src.path(), IdentityNormalization::Upper).unwrap();
  assert!(idx.is_empty());
}

#[test]
fn missing_root_is_a_scan_error() {
  let src = tempdir();
  let missing = src.path().join("nope");
  let err = index::build(&DicomCodec, &missing, IdentityNormalization::Upper).unwrap_err();
  assert!(matches!(err, RelabelError::Scan { ref path, .. } if *path == missing));
}

#[test]
fn rescan_finds_members_after_a_move() {
  let src = tempdir();
  scenario_tree(src.path());
  std::fs::rename(src.path().join("study3"), src.path().join("archive")).unwrap();
  let found = index::rescan_members(&DicomCodec, src.path(), "JOHN DOE", IdentityNormalization::Upper).unwrap();
  assert_eq!(found.len(), 3);
  assert!(found.iter().any(|p| p.ends_with("archive/img001.dcm")));
}
