//! Tests for run file resolution.

use std::fs;

use sans_model::{
    Facility, FileInformation, FileInformationError, FileInformationFactory, Instrument,
    StaticSearchDirectories,
};

#[test]
fn resolves_file_in_search_directory_with_extension() {
    let data_dir = tempfile::tempdir().unwrap();
    fs::write(data_dir.path().join("SANS2D00022024.nxs"), b"").unwrap();

    let provider = StaticSearchDirectories::new(vec![data_dir.path().to_path_buf()]);
    let factory = FileInformationFactory::new(provider);
    let info = factory.create("SANS2D00022024").unwrap();

    assert_eq!(info.instrument(), Instrument::Sans2d);
    assert_eq!(info.facility(), Facility::Isis);
    assert_eq!(info.run_number(), 22024);
    assert_eq!(info.number_of_periods(), 1);
    assert!(info.idf_file_path().is_none());
}

#[test]
fn later_search_directories_are_consulted() {
    let empty = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();
    fs::write(data_dir.path().join("LOQ74044.nxs"), b"").unwrap();

    let provider = StaticSearchDirectories::new(vec![
        empty.path().to_path_buf(),
        data_dir.path().to_path_buf(),
    ]);
    let info = FileInformationFactory::new(provider)
        .create("LOQ74044.nxs")
        .unwrap();
    assert_eq!(info.instrument(), Instrument::Loq);
    assert_eq!(info.run_number(), 74044);
}

#[test]
fn definition_files_follow_instrument_name() {
    let data_dir = tempfile::tempdir().unwrap();
    let definitions = tempfile::tempdir().unwrap();
    fs::write(data_dir.path().join("LARMOR00002260.nxs"), b"").unwrap();

    let provider = StaticSearchDirectories::new(vec![data_dir.path().to_path_buf()])
        .with_definition_directory(definitions.path());
    let info = FileInformationFactory::new(provider)
        .create_with_periods("LARMOR00002260", 4)
        .unwrap();

    assert_eq!(
        info.idf_file_path().unwrap(),
        definitions.path().join("LARMOR_Definition.xml")
    );
    assert_eq!(
        info.ipf_file_path().unwrap(),
        definitions.path().join("LARMOR_Parameters.xml")
    );
    assert!(info.is_multi_period());
}

#[test]
fn missing_file_reports_searched_directories() {
    let data_dir = tempfile::tempdir().unwrap();
    let provider = StaticSearchDirectories::new(vec![data_dir.path().to_path_buf()]);
    let err = FileInformationFactory::new(provider)
        .create("ZOOM00001234")
        .unwrap_err();

    match &err {
        FileInformationError::FileNotFound { searched, .. } => {
            assert_eq!(searched, &vec![data_dir.path().to_path_buf()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.suggestion().is_some());
}

#[test]
fn zero_periods_are_rejected() {
    let provider = StaticSearchDirectories::default();
    let err = FileInformationFactory::new(provider)
        .create_with_periods("LOQ74044", 0)
        .unwrap_err();
    assert!(matches!(err, FileInformationError::InvalidPeriods { .. }));
}
