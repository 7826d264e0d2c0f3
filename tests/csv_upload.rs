use forecast_dashboard::domain::errors::UploadError;
use forecast_dashboard::infrastructure::csv_import;
use std::path::PathBuf;

fn write_temp_csv(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "forecast_dashboard_{}_{}.csv",
        std::process::id(),
        name
    ));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_import_file_with_mixed_case_headers() {
    let path = write_temp_csv(
        "mixed_case",
        " Date , OPEN,high,Low,CLOSE,volume\n2024-03-01,10,11,9,10.5,1000\n2024-03-04,10.5,12,10,11.5,1200\n",
    );

    let history = csv_import::import_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(history.len(), 2);
    assert_eq!(history.records()[1].close, 11.5);
}

#[test]
fn test_import_file_missing_volume_rejected() {
    let path = write_temp_csv(
        "missing_volume",
        "Date,Open,High,Low,Close\n2024-03-01,10,11,9,10.5\n",
    );

    let err = csv_import::import_file(&path).unwrap_err();
    std::fs::remove_file(&path).ok();

    assert!(matches!(err, UploadError::MissingColumns { .. }));
    assert!(err.to_string().contains("Volume"));
}

#[test]
fn test_import_missing_file_is_io_error() {
    let path = std::env::temp_dir().join("forecast_dashboard_does_not_exist.csv");
    assert!(matches!(
        csv_import::import_file(&path),
        Err(UploadError::Io(_))
    ));
}

#[test]
fn test_ragged_row_rejects_whole_file() {
    let err = csv_import::import_bytes(
        b"Date,Open,High,Low,Close,Volume\n2024-03-01,10,11,9,10.5,1000\n2024-03-04,10.5,12\n",
    )
    .unwrap_err();
    assert!(matches!(err, UploadError::Csv(_)));
}
