use std::fs;
use std::path::PathBuf;

use muellplan_core::config::{ConfigError, GridConfig, PipelineConfig};

#[test]
fn test_partial_config_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("muellplan.json");
    fs::write(
        &path,
        r#"{
            "year": 2027,
            "pages": [{"image": "scan.png", "crop": [1, 2, 300, 400], "months": ["Jul", "Dec"]}],
            "grid": {"overlap_px": 2}
        }"#,
    )
    .unwrap();

    let config = PipelineConfig::from_file(&path).unwrap();

    assert_eq!(config.year, 2027);
    assert_eq!(
        config.grid,
        GridConfig {
            overlap_px: 2,
            ..GridConfig::default()
        }
    );
    assert!(config.parallel);
    assert_eq!(config.ocr.languages, ["deu", "eng"]);
    assert_eq!(
        config.dataset_path(),
        PathBuf::from("resources/waste_collection_api_data/waste-collection-2027.json")
    );
    assert_eq!(
        config.ocr_csv_path(0, &config.pages[0]),
        PathBuf::from("resources/ocr_results/07_12_2027.csv")
    );
}

#[test]
fn test_page_without_known_months_gets_indexed_name() {
    let mut config = PipelineConfig::default();
    let page = serde_json::from_str(r#"{"image": "a.png", "crop": [0, 0, 1, 1], "months": []}"#)
        .unwrap();
    config.pages.push(page);

    assert_eq!(
        config.ocr_csv_path(1, &config.pages[0]),
        PathBuf::from("resources/ocr_results/page_1_2026.csv")
    );
}

#[test]
fn test_missing_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let config = PipelineConfig::load_or_default(dir.path().join("absent.json")).unwrap();

    assert_eq!(config, PipelineConfig::default());
}

#[test]
fn test_malformed_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("muellplan.json");
    fs::write(&path, "{\"year\": \"soon\"}").unwrap();

    let err = PipelineConfig::load_or_default(&path).unwrap_err();

    assert!(matches!(err, ConfigError::Parse { .. }));
}
