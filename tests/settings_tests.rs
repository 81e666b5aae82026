use ecpp_assistant::EcppConfig;
use std::io::Write;

#[test]
fn test_settings_file_feeds_config() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "ECPP_SETTINGS_TEST_MODEL=llama3.1").unwrap();
    writeln!(file, "# comment lines are ignored").unwrap();
    file.flush().unwrap();

    ecpp_assistant::load_settings_from(file.path()).unwrap();
    assert_eq!(
        std::env::var("ECPP_SETTINGS_TEST_MODEL").unwrap(),
        "llama3.1"
    );

    let config = EcppConfig::from_lookup(|key| match key {
        "LLM_MODEL" => std::env::var("ECPP_SETTINGS_TEST_MODEL").ok(),
        _ => None,
    });
    assert_eq!(config.llm_model, "llama3.1");
}

#[test]
fn test_missing_settings_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join(".env");
    let err = ecpp_assistant::load_settings_from(&missing).unwrap_err();
    assert!(err.not_found());
}
