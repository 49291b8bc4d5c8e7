use pretty_assertions::assert_eq;
use typedb_config::{ConfigError, LoggingConfig, ScanConfig, TypeDbConfig};

#[test]
fn empty_document_uses_defaults() {
    let config = TypeDbConfig::load_from_str("").unwrap();
    assert_eq!(config.logging, LoggingConfig::default());
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.stderr);
    assert_eq!(config.scan, ScanConfig::default());
    assert!(config.scan.follow_links);
    assert!(!config.catalog.skip_visited_interfaces);
    assert!(config.report.strip_java_lang);
    assert!(!config.report.show_constructors);
}

#[test]
fn full_document_round_trips_through_serde() {
    let text = r#"
[logging]
level = "typedb.catalog=trace"
json = true
stderr = false

[scan]
extensions = ["json"]
skip_files = []
follow_links = false

[catalog]
skip_visited_interfaces = true

[report]
show_constructors = true
strip_java_lang = false
"#;
    let config = TypeDbConfig::load_from_str(text).unwrap();
    assert_eq!(config.logging.level, "typedb.catalog=trace");
    assert!(config.logging.json);
    assert!(!config.logging.stderr);
    assert!(config.scan.skip_files.is_empty());
    assert!(!config.scan.follow_links);

    let rendered = toml::to_string(&config).unwrap();
    assert_eq!(TypeDbConfig::load_from_str(&rendered).unwrap(), config);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = TypeDbConfig::load_from_str("[catalog]\nskip_visited = true\n")
        .expect_err("typo should not parse");
    match err {
        ConfigError::Toml(message) => assert!(message.contains("skip_visited"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn invalid_level_still_builds_a_filter() {
    let logging = LoggingConfig {
        level: "not a [valid directive".to_string(),
        ..LoggingConfig::default()
    };
    // Falls back to `info` instead of failing.
    let _filter = logging.env_filter();
}
