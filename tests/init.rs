use std::process::Command;

#[test]
fn init_creates_valid_toml() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_evolens"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success(), "evolens init failed: {}", String::from_utf8_lossy(&output.stderr));

    let config_path = dir.path().join(".evolens.toml");
    assert!(config_path.exists(), ".evolens.toml should exist");

    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[history]"));
    assert!(content.contains("[[taxonomy]]"));
    assert!(content.contains(r##"# line_comments = ["//", "#"]"##));

    // The generated template must parse back to the built-in defaults
    let config: evolens_core::EvolensConfig = toml::from_str(&content).unwrap();
    let defaults = evolens_core::EvolensConfig::default();
    assert_eq!(config.history.extensions, defaults.history.extensions);
    assert_eq!(config.taxonomy, defaults.taxonomy);
}

#[test]
fn init_refuses_if_exists() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".evolens.toml"), "# existing").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_evolens"))
        .arg("init")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let existing = std::fs::read_to_string(dir.path().join(".evolens.toml")).unwrap();
    assert_eq!(existing, "# existing");
}
