use anyhow::Result;
use bite_test::config::{DEFAULT_EXECUTABLE, HarnessConfig, Overrides, parse_timeout};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn yaml_values_are_trimmed_and_resolved_next_to_the_file() -> Result<()> {
    let dir = tempdir()?;
    let tests = dir.path().join("tests");
    fs::create_dir(&tests)?;
    let file = dir.path().join("harness.yaml");
    let yaml = r#"
Executable: "  build/bite  "
Timeout: 2.5
SourceExtension: ".bt"
ExpectExtension: out
LogDir: logs
"#;
    fs::write(&file, yaml)?;

    let config = HarnessConfig::resolve(Overrides {
        root: Some(tests.clone()),
        config: Some(file),
        ..Overrides::default()
    })?;
    assert_eq!(config.executable, dir.path().join("build/bite"));
    assert_eq!(config.timeout, Duration::from_millis(2500));
    assert_eq!(config.extensions.source, "bt");
    assert_eq!(config.extensions.expect, "out");
    assert_eq!(config.log_dir, dir.path().join("logs"));
    assert_eq!(config.root, tests);
    Ok(())
}

#[test]
fn command_line_wins_over_the_file() -> Result<()> {
    let dir = tempdir()?;
    let file = dir.path().join("harness.yaml");
    fs::write(&file, "BitePath: from-file\nTimeout: 9\n")?;

    let config = HarnessConfig::resolve(Overrides {
        root: Some(dir.path().to_path_buf()),
        config: Some(file),
        executable: Some(PathBuf::from("from-cli")),
        timeout: Some(Duration::from_secs(1)),
        ..Overrides::default()
    })?;
    assert_eq!(config.executable, PathBuf::from("from-cli"));
    assert_eq!(config.timeout, Duration::from_secs(1));
    Ok(())
}

#[test]
fn defaults_apply_without_a_file() -> Result<()> {
    let dir = tempdir()?;
    let config = HarnessConfig::resolve(Overrides {
        root: Some(dir.path().to_path_buf()),
        ..Overrides::default()
    })?;
    assert_eq!(config.executable, PathBuf::from(DEFAULT_EXECUTABLE));
    assert_eq!(config.timeout, Duration::from_secs(4));
    assert_eq!(config.extensions.source, "bite");
    assert_eq!(config.extensions.expect, "expected");
    assert_eq!(config.log_dir, PathBuf::from("."));
    Ok(())
}

#[test]
fn bad_settings_are_rejected() -> Result<()> {
    let dir = tempdir()?;

    let missing_root = HarnessConfig::resolve(Overrides {
        root: Some(dir.path().join("nope")),
        ..Overrides::default()
    });
    assert!(missing_root.is_err());

    let file = dir.path().join("bad.yaml");
    fs::write(&file, "Timeout: -1\n")?;
    let negative = HarnessConfig::resolve(Overrides {
        root: Some(dir.path().to_path_buf()),
        config: Some(file.clone()),
        ..Overrides::default()
    });
    assert!(negative.is_err());

    fs::write(&file, "Timout: 3\n")?;
    let typo = HarnessConfig::resolve(Overrides {
        root: Some(dir.path().to_path_buf()),
        config: Some(file),
        ..Overrides::default()
    });
    assert!(typo.is_err());

    let same_ext = HarnessConfig::resolve(Overrides {
        root: Some(dir.path().to_path_buf()),
        source_ext: Some("txt".into()),
        expect_ext: Some(".txt".into()),
        ..Overrides::default()
    });
    assert!(same_ext.is_err());
    Ok(())
}

#[test]
fn timeout_flag_parsing() {
    assert_eq!(parse_timeout("4"), Ok(Duration::from_secs(4)));
    assert_eq!(parse_timeout(" 0.25 "), Ok(Duration::from_millis(250)));
    assert!(parse_timeout("0").is_err());
    assert!(parse_timeout("-3").is_err());
    assert!(parse_timeout("soon").is_err());
    assert!(parse_timeout("inf").is_err());
}
