use indoc::indoc;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;
use toolmap::config::{parse_and_validate_config, CONFIG_FILE_NAME};
use toolmap::{
    load_config_from, load_config_near, ConfigError, DocstringStyle, Extractor, SourceUnit,
    ToolmapConfig,
};

#[test]
fn test_empty_config_is_default() {
    let config = parse_and_validate_config("").unwrap();
    assert_eq!(config, ToolmapConfig::default());
}

#[test]
fn test_load_config_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        indoc! {r#"
            [markers]
            tool = ["tool", "action"]

            [docstring]
            style = "numpy"

            [scan]
            include_private = false
        "#},
    )
    .unwrap();

    let config = load_config_from(&path).unwrap();
    assert_eq!(config.markers.tool, vec!["tool", "action"]);
    assert_eq!(config.markers.resource, ToolmapConfig::default().markers.resource);
    assert_eq!(config.docstring.style, DocstringStyle::Numpy);
    assert!(!config.scan.include_private);
}

#[test]
fn test_load_config_near_walks_up() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("pkg").join("server");
    fs::create_dir_all(&nested).unwrap();
    fs::write(
        temp_dir.path().join(CONFIG_FILE_NAME),
        "[scan]\ninclude_private = false\n",
    )
    .unwrap();

    let config = load_config_near(nested);
    assert!(!config.scan.include_private);
}

#[test]
fn test_invalid_configs_are_rejected() {
    let shared = parse_and_validate_config(indoc! {r#"
        [markers]
        tool = ["tool", "expose"]
        prompt = ["expose"]
    "#})
    .unwrap_err();
    assert!(matches!(shared, ConfigError::Invalid(_)));

    let empty = parse_and_validate_config("[markers]\nresource = []\n").unwrap_err();
    assert!(matches!(empty, ConfigError::Invalid(_)));

    let malformed = parse_and_validate_config("[docstring\nstyle = 1").unwrap_err();
    assert!(matches!(malformed, ConfigError::Toml(_)));

    let temp_dir = TempDir::new().unwrap();
    let missing = load_config_from(&temp_dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(missing, ConfigError::Read { .. }));
}

#[test]
fn test_configured_markers_and_privacy_drive_extraction() {
    let config = parse_and_validate_config(indoc! {r#"
        [markers]
        tool = ["action"]

        [scan]
        include_private = false
    "#})
    .unwrap();
    let unit = SourceUnit::new(
        "server.py",
        indoc! {r#"
            @server.action
            def visible(x: int):
                pass

            @server.action()
            def _hidden(x: int):
                pass

            @mcp.tool()
            def not_a_marker_anymore():
                pass
        "#},
    );

    let report = Extractor::new(config).extract(&unit).unwrap();
    let names: Vec<&str> = report.descriptors.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["visible"]);
}
