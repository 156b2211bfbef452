use std::fs;
use std::path::{Path, PathBuf};

use super::core::ToolmapConfig;
use crate::errors::ConfigError;

/// Name of the configuration file searched for by [`load_config`]
pub const CONFIG_FILE_NAME: &str = ".toolmap.toml";

/// Pure function to parse and validate config from TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<ToolmapConfig, ConfigError> {
    let config = toml::from_str::<ToolmapConfig>(contents)?;
    config.validate()?;
    Ok(config)
}

/// Load and validate a specific config file
pub fn load_config_from(path: &Path) -> Result<ToolmapConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_and_validate_config(&contents)
}

/// Try loading config from a path, logging anything but a missing file
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<ToolmapConfig> {
    match load_config_from(config_path) {
        Ok(config) => {
            tracing::debug!(path = %config_path.display(), "Loaded config");
            Some(config)
        }
        Err(ConfigError::Read { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            None
        }
        Err(e) => {
            tracing::warn!(
                path = %config_path.display(),
                error = %e,
                "Ignoring unusable config file"
            );
            None
        }
    }
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Find `.toolmap.toml` in `start` or one of its ancestors
pub fn load_config_near(start: PathBuf) -> ToolmapConfig {
    const MAX_TRAVERSAL_DEPTH: usize = 10;

    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            tracing::debug!(
                depth = MAX_TRAVERSAL_DEPTH,
                "No config found. Using default config."
            );
            ToolmapConfig::default()
        })
}

/// Load config for the current working directory
pub fn load_config() -> ToolmapConfig {
    match std::env::current_dir() {
        Ok(dir) => load_config_near(dir),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to get current directory. Using default config.");
            ToolmapConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocstringStyle;
    use indoc::indoc;
    use tempfile::TempDir;

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let config = parse_and_validate_config(indoc! {r#"
            [markers]
            tool = ["tool", "mcp_tool"]

            [docstring]
            style = "google"
        "#})
        .unwrap();

        assert_eq!(config.markers.tool, vec!["tool", "mcp_tool"]);
        assert_eq!(config.markers.resource, vec!["resource"]);
        assert_eq!(config.docstring.style, DocstringStyle::Google);
        assert_eq!(config.docstring.returns_headers, vec!["Returns"]);
        assert!(config.scan.include_private);
    }

    #[test]
    fn test_parse_rejects_invalid_marker_overlap() {
        let result = parse_and_validate_config(indoc! {r#"
            [markers]
            tool = ["handler"]
            resource = ["handler"]
        "#});
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_parse_rejects_malformed_toml() {
        let result = parse_and_validate_config("[markers\ntool = 1");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_directory_ancestors_limits_depth() {
        let dirs: Vec<_> = directory_ancestors(PathBuf::from("/a/b/c/d"), 2).collect();
        assert_eq!(dirs, vec![PathBuf::from("/a/b/c/d"), PathBuf::from("/a/b/c")]);
    }

    #[test]
    fn test_load_config_near_finds_ancestor_file() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("pkg").join("server");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[markers]\nresource = [\"resource\", \"data\"]\n",
        )
        .unwrap();

        let config = load_config_near(nested);
        assert_eq!(config.markers.resource, vec!["resource", "data"]);
    }

    #[test]
    fn test_load_config_from_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = load_config_from(&temp.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
