//! Extractor configuration: marker vocabulary, docstring headers, scan options
//!
//! Configuration is plain data. Loading from `.toolmap.toml` lives in
//! [`loader`]; the extraction core only ever receives a [`ToolmapConfig`].

mod core;
mod loader;

pub use self::core::{
    default_example_headers, default_ignored_headers, default_include_private,
    default_parameter_headers, default_prompt_markers, default_resource_markers,
    default_returns_headers, default_tool_markers, DocstringConfig, DocstringStyle, MarkerConfig,
    ScanConfig, ToolmapConfig,
};
pub use self::loader::{
    directory_ancestors, load_config, load_config_from, load_config_near,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
