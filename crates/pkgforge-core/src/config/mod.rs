//! Configuration management
//!
//! Settings are layered:
//! - Global: user config directory, shared by every project
//! - Project: pkgforge.toml in the project root
//! - Project-Local: `[projects."/path"]` tables in the global config

pub mod merge;
pub mod parser;
pub mod project;
pub mod schema;
pub mod store;

pub use merge::{merge_configs, overlay};
pub use parser::{parse_config, parse_config_str, to_toml};
pub use project::{PROJECT_FILE_NAME, resolve_api_version, source_api_version};
pub use schema::{PkgforgeConfig, Settings};
pub use store::ConfigStore;

/// Config file name for both the global and the project layer.
pub const CONFIG_FILE_NAME: &str = "pkgforge.toml";
