//! Configuration: raw TOML structures, multi-source loading, and the
//! built-in model preset catalog.

mod file_config;
mod loader;
mod presets;

pub use file_config::{
    FileConfig, FileDefaultsConfig, FileHostConfig, FileModelConfig, FileSystemConfig,
};
pub use loader::{config_sources, describe_sources, load_config, ConfigSource};
pub use presets::{builtin_presets, merge_presets, preset_by_id};
