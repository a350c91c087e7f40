//! Configuration discovery and merging.
//!
//! A config is assembled from an ordered stack of sources: built-in
//! defaults at the bottom, then the user-level file, then a project
//! file, then an explicit `--config` path on top. Later sources win
//! key by key. Discovery is separated from merging so the CLI can show
//! the user exactly which files this invocation considers.

use super::file_config::FileConfig;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where one layer of the configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in defaults.
    Defaults,
    /// The user-level file under the platform config directory.
    User(PathBuf),
    /// A `conclave.toml` / `.conclave.toml` in the working directory.
    Project(PathBuf),
    /// A path named with `--config`.
    Explicit(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Defaults => write!(f, "built-in defaults"),
            ConfigSource::User(path) => write!(f, "user config {}", path.display()),
            ConfigSource::Project(path) => write!(f, "project file {}", path.display()),
            ConfigSource::Explicit(path) => write!(f, "--config {}", path.display()),
        }
    }
}

/// The source stack for this invocation, lowest priority first.
///
/// User and project files join the stack only when they exist on disk.
/// An explicit path always joins: a typo there must surface as a load
/// error rather than a silent fall-through to defaults.
pub fn config_sources(explicit: Option<&Path>) -> Vec<ConfigSource> {
    let mut sources = vec![ConfigSource::Defaults];
    if let Some(dir) = dirs::config_dir() {
        let user = dir.join("conclave").join("config.toml");
        if user.exists() {
            sources.push(ConfigSource::User(user));
        }
    }
    if let Some(project) = ["conclave.toml", ".conclave.toml"]
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
    {
        sources.push(ConfigSource::Project(project));
    }
    if let Some(path) = explicit {
        sources.push(ConfigSource::Explicit(path.to_path_buf()));
    }
    sources
}

/// Merge the source stack into one configuration.
///
/// Fails when any layer fails to parse, or when the explicit file is
/// missing.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
    let mut merged = Figment::new();
    for source in config_sources(explicit) {
        merged = match source {
            ConfigSource::Defaults => merged.merge(Serialized::defaults(FileConfig::default())),
            ConfigSource::User(path)
            | ConfigSource::Project(path)
            | ConfigSource::Explicit(path) => merged.merge(Toml::file_exact(path)),
        };
    }
    merged.extract().map_err(Box::new)
}

/// One line per source, for the `show-config` command.
pub fn describe_sources(explicit: Option<&Path>) -> String {
    config_sources(explicit)
        .iter()
        .map(|source| format!("  {}\n", source))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_stack_starts_from_defaults() {
        let sources = config_sources(None);
        assert_eq!(sources.first(), Some(&ConfigSource::Defaults));
    }

    #[test]
    fn explicit_paths_always_join_the_stack() {
        let sources = config_sources(Some(Path::new("custom.toml")));
        assert!(matches!(sources.last(), Some(ConfigSource::Explicit(_))));
    }

    #[test]
    fn explicit_file_overrides_defaults_key_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("override.toml");
        std::fs::write(&path, "[system]\npoll_interval_ms = 25\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.system.poll_interval_ms, 25);
        // Keys the override does not mention keep their defaults
        assert_eq!(config.defaults.reply_timeout_secs, 60);
    }

    #[test]
    fn a_missing_explicit_path_is_an_error() {
        let missing = Path::new("/definitely/not/here/conclave.toml");
        assert!(load_config(Some(missing)).is_err());
    }

    #[test]
    fn sources_render_one_per_line() {
        let listing = describe_sources(None);
        assert!(listing.contains("built-in defaults"));
        assert_eq!(listing.lines().count(), config_sources(None).len());
    }
}
