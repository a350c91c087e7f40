//! Raw TOML configuration data types
//!
//! These structs mirror the exact structure of the config file and are
//! deserialized directly; conversion into runtime types happens where the
//! council is wired together.

use conclave_application::broadcaster::OverflowPolicy;
use conclave_domain::{ParticipantConfig, ParticipantId, UnknownProviderError, HOST_ID};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub system: FileSystemConfig,
    pub defaults: FileDefaultsConfig,
    pub host: FileHostConfig,
    /// Model catalog; presets are merged beneath user entries.
    pub models: Vec<FileModelConfig>,
}

/// `[system]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSystemConfig {
    /// Root under which per-session directories are created. `~` expands.
    pub session_dir: String,
    /// Transcript poll interval for tailing cursors, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for FileSystemConfig {
    fn default() -> Self {
        Self {
            session_dir: "~/.conclave/sessions".to_string(),
            poll_interval_ms: 200,
        }
    }
}

/// `[defaults]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDefaultsConfig {
    /// Deadline for a single backend completion call, in seconds.
    pub reply_timeout_secs: u64,
    /// Capacity of the broadcaster's submission channel.
    pub channel_capacity: usize,
    /// Shutdown drain deadline for the broadcaster, in milliseconds.
    pub drain_deadline_ms: u64,
    /// `"block"` or `"drop-newest"`.
    pub overflow_policy: String,
    /// Emit `system` diagnostic records when a backend call fails.
    pub announce_failures: bool,
}

impl Default for FileDefaultsConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: 60,
            channel_capacity: 100,
            drain_deadline_ms: 2000,
            overflow_policy: "block".to_string(),
            announce_failures: false,
        }
    }
}

/// `[host]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHostConfig {
    /// Sender id the host uses on the transcript.
    pub id: String,
    /// The interactive front-end command.
    pub command: String,
    pub args: Vec<String>,
}

impl Default for FileHostConfig {
    fn default() -> Self {
        Self {
            id: HOST_ID.to_string(),
            command: "claude".to_string(),
            args: Vec::new(),
        }
    }
}

/// One `[[models]]` entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    pub id: String,
    pub name: String,
    pub provider: String,
    /// `${VAR}` / `$VAR` references are expanded from the environment.
    pub api_key: String,
    /// Provider endpoint override; the adapter default when empty.
    pub base_url: String,
    /// Model tag passed to the provider; the entry id when empty.
    pub model: String,
    pub enabled: bool,
}

impl FileConfig {
    /// Models marked enabled in the catalog.
    pub fn enabled_models(&self) -> Vec<FileModelConfig> {
        self.models.iter().filter(|m| m.enabled).cloned().collect()
    }

    /// Look up a catalog entry by id.
    pub fn model_by_id(&self, id: &str) -> Option<&FileModelConfig> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Expand `${VAR}` / `$VAR` references in api keys and `~` in the
    /// session root.
    pub fn expand(&mut self) {
        for model in &mut self.models {
            model.api_key = expand_env_vars(&model.api_key);
        }
        self.system.session_dir = expand_home(&self.system.session_dir);
    }

    /// Convert a catalog entry into a participant configuration.
    pub fn to_participant(entry: &FileModelConfig) -> Result<ParticipantConfig, UnknownProviderError> {
        Ok(ParticipantConfig {
            id: ParticipantId::from(entry.id.clone()),
            name: if entry.name.is_empty() {
                entry.id.clone()
            } else {
                entry.name.clone()
            },
            provider: entry.provider.parse()?,
            api_key: entry.api_key.clone(),
            base_url: (!entry.base_url.is_empty()).then(|| entry.base_url.clone()),
            model: if entry.model.is_empty() {
                entry.id.clone()
            } else {
                entry.model.clone()
            },
        })
    }

    /// Parse the overflow policy, falling back to blocking backpressure.
    pub fn overflow_policy(&self) -> OverflowPolicy {
        match self.defaults.overflow_policy.as_str() {
            "block" => OverflowPolicy::Block,
            "drop-newest" => OverflowPolicy::DropNewest,
            other => {
                warn!(value = other, "unknown overflow_policy, using \"block\"");
                OverflowPolicy::Block
            }
        }
    }
}

/// Expand `${VAR}` and `$VAR` environment references. Unset variables
/// expand to the empty string.
pub(crate) fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if closed {
                    out.push_str(&std::env::var(&name).unwrap_or_default());
                } else {
                    // Unterminated reference: keep the literal text
                    out.push_str("${");
                    out.push_str(&name);
                }
            }
            Some(c) if c.is_ascii_alphanumeric() || *c == '_' => {
                let mut name = String::new();
                while let Some(c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || *c == '_' {
                        name.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&std::env::var(&name).unwrap_or_default());
            }
            _ => out.push('$'),
        }
    }
    out
}

/// Expand a leading `~/` to the user's home directory.
pub(crate) fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().into_owned();
        }
    }
    path.to_string()
}
