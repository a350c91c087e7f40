//! Built-in model presets.
//!
//! The catalog a fresh install can pick from. All presets ship disabled
//! and without credentials; they only join a council once the user
//! enables them or names them explicitly.

use super::file_config::FileModelConfig;

fn preset(id: &str, name: &str, provider: &str, model: &str, base_url: &str) -> FileModelConfig {
    FileModelConfig {
        id: id.to_string(),
        name: name.to_string(),
        provider: provider.to_string(),
        api_key: String::new(),
        base_url: base_url.to_string(),
        model: model.to_string(),
        enabled: false,
    }
}

/// The built-in preset catalog.
pub fn builtin_presets() -> Vec<FileModelConfig> {
    vec![
        // Anthropic
        preset(
            "claude-sonnet",
            "Claude Sonnet 4.5",
            "anthropic",
            "claude-sonnet-4-5",
            "https://api.anthropic.com",
        ),
        preset(
            "claude-haiku",
            "Claude Haiku 4.5",
            "anthropic",
            "claude-haiku-4-5",
            "https://api.anthropic.com",
        ),
        preset(
            "claude-opus",
            "Claude Opus 4.1",
            "anthropic",
            "claude-opus-4-1",
            "https://api.anthropic.com",
        ),
        // OpenAI
        preset(
            "gpt-5",
            "GPT-5",
            "openai",
            "gpt-5",
            "https://api.openai.com/v1",
        ),
        preset(
            "gpt-5-mini",
            "GPT-5 Mini",
            "openai",
            "gpt-5-mini",
            "https://api.openai.com/v1",
        ),
        preset(
            "gpt-4o",
            "GPT-4o",
            "openai",
            "gpt-4o",
            "https://api.openai.com/v1",
        ),
        // Anthropic-compatible third parties
        preset(
            "kimi-k2",
            "Kimi K2",
            "anthropic",
            "kimi-k2",
            "https://api.kimi.com/coding/v1",
        ),
        preset(
            "minimax-m2",
            "MiniMax M2",
            "anthropic",
            "MiniMax-M2",
            "https://api.minimaxi.com/anthropic/v1",
        ),
    ]
}

/// Look up a preset by id.
pub fn preset_by_id(id: &str) -> Option<FileModelConfig> {
    builtin_presets().into_iter().find(|p| p.id == id)
}

/// Append presets the user has not overridden to a loaded config.
pub fn merge_presets(config: &mut super::FileConfig) {
    for preset in builtin_presets() {
        if config.models.iter().all(|m| m.id != preset.id) {
            config.models.push(preset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileConfig;

    #[test]
    fn presets_ship_disabled_and_keyless() {
        for preset in builtin_presets() {
            assert!(!preset.enabled, "{} must start disabled", preset.id);
            assert!(preset.api_key.is_empty());
            assert!(!preset.provider.is_empty());
        }
    }

    #[test]
    fn preset_lookup() {
        assert!(preset_by_id("claude-sonnet").is_some());
        assert!(preset_by_id("unknown").is_none());
    }

    #[test]
    fn user_entries_shadow_presets() {
        let mut config = FileConfig::default();
        config.models.push(FileModelConfig {
            id: "gpt-4o".to_string(),
            name: "My GPT".to_string(),
            provider: "openai".to_string(),
            api_key: "k".to_string(),
            enabled: true,
            ..Default::default()
        });
        merge_presets(&mut config);

        let entry = config.model_by_id("gpt-4o").unwrap();
        assert_eq!(entry.name, "My GPT");
        assert_eq!(
            config.models.iter().filter(|m| m.id == "gpt-4o").count(),
            1
        );
        // The rest of the catalog is present
        assert!(config.model_by_id("claude-sonnet").is_some());
    }
}
