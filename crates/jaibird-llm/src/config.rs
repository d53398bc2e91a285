//! LLM configuration and per-function provider selection.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::{LLMProvider, ModelFunction};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Provider and optional model override for one pipeline function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSettings {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
}

impl Default for FunctionSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
        }
    }
}

/// Stored LLM configuration (`llm-config.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default)]
    pub pdf_parse: FunctionSettings,
    #[serde(default)]
    pub summary: FunctionSettings,
    #[serde(default)]
    pub enrich: FunctionSettings,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_anthropic_model() -> String {
    DEFAULT_ANTHROPIC_MODEL.into()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.into(),
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.into(),
            pdf_parse: FunctionSettings::default(),
            summary: FunctionSettings::default(),
            enrich: FunctionSettings::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            config_path: PathBuf::new(),
        }
    }
}

/// A fully resolved provider selection.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    pub provider: LLMProvider,
    pub model: String,
    pub api_key: String,
}

impl LLMConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        let mut config: LLMConfig = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        config.config_path = config_path.to_path_buf();

        // Env vars as fallback for API keys
        if config.openai_api_key.is_none() {
            config.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if config.anthropic_api_key.is_none() {
            config.anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok();
        }

        // Env vars override per-function providers
        for (key, settings) in [
            ("PDF_PARSE_PROVIDER", &mut config.pdf_parse),
            ("SUMMARY_PROVIDER", &mut config.summary),
            ("ENRICH_PROVIDER", &mut config.enrich),
        ] {
            if let Ok(p) = std::env::var(key) {
                settings.provider = p;
            }
        }

        config
    }

    /// Save config to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(&self.config_path, json)?;
        info!("Saved LLM config to {}", self.config_path.display());
        Ok(())
    }

    pub fn settings(&self, function: ModelFunction) -> &FunctionSettings {
        match function {
            ModelFunction::PdfParse => &self.pdf_parse,
            ModelFunction::Summary => &self.summary,
            ModelFunction::Enrich => &self.enrich,
        }
    }

    /// Resolve which provider, model and key a function uses.
    ///
    /// `None` when the provider name is unknown or has no API key.
    pub fn resolve(&self, function: ModelFunction) -> Option<ResolvedModel> {
        let settings = self.settings(function);
        let Some(provider) = LLMProvider::parse(&settings.provider) else {
            warn!(
                "Unknown provider {:?} configured for {}",
                settings.provider, function
            );
            return None;
        };

        let (key, default_model) = match provider {
            LLMProvider::OpenAI => (self.openai_api_key.as_ref(), &self.openai_model),
            LLMProvider::Anthropic => (self.anthropic_api_key.as_ref(), &self.anthropic_model),
        };
        let api_key = key.filter(|k| !k.trim().is_empty())?.clone();

        Some(ResolvedModel {
            provider,
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| default_model.clone()),
            api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_per_function() {
        let config = LLMConfig {
            openai_api_key: Some("sk-test".into()),
            anthropic_api_key: Some("ak-test".into()),
            summary: FunctionSettings {
                provider: "anthropic".into(),
                model: None,
            },
            enrich: FunctionSettings {
                provider: "openai".into(),
                model: Some("gpt-4o".into()),
            },
            ..Default::default()
        };

        let parse = config.resolve(ModelFunction::PdfParse).unwrap();
        assert_eq!(parse.provider, LLMProvider::OpenAI);
        assert_eq!(parse.model, DEFAULT_OPENAI_MODEL);

        let summary = config.resolve(ModelFunction::Summary).unwrap();
        assert_eq!(summary.provider, LLMProvider::Anthropic);
        assert_eq!(summary.api_key, "ak-test");

        let enrich = config.resolve(ModelFunction::Enrich).unwrap();
        assert_eq!(enrich.model, "gpt-4o");
    }

    #[test]
    fn test_resolve_without_key_or_unknown_provider() {
        let mut config = LLMConfig {
            anthropic_api_key: Some("ak-test".into()),
            ..Default::default()
        };
        assert!(config.resolve(ModelFunction::PdfParse).is_none());

        config.pdf_parse.provider = "groq".into();
        assert!(config.resolve(ModelFunction::PdfParse).is_none());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("llm-config.json");

        let mut config = LLMConfig::default();
        config.config_path = path.clone();
        config.enrich.model = Some("gpt-4o".into());
        config.timeout_secs = 15;
        config.save().unwrap();

        let loaded = LLMConfig::load(&path);
        assert_eq!(loaded.enrich.model.as_deref(), Some("gpt-4o"));
        assert_eq!(loaded.timeout_secs, 15);
        assert_eq!(loaded.anthropic_model, DEFAULT_ANTHROPIC_MODEL);
    }
}
