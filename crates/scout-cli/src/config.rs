use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the deepscout CLI, loaded from
/// `~/.config/deepscout/config.toml`. API keys may instead come from the
/// environment; the env var wins when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub openrouter: OpenRouterEntry,

    #[serde(default)]
    pub serpapi: SerpApiEntry,

    #[serde(default)]
    pub jina: JinaEntry,

    #[serde(default)]
    pub report: ReportEntry,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenRouterEntry {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub base_url: Option<String>,

    /// Model override for every completion call in the run.
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerpApiEntry {
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JinaEntry {
    /// Optional: the reader works unauthenticated at a lower rate limit.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Cap on the evidence context handed to the synthesizer.
    /// 0 disables the cap entirely.
    #[serde(default)]
    pub max_context_chars: Option<usize>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Keys can still come from the environment.
            Ok(Config::default())
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("deepscout").join("config.toml"))
    }

    pub fn openrouter_key(&self) -> Result<String> {
        resolve_key("OPENROUTER_API_KEY", self.openrouter.api_key.as_deref(), "openrouter")
    }

    pub fn serpapi_key(&self) -> Result<String> {
        resolve_key("SERPAPI_API_KEY", self.serpapi.api_key.as_deref(), "serpapi")
    }

    pub fn jina_key(&self) -> Option<String> {
        std::env::var("JINA_API_KEY")
            .ok()
            .or_else(|| self.jina.api_key.clone())
    }
}

fn resolve_key(env_var: &str, configured: Option<&str>, table: &str) -> Result<String> {
    if let Ok(key) = std::env::var(env_var) {
        if !key.is_empty() {
            return Ok(key);
        }
    }
    if let Some(key) = configured {
        return Ok(key.to_string());
    }
    anyhow::bail!(
        "No {table} API key configured. Set {env_var} or add to {}:\n\n\
         [{table}]\n\
         api_key = \"...\"\n",
        Config::config_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "~/.config/deepscout/config.toml".to_string())
    )
}
