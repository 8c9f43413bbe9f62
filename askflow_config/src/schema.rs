use askflow_core::{ConfigProvider, Selection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer clearly and concisely. \
Use markdown tables, lists and code blocks when they make the answer easier to read.";

const CONFIG_DIR: &str = "askflow";
const CONFIG_FILE: &str = "config.json";

const CONFIG_TEMPLATE: &str = r#"{
  "agents": {
    "defaults": {
      "model": "gpt-4o-mini",
      "max_tokens": 4096,
      "temperature": 0.7,
      "system_prompt": "You are a helpful assistant. Answer clearly and concisely.",
      "stream": true
    }
  },
  "providers": {
    "generation": {
      "base_url": "https://api.openai.com/v1",
      "api_key": "your-api-key-here"
    },
    "retrieval": {
      "base_url": "http://localhost:9380/api/v1",
      "api_key": "your-retrieval-key-here",
      "top_k": 8,
      "similarity_threshold": 0.2
    }
  },
  "knowledge_base": null,
  "render": {
    "debounce_ms": 100
  }
}"#;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub agents: AgentsConfig,
    pub providers: ProvidersConfig,
    /// Dataset id; when set, every ask goes through retrieval first.
    #[serde(default)]
    pub knowledge_base: Option<String>,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentsConfig {
    pub defaults: AgentDefaults,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentDefaults {
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default = "AgentDefaults::default_stream")]
    pub stream: bool,
}

impl AgentDefaults {
    const fn default_stream() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub generation: ProviderConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval: Option<RetrievalProviderConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalProviderConfig {
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "RetrievalProviderConfig::default_top_k")]
    pub top_k: usize,
    #[serde(default = "RetrievalProviderConfig::default_similarity_threshold")]
    pub similarity_threshold: f64,
}

impl RetrievalProviderConfig {
    const fn default_top_k() -> usize {
        8
    }

    const fn default_similarity_threshold() -> f64 {
        0.2
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RenderConfig {
    #[serde(default = "RenderConfig::default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            debounce_ms: Self::default_debounce_ms(),
        }
    }
}

impl RenderConfig {
    const fn default_debounce_ms() -> u64 {
        100
    }
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub model: Option<String>,
    pub knowledge_base: Option<String>,
    pub no_stream: bool,
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join(CONFIG_DIR))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'askflow init' to create config.",
                config_path.display()
            );
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config file {}: {e}", path.display()))?;
        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// A knowledge base without a retrieval provider can never be searched.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agents.defaults.model.trim().is_empty() {
            anyhow::bail!("agents.defaults.model must not be empty");
        }
        if self.knowledge_base.is_some() && self.providers.retrieval.is_none() {
            anyhow::bail!("knowledge_base is set but providers.retrieval is missing");
        }
        Ok(())
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = Self::write_template(&config_dir.join(CONFIG_FILE))?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Edit the config file and add your generation API key");
        println!("   2. Optionally set providers.retrieval and knowledge_base to answer from a dataset");
        println!("   3. Run 'askflow chat' to start a conversation");
        println!();
        println!("🔧 Configuration options:");
        println!("   - model: model name sent to the chat-completions endpoint");
        println!("   - stream: render answers incrementally as they arrive");
        println!("   - render.debounce_ms: minimum spacing between screen updates");
        println!();
        Ok(())
    }

    /// Write the template to `path`, refusing to overwrite.
    pub fn write_template(path: &Path) -> anyhow::Result<PathBuf> {
        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }
        std::fs::write(path, CONFIG_TEMPLATE)?;
        info!("Wrote config template to {}", path.display());
        Ok(path.to_path_buf())
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(model) = overrides.model {
            self.agents.defaults.model = model;
        }
        if overrides.knowledge_base.is_some() {
            self.knowledge_base = overrides.knowledge_base;
        }
        if overrides.no_stream {
            self.agents.defaults.stream = false;
        }
        self
    }

    #[must_use]
    pub const fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render.debounce_ms)
    }
}

impl ConfigProvider for Config {
    fn selection(&self) -> Selection {
        let defaults = &self.agents.defaults;
        Selection {
            model: defaults.model.clone(),
            knowledge_base_id: self
                .knowledge_base
                .clone()
                .filter(|id| !id.trim().is_empty()),
            system_prompt: defaults
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            stream: defaults.stream,
        }
    }
}

/// Show only the ends of a secret.
#[must_use]
pub fn masked_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Config {
        serde_json::from_str(
            r#"{
                "agents": {"defaults": {"model": "m", "max_tokens": 100, "temperature": 0.1}},
                "providers": {"generation": {"base_url": "http://h", "api_key": "k"}}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn template_parses_and_validates() {
        let config: Config = serde_json::from_str(CONFIG_TEMPLATE).unwrap();
        config.validate().unwrap();
        assert!(config.agents.defaults.stream);
        assert_eq!(config.render.debounce_ms, 100);
        assert_eq!(config.providers.retrieval.map(|r| r.top_k), Some(8));
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let config = minimal();
        assert!(config.agents.defaults.stream);
        assert_eq!(config.render_interval(), Duration::from_millis(100));
        let selection = config.selection();
        assert_eq!(selection.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(selection.knowledge_base_id, None);
    }

    #[test]
    fn overrides_win() {
        let config = minimal().with_overrides(Overrides {
            model: Some("other".to_string()),
            knowledge_base: Some("kb".to_string()),
            no_stream: true,
        });
        let selection = config.selection();
        assert_eq!(selection.model, "other");
        assert_eq!(selection.knowledge_base_id.as_deref(), Some("kb"));
        assert!(!selection.stream);
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_knowledge_base_means_direct() {
        let mut config = minimal();
        config.knowledge_base = Some("  ".to_string());
        assert_eq!(config.selection().knowledge_base_id, None);
    }

    #[test]
    fn template_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        Config::write_template(&path).unwrap();
        assert!(Config::write_template(&path).is_err());
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.agents.defaults.model, "gpt-4o-mini");
    }

    #[test]
    fn broken_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        let err = Config::load_from(&path).unwrap_err().to_string();
        assert!(err.contains("Invalid config file"));
    }

    #[test]
    fn masking() {
        assert_eq!(masked_key("short"), "*****");
        assert_eq!(masked_key("sk-1234567890abcd"), "sk-1…abcd");
    }
}
