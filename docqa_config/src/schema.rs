use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use docqa_conversation::{ConversationConfig, DEFAULT_PROMPT_TEMPLATE};
use docqa_core::{ConfigurationError, TurnError};
use docqa_index::{FetchConfig, IndexingConfig};
use docqa_providers::{ProviderSettings, RetryPolicy};
use tracing::debug;

/// Environment variable that overrides `provider.api_key`.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Key written by `docqa init`; rejected at startup.
pub const API_KEY_PLACEHOLDER: &str = "your-openai-api-key-here";

const CONFIG_TEMPLATE: &str = r#"{
  "provider": {
    "api_key": "your-openai-api-key-here",
    "base_url": "https://api.openai.com/v1",
    "chat_model": "gpt-3.5-turbo",
    "embedding_model": "text-embedding-ada-002",
    "max_tokens": 512,
    "temperature": 0.7,
    "retry_delays_ms": [1000, 2000, 4000]
  },
  "conversation": {
    "history_window_size": 6,
    "snippet_window_size": 4,
    "retrieval_query_window_size": 4,
    "top_k": 4,
    "prompt_template": null,
    "query_includes_current_input": false,
    "retrieval_timeout_secs": null,
    "generation_timeout_secs": null
  },
  "indexing": {
    "chunk_size": 1000,
    "chunk_overlap": 100,
    "download_timeout_secs": 60,
    "max_download_bytes": 52428800
  }
}
"#;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub conversation: ConversationSection,
    #[serde(default)]
    pub indexing: IndexingSection,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "ProviderConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ProviderConfig::default_chat_model")]
    pub chat_model: String,
    #[serde(default = "ProviderConfig::default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "ProviderConfig::default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "ProviderConfig::default_temperature")]
    pub temperature: f32,
    /// Waits before each retry of a transient provider failure
    #[serde(default = "ProviderConfig::default_retry_delays_ms")]
    pub retry_delays_ms: Vec<u64>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::default_base_url(),
            chat_model: Self::default_chat_model(),
            embedding_model: Self::default_embedding_model(),
            max_tokens: Self::default_max_tokens(),
            temperature: Self::default_temperature(),
            retry_delays_ms: Self::default_retry_delays_ms(),
        }
    }
}

impl ProviderConfig {
    fn default_base_url() -> String {
        "https://api.openai.com/v1".to_string()
    }

    fn default_chat_model() -> String {
        "gpt-3.5-turbo".to_string()
    }

    fn default_embedding_model() -> String {
        "text-embedding-ada-002".to_string()
    }

    const fn default_max_tokens() -> u32 {
        512
    }

    const fn default_temperature() -> f32 {
        0.7
    }

    fn default_retry_delays_ms() -> Vec<u64> {
        vec![1000, 2000, 4000]
    }

    /// First and last four characters of the key, for display.
    #[must_use]
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if self.api_key.is_empty() {
            "(not set)".to_string()
        } else if chars.len() > 8 {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{head}...{tail}")
        } else {
            "***".to_string()
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversationSection {
    #[serde(default = "ConversationSection::default_history_window_size")]
    pub history_window_size: usize,
    #[serde(default = "ConversationSection::default_snippet_window_size")]
    pub snippet_window_size: usize,
    #[serde(default = "ConversationSection::default_retrieval_query_window_size")]
    pub retrieval_query_window_size: usize,
    #[serde(default = "ConversationSection::default_top_k")]
    pub top_k: usize,
    /// Replaces the built-in prompt when set
    #[serde(default)]
    pub prompt_template: Option<String>,
    #[serde(default)]
    pub query_includes_current_input: bool,
    #[serde(default)]
    pub retrieval_timeout_secs: Option<u64>,
    #[serde(default)]
    pub generation_timeout_secs: Option<u64>,
}

impl Default for ConversationSection {
    fn default() -> Self {
        Self {
            history_window_size: Self::default_history_window_size(),
            snippet_window_size: Self::default_snippet_window_size(),
            retrieval_query_window_size: Self::default_retrieval_query_window_size(),
            top_k: Self::default_top_k(),
            prompt_template: None,
            query_includes_current_input: false,
            retrieval_timeout_secs: None,
            generation_timeout_secs: None,
        }
    }
}

impl ConversationSection {
    const fn default_history_window_size() -> usize {
        6
    }

    const fn default_snippet_window_size() -> usize {
        4
    }

    const fn default_retrieval_query_window_size() -> usize {
        4
    }

    const fn default_top_k() -> usize {
        4
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingSection {
    #[serde(default = "IndexingSection::default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "IndexingSection::default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "IndexingSection::default_download_timeout_secs")]
    pub download_timeout_secs: u64,
    #[serde(default = "IndexingSection::default_max_download_bytes")]
    pub max_download_bytes: u64,
}

impl Default for IndexingSection {
    fn default() -> Self {
        Self {
            chunk_size: Self::default_chunk_size(),
            chunk_overlap: Self::default_chunk_overlap(),
            download_timeout_secs: Self::default_download_timeout_secs(),
            max_download_bytes: Self::default_max_download_bytes(),
        }
    }
}

impl IndexingSection {
    const fn default_chunk_size() -> usize {
        1000
    }

    const fn default_chunk_overlap() -> usize {
        100
    }

    const fn default_download_timeout_secs() -> u64 {
        60
    }

    const fn default_max_download_bytes() -> u64 {
        50 * 1024 * 1024
    }
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("docqa"))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load `~/docqa/config.json`, then apply the `OPENAI_API_KEY` override.
    pub fn load() -> anyhow::Result<Self> {
        let config = Self::load_from(&Self::config_path()?)?;
        Ok(config.with_api_key_override(std::env::var(API_KEY_ENV).ok()))
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'docqa init' to create config.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Self = serde_json::from_str(&content)?;
        debug!("Loaded config from {}", config_path.display());

        Ok(config)
    }

    /// A non-blank override replaces the configured API key.
    #[must_use]
    pub fn with_api_key_override(mut self, api_key: Option<String>) -> Self {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            debug!("Using API key from {API_KEY_ENV}");
            self.provider.api_key = key.trim().to_string();
        }
        self
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");
        Self::write_template(&config_path)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Edit the config file and add your OpenAI API key");
        println!("      (or export {API_KEY_ENV})");
        println!("   2. Make sure poppler's pdftotext and pdfinfo are on your PATH");
        println!("   3. Run 'docqa chat --url <PDF URL>' to start asking questions");
        println!();
        println!("🔧 Configuration options:");
        println!("   - provider.chat_model / embedding_model: models to call");
        println!("   - conversation.history_window_size: turns shown to the model");
        println!("   - conversation.snippet_window_size: document excerpts kept across turns");
        println!("   - indexing.chunk_size / chunk_overlap: how pages are split");
        println!();
        Ok(())
    }

    /// Write the default template, refusing to overwrite an existing file.
    pub fn write_template(config_path: &Path) -> anyhow::Result<()> {
        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(config_path, CONFIG_TEMPLATE)?;
        Ok(())
    }

    /// Provider settings, rejecting a missing or placeholder API key.
    pub fn provider_settings(&self) -> Result<ProviderSettings, ConfigurationError> {
        let api_key = self.provider.api_key.trim();
        if api_key.is_empty() || api_key == API_KEY_PLACEHOLDER {
            return Err(ConfigurationError::MissingCredential(format!(
                "set provider.api_key in {} or export {API_KEY_ENV}",
                Self::config_path()
                    .map_or_else(|_| "config.json".to_string(), |p| p.display().to_string())
            )));
        }

        Ok(ProviderSettings {
            api_key: api_key.to_string(),
            base_url: self.provider.base_url.clone(),
            chat_model: self.provider.chat_model.clone(),
            embedding_model: self.provider.embedding_model.clone(),
            max_tokens: self.provider.max_tokens,
            temperature: self.provider.temperature,
            retry: RetryPolicy::new(
                self.provider
                    .retry_delays_ms
                    .iter()
                    .copied()
                    .map(Duration::from_millis)
                    .collect(),
            ),
            ..ProviderSettings::default()
        })
    }

    /// Conversation settings, with the windows and prompt template already
    /// checked.
    pub fn conversation_config(&self) -> Result<ConversationConfig, TurnError> {
        let section = &self.conversation;
        let config = ConversationConfig {
            history_window_size: section.history_window_size,
            snippet_window_size: section.snippet_window_size,
            retrieval_query_window_size: section.retrieval_query_window_size,
            top_k: section.top_k,
            prompt_template: section
                .prompt_template
                .clone()
                .unwrap_or_else(|| DEFAULT_PROMPT_TEMPLATE.to_string()),
            query_includes_current_input: section.query_includes_current_input,
            retrieval_timeout: section.retrieval_timeout_secs.map(Duration::from_secs),
            generation_timeout: section.generation_timeout_secs.map(Duration::from_secs),
            ..ConversationConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub const fn indexing_config(&self) -> IndexingConfig {
        IndexingConfig {
            chunk_size: self.indexing.chunk_size,
            chunk_overlap: self.indexing.chunk_overlap,
        }
    }

    #[must_use]
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(self.indexing.download_timeout_secs),
            max_size: usize::try_from(self.indexing.max_download_bytes).unwrap_or(usize::MAX),
            ..FetchConfig::default()
        }
    }
}
