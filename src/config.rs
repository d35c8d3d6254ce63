//! TOML configuration.
//!
//! Every section is optional; missing keys take the defaults below. A
//! missing file is only an error for commands that need an LLM.

use anyhow::{Context, Result};
use quizsmith_core::chunk::ChunkOptions;
use quizsmith_core::source::NormalizeOptions;
use quizsmith_core::summarize::{SummarizeOptions, SummaryFormat, SummaryKind, SummaryLength};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            min_chars: default_min_chars(),
            overlap: default_overlap(),
        }
    }
}

fn default_max_chars() -> usize {
    4000
}
fn default_min_chars() -> usize {
    1000
}
fn default_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
    /// Timeout for `ingest url` fetches.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: default_excerpt_chars(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_excerpt_chars() -> usize {
    300
}
fn default_fetch_timeout_secs() -> u64 {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub kind: SummaryKind,
    #[serde(default)]
    pub length: SummaryLength,
    #[serde(default)]
    pub format: SummaryFormat,
    #[serde(default = "default_fallback_chars")]
    pub fallback_chars: usize,
    #[serde(default)]
    pub shared_context: Option<String>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            kind: SummaryKind::default(),
            length: SummaryLength::default(),
            format: SummaryFormat::default(),
            fallback_chars: default_fallback_chars(),
            shared_context: None,
        }
    }
}

fn default_fallback_chars() -> usize {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: None,
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Defaults for every section, LLM disabled.
    pub fn minimal() -> Self {
        Self::default()
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            chunking: ChunkOptions {
                max_chars: self.chunking.max_chars,
                min_chars: self.chunking.min_chars,
                overlap: self.chunking.overlap,
            },
            excerpt_chars: self.source.excerpt_chars,
        }
    }

    pub fn summarize_options(&self) -> SummarizeOptions {
        SummarizeOptions {
            kind: self.summarizer.kind,
            length: self.summarizer.length,
            format: self.summarizer.format,
            shared_context: self.summarizer.shared_context.clone(),
            fallback_chars: self.summarizer.fallback_chars,
        }
    }
}

/// Read and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_minimal(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let chunking = &config.chunking;
    if chunking.max_chars == 0 {
        anyhow::bail!("chunking.max_chars must be > 0");
    }
    if chunking.min_chars >= chunking.max_chars {
        anyhow::bail!("chunking.min_chars must be < chunking.max_chars");
    }
    if chunking.overlap >= chunking.max_chars {
        anyhow::bail!("chunking.overlap must be < chunking.max_chars");
    }

    match config.llm.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown llm provider: '{}'. Must be disabled or openai.",
            other
        ),
    }
    if config.llm.is_enabled() && config.llm.model.is_none() {
        anyhow::bail!(
            "llm.model must be specified when provider is '{}'",
            config.llm.provider
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.chunking.max_chars, 4000);
        assert_eq!(cfg.source.excerpt_chars, 300);
        assert!(!cfg.llm.is_enabled());
        assert_eq!(cfg.logging.level, "warn");
    }

    #[test]
    fn summarizer_enums_parse_kebab_case() {
        let cfg = parse_config(
            r#"
[summarizer]
kind = "tldr"
length = "short"
format = "markdown"
"#,
        )
        .unwrap();
        let opts = cfg.summarize_options();
        assert_eq!(opts.kind, SummaryKind::Tldr);
        assert_eq!(opts.length, SummaryLength::Short);
        assert_eq!(opts.format, SummaryFormat::Markdown);
    }

    #[test]
    fn rejects_bad_chunking() {
        let err = parse_config("[chunking]\nmax_chars = 100\nmin_chars = 200\n").unwrap_err();
        assert!(err.to_string().contains("min_chars"));
        assert!(parse_config("[chunking]\nmax_chars = 0\n").is_err());
    }

    #[test]
    fn enabled_llm_requires_model() {
        assert!(parse_config("[llm]\nprovider = \"openai\"\n").is_err());
        assert!(parse_config("[llm]\nprovider = \"mystery\"\nmodel = \"m\"\n").is_err());
        let cfg = parse_config("[llm]\nprovider = \"openai\"\nmodel = \"gpt-4o-mini\"\n").unwrap();
        assert!(cfg.llm.is_enabled());
    }
}
