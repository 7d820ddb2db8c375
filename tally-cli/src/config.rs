use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tally_core::SkippedLinePolicy;

use crate::state::tally_home;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Write the assembled prompt to outputs/debug_prompt.txt
    pub debug_prompt: bool,
    pub llm: LlmSection,
    pub paths: PathsSection,
    pub parser: ParserSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// "openai" (any OpenAI-compatible endpoint, Groq included) or "anthropic"
    pub provider: String,
    pub model: String,
    /// Provider default when unset
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub data_dir: PathBuf,
    /// Taxonomy JSON (depenses / revenus / exclusions)
    pub categories: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSection {
    pub skipped_lines: SkippedLinePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug_prompt: true,
            llm: LlmSection::default(),
            paths: PathsSection::default(),
            parser: ParserSection::default(),
        }
    }
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            base_url: None,
            temperature: 0.1,
            max_tokens: 8192,
            api_key_env: "GROQ_API_KEY".to_string(),
        }
    }
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            categories: PathBuf::from("categories.json"),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(tally_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}
