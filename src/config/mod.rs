use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Locale;
use crate::paths::Paths;
use crate::prompt::PromptStyle;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Resolved XDG-compliant paths (not serialized)
    #[serde(skip)]
    pub paths: Paths,

    /// Where this config was loaded from, if not the default location
    #[serde(skip)]
    pub source: Option<PathBuf>,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub studio: StudioConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_text_model")]
    pub text_model: String,

    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Sampling temperature for the recipe call
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Language the recipe text is written in
    #[serde(default = "default_language")]
    pub language: String,

    /// Currency for cost and selling price
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Request a pencil sketch for every step
    #[serde(default = "default_true")]
    pub illustrate_steps: bool,

    /// Delay between the starts of consecutive step sketches, in milliseconds
    #[serde(default = "default_step_stagger_ms")]
    pub step_stagger_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Supports `${VAR}` / `$VAR` expansion
    #[serde(default = "default_api_key")]
    pub api_key: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Language of user-facing status and error messages: "ja" or "en"
    #[serde(default)]
    pub locale: Locale,

    /// Directory for saved creations (default: data_dir/creations)
    #[serde(default)]
    pub save_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}
fn default_temperature() -> f32 {
    1.0
}
fn default_language() -> String {
    "Japanese".to_string()
}
fn default_currency() -> String {
    "Japanese yen (円)".to_string()
}
fn default_true() -> bool {
    true
}
fn default_step_stagger_ms() -> u64 {
    1200
}
fn default_api_key() -> String {
    "${GEMINI_API_KEY}".to_string()
}
fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            text_model: default_text_model(),
            image_model: default_image_model(),
            temperature: default_temperature(),
            language: default_language(),
            currency: default_currency(),
            illustrate_steps: default_true(),
            step_stagger_ms: default_step_stagger_ms(),
        }
    }
}

impl GenerationConfig {
    pub fn prompt_style(&self) -> PromptStyle {
        PromptStyle {
            language: self.language.clone(),
            currency: self.currency.clone(),
            illustrated_steps: self.illustrate_steps,
        }
    }

    pub fn step_stagger(&self) -> Duration {
        Duration::from_millis(self.step_stagger_ms)
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            base_url: default_gemini_base_url(),
        }
    }
}

impl GeminiConfig {
    /// The API key after env expansion, falling back to GEMINI_API_KEY then API_KEY.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.resolve_api_key_with_env(|key| std::env::var(key))
    }

    pub fn resolve_api_key_with_env<F>(&self, env_fn: F) -> Option<String>
    where
        F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
    {
        let configured = expand_env_with(&self.api_key, &env_fn);
        if !configured.trim().is_empty() && !configured.starts_with('$') {
            return Some(configured.trim().to_string());
        }

        ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .filter_map(|var| env_fn(var).ok())
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from an explicit path, or from the default location
    /// (creating it from the template on first run).
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => {
                let expanded = shellexpand::tilde(p).to_string();
                Self::load_from(Path::new(&expanded))
            }
            None => Self::load_default(),
        }
    }

    fn load_default() -> Result<Self> {
        let paths = Paths::resolve()?;
        paths.ensure_dirs()?;
        let path = paths.config_file();

        if !path.exists() {
            let config = Config {
                paths,
                ..Config::default()
            };
            config.save_with_template()?;
            return Ok(config);
        }

        let mut config = Self::parse(&fs::read_to_string(&path)?)?;
        config.paths = paths;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config {}: {}", path.display(), e)
        })?;
        let mut config = Self::parse(&content)?;
        config.paths = Paths::resolve()?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Path this config reads from and saves to
    pub fn file_path(&self) -> PathBuf {
        self.source
            .clone()
            .unwrap_or_else(|| self.paths.config_file())
    }

    pub fn save(&self) -> Result<()> {
        let path = self.file_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;

        Ok(())
    }

    /// Save config with a helpful template (for first-time setup)
    pub fn save_with_template(&self) -> Result<()> {
        let path = self.file_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        eprintln!("Created default config at {}", path.display());

        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let paths = Paths::resolve()?;
        Ok(paths.config_file())
    }

    /// Directory for saved creations
    pub fn save_dir(&self) -> PathBuf {
        match &self.studio.save_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).to_string()),
            None => self.paths.creations_dir(),
        }
    }

    pub fn get_value(&self, key: &str) -> Result<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["generation", "text_model"] => Ok(self.generation.text_model.clone()),
            ["generation", "image_model"] => Ok(self.generation.image_model.clone()),
            ["generation", "temperature"] => Ok(self.generation.temperature.to_string()),
            ["generation", "language"] => Ok(self.generation.language.clone()),
            ["generation", "currency"] => Ok(self.generation.currency.clone()),
            ["generation", "illustrate_steps"] => Ok(self.generation.illustrate_steps.to_string()),
            ["generation", "step_stagger_ms"] => Ok(self.generation.step_stagger_ms.to_string()),
            ["providers", "gemini", "base_url"] => Ok(self.providers.gemini.base_url.clone()),
            ["studio", "locale"] => Ok(self.studio.locale.to_string()),
            ["studio", "save_dir"] => Ok(self.save_dir().display().to_string()),
            ["logging", "level"] => Ok(self.logging.level.clone()),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["generation", "text_model"] => self.generation.text_model = value.to_string(),
            ["generation", "image_model"] => self.generation.image_model = value.to_string(),
            ["generation", "temperature"] => self.generation.temperature = value.parse()?,
            ["generation", "language"] => self.generation.language = value.to_string(),
            ["generation", "currency"] => self.generation.currency = value.to_string(),
            ["generation", "illustrate_steps"] => {
                self.generation.illustrate_steps = value.parse()?
            }
            ["generation", "step_stagger_ms"] => self.generation.step_stagger_ms = value.parse()?,
            ["providers", "gemini", "base_url"] => {
                self.providers.gemini.base_url = value.to_string()
            }
            ["studio", "locale"] => self.studio.locale = value.parse()?,
            ["studio", "save_dir"] => self.studio.save_dir = Some(value.to_string()),
            ["logging", "level"] => self.logging.level = value.to_string(),
            _ => anyhow::bail!("Unknown config key: {}", key),
        }

        Ok(())
    }
}

fn expand_env_with<F>(s: &str, env_fn: &F) -> String
where
    F: Fn(&str) -> std::result::Result<String, std::env::VarError>,
{
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        env_fn(var_name).unwrap_or_else(|_| s.to_string())
    } else if let Some(var_name) = s.strip_prefix('$') {
        env_fn(var_name).unwrap_or_else(|_| s.to_string())
    } else {
        s.to_string()
    }
}

/// Default config template with helpful comments (used for first-time setup)
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# L'Atelier Configuration
# Auto-created on first run. Edit as needed.

[generation]
text_model = "gemini-2.5-flash"
image_model = "gemini-2.5-flash-image"
temperature = 1.0
language = "Japanese"
currency = "Japanese yen (円)"

# Pencil sketch per preparation step, started 1.2s apart
illustrate_steps = true
step_stagger_ms = 1200

[providers.gemini]
# Falls back to GEMINI_API_KEY, then API_KEY, when unset
api_key = "${GEMINI_API_KEY}"
base_url = "https://generativelanguage.googleapis.com"

[studio]
# Language of status and error messages: "ja" or "en"
locale = "ja"
# save_dir = "~/Pictures/atelier"

[logging]
level = "info"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(map: HashMap<&'static str, &'static str>) -> impl Fn(&str) -> std::result::Result<String, std::env::VarError> {
        move |key: &str| {
            map.get(key)
                .map(|v| v.to_string())
                .ok_or(std::env::VarError::NotPresent)
        }
    }

    #[test]
    fn template_parses_to_defaults() {
        let config = Config::parse(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.generation.text_model, "gemini-2.5-flash");
        assert_eq!(config.generation.image_model, "gemini-2.5-flash-image");
        assert_eq!(config.generation.temperature, 1.0);
        assert!(config.generation.illustrate_steps);
        assert_eq!(config.generation.step_stagger(), Duration::from_millis(1200));
        assert_eq!(config.studio.locale, Locale::Ja);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.providers.gemini.api_key, "${GEMINI_API_KEY}");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn api_key_expansion_and_fallback() {
        let gemini = GeminiConfig::default();

        let mut map = HashMap::new();
        map.insert("GEMINI_API_KEY", "from-gemini");
        assert_eq!(
            gemini.resolve_api_key_with_env(env(map)).as_deref(),
            Some("from-gemini")
        );

        let mut map = HashMap::new();
        map.insert("API_KEY", "from-api-key");
        assert_eq!(
            gemini.resolve_api_key_with_env(env(map)).as_deref(),
            Some("from-api-key")
        );

        assert_eq!(gemini.resolve_api_key_with_env(env(HashMap::new())), None);

        let literal = GeminiConfig {
            api_key: "literal-key".into(),
            ..GeminiConfig::default()
        };
        assert_eq!(
            literal.resolve_api_key_with_env(env(HashMap::new())).as_deref(),
            Some("literal-key")
        );
    }

    #[test]
    fn get_and_set_values() {
        let mut config = Config::default();
        config.set_value("generation.temperature", "0.7").unwrap();
        config.set_value("studio.locale", "en").unwrap();
        config.set_value("generation.illustrate_steps", "false").unwrap();

        assert_eq!(config.get_value("generation.temperature").unwrap(), "0.7");
        assert_eq!(config.get_value("studio.locale").unwrap(), "en");
        assert!(!config.generation.illustrate_steps);
        assert!(config.set_value("studio.locale", "klingon").is_err());
        assert!(config.get_value("nope.key").is_err());
    }

    #[test]
    fn save_and_load_explicit_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("custom.toml");

        let mut config = Config {
            source: Some(path.clone()),
            ..Config::default()
        };
        config.generation.language = "English".into();
        config.save().unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.generation.language, "English");
        assert_eq!(loaded.file_path(), path);
    }
}
