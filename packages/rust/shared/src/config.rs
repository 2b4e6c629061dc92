//! Application configuration for componentgen.
//!
//! User config lives at `~/.componentgen/componentgen.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ComponentGenError, Result};
use crate::types::ComponentType;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "componentgen.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".componentgen";

// ---------------------------------------------------------------------------
// Config structs (matching componentgen.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Generation pipeline settings.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Per-type system instruction overrides.
    #[serde(default)]
    pub templates: TemplateOverrides,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory holding one subdirectory per app.
    #[serde(default = "default_components_root")]
    pub components_root: String,

    /// Default retry budget handed to the pipeline.
    #[serde(default = "default_tries")]
    pub tries: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            components_root: default_components_root(),
            tries: default_tries(),
        }
    }
}

fn default_components_root() -> String {
    "../../components".into()
}
fn default_tries() -> u32 {
    3
}

/// `[generator]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Executable that runs the pipeline bridge.
    #[serde(default = "default_bridge_cmd")]
    pub bridge_cmd: String,

    /// Arguments passed to the bridge executable.
    #[serde(default = "default_bridge_args")]
    pub bridge_args: Vec<String>,

    /// Working directory for the bridge subprocess.
    #[serde(default = "default_working_dir")]
    pub working_dir: String,

    /// Model the pipeline should use.
    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            bridge_cmd: default_bridge_cmd(),
            bridge_args: default_bridge_args(),
            working_dir: default_working_dir(),
            model: default_model(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_bridge_cmd() -> String {
    "python".into()
}
fn default_bridge_args() -> Vec<String> {
    vec!["-m".into(), "code_gen.bridge".into()]
}
fn default_working_dir() -> String {
    ".".into()
}
fn default_model() -> String {
    "gpt-4".into()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}

/// `[templates]` section: files whose content replaces the built-in
/// system instructions for a component type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polling_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
}

impl TemplateOverrides {
    /// Override file configured for a component type, if any.
    pub fn path_for(&self, component_type: ComponentType) -> Option<&str> {
        match component_type {
            ComponentType::Action => self.action.as_deref(),
            ComponentType::WebhookSource => self.webhook_source.as_deref(),
            ComponentType::PollingSource => self.polling_source.as_deref(),
            ComponentType::App => self.app.as_deref(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.componentgen/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ComponentGenError::configuration("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.componentgen/componentgen.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ComponentGenError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ComponentGenError::configuration(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ComponentGenError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config)
        .map_err(|e| ComponentGenError::configuration(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ComponentGenError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the pipeline API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<()> {
    let var_name = &config.generator.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(ComponentGenError::configuration(format!(
            "generation API key not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("components_root"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.tries, 3);
        assert_eq!(parsed.defaults.components_root, "../../components");
        assert_eq!(parsed.generator.bridge_args, vec!["-m", "code_gen.bridge"]);
    }

    #[test]
    fn config_with_template_overrides() {
        let toml_str = r#"
[defaults]
components_root = "/srv/components"

[templates]
action = "prompts/action.md"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.components_root, "/srv/components");
        assert_eq!(config.defaults.tries, 3);
        assert_eq!(
            config.templates.path_for(ComponentType::Action),
            Some("prompts/action.md")
        );
        assert_eq!(config.templates.path_for(ComponentType::App), None);
    }

    #[test]
    fn malformed_config_is_configuration_error() {
        let path = std::env::temp_dir().join(format!(
            "componentgen-config-test-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[defaults\ntries = ").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ComponentGenError::Configuration { .. }));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.generator.api_key_env = "CG_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
