use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::paths::home_dir::resolve_home_dir;

/// Client configuration with strongly-typed global sections
/// and a flexible per-module configuration bag.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Base directory for logs and other local state; normalized to an absolute path.
    #[serde(default)]
    pub home_dir: String,
    /// Backend REST API settings.
    pub api: ApiConfig,
    /// Token refresh / session settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration (optional, uses defaults if None).
    pub logging: Option<LoggingConfig>,
    /// Directory containing per-module YAML files (optional).
    #[serde(default)]
    pub modules_dir: Option<String>,
    /// Per-module configuration bag: module_name → arbitrary JSON/YAML value.
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    /// Uniform request timeout applied to every call.
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,
    /// Raw `Set-Cookie` style strings seeded into the cookie jar at startup.
    #[serde(default)]
    pub cookies: Vec<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default = "default_reissue_path")]
    pub reissue_path: String,
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
    /// When set, a 403 on any gated call also raises the session-expired signal.
    #[serde(default = "default_true")]
    pub forbidden_signals_session_expiry: bool,
}

/// Logging configuration - maps subsystem names to their logging settings.
/// Key "default" is the catch-all for logs that don't match explicit subsystems.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String, // "info", "debug", "error", "off"
    pub file: String,          // "logs/songdap.log"
    #[serde(default)]
    pub file_level: String,
    pub max_age_days: Option<u32>, // Not implemented yet
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

fn default_timeout_sec() -> u64 {
    15
}

fn default_reissue_path() -> String {
    "/auth/reissue".to_string()
}

fn default_logout_path() -> String {
    "/auth/logout".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            timeout_sec: default_timeout_sec(),
            cookies: Vec::new(),
            user_agent: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            reissue_path: default_reissue_path(),
            logout_path: default_logout_path(),
            forbidden_signals_session_expiry: true,
        }
    }
}

/// Create a default logging configuration.
pub fn default_logging_config() -> LoggingConfig {
    let mut logging = HashMap::new();
    logging.insert(
        "default".to_string(),
        Section {
            console_level: "warn".to_string(),
            file: "logs/songdap.log".to_string(),
            file_level: "debug".to_string(),
            max_age_days: Some(7),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    );
    logging
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            // Empty => $HOME/.songdap
            home_dir: String::new(),
            api: ApiConfig::default(),
            auth: AuthConfig::default(),
            logging: Some(default_logging_config()),
            modules_dir: None,
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration with layered loading: defaults → YAML file → environment variables.
    /// Also normalizes `home_dir` into an absolute path and creates the directory.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let path = config_path.as_ref();
        if !path.is_file() {
            anyhow::bail!("config file not found: {}", path.display());
        }

        // Optional sections stay None unless YAML/ENV provides them.
        let base = AppConfig {
            logging: None,
            ..AppConfig::default()
        };

        let figment = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(path))
            // Example: SONGDAP__API__BASE_URL=http://... maps to api.base_url
            .merge(Env::prefixed("SONGDAP__").split("__"));

        let mut config: AppConfig = figment
            .extract()
            .with_context(|| "Failed to extract config from figment".to_string())?;

        normalize_home_dir_inplace(&mut config).context("Failed to resolve home_dir")?;

        if let Some(dir) = config.modules_dir.clone() {
            merge_module_files(&mut config.modules, dir)?;
        }

        Ok(config)
    }

    /// Load configuration from file or create with default values.
    /// Also normalizes `home_dir` into an absolute path and creates the directory.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut c = Self::default();
                normalize_home_dir_inplace(&mut c).context("Failed to resolve home_dir (defaults)")?;
                Ok(c)
            }
        }
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Apply overrides from command line arguments.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(base_url) = &args.base_url {
            self.api.base_url = base_url.clone();
        }

        let logging = self.logging.get_or_insert_with(default_logging_config);
        if let Some(default_section) = logging.get_mut("default") {
            default_section.console_level = match args.verbose {
                0 => default_section.console_level.clone(), // keep
                1 => "info".to_string(),
                2 => "debug".to_string(),
                _ => "trace".to_string(),
            };
        }
    }

    /// Best-effort: deserialize a module's section into `T`, falling back to
    /// `T::default()` if the section is missing or invalid.
    pub fn module_config<T: DeserializeOwned + Default>(&self, module: &str) -> T {
        self.modules
            .get(module)
            .and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Strict: deserialize a module's section into `T`, returning a pathful error on failure.
    pub fn module_config_required<T: DeserializeOwned>(&self, module: &str) -> Result<T> {
        let val = self
            .modules
            .get(module)
            .ok_or_else(|| anyhow::anyhow!("missing module config: {module}"))?;
        serde_json::from_value(val.clone())
            .map_err(|e| anyhow::anyhow!("invalid {module} config: {}", e))
    }
}

/// Command line arguments structure.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub base_url: Option<String>,
    pub print_config: bool,
    pub verbose: u8,
}

const fn default_subdir() -> &'static str {
    ".songdap"
}

/// Normalize `home_dir` using `resolve_home_dir` and store the absolute path back.
fn normalize_home_dir_inplace(config: &mut AppConfig) -> Result<()> {
    let opt = if config.home_dir.trim().is_empty() {
        None
    } else {
        Some(config.home_dir.clone())
    };

    let resolved: PathBuf = resolve_home_dir(opt, default_subdir(), /*create*/ true)
        .context("home_dir normalization failed")?;

    config.home_dir = resolved.to_string_lossy().to_string();
    Ok(())
}

fn merge_module_files(
    bag: &mut HashMap<String, serde_json::Value>,
    dir: impl AsRef<Path>,
) -> Result<()> {
    use std::fs;
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        if ext != "yml" && ext != "yaml" {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();
        let raw = fs::read_to_string(&path)?;
        let val: serde_yaml::Value = serde_yaml::from_str(&raw)?;
        bag.insert(name, serde_json::to_value(val)?);
    }
    Ok(())
}
