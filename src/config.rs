use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::priority::Priority;
use crate::tasks::InvoiceSettings;

/// Main configuration structure for fireops
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FireOpsConfig {
    /// Where records are kept
    pub store: StoreConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Workflow defaults
    pub workflows: WorkflowConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StoreConfig {
    /// JSON snapshot used by the CLI
    pub snapshot_path: PathBuf,
    /// SQLite backend, used instead of the snapshot when built with the `database` feature
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite file path or connection string)
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Enable automatic migrations
    pub auto_migrate: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level, overridden by RUST_LOG
    pub log_level: String,
    /// Emit JSON lines instead of compact text
    pub json_logs: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Operator recorded on writes when none is given on the command line
    pub default_operator: String,
    /// Priority of generated invoice tasks
    pub invoice_priority: Priority,
    /// Days until a generated invoice task is due (0 = immediately)
    pub invoice_due_days: u32,
}

impl WorkflowConfig {
    pub fn invoice_settings(&self) -> InvoiceSettings {
        InvoiceSettings {
            priority: self.invoice_priority,
            due_in_days: self.invoice_due_days,
        }
    }
}

impl Default for FireOpsConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                snapshot_path: PathBuf::from(".fireops/fireops.json"),
                database: None,
            },
            observability: ObservabilityConfig {
                log_level: "warn".to_string(),
                json_logs: false,
            },
            workflows: WorkflowConfig {
                default_operator: "operator".to_string(),
                invoice_priority: Priority::High,
                invoice_due_days: 0,
            },
        }
    }
}

impl FireOpsConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (fireops.toml, .fireops-rc)
    /// 3. Environment variables (prefixed with FIREOPS_, sections split by `__`)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`FireOpsConfig::load`] with config files looked up in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        let toml_path = dir.join("fireops.toml");
        if toml_path.exists() {
            builder = builder.add_source(File::from(toml_path));
        }

        let rc_path = dir.join(".fireops-rc");
        if rc_path.exists() {
            builder = builder.add_source(File::from(rc_path).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("FIREOPS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: FireOpsConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<FireOpsConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = FireOpsConfig::load_env_file();
        FireOpsConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static FireOpsConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = FireOpsConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.workflows.invoice_settings(), InvoiceSettings::default());
        assert_eq!(config.store.snapshot_path, PathBuf::from(".fireops/fireops.json"));
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("fireops.toml"),
            "[workflows]\ninvoice_due_days = 14\ninvoice_priority = \"normal\"\n",
        )
        .unwrap();

        let config = FireOpsConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.workflows.invoice_due_days, 14);
        assert_eq!(config.workflows.invoice_priority, Priority::Normal);
        assert_eq!(config.workflows.default_operator, "operator");
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FireOpsConfig::default();
        config.workflows.default_operator = "kari".to_string();
        config.save_to_file(dir.path().join("fireops.toml")).unwrap();

        let loaded = FireOpsConfig::load_from(dir.path()).unwrap();
        assert_eq!(loaded.workflows.default_operator, "kari");
    }
}
