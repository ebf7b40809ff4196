//! Configuration file management for bouquet.
//!
//! Provides a TOML-based config file at `~/.config/bouquet/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use bouquet_core::llm::{ConfigError, LlmConfig, parse_timeout_secs};
use bouquet_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub server: ServerSection,
    pub llm: LlmSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Origin allowed to call the API from a browser.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frontend_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the bouquet config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/bouquet` or `~/.config/bouquet`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("bouquet");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("bouquet")
}

/// Return the path to the bouquet config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse a config file.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write a config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since it may hold an API key.
pub fn save_config_to(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub database_url: Option<String>,
    pub bind: Option<String>,
    pub port: Option<u16>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
    pub frontend_url: Option<String>,
}

impl ServerSettings {
    pub const DEFAULT_BIND: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 5000;
}

/// LLM settings before the API key has been checked.
#[derive(Clone)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl LlmSettings {
    /// Validate into an [`LlmConfig`]. Fails when no API key is configured.
    pub fn into_config(self) -> Result<LlmConfig, ConfigError> {
        Ok(LlmConfig::new(self.api_key)?
            .with_model(self.model)
            .with_base_url(self.base_url)
            .with_timeout(self.timeout))
    }
}

/// Fully resolved configuration, ready for use.
pub struct BouquetConfig {
    pub db_config: DbConfig,
    pub server: ServerSettings,
    pub llm: LlmSettings,
}

impl BouquetConfig {
    /// Resolve configuration from the CLI, the process environment and the
    /// config file at [`config_path`].
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file = load_config_from(&config_path()).ok();
        Self::resolve_with(cli, file.as_ref(), |key| std::env::var(key).ok())
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `--database-url` > `BOUQUET_DATABASE_URL` > `database.url` > [`DbConfig::DEFAULT_URL`]
    /// - Port: `--port` > `PORT` > `server.port` > 5000
    /// - Frontend URL: `FRONTEND_URL` > `server.frontend_url`
    /// - API key: `GROQ_API_KEY` > `llm.api_key`
    /// - Model / base URL / timeout: `BOUQUET_LLM_*` > `llm.*` > default
    pub fn resolve_with(
        cli: &CliOverrides,
        file: Option<&ConfigFile>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let db_url = cli
            .database_url
            .clone()
            .or_else(|| env(DbConfig::ENV_VAR))
            .or_else(|| file.and_then(|f| f.database.url.clone()))
            .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_owned());

        let port = match (cli.port, env("PORT")) {
            (Some(port), _) => port,
            (None, Some(raw)) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT env var is not a valid port: {raw:?}"))?,
            (None, None) => file
                .and_then(|f| f.server.port)
                .unwrap_or(ServerSettings::DEFAULT_PORT),
        };

        let frontend_url = env("FRONTEND_URL")
            .or_else(|| file.and_then(|f| f.server.frontend_url.clone()))
            .filter(|url| !url.trim().is_empty());

        let server = ServerSettings {
            bind: cli
                .bind
                .clone()
                .unwrap_or_else(|| ServerSettings::DEFAULT_BIND.to_owned()),
            port,
            frontend_url,
        };

        let llm_file = file.map(|f| &f.llm);
        let timeout = match env("BOUQUET_LLM_TIMEOUT_SECS") {
            Some(raw) => parse_timeout_secs(&raw)?,
            None => match llm_file.and_then(|l| l.timeout_secs) {
                Some(secs) => parse_timeout_secs(&secs.to_string())?,
                None => LlmConfig::DEFAULT_TIMEOUT,
            },
        };

        let llm = LlmSettings {
            api_key: env("GROQ_API_KEY").or_else(|| llm_file.and_then(|l| l.api_key.clone())),
            model: env("BOUQUET_LLM_MODEL")
                .or_else(|| llm_file.and_then(|l| l.model.clone()))
                .unwrap_or_else(|| LlmConfig::DEFAULT_MODEL.to_owned()),
            base_url: env("BOUQUET_LLM_BASE_URL")
                .or_else(|| llm_file.and_then(|l| l.base_url.clone()))
                .unwrap_or_else(|| LlmConfig::DEFAULT_BASE_URL.to_owned()),
            timeout,
        };

        Ok(Self {
            db_config: DbConfig::new(db_url),
            server,
            llm,
        })
    }

    /// Log which settings were found, without revealing secrets.
    pub fn log_summary(&self) {
        info!(database = %self.db_config.redacted_url(), "database url resolved");
        if self.llm.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
            info!(model = %self.llm.model, "GROQ_API_KEY loaded");
        } else {
            warn!("GROQ_API_KEY missing");
        }
        match &self.server.frontend_url {
            Some(url) => info!(frontend_url = %url, "CORS restricted to frontend"),
            None => warn!("FRONTEND_URL missing; CORS allows any origin"),
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn sample_file() -> ConfigFile {
        ConfigFile {
            database: DatabaseSection {
                url: Some("postgresql://file:5432/filedb".to_string()),
            },
            server: ServerSection {
                port: Some(7000),
                frontend_url: Some("https://file.example".to_string()),
            },
            llm: LlmSection {
                api_key: Some("gsk_file".to_string()),
                model: Some("file-model".to_string()),
                base_url: None,
                timeout_secs: Some(15),
            },
        }
    }

    #[test]
    fn defaults_when_nothing_set() {
        let cfg = BouquetConfig::resolve_with(&CliOverrides::default(), None, env_from(&[])).unwrap();
        assert_eq!(cfg.db_config.database_url, DbConfig::DEFAULT_URL);
        assert_eq!(cfg.server.port, 5000);
        assert_eq!(cfg.server.bind, "0.0.0.0");
        assert!(cfg.server.frontend_url.is_none());
        assert!(cfg.llm.api_key.is_none());
        assert_eq!(cfg.llm.model, "llama-3.1-8b-instant");
        assert_eq!(cfg.llm.base_url, LlmConfig::DEFAULT_BASE_URL);
        assert_eq!(cfg.llm.timeout, Duration::from_secs(60));
    }

    #[test]
    fn cli_flag_overrides_all() {
        let cli = CliOverrides {
            database_url: Some("postgresql://cli:5432/clidb".to_string()),
            bind: Some("127.0.0.1".to_string()),
            port: Some(8080),
        };
        let env = env_from(&[
            ("BOUQUET_DATABASE_URL", "postgresql://env:5432/envdb"),
            ("PORT", "9090"),
        ]);
        let cfg = BouquetConfig::resolve_with(&cli, Some(&sample_file()), env).unwrap();
        assert_eq!(cfg.db_config.database_url, "postgresql://cli:5432/clidb");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.bind, "127.0.0.1");
    }

    #[test]
    fn env_overrides_config_file() {
        let env = env_from(&[
            ("BOUQUET_DATABASE_URL", "postgresql://env:5432/envdb"),
            ("PORT", "9090"),
            ("FRONTEND_URL", "https://env.example"),
            ("GROQ_API_KEY", "gsk_env"),
            ("BOUQUET_LLM_MODEL", "env-model"),
            ("BOUQUET_LLM_TIMEOUT_SECS", "5"),
        ]);
        let cfg =
            BouquetConfig::resolve_with(&CliOverrides::default(), Some(&sample_file()), env).unwrap();
        assert_eq!(cfg.db_config.database_url, "postgresql://env:5432/envdb");
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.frontend_url.as_deref(), Some("https://env.example"));
        assert_eq!(cfg.llm.api_key.as_deref(), Some("gsk_env"));
        assert_eq!(cfg.llm.model, "env-model");
        assert_eq!(cfg.llm.timeout, Duration::from_secs(5));
    }

    #[test]
    fn config_file_used_when_env_absent() {
        let cfg = BouquetConfig::resolve_with(
            &CliOverrides::default(),
            Some(&sample_file()),
            env_from(&[]),
        )
        .unwrap();
        assert_eq!(cfg.db_config.database_url, "postgresql://file:5432/filedb");
        assert_eq!(cfg.server.port, 7000);
        assert_eq!(cfg.server.frontend_url.as_deref(), Some("https://file.example"));
        assert_eq!(cfg.llm.api_key.as_deref(), Some("gsk_file"));
        assert_eq!(cfg.llm.model, "file-model");
        assert_eq!(cfg.llm.timeout, Duration::from_secs(15));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let result =
            BouquetConfig::resolve_with(&CliOverrides::default(), None, env_from(&[("PORT", "http")]));
        let msg = format!("{:#}", result.err().expect("should fail"));
        assert!(msg.contains("PORT"), "unexpected error: {msg}");
    }

    #[test]
    fn invalid_timeout_is_an_error() {
        let result = BouquetConfig::resolve_with(
            &CliOverrides::default(),
            None,
            env_from(&[("BOUQUET_LLM_TIMEOUT_SECS", "0")]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn blank_frontend_url_is_unset() {
        let cfg = BouquetConfig::resolve_with(
            &CliOverrides::default(),
            None,
            env_from(&[("FRONTEND_URL", "  ")]),
        )
        .unwrap();
        assert!(cfg.server.frontend_url.is_none());
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let cfg = BouquetConfig::resolve_with(&CliOverrides::default(), None, env_from(&[])).unwrap();
        let err = cfg.llm.into_config().err().expect("should fail");
        assert_eq!(err, ConfigError::MissingApiKey);
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn llm_settings_into_config() {
        let env = env_from(&[
            ("GROQ_API_KEY", "gsk_env"),
            ("BOUQUET_LLM_BASE_URL", "http://localhost:1234/v1/"),
        ]);
        let cfg = BouquetConfig::resolve_with(&CliOverrides::default(), None, env).unwrap();
        let llm = cfg.llm.into_config().unwrap();
        assert_eq!(llm.api_key, "gsk_env");
        assert_eq!(llm.base_url, "http://localhost:1234/v1");
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("bouquet").join("config.toml");

        save_config_to(&path, &sample_file()).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.database.url.as_deref(), Some("postgresql://file:5432/filedb"));
        assert_eq!(loaded.server.port, Some(7000));
        assert_eq!(loaded.llm.api_key.as_deref(), Some("gsk_file"));
        assert!(loaded.llm.base_url.is_none());
    }

    #[test]
    fn partial_config_file_parses() {
        let parsed: ConfigFile = toml::from_str("[server]\nport = 6000\n").unwrap();
        assert_eq!(parsed.server.port, Some(6000));
        assert!(parsed.database.url.is_none());
        assert!(parsed.llm.api_key.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        save_config_to(&path, &ConfigFile::default()).unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("bouquet/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
