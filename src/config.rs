use crate::controller::DEFAULT_TIMEOUT;
use crate::error::AppError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const LOCAL_API_BASE: &str = "http://localhost:5001/api";
pub const DEFAULT_LIMIT: u32 = 20;
/// Most products the API returns for one search.
pub const MAX_LIMIT: u32 = 50;
pub const DEFAULT_CURRENCY_SYMBOL: &str = "R$";

/// Where the API lives: a local dev server, or the deployed origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Deployed,
}

impl Environment {
    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "dev" | "localhost" => Ok(Environment::Local),
            "deployed" | "prod" | "production" => Ok(Environment::Deployed),
            other => Err(AppError::Config(format!(
                "Unknown environment '{}'. Use 'local' or 'deployed'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub environment: Environment,
    pub timeout: Duration,
    pub default_limit: u32,
    pub currency_symbol: String,
    pub check_images: bool,
    pub json: bool,
}

/// Values given on the command line; `None` falls through to env/file/defaults.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_base: Option<String>,
    pub environment: Option<String>,
    pub timeout_secs: Option<u64>,
    pub currency: Option<String>,
    pub check_images: bool,
    pub json: bool,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: ConfigDefaults,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigDefaults {
    api_base: Option<String>,
    environment: Option<String>,
    origin: Option<String>,
    timeout_secs: Option<u64>,
    limit: Option<u32>,
    currency: Option<String>,
    check_images: Option<bool>,
}

/// Environment variables read during [`AppConfig::load`].
#[derive(Debug, Clone, Default)]
struct EnvVars {
    api_base: Option<String>,
    environment: Option<String>,
    origin: Option<String>,
    timeout_secs: Option<String>,
    currency: Option<String>,
}

impl EnvVars {
    fn from_process() -> Self {
        Self {
            api_base: std::env::var("SCRAPE_SEARCH_API_BASE").ok(),
            environment: std::env::var("SCRAPE_SEARCH_ENV").ok(),
            origin: std::env::var("SCRAPE_SEARCH_ORIGIN").ok(),
            timeout_secs: std::env::var("SCRAPE_SEARCH_TIMEOUT_SECS").ok(),
            currency: std::env::var("SCRAPE_SEARCH_CURRENCY").ok(),
        }
    }
}

impl AppConfig {
    pub fn load(cli: CliOverrides) -> Result<Self, AppError> {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scrape-search");
        let file_config = load_config_file(&config_dir);
        Self::resolve(cli, EnvVars::from_process(), file_config)
    }

    // Priority: CLI flags → env vars → config file → defaults
    fn resolve(cli: CliOverrides, env: EnvVars, file: ConfigFile) -> Result<Self, AppError> {
        let defaults = file.defaults;

        let environment = match cli
            .environment
            .or(env.environment)
            .or(defaults.environment)
        {
            Some(name) => Environment::parse(&name)?,
            None => Environment::Local,
        };

        let api_base = match cli.api_base.or(env.api_base).or(defaults.api_base) {
            Some(base) => base,
            None => match environment {
                Environment::Local => LOCAL_API_BASE.to_string(),
                Environment::Deployed => {
                    let origin = env.origin.or(defaults.origin).ok_or_else(|| {
                        AppError::Config(
                            "The deployed environment needs an origin (SCRAPE_SEARCH_ORIGIN or `origin` in config.toml)".to_string(),
                        )
                    })?;
                    format!("{}/api", origin.trim_end_matches('/'))
                }
            },
        };
        validate_api_base(&api_base)?;

        let env_timeout = match env.timeout_secs {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| {
                AppError::Config(format!("SCRAPE_SEARCH_TIMEOUT_SECS is not a number: {}", raw))
            })?),
            None => None,
        };
        let timeout = cli
            .timeout_secs
            .or(env_timeout)
            .or(defaults.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(AppError::Config("Timeout must be at least 1 second".to_string()));
        }

        let currency_symbol = cli
            .currency
            .or(env.currency)
            .or(defaults.currency)
            .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string());

        let default_limit = match defaults.limit {
            Some(l) if (1..=MAX_LIMIT).contains(&l) => l,
            Some(l) => {
                tracing::warn!(
                    "Ignoring limit {} from the config file (must be 1-{})",
                    l,
                    MAX_LIMIT
                );
                DEFAULT_LIMIT
            }
            None => DEFAULT_LIMIT,
        };

        Ok(AppConfig {
            api_base,
            environment,
            timeout,
            default_limit,
            currency_symbol,
            check_images: cli.check_images || defaults.check_images.unwrap_or(false),
            json: cli.json,
        })
    }
}

fn validate_api_base(base: &str) -> Result<(), AppError> {
    url::Url::parse(base)
        .map(|_| ())
        .map_err(|e| AppError::Config(format!("Invalid API base URL '{}': {}", base, e)))
}

fn load_config_file(config_dir: &Path) -> ConfigFile {
    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed {}: {}", config_path.display(), e);
                ConfigFile::default()
            }),
            Err(_) => ConfigFile::default(),
        }
    } else {
        ConfigFile::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(cli: CliOverrides, env: EnvVars, file: ConfigFile) -> Result<AppConfig, AppError> {
        AppConfig::resolve(cli, env, file)
    }

    #[test]
    fn defaults_point_at_local_server() {
        let config = resolve(CliOverrides::default(), EnvVars::default(), ConfigFile::default())
            .unwrap();
        assert_eq!(config.api_base, LOCAL_API_BASE);
        assert_eq!(config.environment, Environment::Local);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.default_limit, DEFAULT_LIMIT);
        assert_eq!(config.currency_symbol, "R$");
        assert!(!config.check_images);
    }

    #[test]
    fn deployed_uses_origin() {
        let env = EnvVars {
            environment: Some("deployed".into()),
            origin: Some("https://shop.example.com/".into()),
            ..EnvVars::default()
        };
        let config = resolve(CliOverrides::default(), env, ConfigFile::default()).unwrap();
        assert_eq!(config.api_base, "https://shop.example.com/api");
    }

    #[test]
    fn deployed_without_origin_is_an_error() {
        let cli = CliOverrides {
            environment: Some("deployed".into()),
            ..CliOverrides::default()
        };
        assert!(matches!(
            resolve(cli, EnvVars::default(), ConfigFile::default()),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn cli_beats_env_beats_file() {
        let file: ConfigFile = toml::from_str(
            r#"
            [defaults]
            api_base = "http://file:1/api"
            timeout_secs = 10
            currency = "US$"
            limit = 5
            "#,
        )
        .unwrap();
        let env = EnvVars {
            api_base: Some("http://env:2/api".into()),
            timeout_secs: Some("20".into()),
            ..EnvVars::default()
        };
        let cli = CliOverrides {
            api_base: Some("http://cli:3/api".into()),
            ..CliOverrides::default()
        };

        let config = resolve(cli, env, file).unwrap();
        assert_eq!(config.api_base, "http://cli:3/api");
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.currency_symbol, "US$");
        assert_eq!(config.default_limit, 5);
    }

    #[test]
    fn rejects_bad_values() {
        let env = EnvVars {
            timeout_secs: Some("soon".into()),
            ..EnvVars::default()
        };
        assert!(resolve(CliOverrides::default(), env, ConfigFile::default()).is_err());

        let cli = CliOverrides {
            timeout_secs: Some(0),
            ..CliOverrides::default()
        };
        assert!(resolve(cli, EnvVars::default(), ConfigFile::default()).is_err());

        let cli = CliOverrides {
            environment: Some("staging".into()),
            ..CliOverrides::default()
        };
        assert!(resolve(cli, EnvVars::default(), ConfigFile::default()).is_err());

        let cli = CliOverrides {
            api_base: Some("/api".into()),
            ..CliOverrides::default()
        };
        assert!(resolve(cli, EnvVars::default(), ConfigFile::default()).is_err());
    }

    #[test]
    fn file_limit_outside_api_range_is_ignored() {
        for limit in [0, MAX_LIMIT + 1, 500] {
            let file: ConfigFile =
                toml::from_str(&format!("[defaults]\nlimit = {}\n", limit)).unwrap();
            let config = resolve(CliOverrides::default(), EnvVars::default(), file).unwrap();
            assert_eq!(config.default_limit, DEFAULT_LIMIT);
        }

        let file: ConfigFile = toml::from_str("[defaults]\nlimit = 50\n").unwrap();
        let config = resolve(CliOverrides::default(), EnvVars::default(), file).unwrap();
        assert_eq!(config.default_limit, MAX_LIMIT);
    }

    #[test]
    fn reads_config_file_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "[defaults]\nenvironment = \"deployed\"\norigin = \"https://a.example\"\ncheck_images = true\n",
        )
        .unwrap();

        let file = load_config_file(dir.path());
        let config = resolve(CliOverrides::default(), EnvVars::default(), file).unwrap();
        assert_eq!(config.api_base, "https://a.example/api");
        assert!(config.check_images);
    }

    #[test]
    fn malformed_or_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config_file(dir.path()).defaults.api_base.is_none());

        std::fs::write(dir.path().join("config.toml"), "not = [valid").unwrap();
        assert!(load_config_file(dir.path()).defaults.api_base.is_none());
    }
}
