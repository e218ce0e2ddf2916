use msbt_ui::UiConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound for `http.max_retries`
pub const MAX_RETRIES: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub salesforce: SalesforceSettings,

    #[serde(default)]
    pub monday: MondaySettings,

    #[serde(default)]
    pub smartsheet: SmartsheetSettings,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesforceSettings {
    /// Connected app consumer key (`SF_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Connected app consumer secret (`SF_SECRET`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// OAuth callback URL (`SF_REDIRECT_URL`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,

    /// Session token signing secret (`SF_JWT_SECRET`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,

    /// Fixed org instance URL (`SF_INSTANCE_URL`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_url: Option<String>,

    /// Login host (`SF_LOGIN_URL`)
    #[serde(default = "default_sf_login_url")]
    pub login_url: String,

    #[serde(default = "default_sf_api_version")]
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MondaySettings {
    /// API token (`MONDAY_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_monday_api_version")]
    pub api_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmartsheetSettings {
    /// API token (`SMARTSHEET_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// File written by `writeToCSV`
    #[serde(default = "default_export_path")]
    pub export_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Signed token lifetime
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,

    /// Browser lifetime of the `access` cookie
    #[serde(default = "default_cookie_max_age_secs")]
    pub cookie_max_age_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of the human readable format
    #[serde(default)]
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            salesforce: SalesforceSettings::default(),
            monday: MondaySettings::default(),
            smartsheet: SmartsheetSettings::default(),
            session: SessionSettings::default(),
            http: HttpSettings::default(),
            ui: UiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SalesforceSettings {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            redirect_url: None,
            jwt_secret: None,
            instance_url: None,
            login_url: default_sf_login_url(),
            api_version: default_sf_api_version(),
        }
    }
}

impl SalesforceSettings {
    /// Whether the OAuth login flow can run
    pub fn oauth_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some() && self.redirect_url.is_some()
    }
}

impl Default for MondaySettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            api_version: default_monday_api_version(),
        }
    }
}

impl Default for SmartsheetSettings {
    fn default() -> Self {
        Self {
            access_token: None,
            base_url: None,
            export_path: default_export_path(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl_secs(),
            cookie_max_age_secs: default_cookie_max_age_secs(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)?
        };

        Ok(config)
    }

    /// Merge environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) {
        self.merge_env_from(|key| std::env::var(key).ok());
    }

    pub fn merge_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        // Salesforce connected app (names shared with the deployed .env files)
        if let Some(val) = var("SF_KEY") {
            self.salesforce.client_id = Some(val);
        }
        if let Some(val) = var("SF_SECRET") {
            self.salesforce.client_secret = Some(val);
        }
        if let Some(val) = var("SF_REDIRECT_URL") {
            self.salesforce.redirect_url = Some(val);
        }
        if let Some(val) = var("SF_JWT_SECRET") {
            self.salesforce.jwt_secret = Some(val);
        }
        if let Some(val) = var("SF_INSTANCE_URL") {
            self.salesforce.instance_url = Some(val);
        }
        if let Some(val) = var("SF_LOGIN_URL") {
            self.salesforce.login_url = val;
        }

        if let Some(val) = var("MONDAY_KEY") {
            self.monday.api_key = Some(val);
        }
        if let Some(val) = var("SMARTSHEET_KEY") {
            self.smartsheet.access_token = Some(val);
        }

        // Server settings
        if let Some(val) = var("MSBT_HOST") {
            self.host = val;
        }
        if let Some(val) = var("MSBT_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.port = port,
                Err(_) => eprintln!("Warning: Invalid MSBT_PORT '{}', using {}", val, self.port),
            }
        }
        if let Some(val) = var("MSBT_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .salesforce
            .jwt_secret
            .as_deref()
            .is_none_or(|secret| secret.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "salesforce.jwt_secret (SF_JWT_SECRET) is required".to_string(),
            ));
        }
        if self.session.token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid(
                "session.token_ttl_secs must be positive".to_string(),
            ));
        }
        if self.http.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "http.max_retries must be at most {}",
                MAX_RETRIES
            )));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_sf_login_url() -> String {
    "https://login.salesforce.com".to_string()
}

fn default_sf_api_version() -> String {
    "59.0".to_string()
}

fn default_monday_api_version() -> String {
    "2023-10".to_string()
}

fn default_export_path() -> PathBuf {
    PathBuf::from("output.csv")
}

fn default_token_ttl_secs() -> i64 {
    msbt_session::DEFAULT_TTL_SECS
}

fn default_cookie_max_age_secs() -> i64 {
    msbt_session::DEFAULT_COOKIE_MAX_AGE_SECS
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.salesforce.login_url, "https://login.salesforce.com");
        assert_eq!(config.session.token_ttl_secs, 8 * 60 * 60);
        assert_eq!(config.session.cookie_max_age_secs, 14400);
        assert_eq!(config.smartsheet.export_path, PathBuf::from("output.csv"));
        assert!(!config.salesforce.oauth_configured());
    }

    #[test]
    fn test_merge_env() {
        let mut config = ServerConfig::default();
        config.merge_env_from(lookup(&[
            ("SF_KEY", "key"),
            ("SF_SECRET", "secret"),
            ("SF_REDIRECT_URL", "http://localhost:3000/api/oauth"),
            ("SF_JWT_SECRET", "jwt"),
            ("SF_INSTANCE_URL", "https://acme.my.salesforce.com"),
            ("MONDAY_KEY", "monday"),
            ("SMARTSHEET_KEY", ""),
            ("MSBT_PORT", "8080"),
            ("MSBT_LOG_LEVEL", "debug"),
        ]));

        assert!(config.salesforce.oauth_configured());
        assert_eq!(config.salesforce.jwt_secret.as_deref(), Some("jwt"));
        assert_eq!(
            config.salesforce.instance_url.as_deref(),
            Some("https://acme.my.salesforce.com")
        );
        assert_eq!(config.monday.api_key.as_deref(), Some("monday"));
        assert!(config.smartsheet.access_token.is_none());
        assert_eq!(config.port, 8080);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_invalid_port_is_ignored() {
        let mut config = ServerConfig::default();
        config.merge_env_from(lookup(&[("MSBT_PORT", "not-a-port")]));
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_validate_requires_jwt_secret() {
        let mut config = ServerConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.salesforce.jwt_secret = Some("   ".to_string());
        assert!(config.validate().is_err());

        config.salesforce.jwt_secret = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bounds_retries() {
        let mut config = ServerConfig::default();
        config.salesforce.jwt_secret = Some("secret".to_string());

        config.http.max_retries = MAX_RETRIES;
        assert!(config.validate().is_ok());

        config.http.max_retries = 65;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(msg)) if msg.contains("max_retries")));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "port: 4000\nsalesforce:\n  jwt_secret: yaml-secret\n  api_version: \"60.0\"\nsmartsheet:\n  export_path: /tmp/sheet.csv\nui:\n  default_source: monday\n"
        )
        .unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.salesforce.jwt_secret.as_deref(), Some("yaml-secret"));
        assert_eq!(config.salesforce.api_version, "60.0");
        assert_eq!(config.smartsheet.export_path, PathBuf::from("/tmp/sheet.csv"));
        assert_eq!(config.ui.default_source, msbt_core::SourceKind::Monday);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "host = \"0.0.0.0\"\n\n[monday]\napi_key = \"toml-key\"\n\n[logging]\nlevel = \"warn\"\njson = true\n"
        )
        .unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.monday.api_key.as_deref(), Some("toml-key"));
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.json);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_unreadable_file() {
        assert!(matches!(
            ServerConfig::from_file("/nonexistent/msbt.yaml"),
            Err(ConfigError::Io(_))
        ));
    }
}
