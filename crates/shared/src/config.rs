//! Application configuration management.
//!
//! Values are layered: `config/default.toml`, then `config/{RUN_MODE}.toml`,
//! then `COMPTRACK__SECTION__KEY` environment variables.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Commission calculation settings.
    #[serde(default)]
    pub commission: CommissionConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT settings as read from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    3600
}

/// Commission calculation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CommissionConfig {
    /// Decimal places commission amounts are rounded to.
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// Whether a manager may approve or reject their own commission.
    #[serde(default)]
    pub allow_self_approval: bool,
}

fn default_scale() -> u32 {
    2
}

/// Money columns are `NUMERIC(19, 4)`; a finer scale would be rounded away
/// on write.
pub const MAX_COMMISSION_SCALE: u32 = 4;

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            allow_self_approval: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from config files and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or a required key is missing.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("COMPTRACK").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the rest of the system cannot store.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` when `commission.scale` exceeds
    /// [`MAX_COMMISSION_SCALE`].
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.commission.scale > MAX_COMMISSION_SCALE {
            return Err(config::ConfigError::Message(format!(
                "commission.scale must be at most {MAX_COMMISSION_SCALE}, got {}",
                self.commission.scale
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_with(vars: Vec<(&str, Option<&str>)>) -> Result<AppConfig, config::ConfigError> {
        temp_env::with_vars(vars, AppConfig::load)
    }

    #[test]
    fn test_load_from_env_with_defaults() {
        let config = load_with(vec![
            ("RUN_MODE", Some("test-nonexistent")),
            ("COMPTRACK__DATABASE__URL", Some("postgres://localhost/comptrack")),
            ("COMPTRACK__JWT__SECRET", Some("secret")),
        ])
        .unwrap();

        assert_eq!(config.database.url, "postgres://localhost/comptrack");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.access_token_expiry_secs, 3600);
        assert_eq!(config.commission, CommissionConfig::default());
    }

    #[test]
    fn test_commission_overrides() {
        let config = load_with(vec![
            ("RUN_MODE", Some("test-nonexistent")),
            ("COMPTRACK__DATABASE__URL", Some("postgres://localhost/comptrack")),
            ("COMPTRACK__JWT__SECRET", Some("secret")),
            ("COMPTRACK__COMMISSION__SCALE", Some("4")),
            ("COMPTRACK__COMMISSION__ALLOW_SELF_APPROVAL", Some("true")),
        ])
        .unwrap();

        assert_eq!(config.commission.scale, 4);
        assert!(config.commission.allow_self_approval);
    }

    #[test]
    fn test_scale_beyond_storage_rejected() {
        let result = load_with(vec![
            ("RUN_MODE", Some("test-nonexistent")),
            ("COMPTRACK__DATABASE__URL", Some("postgres://localhost/comptrack")),
            ("COMPTRACK__JWT__SECRET", Some("secret")),
            ("COMPTRACK__COMMISSION__SCALE", Some("5")),
        ]);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("commission.scale"));
    }

    #[test]
    fn test_missing_secret_fails() {
        let result = load_with(vec![
            ("RUN_MODE", Some("test-nonexistent")),
            ("COMPTRACK__DATABASE__URL", Some("postgres://localhost/comptrack")),
            ("COMPTRACK__JWT__SECRET", None),
        ]);
        assert!(result.is_err());
    }
}
