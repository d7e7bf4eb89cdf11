use serde::Deserialize;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/ads.db";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub internal_webhook_key: String,
    pub enable_seed: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Database URL: {}", config.database_url);
        tracing::debug!("Server Port: {}", config.port);
        if config.enable_seed {
            tracing::warn!("Seed endpoint enabled (ENABLE_SEED)");
        }

        Ok(config)
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            port: match non_empty("PORT") {
                Some(port) => port
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
                None => DEFAULT_PORT,
            },
            database_url: non_empty("DATABASE_URL")
                .or_else(|| non_empty("DB_PATH"))
                .map(|raw| normalize_database_url(raw.trim()))
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            internal_webhook_key: non_empty("INTERNAL_WEBHOOK_KEY")
                .or_else(|| non_empty("INTERNAL_KEY"))
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "INTERNAL_WEBHOOK_KEY or INTERNAL_KEY environment variable required"
                    )
                })?,
            enable_seed: non_empty("ENABLE_SEED")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        })
    }
}

/// Accepts either a `sqlite:` URL or a bare file path.
fn normalize_database_url(raw: &str) -> String {
    if raw.starts_with("sqlite:") {
        raw.to_string()
    } else {
        format!("sqlite://{}", raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup(&[("INTERNAL_WEBHOOK_KEY", "secret")])).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.database_url, "sqlite://data/ads.db");
        assert_eq!(config.internal_webhook_key, "secret");
        assert!(!config.enable_seed);
    }

    #[test]
    fn test_secret_is_required() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("INTERNAL_WEBHOOK_KEY", "   ")])).is_err());
    }

    #[test]
    fn test_secret_alias() {
        let config = Config::from_lookup(lookup(&[("INTERNAL_KEY", "legacy")])).unwrap();
        assert_eq!(config.internal_webhook_key, "legacy");
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("INTERNAL_WEBHOOK_KEY", "secret"),
            ("PORT", "not-a-port"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_bare_path_becomes_sqlite_url() {
        let config = Config::from_lookup(lookup(&[
            ("INTERNAL_WEBHOOK_KEY", "secret"),
            ("DB_PATH", "/var/lib/ads/ads.db"),
            ("ENABLE_SEED", "true"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite:///var/lib/ads/ads.db");
        assert!(config.enable_seed);
    }
}
