//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

const DEFAULT_TEACHER_PASSWORD: &str = "050607";

/// Process configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub vk_token: SecretString,
    pub vk_group_id: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub backup_dir: PathBuf,
    pub log_file: PathBuf,
    pub storage_timeout: Duration,
    pub dispatch: DispatchConfig,
}

/// Knobs the dispatcher needs.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Shared secret gating the teacher flow.
    pub teacher_password: SecretString,
    /// Pause between the individual sends of a bulk retrieval.
    pub send_delay: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            teacher_password: SecretString::from(DEFAULT_TEACHER_PASSWORD.to_string()),
            send_delay: Duration::from_millis(500),
        }
    }
}

impl BotConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| get(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let vk_token = SecretString::from(required("VK_TOKEN")?);
        let vk_group_id = required("VK_GROUP_ID")?.trim().to_string();

        let port: u16 = parse_or(&get, "PORT", 5000)?;
        let send_delay_ms: u64 = parse_or(&get, "BOT_SEND_DELAY_MS", 500)?;
        let storage_timeout_secs: u64 = parse_or(&get, "BOT_STORAGE_TIMEOUT_SECS", 30)?;

        let teacher_password = SecretString::from(
            get("TEACHER_PASSWORD").unwrap_or_else(|| DEFAULT_TEACHER_PASSWORD.to_string()),
        );

        Ok(Self {
            vk_token,
            vk_group_id,
            port,
            db_path: get("BOT_DB_PATH")
                .unwrap_or_else(|| "bot_database.db".to_string())
                .into(),
            backup_dir: get("BOT_BACKUP_DIR")
                .unwrap_or_else(|| "backups".to_string())
                .into(),
            log_file: get("BOT_LOG_FILE")
                .unwrap_or_else(|| "bot.log".to_string())
                .into(),
            storage_timeout: Duration::from_secs(storage_timeout_secs),
            dispatch: DispatchConfig {
                teacher_password,
                send_delay: Duration::from_millis(send_delay_ms),
            },
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?}: {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("VK_TOKEN", "tok"), ("VK_GROUP_ID", "123")]).unwrap();
        assert_eq!(cfg.vk_token.expose_secret(), "tok");
        assert_eq!(cfg.vk_group_id, "123");
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.db_path, PathBuf::from("bot_database.db"));
        assert_eq!(cfg.backup_dir, PathBuf::from("backups"));
        assert_eq!(cfg.log_file, PathBuf::from("bot.log"));
        assert_eq!(cfg.storage_timeout, Duration::from_secs(30));
        assert_eq!(cfg.dispatch.send_delay, Duration::from_millis(500));
        assert_eq!(cfg.dispatch.teacher_password.expose_secret(), "050607");
    }

    #[test]
    fn missing_credentials() {
        let err = config(&[("VK_GROUP_ID", "123")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "VK_TOKEN"));

        let err = config(&[("VK_TOKEN", "tok"), ("VK_GROUP_ID", "  ")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "VK_GROUP_ID"));
    }

    #[test]
    fn overrides_and_invalid_numbers() {
        let cfg = config(&[
            ("VK_TOKEN", "tok"),
            ("VK_GROUP_ID", "123"),
            ("PORT", "8081"),
            ("TEACHER_PASSWORD", "secret"),
            ("BOT_SEND_DELAY_MS", "0"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.dispatch.teacher_password.expose_secret(), "secret");
        assert_eq!(cfg.dispatch.send_delay, Duration::ZERO);

        let err = config(&[("VK_TOKEN", "tok"), ("VK_GROUP_ID", "123"), ("PORT", "http")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));
    }
}
