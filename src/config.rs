use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;
use crate::reconcile::cache::MergeMode;

#[derive(Clone, Debug, Default)]
pub struct Features {
    pub refresh_task: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Config {
    pub poll_interval: Duration,
    pub data_path: PathBuf,
    pub db_path: PathBuf,
    pub logs_path: PathBuf,
    /// Root of the scraper snapshot directories, one per provider.
    pub providers_path: PathBuf,
    pub merge_mode: MergeMode,
    pub features: Features,
}

impl Config {
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_secs(3600),
            data_path: PathBuf::from("./data"),
            db_path: PathBuf::from("./data/database.json"),
            logs_path: PathBuf::from("./data/logs"),
            providers_path: PathBuf::from("./data/providers"),
            merge_mode: MergeMode::Incremental,
            features: Features { refresh_task: true },
        }
    }

    /// Overrides defaults with values from the environment.
    pub fn load(&mut self) -> Result<(), AppError> {
        if let Ok(data_path) = std::env::var("DATA_PATH") {
            self.data_path = PathBuf::from(data_path);
        }
        self.db_path = std::env::var("DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.data_path.join("database.json"));
        self.logs_path = std::env::var("LOGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.data_path.join("logs"));
        self.providers_path = std::env::var("PROVIDERS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| self.data_path.join("providers"));

        if let Ok(raw) = std::env::var("POLL_INTERVAL") {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| AppError::ConfigurationError {
                    msg: format!("POLL_INTERVAL must be a positive number of seconds, got `{raw}`"),
                })?;
            self.poll_interval = Duration::from_secs(secs);
        }

        if Self::flag("FULL_RESYNC", false)? {
            self.merge_mode = MergeMode::FullResync;
        }
        self.features.refresh_task = Self::flag("FEATURE_REFRESH_TASK", true)?;
        Ok(())
    }

    fn flag(key: &str, default: bool) -> Result<bool, AppError> {
        match std::env::var(key) {
            Err(_) => Ok(default),
            Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(AppError::ConfigurationError {
                    msg: format!("{key} must be a boolean, got `{raw}`"),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    const KEYS: [&str; 7] = [
        "DATA_PATH",
        "DB_PATH",
        "LOGS_PATH",
        "PROVIDERS_PATH",
        "POLL_INTERVAL",
        "FULL_RESYNC",
        "FEATURE_REFRESH_TASK",
    ];

    fn clear_env() {
        for key in KEYS {
            // SAFETY: env-mutating tests are serialized.
            unsafe { std::env::remove_var(key) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: env-mutating tests are serialized.
        unsafe { std::env::set_var(key, value) };
    }

    #[test]
    #[serial]
    fn test_defaults_derive_from_data_path() {
        clear_env();
        set_env("DATA_PATH", "/tmp/manga");

        let mut config = Config::new();
        config.load().unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/manga/database.json"));
        assert_eq!(config.logs_path, PathBuf::from("/tmp/manga/logs"));
        assert_eq!(config.providers_path, PathBuf::from("/tmp/manga/providers"));
        assert_eq!(config.poll_interval, Duration::from_secs(3600));
        assert_eq!(config.merge_mode, MergeMode::Incremental);
        assert!(config.features.refresh_task);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        set_env("DB_PATH", "/srv/db.json");
        set_env("PROVIDERS_PATH", "/srv/scrapes");
        set_env("POLL_INTERVAL", "120");
        set_env("FULL_RESYNC", "true");
        set_env("FEATURE_REFRESH_TASK", "0");

        let mut config = Config::new();
        config.load().unwrap();

        assert_eq!(config.db_path, PathBuf::from("/srv/db.json"));
        assert_eq!(config.providers_path, PathBuf::from("/srv/scrapes"));
        assert_eq!(config.poll_interval, Duration::from_secs(120));
        assert_eq!(config.merge_mode, MergeMode::FullResync);
        assert!(!config.features.refresh_task);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_are_rejected() {
        clear_env();
        set_env("POLL_INTERVAL", "soon");
        assert!(matches!(
            Config::new().load(),
            Err(AppError::ConfigurationError { .. })
        ));

        clear_env();
        set_env("FULL_RESYNC", "maybe");
        assert!(matches!(
            Config::new().load(),
            Err(AppError::ConfigurationError { .. })
        ));
        clear_env();
    }
}
