use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Application settings for the composer itself (not the plugin project).
///
/// Loaded by [`crate::config::ConfigManager::load_settings`] from built-in
/// defaults, an optional `settings.toml` and `IPLUG_COMPOSER_*` environment
/// variables, in that order of precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub log_dir: String,
    pub debug: bool,
    /// Python interpreter used to run the iPlug2 duplicate script
    pub python: String,
    /// Command used to open the generated IDE project; `{project}` is replaced
    /// by the solution/project path
    pub ide_command: Option<String>,
    pub generator_timeout_secs: u64,
    pub watch_debounce_ms: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub github_base_url: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            debug: false,
            python: if cfg!(target_os = "windows") {
                "python".to_string()
            } else {
                "python3".to_string()
            },
            ide_command: None,
            generator_timeout_secs: 600,
            watch_debounce_ms: 250,
            retry_attempts: 5,
            retry_delay_ms: 200,
            github_base_url: "https://github.com".to_string(),
        }
    }
}

impl AppSettings {
    pub fn log_dir(&self) -> &Utf8Path {
        Utf8Path::new(&self.log_dir)
    }

    pub fn generator_timeout(&self) -> Duration {
        Duration::from_secs(self.generator_timeout_secs)
    }

    pub fn watch_debounce(&self) -> Duration {
        Duration::from_millis(self.watch_debounce_ms)
    }

    pub fn retry_policy(&self) -> crate::services::fs_utils::RetryPolicy {
        crate::services::fs_utils::RetryPolicy {
            attempts: self.retry_attempts.max(1),
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Platform directory holding settings.toml and the recent projects list
pub fn default_settings_dir() -> Utf8PathBuf {
    dirs::config_dir()
        .and_then(|dir| Utf8PathBuf::try_from(dir).ok())
        .map(|dir| dir.join("iplug-composer"))
        .unwrap_or_else(|| Utf8PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = AppSettings::default();
        assert_eq!(settings.generator_timeout(), Duration::from_secs(600));
        assert_eq!(settings.watch_debounce(), Duration::from_millis(250));
        assert!(settings.ide_command.is_none());
    }

    #[test]
    fn test_retry_policy_never_zero_attempts() {
        let settings = AppSettings {
            retry_attempts: 0,
            ..AppSettings::default()
        };
        assert_eq!(settings.retry_policy().attempts, 1);
    }
}
