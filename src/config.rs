use std::collections::HashMap;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use chrono_tz::Tz;

use crate::store::FactPolicy;

pub const DEFAULT_RUN_MODE: &str = "cli";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:4943";
pub const DEFAULT_DB_LOCATION: &str = "./data";
pub const DEFAULT_ON_THIS_DAY_URL: &str =
    "https://api.wikimedia.org/feed/v1/wikipedia/en/onthisday/selected";
pub const DEFAULT_TIMEZONE: &str = "America/New_York";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Raw `KEY=VALUE` pairs read from a config file.
#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, String> {
        let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(format!("Invalid config line {}: {}", idx + 1, line));
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    /// Process environment first, then the file value.
    pub fn prop(&self, key: &str) -> Option<String> {
        env::var(key).ok().or_else(|| self.get(key))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Api,
    Cli,
}

/// Typed settings resolved from an [`AppConfig`].
#[derive(Debug, Clone)]
pub struct Settings {
    pub run_mode: RunMode,
    pub bind_addr: SocketAddr,
    pub db_location: PathBuf,
    pub backend_url: Option<String>,
    pub on_this_day_url: String,
    pub fact_policy: FactPolicy,
    pub timezone: Tz,
    pub log_level: String,
}

impl Settings {
    pub fn resolve(config: &AppConfig) -> Result<Self, String> {
        let run_mode = match config
            .prop("RUN_MODE")
            .unwrap_or(DEFAULT_RUN_MODE.to_string())
            .as_str()
        {
            "api" => RunMode::Api,
            "cli" => RunMode::Cli,
            other => return Err(format!("Invalid run mode {}", other)),
        };
        let bind_addr = config
            .prop("BIND_ADDR")
            .unwrap_or(DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .map_err(|e| format!("Invalid BIND_ADDR {}: {}", bind_addr, e))?;
        let fact_policy: FactPolicy = match config.prop("FACT_POLICY") {
            Some(raw) => raw.parse()?,
            None => FactPolicy::default(),
        };
        let timezone = config
            .prop("TIMEZONE")
            .unwrap_or(DEFAULT_TIMEZONE.to_string());
        let timezone: Tz = timezone
            .parse()
            .map_err(|_| format!("Invalid TIMEZONE {}", timezone))?;

        Ok(Self {
            run_mode,
            bind_addr,
            db_location: PathBuf::from(
                config
                    .prop("DB_LOCATION")
                    .unwrap_or(DEFAULT_DB_LOCATION.to_string()),
            ),
            backend_url: config.prop("BACKEND_URL").filter(|url| !url.trim().is_empty()),
            on_this_day_url: config
                .prop("ON_THIS_DAY_URL")
                .unwrap_or(DEFAULT_ON_THIS_DAY_URL.to_string()),
            fact_policy,
            timezone,
            log_level: config
                .prop("LOG_LEVEL")
                .unwrap_or(DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comments_exports_and_quotes() {
        let config = AppConfig::parse(
            "# planner\n\nexport RUN_MODE=api\nBIND_ADDR = \"0.0.0.0:8080\"\nFACT_POLICY='keep-first'\n",
        )
        .unwrap();
        assert_eq!(config.get("RUN_MODE").as_deref(), Some("api"));
        assert_eq!(config.get("BIND_ADDR").as_deref(), Some("0.0.0.0:8080"));
        assert_eq!(config.get("FACT_POLICY").as_deref(), Some("keep-first"));
    }

    #[test]
    fn environment_overrides_file_values() {
        let config = AppConfig::parse(
            "DAYPLANNER_TEST_OVERRIDDEN=file\nDAYPLANNER_TEST_FILE_ONLY=file\n",
        )
        .unwrap();
        // Keys are unique to this test, so no other test reads them.
        unsafe {
            env::set_var("DAYPLANNER_TEST_OVERRIDDEN", "env");
        }
        assert_eq!(config.prop("DAYPLANNER_TEST_OVERRIDDEN").as_deref(), Some("env"));
        assert_eq!(config.prop("DAYPLANNER_TEST_FILE_ONLY").as_deref(), Some("file"));
        assert_eq!(config.prop("DAYPLANNER_TEST_UNSET"), None);
        unsafe {
            env::remove_var("DAYPLANNER_TEST_OVERRIDDEN");
        }
    }

    #[test]
    fn rejects_lines_without_equals() {
        let err = AppConfig::parse("RUN_MODE api").unwrap_err();
        assert!(err.contains("line 1"));
    }

    #[test]
    fn resolves_typed_settings_from_file_values() {
        let config = AppConfig::parse(
            "RUN_MODE=api\nBIND_ADDR=0.0.0.0:8080\nFACT_POLICY=keep-first\nTIMEZONE=Europe/Berlin\nDB_LOCATION=/tmp/planner\nBACKEND_URL=http://localhost:8080\nON_THIS_DAY_URL=http://localhost:9000/selected\nLOG_LEVEL=debug\n",
        )
        .unwrap();
        let settings = Settings::resolve(&config).unwrap();
        assert_eq!(settings.run_mode, RunMode::Api);
        assert_eq!(settings.bind_addr.port(), 8080);
        assert_eq!(settings.fact_policy, FactPolicy::KeepFirst);
        assert_eq!(settings.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(settings.db_location, PathBuf::from("/tmp/planner"));
        assert_eq!(settings.backend_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(settings.on_this_day_url, "http://localhost:9000/selected");
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn invalid_values_fail_resolution() {
        for content in [
            "RUN_MODE=daemon\nFACT_POLICY=overwrite\nTIMEZONE=UTC\nBIND_ADDR=127.0.0.1:1",
            "RUN_MODE=cli\nFACT_POLICY=sometimes\nTIMEZONE=UTC\nBIND_ADDR=127.0.0.1:1",
            "RUN_MODE=cli\nFACT_POLICY=overwrite\nTIMEZONE=Mars/Olympus\nBIND_ADDR=127.0.0.1:1",
            "RUN_MODE=cli\nFACT_POLICY=overwrite\nTIMEZONE=UTC\nBIND_ADDR=nowhere",
        ] {
            let config = AppConfig::parse(content).unwrap();
            assert!(Settings::resolve(&config).is_err(), "{} should fail", content);
        }
    }
}
