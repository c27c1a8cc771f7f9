use anyhow::{bail, Context, Result};
use chrono::NaiveTime;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use sched_core::week::WeekStrategyKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub planning: PlanningConfig,
    #[serde(default)]
    pub comfort: ComfortConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlanningConfig {
    /// "HH:MM"
    pub day_start: String,
    pub day_end: String,
    pub week_strategy: WeekStrategyKind,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            day_start: "09:00".into(),
            day_end: "17:00".into(),
            week_strategy: WeekStrategyKind::MondayFinder,
        }
    }
}

impl PlanningConfig {
    pub fn day_window(&self) -> Result<(NaiveTime, NaiveTime)> {
        let parse = |s: &str| {
            NaiveTime::parse_from_str(s, "%H:%M").with_context(|| format!("invalid time of day {s:?}"))
        };
        Ok((parse(&self.day_start)?, parse(&self.day_end)?))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ComfortConfig {
    /// Sensor gateway; without it every room gets the neutral score.
    pub base_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for ComfortConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: 2000,
        }
    }
}

impl ComfortConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    pub seed_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JobsConfig {
    /// Seconds a finished background job stays queryable.
    pub retention_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self { retention_secs: 3600 }
    }
}

impl JobsConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

impl Config {
    /// Defaults, then `roomplan.yaml` (or `$ROOMPLAN_CONFIG`), then
    /// `ROOMPLAN__*` environment variables.
    pub fn load() -> Result<Self> {
        let file = std::env::var("ROOMPLAN_CONFIG").unwrap_or_else(|_| "roomplan.yaml".into());
        Self::from_file(file)
    }

    fn from_file(file: impl Into<PathBuf>) -> Result<Self> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file.into()))
            .merge(Env::prefixed("ROOMPLAN__").split("__"))
            .extract()
            .context("failed to read configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let (start, end) = self.planning.day_window()?;
        if start >= end {
            bail!("planning.day_start must be before planning.day_end");
        }
        if self.comfort.timeout_ms == 0 {
            bail!("comfort.timeout_ms must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_jailed() -> Result<Config> {
        Config::from_file("roomplan.yaml")
    }

    #[test]
    fn defaults_are_valid() {
        let c = Config::default();
        c.validate().unwrap();
        assert_eq!(c.server.port, 8080);
        assert_eq!(
            c.planning.day_window().unwrap(),
            (NaiveTime::from_hms_opt(9, 0, 0).unwrap(), NaiveTime::from_hms_opt(17, 0, 0).unwrap())
        );
    }

    #[test]
    fn env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "roomplan.yaml",
                "server:\n  port: 9000\nplanning:\n  day_start: \"08:00\"\n  day_end: \"16:00\"\n  week_strategy: iso\n",
            )?;
            jail.set_env("ROOMPLAN__SERVER__PORT", "9100");
            jail.set_env("ROOMPLAN__JOBS__RETENTION_SECS", "60");
            let c = load_jailed().map_err(|e| e.to_string())?;
            assert_eq!(c.jobs.retention(), Duration::from_secs(60));
            assert_eq!(c.server.port, 9100);
            assert_eq!(c.planning.week_strategy, WeekStrategyKind::Iso);
            assert_eq!(c.planning.day_start, "08:00");
            Ok(())
        });
    }

    #[test]
    fn inverted_day_window_is_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("roomplan.yaml", "planning:\n  day_start: \"17:00\"\n  day_end: \"09:00\"\n")?;
            assert!(load_jailed().is_err());
            Ok(())
        });
    }
}
