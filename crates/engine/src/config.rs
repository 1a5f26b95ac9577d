//! Configuration loading for the scheduling engine.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl DatabaseConfig {
    /// The persistence-layer view of this configuration.
    pub fn pool_config(&self) -> persistence::db::DatabaseConfig {
        persistence::db::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Business parameters of the negotiation and sweep. All tunable; the
/// defaults reflect the product rules.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    /// How many counter-offers a negotiation may see before the decision
    /// holder must accept or decline.
    #[serde(default = "default_max_counter_offers")]
    pub max_counter_offers: i32,

    /// Geo-fence radius for check-ins, in meters.
    #[serde(default = "default_check_in_radius_meters")]
    pub check_in_radius_meters: f64,

    /// Minutes after the meeting time (or after the first check-in) before
    /// the sweep forces a terminal transition.
    #[serde(default = "default_grace_period_minutes")]
    pub grace_period_minutes: i64,

    /// How often the expiry sweep runs.
    #[serde(default = "default_sweep_interval_minutes")]
    pub sweep_interval_minutes: u64,

    /// Symmetric tolerance around a meeting time for advisory conflicts.
    #[serde(default = "default_conflict_window_minutes")]
    pub conflict_window_minutes: i64,

    /// Symmetric window within which a second appointment for the same pet
    /// pair counts as a duplicate.
    #[serde(default = "default_dedup_window_minutes")]
    pub dedup_window_minutes: i64,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            max_counter_offers: default_max_counter_offers(),
            check_in_radius_meters: default_check_in_radius_meters(),
            grace_period_minutes: default_grace_period_minutes(),
            sweep_interval_minutes: default_sweep_interval_minutes(),
            conflict_window_minutes: default_conflict_window_minutes(),
            dedup_window_minutes: default_dedup_window_minutes(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// Port for the Prometheus exporter; disabled when unset.
    #[serde(default)]
    pub port: Option<u16>,
}

// Default value functions
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_max_counter_offers() -> i32 {
    3
}
fn default_check_in_radius_meters() -> f64 {
    200.0
}
fn default_grace_period_minutes() -> i64 {
    90
}
fn default_sweep_interval_minutes() -> u64 {
    5
}
fn default_conflict_window_minutes() -> i64 {
    60
}
fn default_dedup_window_minutes() -> i64 {
    1440
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with PETMEET__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("PETMEET").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(config::ConfigError::Message)?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), String> {
        if self.database.url.is_empty() {
            return Err("database.url must be set".into());
        }
        if self.scheduling.max_counter_offers < 1 {
            return Err("scheduling.max_counter_offers must be at least 1".into());
        }
        if self.scheduling.check_in_radius_meters <= 0.0 {
            return Err("scheduling.check_in_radius_meters must be positive".into());
        }
        if self.scheduling.grace_period_minutes < 1 {
            return Err("scheduling.grace_period_minutes must be at least 1".into());
        }
        if self.scheduling.sweep_interval_minutes < 1 {
            return Err("scheduling.sweep_interval_minutes must be at least 1".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Config {
        Config {
            database: DatabaseConfig {
                url: "postgres://localhost/petmeet".into(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                connect_timeout_secs: default_connect_timeout(),
                idle_timeout_secs: default_idle_timeout(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
            scheduling: SchedulingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }

    #[test]
    fn test_scheduling_defaults_match_product_rules() {
        let scheduling = SchedulingConfig::default();
        assert_eq!(scheduling.max_counter_offers, 3);
        assert_eq!(scheduling.check_in_radius_meters, 200.0);
        assert_eq!(scheduling.grace_period_minutes, 90);
        assert_eq!(scheduling.sweep_interval_minutes, 5);
        assert_eq!(scheduling.conflict_window_minutes, 60);
        assert_eq!(scheduling.dedup_window_minutes, 1440);
    }

    #[test]
    fn test_validate_rejects_empty_database_url() {
        let mut cfg = minimal_config();
        cfg.database.url = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_scheduling_values() {
        let mut cfg = minimal_config();
        cfg.scheduling.max_counter_offers = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = minimal_config();
        cfg.scheduling.check_in_radius_meters = -1.0;
        assert!(cfg.validate().is_err());

        let mut cfg = minimal_config();
        cfg.scheduling.sweep_interval_minutes = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_scheduling_config_deserialize_partial() {
        let scheduling: SchedulingConfig =
            serde_json::from_str(r#"{"max_counter_offers": 5}"#).unwrap();
        assert_eq!(scheduling.max_counter_offers, 5);
        assert_eq!(scheduling.grace_period_minutes, 90);
    }

    #[test]
    fn test_pool_config_conversion() {
        let cfg = minimal_config();
        let pool_cfg = cfg.database.pool_config();
        assert_eq!(pool_cfg.url, cfg.database.url);
        assert_eq!(pool_cfg.max_connections, 20);
    }
}
