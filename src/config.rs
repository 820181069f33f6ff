use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::analytics::DashboardOptions;
use crate::ops::{MaintenanceMode, MaintenanceOptions};

// ============================================================================
// Configuration - environment variables, optionally from a .env file
// ============================================================================

/// Longest accepted growth window, about a century
pub const MAX_GROWTH_WINDOW_DAYS: i64 = 36_500;
pub const MAX_DAYS_BACK: u32 = 3_660;
pub const MAX_MONTHS_BACK: u32 = 1_200;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string. Absent means the JSON snapshot file is used.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub snapshot_path: PathBuf,
    pub metrics_port: Option<u16>,
    pub repair_seed: u64,
    pub maintenance_mode: MaintenanceMode,
    pub maintenance_concurrency: usize,
    /// Pause between runs in `serve` mode
    pub maintenance_interval_secs: u64,
    pub growth_window_days: i64,
    pub months_back: u32,
    pub days_back: u32,
    pub top_countries: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name -> value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let defaults = DashboardOptions::default();

        let config = Self {
            database_url: get("DATABASE_URL"),
            db_max_connections: parse(&get, "DB_MAX_CONNECTIONS")?.unwrap_or(5),
            snapshot_path: get("SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/orders.json")),
            metrics_port: parse(&get, "METRICS_PORT")?,
            repair_seed: parse(&get, "REPAIR_SEED")?.unwrap_or(42),
            maintenance_mode: parse(&get, "MAINTENANCE_MODE")?.unwrap_or(MaintenanceMode::Repair),
            maintenance_concurrency: positive(parse(&get, "MAINTENANCE_CONCURRENCY")?, "MAINTENANCE_CONCURRENCY")?
                .unwrap_or(8),
            maintenance_interval_secs: positive(
                parse(&get, "MAINTENANCE_INTERVAL_SECS")?,
                "MAINTENANCE_INTERVAL_SECS",
            )?
            .unwrap_or(3600),
            growth_window_days: at_most(
                positive(parse(&get, "GROWTH_WINDOW_DAYS")?, "GROWTH_WINDOW_DAYS")?,
                MAX_GROWTH_WINDOW_DAYS,
                "GROWTH_WINDOW_DAYS",
            )?
            .unwrap_or(defaults.growth_window_days),
            months_back: at_most(parse(&get, "MONTHS_BACK")?, MAX_MONTHS_BACK, "MONTHS_BACK")?
                .unwrap_or(defaults.months_back),
            days_back: at_most(parse(&get, "DAYS_BACK")?, MAX_DAYS_BACK, "DAYS_BACK")?
                .unwrap_or(defaults.days_back),
            top_countries: parse(&get, "TOP_COUNTRIES")?.unwrap_or(defaults.top_countries),
        };

        tracing::debug!(
            backend = if config.database_url.is_some() { "postgres" } else { "snapshot_file" },
            mode = %config.maintenance_mode,
            "Configuration loaded"
        );

        Ok(config)
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            growth_window_days: self.growth_window_days,
            months_back: self.months_back,
            days_back: self.days_back,
            top_countries: self.top_countries,
            ..DashboardOptions::default()
        }
    }

    pub fn maintenance_options(&self, mode: MaintenanceMode) -> MaintenanceOptions {
        MaintenanceOptions {
            mode,
            seed: self.repair_seed,
            concurrency: self.maintenance_concurrency,
            ..MaintenanceOptions::default()
        }
    }
}

fn parse<T, G>(get: &G, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        None => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

fn positive<T>(value: Option<T>, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: PartialOrd + Default + ToString,
{
    match value {
        Some(v) if v <= T::default() => Err(ConfigError::Invalid {
            name,
            value: v.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        other => Ok(other),
    }
}

fn at_most<T>(value: Option<T>, max: T, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: PartialOrd + ToString,
{
    match value {
        Some(v) if v > max => Err(ConfigError::Invalid {
            name,
            value: v.to_string(),
            reason: format!("must be at most {}", max.to_string()),
        }),
        other => Ok(other),
    }
}
