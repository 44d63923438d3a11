//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{collections::HashMap, num::NonZeroU32, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::{
    CATALOG_ABSOLUTE_MINUTES, DEFAULT_ABSOLUTE_MINUTES, DEFAULT_SLIDING_MINUTES,
    DEFAULT_SWEEP_INTERVAL_SECS, EntityKind, ExpirationPolicy, WriteConsistency,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "storefront";
const ENV_PREFIX: &str = "STOREFRONT";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const MAX_POLICY_MINUTES: u64 = 366 * 24 * 60;
const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Command-line arguments for the storefront binary.
#[derive(Debug, Parser)]
#[command(
    name = "storefront",
    version,
    about = "Storefront back office with a read-through entity cache"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "STOREFRONT_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the resolved per-entity expiration policies as JSON.
    Policies(PoliciesArgs),
    /// Load every collection through the cached services and print cache statistics.
    Warm(WarmArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct PoliciesArgs {
    #[command(flatten)]
    pub overrides: CacheOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct WarmArgs {
    #[command(flatten)]
    pub overrides: WarmOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct CacheOverrides {
    /// Override the write consistency mode (bounded_staleness|invalidate_on_write).
    #[arg(long = "cache-consistency", value_name = "MODE")]
    pub cache_consistency: Option<String>,

    /// Enable or disable the entity cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct WarmOverrides {
    #[command(flatten)]
    pub cache: CacheOverrides,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub consistency: WriteConsistency,
    /// `None` when the background sweep is switched off.
    pub sweep_interval: Option<Duration>,
    pub default_policy: ExpirationPolicy,
    pub policies: HashMap<EntityKind, ExpirationPolicy>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Policies(args)) => raw.apply_cache_overrides(&args.overrides),
        Some(Command::Warm(args)) => raw.apply_warm_overrides(&args.overrides),
        None => {}
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_warm_overrides(&mut self, overrides: &WarmOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }

        self.apply_cache_overrides(&overrides.cache);
    }

    fn apply_cache_overrides(&mut self, overrides: &CacheOverrides) {
        if let Some(mode) = overrides.cache_consistency.as_ref() {
            self.cache.consistency = Some(mode.clone());
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            database,
            cache,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_connections = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = NonZeroU32::new(max_connections).ok_or_else(|| {
        LoadError::invalid("database.max_connections", "must be greater than zero")
    })?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let consistency = match cache.consistency {
        Some(value) => WriteConsistency::from_str(&value)
            .map_err(|reason| LoadError::invalid("cache.consistency", reason))?,
        None => WriteConsistency::default(),
    };

    let sweep_secs = cache
        .sweep_interval_seconds
        .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);
    if sweep_secs > MAX_SWEEP_INTERVAL_SECS {
        return Err(LoadError::invalid(
            "cache.sweep_interval_seconds",
            format!("must be at most {MAX_SWEEP_INTERVAL_SECS}"),
        ));
    }
    let sweep_interval = (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs));

    let sliding = policy_minutes(
        cache.sliding_minutes.unwrap_or(DEFAULT_SLIDING_MINUTES),
        "cache.sliding_minutes",
    )?;
    let absolute = policy_minutes(
        cache.absolute_minutes.unwrap_or(DEFAULT_ABSOLUTE_MINUTES),
        "cache.absolute_minutes",
    )?;
    let default_policy = expiration_policy(sliding, absolute, "cache.sliding_minutes")?;

    // Product and Category get at least the catalog absolute bound.
    let catalog =
        ExpirationPolicy::from_minutes(sliding, absolute.max(CATALOG_ABSOLUTE_MINUTES));
    let mut policies = HashMap::from([
        (EntityKind::Product, catalog),
        (EntityKind::Category, catalog),
    ]);

    for (name, raw_policy) in cache.policies {
        let kind = EntityKind::from_label(&name).ok_or_else(|| {
            LoadError::invalid("cache.policies", format!("unknown entity `{name}`"))
        })?;
        let base = policies.get(&kind).copied().unwrap_or(default_policy);

        let sliding = match raw_policy.sliding_minutes {
            Some(minutes) => policy_minutes(minutes, "cache.policies.sliding_minutes")?,
            None => base.sliding().as_secs() / 60,
        };
        let absolute = match raw_policy.absolute_minutes {
            Some(minutes) => policy_minutes(minutes, "cache.policies.absolute_minutes")?,
            None => base.absolute().as_secs() / 60,
        };

        policies.insert(
            kind,
            expiration_policy(sliding, absolute, "cache.policies.sliding_minutes")?,
        );
    }

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        consistency,
        sweep_interval,
        default_policy,
        policies,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    consistency: Option<String>,
    sweep_interval_seconds: Option<u64>,
    sliding_minutes: Option<u64>,
    absolute_minutes: Option<u64>,
    policies: HashMap<String, RawPolicySettings>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPolicySettings {
    sliding_minutes: Option<u64>,
    absolute_minutes: Option<u64>,
}

fn policy_minutes(value: u64, key: &'static str) -> Result<u64, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    if value > MAX_POLICY_MINUTES {
        return Err(LoadError::invalid(
            key,
            format!("must be at most {MAX_POLICY_MINUTES}"),
        ));
    }
    Ok(value)
}

fn expiration_policy(
    sliding: u64,
    absolute: u64,
    key: &'static str,
) -> Result<ExpirationPolicy, LoadError> {
    if sliding > absolute {
        return Err(LoadError::invalid(
            key,
            format!("sliding window of {sliding} minutes exceeds the absolute bound of {absolute}"),
        ));
    }
    Ok(ExpirationPolicy::from_minutes(sliding, absolute))
}
