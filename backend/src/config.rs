use crate::models::IdentifierFormat;
use crate::services::stats::DEFAULT_EXTENT_SIZE;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub collection: CollectionConfig,
    pub stats: StatsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Per-node collection timeout in seconds (default: 5)
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Bytes per on-disk extent, used to convert extent counts (default: 2 MiB)
    pub extent_size: u64,
    /// Render `db`/`table`/`server` fields as names or uuids (default: name)
    pub identifier_format: IdentifierFormat,
}

impl Config {
    /// Load configuration with environment variable override support
    ///
    /// Loading order:
    /// 1. Load from the given path, or the first config file found
    /// 2. Override with environment variables (prefixed with APP_)
    /// 3. Validate the final configuration
    pub fn load(path: Option<&Path>) -> Result<Self, anyhow::Error> {
        // 1. Load from config file
        let mut config = match path {
            Some(path) => Self::from_toml(path)?,
            None => match Self::find_config_file() {
                Some(config_path) => Self::from_toml(Path::new(&config_path))?,
                None => {
                    tracing::warn!("Configuration file not found, using defaults");
                    Config::default()
                },
            },
        };

        // 2. Override with environment variables
        config.apply_env_overrides();

        // 3. Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,cluster_stats=debug")
    /// - APP_LOG_FILE: Log file path
    /// - APP_COLLECTION_TIMEOUT: Per-node collection timeout (accepts "5", "5s", "1m")
    /// - APP_EXTENT_SIZE: Extent size in bytes
    /// - APP_IDENTIFIER_FORMAT: "name" or "uuid"
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides resolved through `lookup`; invalid values are logged and ignored
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Some(file) = lookup("APP_LOG_FILE") {
            self.logging.file = if file.is_empty() { None } else { Some(file) };
            tracing::info!("Override logging.file from env: {:?}", self.logging.file);
        }

        if let Some(timeout) = lookup("APP_COLLECTION_TIMEOUT") {
            match parse_duration_to_secs(&timeout) {
                Ok(val) => {
                    self.collection.timeout_secs = val;
                    tracing::info!(
                        "Override collection.timeout_secs from env: {}",
                        self.collection.timeout_secs
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_COLLECTION_TIMEOUT '{}': {} (keep {})",
                    timeout,
                    e,
                    self.collection.timeout_secs
                ),
            }
        }

        if let Some(extent_size) = lookup("APP_EXTENT_SIZE") {
            match extent_size.parse() {
                Ok(val) => {
                    self.stats.extent_size = val;
                    tracing::info!("Override stats.extent_size from env: {}", self.stats.extent_size);
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_EXTENT_SIZE '{}': {} (keep {})",
                    extent_size,
                    e,
                    self.stats.extent_size
                ),
            }
        }

        if let Some(format) = lookup("APP_IDENTIFIER_FORMAT") {
            match format.parse() {
                Ok(val) => {
                    self.stats.identifier_format = val;
                    tracing::info!(
                        "Override stats.identifier_format from env: {:?}",
                        self.stats.identifier_format
                    );
                },
                Err(e) => tracing::warn!("Invalid APP_IDENTIFIER_FORMAT: {}", e),
            }
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.collection.timeout_secs == 0 {
            anyhow::bail!("collection.timeout_secs must be > 0");
        }
        if self.stats.extent_size == 0 {
            anyhow::bail!("stats.extent_size must be > 0");
        }
        if self.stats.extent_size != DEFAULT_EXTENT_SIZE {
            tracing::warn!(
                "Using non-default extent size {} (default {})",
                self.stats.extent_size,
                DEFAULT_EXTENT_SIZE
            );
        }
        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths = [
            "conf/cluster-stats.toml",
            "cluster-stats.toml",
            "./conf/cluster-stats.toml",
            "./cluster-stats.toml",
        ];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &Path) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, anyhow::Error> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

impl CollectionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,cluster_stats=debug".to_string(), file: None }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self { extent_size: DEFAULT_EXTENT_SIZE, identifier_format: IdentifierFormat::Name }
    }
}

// =========================
// Helpers for parsing values
// =========================

fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Accept plain numbers (treated as seconds)
    if let Ok(val) = input.parse::<u64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    let multiplier: u64 = match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hour" | "hours" => 60 * 60,
        _ => return Err(format!("unsupported unit: {}", unit)),
    };
    n.checked_mul(multiplier).ok_or_else(|| format!("duration too large: {}", input))
}

// Custom serde deserializer to support numeric or human-friendly string values
fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of seconds or a string like '5s', '1m'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(v).map_err(E::custom)
        }
        fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(&v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}
