//! # Shop Configuration
//!
//! Settings that shape the order flow.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     TORQUE_SHOP_NAME=...  TORQUE_DB_PATH=...                            │
//! │     TORQUE_SEARCH_MIN_CHARS=3                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/torque-shop/torque.toml (Linux)                           │
//! │     ~/Library/Application Support/com.torque.torque-shop/torque.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [shop]
//! name = "Torque Detailing"
//!
//! [search]
//! min_query_chars = 3
//!
//! [vehicle]
//! min_year = 1900
//! max_years_ahead = 1
//!
//! [database]
//! path = "/var/lib/torque/torque.db"
//! ```

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use torque_core::validation::MIN_VEHICLE_YEAR;

use crate::error::{ConfigError, ConfigResult};

const CONFIG_FILE: &str = "torque.toml";
const DATABASE_FILE: &str = "torque.db";

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSettings {
    /// Shown in logs and on printed orders.
    #[serde(default = "default_shop_name")]
    pub name: String,
}

fn default_shop_name() -> String {
    "Torque Shop".to_string()
}

impl Default for ShopSettings {
    fn default() -> Self {
        ShopSettings {
            name: default_shop_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Client search returns nothing until the trimmed query is this long.
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,
}

fn default_min_query_chars() -> usize {
    3
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            min_query_chars: default_min_query_chars(),
        }
    }
}

/// Accepted model-year range: `min_year ..= current_year + max_years_ahead`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSettings {
    #[serde(default = "default_min_year")]
    pub min_year: i32,

    /// Next year's models are sold before the calendar turns.
    #[serde(default = "default_max_years_ahead")]
    pub max_years_ahead: i32,
}

fn default_min_year() -> i32 {
    MIN_VEHICLE_YEAR
}

fn default_max_years_ahead() -> i32 {
    1
}

impl Default for VehicleSettings {
    fn default() -> Self {
        VehicleSettings {
            min_year: default_min_year(),
            max_years_ahead: default_max_years_ahead(),
        }
    }
}

impl VehicleSettings {
    /// Newest accepted model year, relative to today.
    pub fn max_year(&self) -> i32 {
        Utc::now().year() + self.max_years_ahead
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file; the platform data dir when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrdersConfig {
    #[serde(default)]
    pub shop: ShopSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub vehicle: VehicleSettings,

    #[serde(default)]
    pub database: DatabaseSettings,
}

impl OrdersConfig {
    /// Defaults, then `torque.toml` if present, then `TORQUE_*` variables.
    ///
    /// With no explicit path the platform config dir is tried. A missing
    /// file is not an error; a malformed one is.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let file = config_path
            .or_else(Self::default_config_path)
            .filter(|path| path.is_file());

        let mut config = match file {
            Some(path) => {
                info!(path = %path.display(), "Reading shop config");
                Self::from_toml(&std::fs::read_to_string(&path)?)?
            }
            None => {
                debug!("No shop config file, starting from defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// [`load`](Self::load), falling back to defaults on any error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        match Self::load(config_path) {
            Ok(config) => config,
            Err(error) => {
                warn!(%error, "Shop config unusable, continuing with defaults");
                Self::default()
            }
        }
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Writes the config as pretty TOML, creating parent directories.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let Some(path) = config_path.or_else(Self::default_config_path) else {
            return Err(ConfigError::NoConfigPath);
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        std::fs::write(&path, rendered)?;
        info!(path = %path.display(), "Shop config written");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.search.min_query_chars == 0 {
            return Err(ConfigError::InvalidConfig(
                "search.min_query_chars must be greater than 0".into(),
            ));
        }

        if self.vehicle.max_years_ahead < 0 {
            return Err(ConfigError::InvalidConfig(
                "vehicle.max_years_ahead must not be negative".into(),
            ));
        }

        if self.vehicle.min_year > self.vehicle.max_year() {
            return Err(ConfigError::InvalidConfig(format!(
                "vehicle.min_year {} is after the newest accepted year {}",
                self.vehicle.min_year,
                self.vehicle.max_year()
            )));
        }

        if self.shop.name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig("shop.name must not be empty".into()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(name) = std::env::var("TORQUE_SHOP_NAME") {
            self.shop.name = name;
        }

        if let Ok(chars) = std::env::var("TORQUE_SEARCH_MIN_CHARS") {
            match chars.parse::<usize>() {
                Ok(n) => {
                    debug!(min_query_chars = n, "Overriding search length from environment");
                    self.search.min_query_chars = n;
                }
                Err(_) => warn!(value = %chars, "Ignoring invalid TORQUE_SEARCH_MIN_CHARS"),
            }
        }

        if let Ok(year) = std::env::var("TORQUE_VEHICLE_MIN_YEAR") {
            if let Ok(y) = year.parse::<i32>() {
                self.vehicle.min_year = y;
            }
        }

        if let Ok(path) = std::env::var("TORQUE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "torque", "torque-shop")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Database file to open: configured path, else the platform data dir.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database
            .path
            .clone()
            .or_else(|| Self::project_dirs().map(|dirs| dirs.data_dir().join(DATABASE_FILE)))
    }

    pub fn min_query_chars(&self) -> usize {
        self.search.min_query_chars
    }

    /// `(min_year, max_year)` accepted for a new vehicle.
    pub fn year_bounds(&self) -> (i32, i32) {
        (self.vehicle.min_year, self.vehicle.max_year())
    }
}
