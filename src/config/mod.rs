//! # Configuration
//!
//! TOML configuration for the lost item economy and its companion tooling.
//!
//! ```toml
//! [economy]
//! base_price = 4
//! disposal_window_ticks = 336000
//! offer_probability_percent = 15
//! valuable_item_ids = ["minecraft:golden_apple/5"]
//! valuable_tag_ids = []
//!
//! [summoning]
//! enabled = true
//! cooldown_ticks = 96000
//!
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "wandering-collector.log"
//! ```
//!
//! Override entries use the `<namespace:path>/<price>` form. Entries that do
//! not parse are skipped when the price model is built, never at load time.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub summoning: SummoningConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EconomyConfig {
    /// Worth of one diamond in currency units; every other price derives from it.
    #[serde(default = "default_base_price")]
    pub base_price: i64,
    /// Ticks a captured item stays redeemable. Zero expires everything.
    #[serde(default = "default_disposal_window")]
    pub disposal_window_ticks: i64,
    /// Chance, per record, that a merchant offers it on the first interaction.
    #[serde(default = "default_offer_probability")]
    pub offer_probability_percent: u32,
    #[serde(default = "default_valuable_items")]
    pub valuable_item_ids: Vec<String>,
    #[serde(default)]
    pub valuable_tag_ids: Vec<String>,
}

fn default_base_price() -> i64 {
    4
}

fn default_disposal_window() -> i64 {
    336_000 // two weeks of in-game days
}

fn default_offer_probability() -> u32 {
    15
}

fn default_valuable_items() -> Vec<String> {
    [
        "minecraft:golden_apple/5",
        "minecraft:enchanted_golden_apple/15",
        "minecraft:golden_carrot/1",
        "minecraft:totem_of_undying/15",
        "minecraft:nether_star/70",
        "minecraft:ender_pearl/2",
        "minecraft:ender_eye/15",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            base_price: default_base_price(),
            disposal_window_ticks: default_disposal_window(),
            offer_probability_percent: default_offer_probability(),
            valuable_item_ids: default_valuable_items(),
            valuable_tag_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummoningConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ticks a village must wait between bell summons.
    #[serde(default = "default_summon_cooldown")]
    pub cooldown_ticks: i64,
}

fn default_true() -> bool {
    true
}

fn default_summon_cooldown() -> i64 {
    96_000
}

impl Default for SummoningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_ticks: default_summon_cooldown(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: Some("wandering-collector.log".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub fn create_default(path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path.display(), e))?;

        Ok(())
    }

    /// Clamp out-of-range values in place, returning a description of each
    /// adjustment.
    pub fn normalize(&mut self) -> Vec<String> {
        let mut adjustments = Vec::new();
        let economy = &mut self.economy;

        if economy.base_price < 1 {
            adjustments.push(format!("economy.base_price {} raised to 1", economy.base_price));
            economy.base_price = 1;
        } else if economy.base_price > i64::from(u32::MAX) {
            adjustments.push(format!(
                "economy.base_price {} lowered to {}",
                economy.base_price,
                u32::MAX
            ));
            economy.base_price = i64::from(u32::MAX);
        }
        if economy.offer_probability_percent > 100 {
            adjustments.push(format!(
                "economy.offer_probability_percent {} lowered to 100",
                economy.offer_probability_percent
            ));
            economy.offer_probability_percent = 100;
        }
        if economy.disposal_window_ticks < 0 {
            adjustments.push(format!(
                "economy.disposal_window_ticks {} raised to 0",
                economy.disposal_window_ticks
            ));
            economy.disposal_window_ticks = 0;
        }
        if self.summoning.cooldown_ticks < 0 {
            adjustments.push(format!(
                "summoning.cooldown_ticks {} raised to 0",
                self.summoning.cooldown_ticks
            ));
            self.summoning.cooldown_ticks = 0;
        }

        adjustments
    }

    /// Base price as the economy uses it; call `normalize` first.
    pub fn base_price(&self) -> u32 {
        u32::try_from(self.economy.base_price.max(1)).unwrap_or(u32::MAX)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            economy: EconomyConfig::default(),
            summoning: SummoningConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
