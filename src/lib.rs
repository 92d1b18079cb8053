//! # Wandering Collector
//!
//! A lost item economy for block-game servers. Items that leave the world
//! while owned by a player are captured, valued and merged into a per-player
//! ledger, then offered back through wandering merchants. Villages can ring a
//! bell to summon a merchant, subject to a per-village cooldown.
//!
//! ## Module Organization
//!
//! - [`collector`] - pricing, consolidation, ledger, offers, redemption, summoning and the sled store
//! - [`config`] - TOML configuration and clamping of out-of-range values
//! - [`validation`] - parsing of operator-supplied price overrides and ids
//! - [`logutil`] - single-line log rendering helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wandering_collector::collector::{CollectorService, CollectorStoreBuilder, EconomyEvents};
//! use wandering_collector::config::Config;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("collector.toml")?;
//!     let store = CollectorStoreBuilder::new(&config.storage.data_dir).open()?;
//!     let mut service = CollectorService::from_config(&config, store);
//!     service.on_session_start(uuid::Uuid::new_v4());
//!     service.on_shutdown();
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod config;
pub mod logutil;
pub mod validation;
