//! Lost item economy: captures valuable items that leave the world while
//! owned by a player, prices them, and offers them back through roaming
//! merchants.
//!
//! Every piece of mutable state lives in [`CollectorService`]; hosts drive it
//! through the [`EconomyEvents`] handlers and receive spawn and chat requests
//! through [`MerchantHost`].

pub mod consolidate;
pub mod errors;
pub mod host;
pub mod ledger;
pub mod offers;
pub mod pricing;
pub mod redemption;
pub mod service;
pub mod storage;
pub mod summon;
pub mod types;

pub use consolidate::{absorb, AbsorbOutcome, MAX_AGGREGATE_PRICE};
pub use errors::CollectorError;
pub use host::{EconomyEvents, MerchantHost};
pub use ledger::{is_expired, LootLedger};
pub use offers::{
    offer_costs, offer_for_record, split_price, OfferBook, OfferGenerator, OfferRound, RoundKind,
};
pub use pricing::{PriceModel, PriceOverrides};
pub use redemption::{redeem, Redemption};
pub use service::{CollectorService, ServiceSettings};
pub use storage::{CollectorStore, CollectorStoreBuilder, LootStore, StoredRecord};
pub use summon::{CooldownRemaining, SummonCooldowns, SummonOutcome};
pub use types::*;
