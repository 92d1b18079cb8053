//! Offer synthesis: turns ledger records into merchant trades and keeps the
//! per-player selection stable across interactions.

use log::debug;
use rand::Rng;

use super::ledger::LootLedger;
use super::pricing::PriceModel;
use super::types::{
    BindingState, Cost, ItemRecord, OwnerId, RecordId, Tick, TradeOffer, TraderBinding,
};
use crate::logutil::short_id;

/// Largest amount of one currency a single offer slot can ask for.
pub const MAX_COST_STACK: u32 = 64;
/// Units per block.
pub const BLOCK_VALUE: u32 = 9;
pub const OFFER_MAX_USES: u32 = 1;
pub const OFFER_PRICE_MULTIPLIER: f32 = 0.05;

/// The merchant's published offer list, as far as the economy touches it.
pub trait OfferBook {
    fn offer_count(&self) -> usize;
    fn truncate_offers(&mut self, len: usize);
    fn push_offer(&mut self, offer: TradeOffer);
}

impl OfferBook for Vec<TradeOffer> {
    fn offer_count(&self) -> usize {
        self.len()
    }

    fn truncate_offers(&mut self, len: usize) {
        self.truncate(len);
    }

    fn push_offer(&mut self, offer: TradeOffer) {
        self.push(offer);
    }
}

/// Split a price into `(blocks, units)`.
///
/// Prices up to 64 are paid in units. Above that, blocks carry the bulk; if
/// more than 64 blocks would be needed the excess folds back into units,
/// which are then capped at 64.
pub fn split_price(price: u32) -> (u32, u32) {
    if price <= MAX_COST_STACK {
        return (0, price);
    }
    let mut blocks = price / BLOCK_VALUE;
    let mut units = price % BLOCK_VALUE;
    if blocks > MAX_COST_STACK {
        units += (blocks - MAX_COST_STACK) * BLOCK_VALUE;
        blocks = MAX_COST_STACK;
        units = units.min(MAX_COST_STACK);
    }
    (blocks, units)
}

/// Primary and optional secondary cost for a price.
pub fn offer_costs(price: u32) -> (Cost, Option<Cost>) {
    match split_price(price) {
        (0, units) => (Cost::units(units), None),
        (blocks, 0) => (Cost::blocks(blocks), None),
        (blocks, units) => (Cost::blocks(blocks), Some(Cost::units(units))),
    }
}

pub fn offer_for_record(pricing: &PriceModel, record: &ItemRecord) -> TradeOffer {
    let (primary, secondary) = offer_costs(pricing.price(&record.descriptor));
    TradeOffer {
        primary,
        secondary,
        result: record.descriptor.clone(),
        record_id: Some(record.id),
        uses: 0,
        max_uses: OFFER_MAX_USES,
        xp: record.descriptor.count,
        price_multiplier: OFFER_PRICE_MULTIPLIER,
    }
}

/// How the subset for this interaction was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundKind {
    /// First interaction: records were drawn and the subset bound.
    Drawn,
    /// Later interaction: the bound subset was replayed.
    Replayed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferRound {
    pub kind: RoundKind,
    /// Records published as offers, in publication order
    pub published: Vec<RecordId>,
    /// Records removed by the expiry sweep
    pub expired: usize,
    /// Stale offers removed from the merchant before publishing
    pub trimmed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferGenerator {
    probability_percent: u32,
    disposal_window: Tick,
}

impl OfferGenerator {
    pub fn new(probability_percent: u32, disposal_window: Tick) -> Self {
        Self {
            probability_percent: probability_percent.min(100),
            disposal_window,
        }
    }

    pub fn probability_percent(&self) -> u32 {
        self.probability_percent
    }

    pub fn disposal_window(&self) -> Tick {
        self.disposal_window
    }

    /// Publish the owner's offers on a merchant.
    ///
    /// The merchant's list is first cut back to the native offer count seen at
    /// the first encounter. Expired records are swept, then the owner's subset
    /// is either drawn (first interaction) or replayed from `binding`.
    #[allow(clippy::too_many_arguments)]
    pub fn generate<R: Rng>(
        &self,
        rng: &mut R,
        pricing: &PriceModel,
        ledger: &mut LootLedger,
        binding: &mut TraderBinding,
        owner: OwnerId,
        now: Tick,
        book: &mut dyn OfferBook,
    ) -> OfferRound {
        let before = book.offer_count();
        let baseline = match binding.baseline_offers {
            Some(baseline) => baseline as usize,
            None => {
                binding.baseline_offers = Some(before as u32);
                before
            }
        };
        if before > baseline {
            book.truncate_offers(baseline);
        }
        let trimmed = before.saturating_sub(book.offer_count());

        let expired = ledger.sweep_expired(&owner, now, self.disposal_window).len();

        let (kind, subset) = match binding.state(&owner) {
            BindingState::Unseen => {
                let drawn: Vec<RecordId> = ledger
                    .records(&owner)
                    .iter()
                    .filter(|_| rng.gen_range(0..100) < self.probability_percent)
                    .map(|r| r.id)
                    .collect();
                (RoundKind::Drawn, drawn)
            }
            BindingState::Bound(ids) => {
                let live: Vec<RecordId> = ids
                    .iter()
                    .copied()
                    .filter(|id| ledger.contains(&owner, id))
                    .collect();
                (RoundKind::Replayed, live)
            }
        };

        for id in &subset {
            if let Some(record) = ledger.get(&owner, id) {
                book.push_offer(offer_for_record(pricing, record));
            }
        }
        debug!(
            "{:?} {} offer(s) for {} ({} expired, {} trimmed)",
            kind,
            subset.len(),
            short_id(&owner),
            expired,
            trimmed
        );

        binding.subsets.insert(owner, subset.clone());
        OfferRound {
            kind,
            published: subset,
            expired,
            trimmed,
        }
    }
}
