//! Redemption: removes the ledger record behind a completed trade.

use log::debug;

use super::ledger::LootLedger;
use super::types::{ItemDescriptor, ItemRecord, OwnerId, RecordId};
use crate::logutil::short_id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption {
    /// The offer named its record and that record was removed.
    ByIdentity(ItemRecord),
    /// No usable identity; the first record with the same item and count was
    /// removed. May pick the wrong one among identical stacks.
    ByHeuristic(ItemRecord),
    /// Nothing matched; the ledger is unchanged.
    Unmatched,
}

impl Redemption {
    pub fn record(&self) -> Option<&ItemRecord> {
        match self {
            Redemption::ByIdentity(r) | Redemption::ByHeuristic(r) => Some(r),
            Redemption::Unmatched => None,
        }
    }
}

/// Remove the record redeemed by a trade with result `result`.
///
/// An offer that names its record only ever removes that record. Offers
/// without an identity fall back to matching item and count, and only for
/// stackable results.
pub fn redeem(
    ledger: &mut LootLedger,
    owner: &OwnerId,
    record_id: Option<&RecordId>,
    result: &ItemDescriptor,
) -> Redemption {
    match record_id {
        Some(id) => match ledger.remove_by_id(owner, id) {
            Some(record) => {
                debug!("Redeemed record {} for {}", id, short_id(owner));
                Redemption::ByIdentity(record)
            }
            None => Redemption::Unmatched,
        },
        None if result.is_stackable() => {
            match ledger.remove_first_match(owner, &result.item_id, result.count) {
                Some(record) => {
                    debug!(
                        "Redeemed {} x{} for {} by item match",
                        result.item_id,
                        result.count,
                        short_id(owner)
                    );
                    Redemption::ByHeuristic(record)
                }
                None => Redemption::Unmatched,
            }
        }
        None => Redemption::Unmatched,
    }
}
