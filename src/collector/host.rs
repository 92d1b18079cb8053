//! The seams between the economy and the game host.

use super::consolidate::AbsorbOutcome;
use super::offers::{OfferBook, OfferRound};
use super::redemption::Redemption;
use super::summon::SummonOutcome;
use super::types::{BlockPos, ItemDescriptor, ItemLoss, OwnerId, Tick, TradeOffer, TraderId, VillageId};

/// Calls the economy makes back into the host.
pub trait MerchantHost {
    /// Spawn a merchant near `at` and send it wandering towards `wander_to`.
    /// The host picks the surface height at `at`.
    fn spawn_merchant(&mut self, at: BlockPos, wander_to: BlockPos);
    fn send_message(&mut self, owner: &OwnerId, text: &str);
}

/// One handler per inbound host event.
///
/// Handlers run to completion on the host's simulation thread and never fail;
/// storage problems are logged and the affected step is skipped. A completed
/// trade must be reported once, either through `on_trade_completed` or as an
/// exhausted offer passed to `on_merchant_closed`.
pub trait EconomyEvents {
    /// Load the owner's stored records; captures for them start now.
    fn on_session_start(&mut self, owner: OwnerId);

    /// Persist the owner's records and drop them from memory.
    fn on_session_end(&mut self, owner: OwnerId);

    /// Persist every loaded ledger.
    fn on_shutdown(&mut self);

    /// Stamp valuable items in a dying player's inventory with their owner.
    /// Returns how many stacks were stamped.
    fn on_player_death(&mut self, owner: OwnerId, inventory: &mut [ItemDescriptor]) -> usize;

    /// An owned item left the world. `None` when nothing was captured.
    fn on_item_lost(&mut self, loss: ItemLoss) -> Option<AbsorbOutcome>;

    /// A player opened a merchant. `None` when the player has no active session.
    fn on_merchant_interact(
        &mut self,
        owner: OwnerId,
        trader: TraderId,
        now: Tick,
        offers: &mut dyn OfferBook,
    ) -> Option<OfferRound>;

    fn on_trade_completed(
        &mut self,
        owner: OwnerId,
        trader: TraderId,
        offer: &TradeOffer,
    ) -> Redemption;

    /// The trade screen closed; exhausted offers count as completed trades.
    /// Returns how many records were redeemed.
    fn on_merchant_closed(&mut self, owner: OwnerId, trader: TraderId, offers: &[TradeOffer])
        -> usize;

    fn on_merchant_despawned(&mut self, trader: TraderId);

    fn on_bell_rung(
        &mut self,
        village: VillageId,
        bell: BlockPos,
        now: Tick,
        owner: OwnerId,
        host: &mut dyn MerchantHost,
    ) -> SummonOutcome;
}
