//! The economy service: owns every piece of process-wide state and answers
//! host events through [`EconomyEvents`].

use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

use super::consolidate::AbsorbOutcome;
use super::host::{EconomyEvents, MerchantHost};
use super::ledger::LootLedger;
use super::offers::{OfferBook, OfferGenerator, OfferRound};
use super::pricing::{PriceModel, PriceOverrides};
use super::redemption::{redeem, Redemption};
use super::storage::LootStore;
use super::summon::{SummonCooldowns, SummonOutcome, SUMMONED_MESSAGE};
use super::types::{
    BlockPos, ItemDescriptor, ItemLoss, ItemRecord, OwnerId, Tick, TradeOffer, TraderBinding,
    TraderId, VillageId,
};
use crate::config::Config;
use crate::logutil::short_id;

/// Tunables the service needs, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub pricing: PriceModel,
    pub offer_probability_percent: u32,
    pub disposal_window: Tick,
    pub summoning_enabled: bool,
    pub summon_cooldown: Tick,
}

impl ServiceSettings {
    /// Settings from a loaded config. Out-of-range values are clamped.
    pub fn from_config(config: &Config) -> Self {
        let mut config = config.clone();
        for adjustment in config.normalize() {
            info!("Config adjusted: {}", adjustment);
        }
        let overrides = PriceOverrides::from_entries(
            &config.economy.valuable_item_ids,
            &config.economy.valuable_tag_ids,
        );
        Self {
            pricing: PriceModel::new(config.base_price(), overrides),
            offer_probability_percent: config.economy.offer_probability_percent,
            disposal_window: config.economy.disposal_window_ticks,
            summoning_enabled: config.summoning.enabled,
            summon_cooldown: config.summoning.cooldown_ticks,
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct CollectorService<S: LootStore> {
    pricing: PriceModel,
    offers: OfferGenerator,
    summoning_enabled: bool,
    summon_cooldown: Tick,
    ledger: LootLedger,
    cooldowns: SummonCooldowns,
    bindings: HashMap<TraderId, TraderBinding>,
    store: S,
    rng: StdRng,
}

impl<S: LootStore> CollectorService<S> {
    pub fn new(settings: ServiceSettings, store: S) -> Self {
        Self::with_rng(settings, store, StdRng::from_entropy())
    }

    /// Same as `new` but with a caller-supplied RNG, for reproducible draws.
    pub fn with_rng(settings: ServiceSettings, store: S, rng: StdRng) -> Self {
        Self {
            pricing: settings.pricing,
            offers: OfferGenerator::new(
                settings.offer_probability_percent,
                settings.disposal_window,
            ),
            summoning_enabled: settings.summoning_enabled,
            summon_cooldown: settings.summon_cooldown,
            ledger: LootLedger::new(),
            cooldowns: SummonCooldowns::new(),
            bindings: HashMap::new(),
            store,
            rng,
        }
    }

    pub fn from_config(config: &Config, store: S) -> Self {
        Self::new(ServiceSettings::from_config(config), store)
    }

    pub fn pricing(&self) -> &PriceModel {
        &self.pricing
    }

    pub fn ledger(&self) -> &LootLedger {
        &self.ledger
    }

    pub fn cooldowns(&self) -> &SummonCooldowns {
        &self.cooldowns
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn binding(&self, trader: &TraderId) -> Option<&TraderBinding> {
        self.bindings.get(trader)
    }

    fn persist_owner(&self, owner: &OwnerId, records: &[ItemRecord]) {
        match self.store.persist_records(owner, records) {
            Ok(()) => info!(
                "Persisted {} record(s) for {}",
                records.len(),
                short_id(owner)
            ),
            Err(e) => error!("Failed to persist records for {}: {}", short_id(owner), e),
        }
    }

    /// Make sure the trader's binding is cached, reading it from the store
    /// the first time the trader is seen.
    fn cache_binding(&mut self, trader: TraderId) {
        if self.bindings.contains_key(&trader) {
            return;
        }
        let binding = match self.store.load_binding(&trader) {
            Ok(Some(binding)) => binding,
            Ok(None) => TraderBinding::new(),
            Err(e) => {
                error!("Failed to load binding for trader {}: {}", trader, e);
                TraderBinding::new()
            }
        };
        self.bindings.insert(trader, binding);
    }

    fn redeem_offer(&mut self, owner: &OwnerId, offer: &TradeOffer) -> Redemption {
        redeem(
            &mut self.ledger,
            owner,
            offer.record_id.as_ref(),
            &offer.result,
        )
    }
}

impl<S: LootStore> EconomyEvents for CollectorService<S> {
    fn on_session_start(&mut self, owner: OwnerId) {
        match self.store.load_records(&owner) {
            Ok(records) => {
                let count = self.ledger.load(owner, records);
                info!("Loaded {} record(s) for {}", count, short_id(&owner));
            }
            Err(e) => error!("Failed to load records for {}: {}", short_id(&owner), e),
        }
    }

    fn on_session_end(&mut self, owner: OwnerId) {
        if let Some(records) = self.ledger.evict(&owner) {
            self.persist_owner(&owner, &records);
        }
    }

    fn on_shutdown(&mut self) {
        for owner in self.ledger.owners() {
            if let Some(records) = self.ledger.evict(&owner) {
                self.persist_owner(&owner, &records);
            }
        }
    }

    fn on_player_death(&mut self, owner: OwnerId, inventory: &mut [ItemDescriptor]) -> usize {
        let mut stamped = 0;
        for item in inventory
            .iter_mut()
            .filter(|item| self.pricing.is_valuable(item))
        {
            item.owner_tag = Some(owner);
            stamped += 1;
        }
        debug!("Stamped {} item(s) for {}", stamped, short_id(&owner));
        stamped
    }

    fn on_item_lost(&mut self, loss: ItemLoss) -> Option<AbsorbOutcome> {
        let owner = loss.resolved_owner()?;
        if !self.pricing.is_valuable(&loss.descriptor) {
            return None;
        }
        let outcome = self
            .ledger
            .capture(&self.pricing, owner, loss.descriptor, loss.tick);
        if outcome.is_none() {
            debug!("No active session for {}, loss dropped", short_id(&owner));
        }
        outcome
    }

    fn on_merchant_interact(
        &mut self,
        owner: OwnerId,
        trader: TraderId,
        now: Tick,
        offers: &mut dyn OfferBook,
    ) -> Option<OfferRound> {
        if !self.ledger.is_loaded(&owner) {
            debug!("Interaction from {} without a session", short_id(&owner));
            return None;
        }
        self.cache_binding(trader);
        let binding = self.bindings.entry(trader).or_default();
        let round = self.offers.generate(
            &mut self.rng,
            &self.pricing,
            &mut self.ledger,
            binding,
            owner,
            now,
            offers,
        );
        if let Err(e) = self.store.persist_binding(&trader, binding) {
            error!("Failed to persist binding for trader {}: {}", trader, e);
        }
        Some(round)
    }

    fn on_trade_completed(
        &mut self,
        owner: OwnerId,
        trader: TraderId,
        offer: &TradeOffer,
    ) -> Redemption {
        let outcome = self.redeem_offer(&owner, offer);
        if outcome == Redemption::Unmatched {
            debug!(
                "Trade of {} with trader {} matched no record",
                offer.result.item_id, trader
            );
        }
        outcome
    }

    fn on_merchant_closed(
        &mut self,
        owner: OwnerId,
        trader: TraderId,
        offers: &[TradeOffer],
    ) -> usize {
        let redeemed = offers
            .iter()
            .filter(|offer| offer.is_exhausted())
            .filter(|offer| self.redeem_offer(&owner, offer) != Redemption::Unmatched)
            .count();
        debug!(
            "Closed trader {} for {}: {} redeemed",
            trader,
            short_id(&owner),
            redeemed
        );
        redeemed
    }

    fn on_merchant_despawned(&mut self, trader: TraderId) {
        self.bindings.remove(&trader);
        if let Err(e) = self.store.forget_binding(&trader) {
            error!("Failed to forget binding for trader {}: {}", trader, e);
        }
    }

    fn on_bell_rung(
        &mut self,
        village: VillageId,
        bell: BlockPos,
        now: Tick,
        owner: OwnerId,
        host: &mut dyn MerchantHost,
    ) -> SummonOutcome {
        if !self.summoning_enabled {
            return SummonOutcome::Disabled;
        }
        let outcome =
            self.cooldowns
                .try_summon(&mut self.rng, village, bell, now, self.summon_cooldown);
        match outcome {
            SummonOutcome::Spawn { at } => {
                host.spawn_merchant(at, bell);
                host.send_message(&owner, SUMMONED_MESSAGE);
            }
            SummonOutcome::Denied(remaining) => {
                host.send_message(&owner, &remaining.message());
            }
            SummonOutcome::Disabled => {}
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::storage::{CollectorStore, CollectorStoreBuilder};
    use crate::collector::types::{Category, Material, Weapon};
    use tempfile::TempDir;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingHost {
        spawned: Vec<(BlockPos, BlockPos)>,
        messages: Vec<(OwnerId, String)>,
    }

    impl MerchantHost for RecordingHost {
        fn spawn_merchant(&mut self, at: BlockPos, wander_to: BlockPos) {
            self.spawned.push((at, wander_to));
        }

        fn send_message(&mut self, owner: &OwnerId, text: &str) {
            self.messages.push((*owner, text.to_string()));
        }
    }

    fn service(dir: &TempDir, settings: ServiceSettings) -> CollectorService<CollectorStore> {
        let store = CollectorStoreBuilder::new(dir.path()).open().expect("store");
        CollectorService::with_rng(settings, store, StdRng::seed_from_u64(17))
    }

    fn sword() -> ItemDescriptor {
        ItemDescriptor::new(
            "minecraft:diamond_sword",
            Category::Weapon(Weapon::Sword(Material::Diamond)),
        )
    }

    fn lost(thrower: Option<OwnerId>, descriptor: ItemDescriptor, tick: Tick) -> ItemLoss {
        ItemLoss {
            thrower,
            descriptor,
            tick,
        }
    }

    #[test]
    fn losses_need_an_active_session() {
        let dir = TempDir::new().expect("tempdir");
        let mut svc = service(&dir, ServiceSettings::default());
        let owner = Uuid::new_v4();

        assert!(svc.on_item_lost(lost(Some(owner), sword(), 0)).is_none());
        svc.on_session_start(owner);
        assert!(svc.on_item_lost(lost(Some(owner), sword(), 0)).is_some());
        assert_eq!(svc.ledger().records(&owner).len(), 1);
    }

    #[test]
    fn worthless_items_are_ignored() {
        let dir = TempDir::new().expect("tempdir");
        let mut svc = service(&dir, ServiceSettings::default());
        let owner = Uuid::new_v4();
        svc.on_session_start(owner);
        let dirt = ItemDescriptor::stack("minecraft:dirt", Category::Block(Material::Other), 64, 64);
        assert!(svc.on_item_lost(lost(Some(owner), dirt, 0)).is_none());
        assert!(svc.on_item_lost(lost(None, sword(), 0)).is_none());
        assert!(svc.ledger().records(&owner).is_empty());
    }

    #[test]
    fn death_stamp_resolves_owner() {
        let dir = TempDir::new().expect("tempdir");
        let mut svc = service(&dir, ServiceSettings::default());
        let owner = Uuid::new_v4();
        svc.on_session_start(owner);

        let stick = ItemDescriptor::stack("minecraft:stick", Category::Other, 3, 64);
        let mut inventory = vec![sword(), stick];
        assert_eq!(svc.on_player_death(owner, &mut inventory), 1);
        assert_eq!(inventory[0].owner_tag, Some(owner));
        assert_eq!(inventory[1].owner_tag, None);

        let outcome = svc.on_item_lost(lost(None, inventory[0].clone(), 9));
        assert_eq!(outcome.map(|o| o.created.len()), Some(1));
        assert_eq!(svc.ledger().records(&owner)[0].descriptor.owner_tag, None);
    }

    #[test]
    fn session_end_persists_and_evicts() {
        let dir = TempDir::new().expect("tempdir");
        let mut svc = service(&dir, ServiceSettings::default());
        let owner = Uuid::new_v4();
        svc.on_session_start(owner);
        svc.on_item_lost(lost(Some(owner), sword(), 3));
        svc.on_session_end(owner);

        assert!(!svc.ledger().is_loaded(&owner));
        assert_eq!(svc.store().load_records(&owner).expect("load").len(), 1);

        svc.on_session_start(owner);
        assert_eq!(svc.ledger().records(&owner).len(), 1);
    }

    #[test]
    fn trade_redeems_by_identity() {
        let dir = TempDir::new().expect("tempdir");
        let mut settings = ServiceSettings::default();
        settings.offer_probability_percent = 100;
        let mut svc = service(&dir, settings);
        let owner = Uuid::new_v4();
        let trader = Uuid::new_v4();
        svc.on_session_start(owner);
        svc.on_item_lost(lost(Some(owner), sword(), 0));

        let mut book: Vec<TradeOffer> = Vec::new();
        let round = svc
            .on_merchant_interact(owner, trader, 10, &mut book)
            .expect("round");
        assert_eq!(round.published.len(), 1);

        let outcome = svc.on_trade_completed(owner, trader, &book[0]);
        assert!(matches!(outcome, Redemption::ByIdentity(_)));
        assert!(svc.ledger().records(&owner).is_empty());
        assert_eq!(
            svc.on_trade_completed(owner, trader, &book[0]),
            Redemption::Unmatched
        );
    }

    #[test]
    fn closing_redeems_exhausted_offers_only() {
        let dir = TempDir::new().expect("tempdir");
        let mut settings = ServiceSettings::default();
        settings.offer_probability_percent = 100;
        let mut svc = service(&dir, settings);
        let owner = Uuid::new_v4();
        let trader = Uuid::new_v4();
        svc.on_session_start(owner);
        svc.on_item_lost(lost(Some(owner), sword(), 0));
        svc.on_item_lost(lost(Some(owner), sword(), 0));

        let mut book: Vec<TradeOffer> = Vec::new();
        svc.on_merchant_interact(owner, trader, 1, &mut book);
        book[0].uses = book[0].max_uses;

        assert_eq!(svc.on_merchant_closed(owner, trader, &book), 1);
        assert_eq!(svc.ledger().records(&owner).len(), 1);
        assert_eq!(
            svc.ledger().records(&owner)[0].id,
            book[1].record_id.expect("identity")
        );
    }

    #[test]
    fn despawn_forgets_binding() {
        let dir = TempDir::new().expect("tempdir");
        let mut svc = service(&dir, ServiceSettings::default());
        let owner = Uuid::new_v4();
        let trader = Uuid::new_v4();
        svc.on_session_start(owner);
        let mut book: Vec<TradeOffer> = Vec::new();
        svc.on_merchant_interact(owner, trader, 0, &mut book);
        assert!(svc.binding(&trader).is_some());
        assert!(svc.store().load_binding(&trader).expect("load").is_some());

        svc.on_merchant_despawned(trader);
        assert!(svc.binding(&trader).is_none());
        assert!(svc.store().load_binding(&trader).expect("load").is_none());
    }

    #[test]
    fn bell_summons_and_reports_cooldown() {
        let dir = TempDir::new().expect("tempdir");
        let mut svc = service(&dir, ServiceSettings::default());
        let owner = Uuid::new_v4();
        let bell = BlockPos::new(0, 64, 0);
        let mut host = RecordingHost::default();

        let first = svc.on_bell_rung(7, bell, 0, owner, &mut host);
        assert!(matches!(first, SummonOutcome::Spawn { .. }));
        assert_eq!(host.spawned.len(), 1);
        assert_eq!(host.spawned[0].1, bell);
        assert_eq!(host.messages[0].1, SUMMONED_MESSAGE);

        let second = svc.on_bell_rung(7, bell, 50_000, owner, &mut host);
        assert!(matches!(second, SummonOutcome::Denied(_)));
        assert_eq!(host.spawned.len(), 1);
        assert_eq!(
            host.messages[1].1,
            "There aren't any new traders nearby, come back in 2 days"
        );
    }

    #[test]
    fn disabled_summoning_does_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let mut settings = ServiceSettings::default();
        settings.summoning_enabled = false;
        let mut svc = service(&dir, settings);
        let mut host = RecordingHost::default();
        let outcome = svc.on_bell_rung(1, BlockPos::new(0, 64, 0), 0, Uuid::new_v4(), &mut host);
        assert_eq!(outcome, SummonOutcome::Disabled);
        assert!(host.spawned.is_empty());
        assert!(host.messages.is_empty());
        assert_eq!(svc.cooldowns().last_summon(1), None);
    }
}
