//! End-to-end flow: loss, offer, trade, persistence and expiry.

mod common;

use common::{diamonds, netherite_sword, service_in, settings_with_probability, thrown};
use tempfile::TempDir;
use uuid::Uuid;
use wandering_collector::collector::{
    Cost, EconomyEvents, ItemLoss, LootStore, Redemption, RoundKind, TradeOffer,
};

#[test]
fn lost_item_is_offered_and_redeemed() {
    let dir = TempDir::new().expect("tempdir");
    let mut svc = service_in(&dir, settings_with_probability(100), 1);
    let owner = Uuid::new_v4();
    let trader = Uuid::new_v4();

    svc.on_session_start(owner);
    svc.on_item_lost(thrown(owner, netherite_sword().with_enchantments(1), 100));

    let mut book: Vec<TradeOffer> = Vec::new();
    let round = svc
        .on_merchant_interact(owner, trader, 200, &mut book)
        .expect("session active");
    assert_eq!(round.kind, RoundKind::Drawn);
    assert_eq!(book.len(), 1);
    // 16 for the sword, 8 for the enchantment
    assert_eq!(book[0].primary, Cost::units(24));
    assert_eq!(book[0].secondary, None);
    assert_eq!(book[0].xp, 1);

    let mut traded = book[0].clone();
    traded.uses = 1;
    assert!(matches!(
        svc.on_trade_completed(owner, trader, &traded),
        Redemption::ByIdentity(_)
    ));
    assert!(svc.ledger().records(&owner).is_empty());

    let round = svc
        .on_merchant_interact(owner, trader, 300, &mut book)
        .expect("session active");
    assert_eq!(round.kind, RoundKind::Replayed);
    assert!(book.is_empty());
}

#[test]
fn stacks_merge_across_losses_and_survive_restart() {
    let dir = TempDir::new().expect("tempdir");
    let owner = Uuid::new_v4();
    {
        let mut svc = service_in(&dir, settings_with_probability(15), 2);
        svc.on_session_start(owner);
        svc.on_item_lost(thrown(owner, diamonds(10), 0));
        svc.on_item_lost(thrown(owner, diamonds(20), 5));
        let records = svc.ledger().records(&owner);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].descriptor.count, 30);
        svc.on_shutdown();
        assert!(!svc.ledger().is_loaded(&owner));
    }

    let mut svc = service_in(&dir, settings_with_probability(15), 3);
    assert_eq!(svc.store().list_owners().expect("owners"), vec![owner]);
    svc.on_session_start(owner);
    let records = svc.ledger().records(&owner);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].descriptor.count, 30);
    assert_eq!(records[0].created_at, 0);
}

#[test]
fn large_stack_is_split_under_the_price_cap() {
    let dir = TempDir::new().expect("tempdir");
    let mut svc = service_in(&dir, settings_with_probability(100), 4);
    let owner = Uuid::new_v4();
    svc.on_session_start(owner);

    // nether stars are priced at 70 each by default
    let stars = wandering_collector::collector::ItemDescriptor::stack(
        "minecraft:nether_star",
        wandering_collector::collector::Category::Other,
        20,
        64,
    );
    let outcome = svc.on_item_lost(thrown(owner, stars, 0)).expect("captured");
    assert_eq!(outcome.created.len(), 3);

    let records = svc.ledger().records(&owner);
    assert_eq!(records.iter().map(|r| r.descriptor.count).sum::<u32>(), 20);
    for record in records {
        assert!(svc.pricing().price(&record.descriptor) <= 640);
    }
}

#[test]
fn loss_without_session_or_owner_is_dropped() {
    let dir = TempDir::new().expect("tempdir");
    let mut svc = service_in(&dir, settings_with_probability(100), 5);
    let owner = Uuid::new_v4();

    assert!(svc.on_item_lost(thrown(owner, netherite_sword(), 0)).is_none());
    svc.on_session_start(owner);
    let orphan = ItemLoss {
        thrower: None,
        descriptor: netherite_sword(),
        tick: 0,
    };
    assert!(svc.on_item_lost(orphan).is_none());
    assert!(svc.ledger().records(&owner).is_empty());
}

#[test]
fn death_stamped_items_return_to_their_owner() {
    let dir = TempDir::new().expect("tempdir");
    let mut svc = service_in(&dir, settings_with_probability(100), 6);
    let owner = Uuid::new_v4();
    svc.on_session_start(owner);

    let mut inventory = vec![netherite_sword(), diamonds(12)];
    assert_eq!(svc.on_player_death(owner, &mut inventory), 2);
    for item in inventory {
        let loss = ItemLoss {
            thrower: None,
            descriptor: item,
            tick: 40,
        };
        assert!(svc.on_item_lost(loss).is_some());
    }
    assert_eq!(svc.ledger().records(&owner).len(), 2);
}

#[test]
fn expired_records_are_swept_on_interaction() {
    let dir = TempDir::new().expect("tempdir");
    let mut settings = settings_with_probability(100);
    settings.disposal_window = 1_000;
    let mut svc = service_in(&dir, settings, 7);
    let owner = Uuid::new_v4();
    let trader = Uuid::new_v4();
    svc.on_session_start(owner);
    svc.on_item_lost(thrown(owner, netherite_sword(), 0));
    svc.on_item_lost(thrown(owner, netherite_sword(), 900));

    let mut book: Vec<TradeOffer> = Vec::new();
    let round = svc
        .on_merchant_interact(owner, trader, 1_500, &mut book)
        .expect("session active");
    assert_eq!(round.expired, 1);
    assert_eq!(book.len(), 1);
    assert_eq!(svc.ledger().records(&owner).len(), 1);
}

#[test]
fn zero_disposal_window_expires_everything() {
    let dir = TempDir::new().expect("tempdir");
    let mut settings = settings_with_probability(100);
    settings.disposal_window = 0;
    let mut svc = service_in(&dir, settings, 8);
    let owner = Uuid::new_v4();
    svc.on_session_start(owner);
    svc.on_item_lost(thrown(owner, netherite_sword(), 10));

    let mut book: Vec<TradeOffer> = Vec::new();
    svc.on_merchant_interact(owner, Uuid::new_v4(), 10, &mut book);
    assert!(book.is_empty());
    assert!(svc.ledger().records(&owner).is_empty());
}

#[test]
fn identityless_stackable_trade_uses_item_match() {
    let dir = TempDir::new().expect("tempdir");
    let mut svc = service_in(&dir, settings_with_probability(100), 9);
    let owner = Uuid::new_v4();
    let trader = Uuid::new_v4();
    svc.on_session_start(owner);
    svc.on_item_lost(thrown(owner, diamonds(7), 0));

    let mut book: Vec<TradeOffer> = Vec::new();
    svc.on_merchant_interact(owner, trader, 1, &mut book);
    let mut stripped = book[0].clone();
    stripped.record_id = None;
    stripped.uses = stripped.max_uses;

    assert_eq!(svc.on_merchant_closed(owner, trader, &[stripped]), 1);
    assert!(svc.ledger().records(&owner).is_empty());
}
