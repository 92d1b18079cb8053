//! Test utilities & fixtures shared by the integration tests.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;
use wandering_collector::collector::{
    BlockPos, Category, CollectorService, CollectorStore, CollectorStoreBuilder, ItemDescriptor,
    ItemLoss, Material, MerchantHost, OwnerId, ServiceSettings, Tick, Weapon,
};

/// Host double that records every outbound call.
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingHost {
    pub spawned: Vec<(BlockPos, BlockPos)>,
    pub messages: Vec<(OwnerId, String)>,
}

impl MerchantHost for RecordingHost {
    fn spawn_merchant(&mut self, at: BlockPos, wander_to: BlockPos) {
        self.spawned.push((at, wander_to));
    }

    fn send_message(&mut self, owner: &OwnerId, text: &str) {
        self.messages.push((*owner, text.to_string()));
    }
}

/// Service backed by a sled store in `dir`, with a seeded RNG.
#[allow(dead_code)]
pub fn service_in(
    dir: &TempDir,
    settings: ServiceSettings,
    seed: u64,
) -> CollectorService<CollectorStore> {
    // sled releases its file lock from a background thread after drop, so a
    // reopen right after a "restart" can briefly see the old lock.
    let mut attempts = 0;
    let store = loop {
        match CollectorStoreBuilder::new(dir.path()).open() {
            Ok(store) => break store,
            Err(err) if attempts < 100 && format!("{:?}", err).contains("could not acquire lock") => {
                attempts += 1;
                std::thread::sleep(std::time::Duration::from_millis(20));
            }
            Err(err) => panic!("open store: {:?}", err),
        }
    };
    CollectorService::with_rng(settings, store, StdRng::seed_from_u64(seed))
}

#[allow(dead_code)]
pub fn settings_with_probability(percent: u32) -> ServiceSettings {
    let mut settings = ServiceSettings::default();
    settings.offer_probability_percent = percent;
    settings
}

#[allow(dead_code)]
pub fn netherite_sword() -> ItemDescriptor {
    ItemDescriptor::new(
        "minecraft:netherite_sword",
        Category::Weapon(Weapon::Sword(Material::Netherite)),
    )
}

#[allow(dead_code)]
pub fn diamonds(count: u32) -> ItemDescriptor {
    ItemDescriptor::stack(
        "minecraft:diamond",
        Category::Ingot(Material::Diamond),
        count,
        64,
    )
}

#[allow(dead_code)]
pub fn thrown(owner: OwnerId, descriptor: ItemDescriptor, tick: Tick) -> ItemLoss {
    ItemLoss {
        thrower: Some(owner),
        descriptor,
        tick,
    }
}
