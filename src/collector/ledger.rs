//! In-memory loot ledger: the outstanding records of every owner with an
//! active session, plus the expiry rule applied to them.

use log::{debug, warn};
use std::collections::{HashMap, HashSet};

use super::consolidate::{absorb, AbsorbOutcome};
use super::pricing::PriceModel;
use super::types::{ItemDescriptor, ItemRecord, OwnerId, RecordId, Tick};
use crate::logutil::short_id;

/// True when `record` should be disposed of at `now`.
///
/// A window of zero expires every record regardless of age.
pub fn is_expired(record: &ItemRecord, now: Tick, disposal_window: Tick) -> bool {
    disposal_window == 0 || now > record.created_at.saturating_add(disposal_window)
}

#[derive(Debug, Default)]
pub struct LootLedger {
    entries: HashMap<OwnerId, Vec<ItemRecord>>,
}

impl LootLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an owner's records, replacing anything already loaded for them.
    /// Records repeating an identity already seen are dropped.
    pub fn load(&mut self, owner: OwnerId, records: Vec<ItemRecord>) -> usize {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(records.len());
        for mut record in records {
            if !seen.insert(record.id) {
                warn!(
                    "Dropping duplicate record {} for {}",
                    record.id,
                    short_id(&owner)
                );
                continue;
            }
            record.owner = owner;
            kept.push(record);
        }
        let count = kept.len();
        self.entries.insert(owner, kept);
        count
    }

    /// Remove an owner from memory, handing back their records for persistence.
    pub fn evict(&mut self, owner: &OwnerId) -> Option<Vec<ItemRecord>> {
        self.entries.remove(owner)
    }

    pub fn is_loaded(&self, owner: &OwnerId) -> bool {
        self.entries.contains_key(owner)
    }

    pub fn owners(&self) -> Vec<OwnerId> {
        self.entries.keys().copied().collect()
    }

    pub fn records(&self, owner: &OwnerId) -> &[ItemRecord] {
        self.entries.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, owner: &OwnerId, id: &RecordId) -> Option<&ItemRecord> {
        self.records(owner).iter().find(|r| &r.id == id)
    }

    pub fn contains(&self, owner: &OwnerId, id: &RecordId) -> bool {
        self.get(owner, id).is_some()
    }

    /// Capture a lost item for a loaded owner. Non-stackable items become a
    /// fresh record; stackable items are consolidated. Returns `None` when the
    /// owner has no active session.
    pub fn capture(
        &mut self,
        pricing: &PriceModel,
        owner: OwnerId,
        descriptor: ItemDescriptor,
        now: Tick,
    ) -> Option<AbsorbOutcome> {
        let records = self.entries.get_mut(&owner)?;
        if descriptor.count == 0 {
            return Some(AbsorbOutcome::default());
        }
        if descriptor.is_stackable() {
            return Some(absorb(pricing, records, owner, descriptor, now));
        }

        let record = ItemRecord::new(owner, descriptor, now);
        debug!(
            "Captured {} as record {} for {}",
            record.descriptor.item_id,
            record.id,
            short_id(&owner)
        );
        let outcome = AbsorbOutcome {
            merged: 0,
            created: vec![record.id],
        };
        records.push(record);
        Some(outcome)
    }

    pub fn remove_by_id(&mut self, owner: &OwnerId, id: &RecordId) -> Option<ItemRecord> {
        let records = self.entries.get_mut(owner)?;
        let index = records.iter().position(|r| &r.id == id)?;
        Some(records.remove(index))
    }

    /// Remove the first record with the same item and exact count.
    pub fn remove_first_match(
        &mut self,
        owner: &OwnerId,
        item_id: &str,
        count: u32,
    ) -> Option<ItemRecord> {
        let records = self.entries.get_mut(owner)?;
        let index = records
            .iter()
            .position(|r| r.descriptor.item_id == item_id && r.descriptor.count == count)?;
        Some(records.remove(index))
    }

    /// Drop every expired record for `owner`, returning what was removed.
    pub fn sweep_expired(
        &mut self,
        owner: &OwnerId,
        now: Tick,
        disposal_window: Tick,
    ) -> Vec<ItemRecord> {
        let Some(records) = self.entries.get_mut(owner) else {
            return Vec::new();
        };
        let (expired, live): (Vec<_>, Vec<_>) = records
            .drain(..)
            .partition(|r| is_expired(r, now, disposal_window));
        *records = live;
        if !expired.is_empty() {
            debug!(
                "Expired {} record(s) for {}",
                expired.len(),
                short_id(owner)
            );
        }
        expired
    }

    pub fn total_records(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}
