use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use sled::IVec;

use super::errors::CollectorError;
use super::types::{
    ItemDescriptor, ItemRecord, OwnerId, RecordId, Tick, TraderBinding, TraderId,
    BINDING_SCHEMA_VERSION, RECORD_SCHEMA_VERSION,
};
use crate::logutil::short_id;
use crate::validation::validate_uuid;

const TREE_LOOT: &str = "collector_loot";
const TREE_TRADERS: &str = "collector_traders";

/// Persistence collaborator for ledgers and merchant bindings.
pub trait LootStore {
    /// All stored records for `owner`. Unreadable entries are skipped.
    fn load_records(&self, owner: &OwnerId) -> Result<Vec<ItemRecord>, CollectorError>;
    /// Replace the stored records for `owner` with `records`.
    fn persist_records(&self, owner: &OwnerId, records: &[ItemRecord])
        -> Result<(), CollectorError>;
    fn load_binding(&self, trader: &TraderId) -> Result<Option<TraderBinding>, CollectorError>;
    fn persist_binding(
        &self,
        trader: &TraderId,
        binding: &TraderBinding,
    ) -> Result<(), CollectorError>;
    fn forget_binding(&self, trader: &TraderId) -> Result<(), CollectorError>;
    /// Owners with at least one stored record.
    fn list_owners(&self) -> Result<Vec<OwnerId>, CollectorError>;
}

/// On-disk form of an `ItemRecord`; owner and identity live in the key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredRecord {
    pub schema_version: u8,
    pub descriptor: ItemDescriptor,
    pub created_at: Tick,
}

impl StoredRecord {
    fn from_record(record: &ItemRecord) -> Self {
        Self {
            schema_version: RECORD_SCHEMA_VERSION,
            descriptor: record.descriptor.clone(),
            created_at: record.created_at,
        }
    }

    fn into_record(self, owner: OwnerId, id: RecordId) -> ItemRecord {
        ItemRecord {
            id,
            owner,
            descriptor: self.descriptor,
            created_at: self.created_at,
        }
    }
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct CollectorStoreBuilder {
    path: PathBuf,
}

impl CollectorStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(self) -> Result<CollectorStore, CollectorError> {
        CollectorStore::open(self.path)
    }
}

/// Sled-backed persistence for lost-item ledgers and merchant bindings.
pub struct CollectorStore {
    _db: sled::Db,
    loot: sled::Tree,
    traders: sled::Tree,
}

impl CollectorStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CollectorError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let loot = db.open_tree(TREE_LOOT)?;
        let traders = db.open_tree(TREE_TRADERS)?;
        Ok(Self {
            _db: db,
            loot,
            traders,
        })
    }

    fn owner_prefix(owner: &OwnerId) -> Vec<u8> {
        format!("loot:{}:", owner).into_bytes()
    }

    fn record_key(owner: &OwnerId, id: &RecordId) -> Vec<u8> {
        format!("loot:{}:{}", owner, id).into_bytes()
    }

    fn trader_key(trader: &TraderId) -> Vec<u8> {
        format!("trader:{}", trader).into_bytes()
    }

    /// Split a `loot:<owner>:<record>` key.
    fn parse_record_key(key: &[u8]) -> Result<(OwnerId, RecordId), CollectorError> {
        let text = String::from_utf8_lossy(key);
        let invalid = || CollectorError::InvalidId(text.to_string());
        let rest = text.strip_prefix("loot:").ok_or_else(invalid)?;
        let (owner, record) = rest.split_once(':').ok_or_else(invalid)?;
        let owner = validate_uuid(owner).ok_or_else(invalid)?;
        let record = validate_uuid(record).ok_or_else(invalid)?;
        Ok((owner, RecordId::from_uuid(record)))
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, CollectorError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: &IVec) -> Result<T, CollectorError> {
        Ok(bincode::deserialize::<T>(bytes)?)
    }

    fn decode_record(key: &IVec, value: &IVec) -> Result<ItemRecord, CollectorError> {
        let (owner, id) = Self::parse_record_key(key)?;
        let stored: StoredRecord = Self::deserialize(value)?;
        if stored.schema_version != RECORD_SCHEMA_VERSION {
            return Err(CollectorError::SchemaMismatch {
                entity: "record",
                expected: RECORD_SCHEMA_VERSION,
                found: stored.schema_version,
            });
        }
        Ok(stored.into_record(owner, id))
    }

    /// Fetch a merchant binding, failing with `NotFound` when none is stored.
    pub fn get_binding(&self, trader: &TraderId) -> Result<TraderBinding, CollectorError> {
        let key = Self::trader_key(trader);
        let Some(bytes) = self.traders.get(&key)? else {
            return Err(CollectorError::NotFound(format!("trader: {}", trader)));
        };
        let binding: TraderBinding = Self::deserialize(&bytes)?;
        if binding.schema_version != BINDING_SCHEMA_VERSION {
            return Err(CollectorError::SchemaMismatch {
                entity: "trader binding",
                expected: BINDING_SCHEMA_VERSION,
                found: binding.schema_version,
            });
        }
        Ok(binding)
    }

    /// Number of records stored for `owner`, readable or not.
    pub fn count_records(&self, owner: &OwnerId) -> usize {
        self.loot.scan_prefix(Self::owner_prefix(owner)).count()
    }

    pub fn flush(&self) -> Result<(), CollectorError> {
        self.loot.flush()?;
        self.traders.flush()?;
        Ok(())
    }
}

impl LootStore for CollectorStore {
    fn load_records(&self, owner: &OwnerId) -> Result<Vec<ItemRecord>, CollectorError> {
        let mut records = Vec::new();
        for entry in self.loot.scan_prefix(Self::owner_prefix(owner)) {
            let (key, value) = entry?;
            match Self::decode_record(&key, &value) {
                Ok(record) => records.push(record),
                Err(e) => warn!(
                    "Skipping unreadable record '{}' for {}: {}",
                    String::from_utf8_lossy(&key),
                    short_id(owner),
                    e
                ),
            }
        }
        Ok(records)
    }

    fn persist_records(
        &self,
        owner: &OwnerId,
        records: &[ItemRecord],
    ) -> Result<(), CollectorError> {
        let mut batch = sled::Batch::default();
        for entry in self.loot.scan_prefix(Self::owner_prefix(owner)) {
            let (key, _) = entry?;
            batch.remove(key);
        }
        for record in records {
            let bytes = Self::serialize(&StoredRecord::from_record(record))?;
            batch.insert(Self::record_key(owner, &record.id), bytes);
        }
        self.loot.apply_batch(batch)?;
        self.loot.flush()?;
        Ok(())
    }

    fn load_binding(&self, trader: &TraderId) -> Result<Option<TraderBinding>, CollectorError> {
        match self.get_binding(trader) {
            Ok(binding) => Ok(Some(binding)),
            Err(CollectorError::NotFound(_)) => Ok(None),
            Err(e @ (CollectorError::Bincode(_) | CollectorError::SchemaMismatch { .. })) => {
                warn!("Discarding unreadable binding for trader {}: {}", trader, e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn persist_binding(
        &self,
        trader: &TraderId,
        binding: &TraderBinding,
    ) -> Result<(), CollectorError> {
        let mut binding = binding.clone();
        binding.schema_version = BINDING_SCHEMA_VERSION;
        let bytes = Self::serialize(&binding)?;
        self.traders.insert(Self::trader_key(trader), bytes)?;
        self.traders.flush()?;
        Ok(())
    }

    fn forget_binding(&self, trader: &TraderId) -> Result<(), CollectorError> {
        self.traders.remove(Self::trader_key(trader))?;
        self.traders.flush()?;
        Ok(())
    }

    fn list_owners(&self) -> Result<Vec<OwnerId>, CollectorError> {
        let mut owners = BTreeSet::new();
        for entry in self.loot.scan_prefix(b"loot:") {
            let (key, _) = entry?;
            match Self::parse_record_key(&key) {
                Ok((owner, _)) => {
                    owners.insert(owner);
                }
                Err(e) => warn!("Ignoring malformed loot key: {}", e),
            }
        }
        Ok(owners.into_iter().collect())
    }
}
