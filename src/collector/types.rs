use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

pub const RECORD_SCHEMA_VERSION: u8 = 1;
pub const BINDING_SCHEMA_VERSION: u8 = 1;

/// Player that owns captured items.
pub type OwnerId = Uuid;
/// Merchant entity that publishes offers.
pub type TraderId = Uuid;
/// Host-assigned village structure reference.
pub type VillageId = i64;
/// Game time in ticks (20 ticks per second, 24000 per day).
pub type Tick = i64;

/// Opaque identity of a captured record. Assigned once, never reused.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Item classification
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Wood,
    Stone,
    Leather,
    Chainmail,
    Iron,
    Gold,
    Diamond,
    Netherite,
    Turtle,
    Other,
}

impl Material {
    /// Basic gear is never captured unless enchanted or explicitly priced.
    pub fn is_basic(self) -> bool {
        matches!(
            self,
            Material::Wood | Material::Stone | Material::Leather | Material::Iron | Material::Gold
        )
    }

    pub fn is_top_tier(self) -> bool {
        self == Material::Netherite
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ArmorSlot {
    Head,
    Chest,
    Legs,
    Feet,
}

impl ArmorSlot {
    /// Material units needed to craft a piece for this slot
    pub fn material_count(self) -> u32 {
        match self {
            ArmorSlot::Head => 5,
            ArmorSlot::Chest => 8,
            ArmorSlot::Legs => 7,
            ArmorSlot::Feet => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Weapon {
    Sword(Material),
    Bow,
    Crossbow,
    Trident,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Armor {
    Worn { slot: ArmorSlot, material: Material },
    /// Full-body glider
    Elytra,
    /// Horse and wolf armor; never captured as armor
    Animal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Pickaxe(Material),
    Axe(Material),
    Shovel(Material),
    Hoe(Material),
    FishingRod,
}

impl Tool {
    pub fn material(self) -> Option<Material> {
        match self {
            Tool::Pickaxe(m) | Tool::Axe(m) | Tool::Shovel(m) | Tool::Hoe(m) => Some(m),
            Tool::FishingRod => None,
        }
    }

    pub fn material_count(self) -> u32 {
        match self {
            Tool::Pickaxe(_) | Tool::Axe(_) => 3,
            Tool::Shovel(_) => 1,
            Tool::Hoe(_) => 2,
            Tool::FishingRod => 0,
        }
    }
}

/// Closed item classification, computed once by the host when it builds a descriptor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    EnchantedBook,
    Weapon(Weapon),
    Armor(Armor),
    Tool(Tool),
    Block(Material),
    Ingot(Material),
    Potion,
    Other,
}

// ============================================================================
// Items and records
// ============================================================================

/// Everything the economy needs to know about an item stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemDescriptor {
    /// Namespaced item id, e.g. `minecraft:diamond_sword`
    pub item_id: String,
    pub count: u32,
    /// Number of distinct enchantments on the stack
    #[serde(default)]
    pub enchantments: u32,
    pub category: Category,
    /// Item tags the stack belongs to, used for tag price overrides
    #[serde(default)]
    pub tags: Vec<String>,
    pub max_stack_size: u32,
    /// Owner stamped on the stack when its holder died
    #[serde(default)]
    pub owner_tag: Option<OwnerId>,
}

impl ItemDescriptor {
    pub fn new(item_id: impl Into<String>, category: Category) -> Self {
        Self {
            item_id: item_id.into(),
            count: 1,
            enchantments: 0,
            category,
            tags: Vec::new(),
            max_stack_size: 1,
            owner_tag: None,
        }
    }

    /// A stackable descriptor with the given count and natural stack limit.
    pub fn stack(
        item_id: impl Into<String>,
        category: Category,
        count: u32,
        max_stack_size: u32,
    ) -> Self {
        Self {
            count,
            max_stack_size,
            ..Self::new(item_id, category)
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_enchantments(mut self, enchantments: u32) -> Self {
        self.enchantments = enchantments;
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_stackable(&self) -> bool {
        self.max_stack_size > 1
    }

    pub fn is_enchanted(&self) -> bool {
        self.enchantments > 0
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// One captured lost item, owned by a single player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemRecord {
    pub id: RecordId,
    pub owner: OwnerId,
    pub descriptor: ItemDescriptor,
    /// Tick at which the record was created; expiry counts from here
    pub created_at: Tick,
}

impl ItemRecord {
    pub fn new(owner: OwnerId, mut descriptor: ItemDescriptor, created_at: Tick) -> Self {
        descriptor.owner_tag = None;
        Self {
            id: RecordId::new(),
            owner,
            descriptor,
            created_at,
        }
    }
}

/// A loss reported by the host: an owned item entity left the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLoss {
    /// Player that dropped or threw the item, when the entity still knows it
    pub thrower: Option<OwnerId>,
    pub descriptor: ItemDescriptor,
    pub tick: Tick,
}

impl ItemLoss {
    /// The thrower wins; otherwise fall back to the owner stamped at death.
    pub fn resolved_owner(&self) -> Option<OwnerId> {
        self.thrower.or(self.descriptor.owner_tag)
    }
}

// ============================================================================
// Merchant offers
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    /// Single currency token
    Unit,
    /// Compressed block worth nine units
    Block,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cost {
    pub currency: Currency,
    pub amount: u32,
}

impl Cost {
    pub fn units(amount: u32) -> Self {
        Self {
            currency: Currency::Unit,
            amount,
        }
    }

    pub fn blocks(amount: u32) -> Self {
        Self {
            currency: Currency::Block,
            amount,
        }
    }
}

/// A trade published on a merchant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeOffer {
    pub primary: Cost,
    pub secondary: Option<Cost>,
    pub result: ItemDescriptor,
    /// Ledger record this offer redeems; `None` for native or legacy offers
    pub record_id: Option<RecordId>,
    pub uses: u32,
    pub max_uses: u32,
    pub xp: u32,
    pub price_multiplier: f32,
}

impl TradeOffer {
    pub fn is_exhausted(&self) -> bool {
        self.uses >= self.max_uses
    }
}

/// Persisted per-merchant state: the native offer count and, per player,
/// the stable subset of records chosen for that player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TraderBinding {
    pub schema_version: u8,
    pub baseline_offers: Option<u32>,
    pub subsets: HashMap<OwnerId, Vec<RecordId>>,
}

impl TraderBinding {
    pub fn new() -> Self {
        Self {
            schema_version: BINDING_SCHEMA_VERSION,
            baseline_offers: None,
            subsets: HashMap::new(),
        }
    }

    pub fn state(&self, owner: &OwnerId) -> BindingState<'_> {
        match self.subsets.get(owner) {
            Some(subset) => BindingState::Bound(subset),
            None => BindingState::Unseen,
        }
    }
}

impl Default for TraderBinding {
    fn default() -> Self {
        Self::new()
    }
}

/// Offer state of one (merchant, player) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState<'a> {
    Unseen,
    Bound(&'a [RecordId]),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y,
            z: self.z + dz,
        }
    }
}
