//! Price model and valuable-item filter.
//!
//! Prices are whole currency units. Resolution order:
//! 1. enchanted books cost the flat base price;
//! 2. configured item/tag overrides cost `configured * count`;
//! 3. category rules (weapon, armor, tool, then the generic block/ingot rule);
//! 4. every branch except books adds `enchantments * base * 2`.

use log::{debug, warn};

use super::types::{Armor, Category, ItemDescriptor, Material, Tool, Weapon};
use crate::logutil::escape_log;
use crate::validation::{parse_price_override, PriceOverride};

/// Items that are never captured no matter what else is true about them.
pub const EXCLUDED_ITEM_IDS: &[&str] = &["minecraft:emerald", "minecraft:air"];

/// Operator price overrides, matched by exact item id first, then by tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceOverrides {
    items: Vec<PriceOverride>,
    tags: Vec<PriceOverride>,
}

impl PriceOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build overrides from `<id>/<price>` config entries. Bad entries are
    /// logged and skipped; the rest still apply.
    pub fn from_entries<I, T>(item_entries: I, tag_entries: T) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        Self {
            items: parse_entries("item", item_entries),
            tags: parse_entries("tag", tag_entries),
        }
    }

    pub fn with_item(mut self, id: impl Into<String>, price: u32) -> Self {
        self.items.push(PriceOverride {
            id: id.into(),
            price,
        });
        self
    }

    pub fn with_tag(mut self, id: impl Into<String>, price: u32) -> Self {
        self.tags.push(PriceOverride {
            id: id.into(),
            price,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.items.len() + self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.tags.is_empty()
    }

    /// Configured per-unit price for the descriptor, if any entry matches.
    pub fn price_for(&self, descriptor: &ItemDescriptor) -> Option<u32> {
        self.items
            .iter()
            .find(|o| o.id == descriptor.item_id)
            .or_else(|| self.tags.iter().find(|o| descriptor.has_tag(&o.id)))
            .map(|o| o.price)
    }
}

fn parse_entries<I>(kind: &str, entries: I) -> Vec<PriceOverride>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|entry| match parse_price_override(entry.as_ref()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(
                    "Ignoring {} price override '{}': {}",
                    kind,
                    escape_log(entry.as_ref()),
                    e
                );
                None
            }
        })
        .collect()
}

// ============================================================================
// Category predicates
// ============================================================================

pub fn is_excluded(d: &ItemDescriptor) -> bool {
    d.count == 0 || EXCLUDED_ITEM_IDS.contains(&d.item_id.as_str())
}

pub fn is_enchanted_book(d: &ItemDescriptor) -> bool {
    d.category == Category::EnchantedBook
}

/// Ranged weapons always count; swords only above the basic tiers.
pub fn is_weapon(d: &ItemDescriptor) -> bool {
    match d.category {
        Category::Weapon(Weapon::Sword(material)) => !material.is_basic(),
        Category::Weapon(_) => true,
        _ => false,
    }
}

pub fn is_armor(d: &ItemDescriptor) -> bool {
    match d.category {
        Category::Armor(Armor::Elytra) => true,
        Category::Armor(Armor::Worn { material, .. }) => !material.is_basic(),
        _ => false,
    }
}

pub fn is_tool(d: &ItemDescriptor) -> bool {
    match d.category {
        Category::Tool(tool) => tool.material().map_or(true, |m| !m.is_basic()),
        _ => false,
    }
}

pub fn is_effect_potion(d: &ItemDescriptor) -> bool {
    d.category == Category::Potion
}

pub fn is_valuable_block(d: &ItemDescriptor) -> bool {
    matches!(
        d.category,
        Category::Block(Material::Diamond | Material::Netherite)
    )
}

pub fn is_valuable_ingot(d: &ItemDescriptor) -> bool {
    matches!(
        d.category,
        Category::Ingot(Material::Diamond | Material::Netherite)
    )
}

// ============================================================================
// Price model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceModel {
    base_price: u32,
    overrides: PriceOverrides,
}

impl PriceModel {
    /// `base_price` is what a diamond is worth; anything below 1 is raised to 1.
    pub fn new(base_price: u32, overrides: PriceOverrides) -> Self {
        Self {
            base_price: base_price.max(1),
            overrides,
        }
    }

    pub fn base_price(&self) -> u32 {
        self.base_price
    }

    pub fn overrides(&self) -> &PriceOverrides {
        &self.overrides
    }

    pub fn configured_price(&self, d: &ItemDescriptor) -> Option<u32> {
        self.overrides.price_for(d)
    }

    /// True when the item may be captured into a ledger.
    pub fn is_valuable(&self, d: &ItemDescriptor) -> bool {
        !is_excluded(d)
            && (d.is_enchanted()
                || is_enchanted_book(d)
                || is_weapon(d)
                || is_armor(d)
                || is_tool(d)
                || is_effect_potion(d)
                || is_valuable_block(d)
                || is_valuable_ingot(d)
                || self.configured_price(d).is_some())
    }

    pub fn price(&self, d: &ItemDescriptor) -> u32 {
        let base = self.base_price;

        if is_enchanted_book(d) {
            return base;
        }

        let price = if let Some(configured) = self.configured_price(d) {
            configured.saturating_mul(d.count)
        } else if is_weapon(d) {
            weapon_price(base, d.category)
        } else if is_armor(d) {
            armor_price(base, d.category)
        } else if is_tool(d) {
            tool_price(base, d.category)
        } else {
            generic_price(base, d)
        };

        price.saturating_add(self.enchant_bonus(d))
    }

    fn enchant_bonus(&self, d: &ItemDescriptor) -> u32 {
        d.enchantments
            .saturating_mul(self.base_price)
            .saturating_mul(2)
    }
}

fn top_tier_doubled(price: u32, material: Material) -> u32 {
    if material.is_top_tier() {
        price.saturating_mul(2)
    } else {
        price
    }
}

fn weapon_price(base: u32, category: Category) -> u32 {
    match category {
        Category::Weapon(Weapon::Sword(material)) => {
            top_tier_doubled(base.saturating_mul(2), material)
        }
        _ => base.saturating_add(base.saturating_mul(4)),
    }
}

fn armor_price(base: u32, category: Category) -> u32 {
    match category {
        Category::Armor(Armor::Worn { slot, material }) => {
            top_tier_doubled(base.saturating_mul(slot.material_count()), material)
        }
        _ => base.saturating_mul(20),
    }
}

fn tool_price(base: u32, category: Category) -> u32 {
    match category {
        // half the base price, rounded half up
        Category::Tool(Tool::FishingRod) => base / 2 + base % 2,
        Category::Tool(tool) => {
            let price = base.saturating_mul(tool.material_count());
            match tool.material() {
                Some(material) => top_tier_doubled(price, material),
                None => price,
            }
        }
        _ => base,
    }
}

fn generic_price(base: u32, d: &ItemDescriptor) -> u32 {
    let mut price = base;
    match d.category {
        Category::Block(material) => {
            price = top_tier_doubled(base.saturating_mul(9), material);
        }
        Category::Ingot(Material::Netherite) => {
            price = price.saturating_mul(2);
        }
        _ => {}
    }
    let total = price.saturating_mul(d.count);
    debug!("Generic price for {} x{}: {}", d.item_id, d.count, total);
    total
}
