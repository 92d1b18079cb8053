//! Stack consolidation: merges a stackable loss into an owner's records while
//! keeping every record within its stack size and under the aggregate price cap.

use log::debug;

use super::pricing::PriceModel;
use super::types::{ItemDescriptor, ItemRecord, OwnerId, RecordId, Tick};

/// No single record may be worth more than this many currency units.
pub const MAX_AGGREGATE_PRICE: u32 = 640;

/// What `absorb` did with an incoming stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbsorbOutcome {
    /// Units added to records that already existed
    pub merged: u32,
    /// Records created for the remainder, in creation order
    pub created: Vec<RecordId>,
}

impl AbsorbOutcome {
    pub fn is_noop(&self) -> bool {
        self.merged == 0 && self.created.is_empty()
    }
}

fn unit_price(pricing: &PriceModel, d: &ItemDescriptor) -> u32 {
    if d.count == 0 {
        return 0;
    }
    pricing.price(d) / d.count
}

/// Merge `incoming` into `records`, topping up partial records of the same
/// item first and carving the rest into fresh capped records.
pub fn absorb(
    pricing: &PriceModel,
    records: &mut Vec<ItemRecord>,
    owner: OwnerId,
    mut incoming: ItemDescriptor,
    now: Tick,
) -> AbsorbOutcome {
    let mut outcome = AbsorbOutcome::default();
    if incoming.count == 0 {
        return outcome;
    }

    for existing in records
        .iter_mut()
        .filter(|r| r.descriptor.item_id == incoming.item_id)
    {
        let max_stack = existing.descriptor.max_stack_size;
        let existing_count = existing.descriptor.count;
        if existing_count >= max_stack {
            continue;
        }

        let existing_price = pricing.price(&existing.descriptor);
        let incoming_price = pricing.price(&incoming);

        if existing_count
            .checked_add(incoming.count)
            .is_some_and(|total| total <= max_stack)
            && existing_price.saturating_add(incoming_price) <= MAX_AGGREGATE_PRICE
        {
            existing.descriptor.count += incoming.count;
            outcome.merged += incoming.count;
            debug!(
                "Merged {} x{} into record {}",
                incoming.item_id, incoming.count, existing.id
            );
            return outcome;
        }

        let per_unit = unit_price(pricing, &incoming);
        let allowed_by_size = max_stack - existing_count;
        let allowed_by_price = if per_unit > 0 {
            MAX_AGGREGATE_PRICE.saturating_sub(existing_price) / per_unit
        } else {
            0
        };
        let added = incoming.count.min(allowed_by_size).min(allowed_by_price);
        if added == 0 {
            continue;
        }

        existing.descriptor.count += added;
        incoming.count -= added;
        outcome.merged += added;
        debug!(
            "Topped up record {} with {} x{}, {} left",
            existing.id, incoming.item_id, added, incoming.count
        );
        if incoming.count == 0 {
            return outcome;
        }
    }

    let max_stack = incoming.max_stack_size.max(1);
    while incoming.count > 0 {
        let per_unit = unit_price(pricing, &incoming);
        let allowed_by_price = if per_unit > 0 {
            (MAX_AGGREGATE_PRICE / per_unit).max(1)
        } else {
            max_stack
        };
        let mut carved = incoming.count.min(allowed_by_price).min(max_stack);

        let mut piece = incoming.clone().with_count(carved);
        while carved > 1 && pricing.price(&piece) > MAX_AGGREGATE_PRICE {
            carved -= 1;
            piece.count = carved;
        }

        let record = ItemRecord::new(owner, piece, now);
        debug!(
            "Carved new record {} for {} x{}",
            record.id, incoming.item_id, carved
        );
        outcome.created.push(record.id);
        records.push(record);
        incoming.count -= carved;
    }

    outcome
}
