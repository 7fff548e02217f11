//! Position assignment for items placed at a visual slot.
//!
//! Pure functions that decide the ordering key for an item being
//! inserted, moved, or removed, and when a column's keys must be
//! reindexed. Column-scoped: a cross-column move computes against the
//! destination column's current keys only. Used by the board store;
//! has no knowledge of items or columns, only sorted key sequences.

/// Outcome of asking for a key at a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPosition {
    /// A key strictly between the slot's neighbors.
    At(i64),
    /// No representable key exists between the neighbors; the column
    /// must be reindexed before the slot can be filled.
    NeedsReindex,
}

/// Compute the position key for the given slot in a column whose
/// current keys are `positions` (sorted ascending, the moved item
/// already excluded). `slot` ranges from 0 (before the first item)
/// to `positions.len()` (after the last).
///
/// Deterministic given the same neighbor pair. An empty column gets
/// `spacing`; prepend/append step outward by `spacing`; interior
/// slots take the midpoint of their neighbors.
///
/// Panics if `positions` is not strictly ascending (duplicate keys in
/// a column are an engine invariant violation) or if `slot` is out of
/// range.
pub fn position_for_slot(positions: &[i64], slot: usize, spacing: i64) -> SlotPosition {
    assert!(
        positions.windows(2).all(|w| w[0] < w[1]),
        "column positions must be strictly ascending"
    );
    assert!(
        slot <= positions.len(),
        "slot {} out of range for {} positions",
        slot,
        positions.len()
    );

    if positions.is_empty() {
        return SlotPosition::At(spacing);
    }

    if slot == 0 {
        return match positions[0].checked_sub(spacing) {
            Some(key) => SlotPosition::At(key),
            None => SlotPosition::NeedsReindex,
        };
    }

    if slot == positions.len() {
        return match positions[slot - 1].checked_add(spacing) {
            Some(key) => SlotPosition::At(key),
            None => SlotPosition::NeedsReindex,
        };
    }

    midpoint(positions[slot - 1], positions[slot])
}

/// Midpoint of an open interval, or `NeedsReindex` when the neighbors
/// are adjacent integers and no key fits strictly between them.
fn midpoint(lower: i64, upper: i64) -> SlotPosition {
    let gap = upper as i128 - lower as i128;
    if gap >= 2 {
        SlotPosition::At((lower as i128 + gap / 2) as i64)
    } else {
        SlotPosition::NeedsReindex
    }
}

/// Evenly spaced keys for a full column reindex: `spacing`,
/// `2 * spacing`, ... Assigning these in current visual order never
/// reorders items relative to each other, only their absolute keys
/// change, and running it twice yields the same keys.
pub fn reindexed_positions(count: usize, spacing: i64) -> Vec<i64> {
    (1..=count as i64).map(|rank| rank * spacing).collect()
}
