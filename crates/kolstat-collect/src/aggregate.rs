//! Pure merge of partial result records.
//!
//! Each sub-fetch flattens its payload into its own dotted namespace, so in
//! practice merges never collide. A collision would mean two fetchers claim
//! the same field name, which is a programming error worth shouting about —
//! the merge still completes (first write wins) and returns the offenders
//! for the caller to log.

use std::collections::BTreeMap;

/// One creator's flattened metrics: stable dotted field name to rendered
/// value. `BTreeMap` keeps export column order deterministic.
pub type ResultRecord = BTreeMap<String, String>;

/// Merges `incoming` into `into`, keeping existing values on key collisions.
/// Returns the colliding keys, empty in the normal case.
pub fn merge(into: &mut ResultRecord, incoming: ResultRecord) -> Vec<String> {
    let mut collisions = Vec::new();
    for (key, value) in incoming {
        if into.contains_key(&key) {
            collisions.push(key);
        } else {
            into.insert(key, value);
        }
    }
    collisions
}
