// src/registry/meta_groups.rs

//! Meta-group expansion.

use std::collections::{BTreeMap, BTreeSet};

/// Expand `groups` through the meta-group table.
///
/// The result contains every name passed in plus the transitive closure of
/// their meta-group members. Cycles in the table terminate because a name is
/// only expanded the first time it is seen.
pub fn expand_groups(
    groups: &[String],
    meta_groups: &BTreeMap<String, Vec<String>>,
) -> BTreeSet<String> {
    let mut result: BTreeSet<String> = groups.iter().cloned().collect();
    let mut unfinished: Vec<String> = groups.to_vec();

    while let Some(name) = unfinished.pop() {
        if let Some(members) = meta_groups.get(&name) {
            for member in members {
                if result.insert(member.clone()) {
                    unfinished.push(member.clone());
                }
            }
        }
    }

    result
}
