//! Legend org selection.
//!
//! For each visited person, only its deepest memberships count: an org is
//! skipped when another org the same person belongs to is its child.

use std::collections::{HashMap, HashSet};

use crate::graph::{Adjacency, Dataset, NodeId, OrgHierarchy};

/// Deepest orgs activated by the visited persons, with the minimum
/// activating person level per org.
pub(crate) fn legend_orgs(
    dataset: &Dataset,
    adjacency: &Adjacency,
    hierarchy: &OrgHierarchy,
    order: &[NodeId],
    levels: &HashMap<NodeId, u32>,
) -> (HashSet<NodeId>, HashMap<NodeId, u32>) {
    let mut orgs = HashSet::new();
    let mut org_levels: HashMap<NodeId, u32> = HashMap::new();

    for &person in order {
        if !dataset.is_person(person) {
            continue;
        }
        let level = levels[&person];
        for org in adjacency.deepest_memberships(person, hierarchy) {
            orgs.insert(org);
            org_levels
                .entry(org)
                .and_modify(|min| *min = (*min).min(level))
                .or_insert(level);
        }
    }

    (orgs, org_levels)
}
