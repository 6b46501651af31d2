//! Org membership grouping.
//!
//! A person belongs to an org's cluster when it is a direct member of that
//! org or of any org below it in the hierarchy.

use std::collections::{BTreeMap, HashSet};

use crate::graph::{Adjacency, NodeId, OrgHierarchy};

/// Members per org, for every allowed org among `org_ids` that has any.
///
/// `person_ids` are the visible persons, in display order; each org's member
/// list follows that order without duplicates. `allowed_orgs = None` allows
/// all of `org_ids`.
pub fn compute_memberships(
    person_ids: &[NodeId],
    org_ids: &[NodeId],
    allowed_orgs: Option<&HashSet<NodeId>>,
    adjacency: &Adjacency,
    hierarchy: &OrgHierarchy,
) -> BTreeMap<NodeId, Vec<NodeId>> {
    let scopes: Vec<(NodeId, HashSet<NodeId>)> = org_ids
        .iter()
        .copied()
        .filter(|org| allowed_orgs.is_none_or(|allowed| allowed.contains(org)))
        .map(|org| (org, hierarchy.descendants(org)))
        .collect();

    let mut members: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    let mut seen: HashSet<(NodeId, NodeId)> = HashSet::new();
    for &person in person_ids {
        for direct in adjacency.memberships(person) {
            for (org, scope) in &scopes {
                if scope.contains(&direct) && seen.insert((*org, person)) {
                    members.entry(*org).or_default().push(person);
                }
            }
        }
    }
    members
}
