//! Post-traversal passes: hidden nodes, management compaction, org filter.
//!
//! Passes run in that order over an ordered working set of
//! `(node, level)` pairs, so visit order survives into the result.

use std::collections::{HashMap, HashSet};

use crate::graph::{Adjacency, Dataset, NodeId};

use super::{SubgraphRequest, TraversalMode};

/// Ordered working set of retained nodes.
#[derive(Debug, Default)]
pub(crate) struct Retained {
    pub nodes: Vec<(NodeId, u32)>,
    members: HashSet<NodeId>,
}

impl Retained {
    pub fn from_levels(order: &[NodeId], levels: &HashMap<NodeId, u32>) -> Self {
        let nodes: Vec<_> = order.iter().map(|&id| (id, levels[&id])).collect();
        let members = nodes.iter().map(|&(id, _)| id).collect();
        Self { nodes, members }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) -> usize {
        let before = self.nodes.len();
        let members = &mut self.members;
        self.nodes.retain(|&(id, _)| {
            let kept = keep(id);
            if !kept {
                members.remove(&id);
            }
            kept
        });
        before - self.nodes.len()
    }

    fn push(&mut self, id: NodeId, level: u32) {
        if self.members.insert(id) {
            self.nodes.push((id, level));
        }
    }
}

/// Drop hidden nodes that are not temporarily revealed. Returns how many.
pub(crate) fn filter_hidden(retained: &mut Retained, request: &SubgraphRequest) -> usize {
    retained.retain(|id| !request.is_hidden(id))
}

/// Drop basis persons, then re-insert managers needed to keep reporting
/// edges drawable.
pub(crate) fn compact_management(
    retained: &mut Retained,
    dataset: &Dataset,
    adjacency: &Adjacency,
    levels: &HashMap<NodeId, u32>,
    request: &SubgraphRequest,
) {
    retained.retain(|id| !dataset.is_basis(id));

    let persons: Vec<NodeId> = retained
        .nodes
        .iter()
        .map(|&(id, _)| id)
        .filter(|&id| dataset.is_person(id))
        .collect();

    let mut reinserted = 0usize;
    for person in persons {
        let Some(manager) = adjacency.manager_of(person) else {
            continue;
        };
        if retained.contains(manager) || request.is_hidden(manager) {
            continue;
        }
        let reached = levels.get(&manager).copied();
        // Walking down never climbs above the roots to fetch a manager.
        if request.mode == TraversalMode::Down && reached.is_none() {
            continue;
        }
        retained.push(manager, reached.unwrap_or(0));
        reinserted += 1;
    }

    if reinserted > 0 {
        tracing::debug!(reinserted, "connector managers re-inserted");
    }
}

/// Drop org nodes outside the allowed set.
pub(crate) fn filter_orgs(retained: &mut Retained, dataset: &Dataset, request: &SubgraphRequest) {
    let Some(allowed) = &request.allowed_orgs else {
        return;
    };
    retained.retain(|id| !dataset.is_org(id) || allowed.contains(&id));
}
