//! Depth-bounded breadth-first traversal with type-aware edge rules.
//!
//! The rules are asymmetric:
//!
//! | mode      | from a person                         | from an org                  |
//! |-----------|---------------------------------------|------------------------------|
//! | down      | reports (person → person)             | child orgs (org → org)       |
//! | up        | managers, plus the person's own orgs  | parent orgs only             |
//!
//! Walking down never steps from a person into its orgs, and an org only
//! pulls in its member persons when it is itself a traversal root. This
//! keeps a depth-1 view of a person from exploding into whole adjacent orgs.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::graph::{Adjacency, LinkKind, NodeId, NodeKind};

use super::TraversalMode;

/// Nodes reached by one traversal, with first-reached distances.
#[derive(Debug, Default)]
pub(crate) struct Traversal {
    /// Visit order (roots first).
    pub order: Vec<NodeId>,
    pub levels: HashMap<NodeId, u32>,
}

/// Breadth-first walk from every root at once, stopping expansion at `depth`.
pub(crate) fn traverse(
    adjacency: &Adjacency,
    roots: &[NodeId],
    depth: u32,
    mode: TraversalMode,
) -> Traversal {
    let mut traversal = Traversal::default();
    let root_set: HashSet<NodeId> = roots.iter().copied().collect();
    let mut queue = VecDeque::with_capacity(roots.len());

    for &root in roots {
        if traversal.levels.insert(root, 0).is_none() {
            traversal.order.push(root);
            queue.push_back(root);
        }
    }

    let mut next = Vec::new();
    while let Some(current) = queue.pop_front() {
        let level = traversal.levels[&current];
        if level >= depth {
            continue;
        }

        next.clear();
        expand(adjacency, current, mode, root_set.contains(&current), &mut next);
        for &neighbor in &next {
            // Uniform edge weights: first reach is the shortest distance.
            if traversal.levels.contains_key(&neighbor) {
                continue;
            }
            traversal.levels.insert(neighbor, level + 1);
            traversal.order.push(neighbor);
            queue.push_back(neighbor);
        }
    }

    traversal
}

/// Neighbors of `node` that the mode's edge rules allow following.
fn expand(
    adjacency: &Adjacency,
    node: NodeId,
    mode: TraversalMode,
    is_root: bool,
    out: &mut Vec<NodeId>,
) {
    let Some(kind) = adjacency.kind(node) else {
        return;
    };

    if mode.follows_down() {
        match kind {
            NodeKind::Person => out.extend(
                adjacency
                    .out(node)
                    .filter(|&(_, k)| k == LinkKind::Reports)
                    .map(|(n, _)| n),
            ),
            NodeKind::Org => {
                out.extend(
                    adjacency
                        .out(node)
                        .filter(|&(_, k)| k == LinkKind::OrgParent)
                        .map(|(n, _)| n),
                );
                if is_root {
                    out.extend(
                        adjacency
                            .inn(node)
                            .filter(|&(_, k)| k == LinkKind::Membership)
                            .map(|(n, _)| n),
                    );
                }
            }
        }
    }

    if mode.follows_up() {
        match kind {
            NodeKind::Org => out.extend(
                adjacency
                    .inn(node)
                    .filter(|&(_, k)| k == LinkKind::OrgParent)
                    .map(|(n, _)| n),
            ),
            NodeKind::Person => {
                out.extend(
                    adjacency
                        .inn(node)
                        .filter(|&(_, k)| k == LinkKind::Reports)
                        .map(|(n, _)| n),
                );
                out.extend(adjacency.memberships(node));
            }
        }
    }
}
