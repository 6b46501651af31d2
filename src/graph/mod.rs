//! Graph data structures and operations.
//!
//! This module holds the loaded dataset (dense node table plus link
//! collection), the cached adjacency/hierarchy index built on petgraph's
//! StableGraph, and the engine that ties them to layout and clustering.

mod dataset;
mod engine;
mod index;
mod link;
mod node;

pub use dataset::{Dataset, DatasetInput, IngestStats, OrgRecord, PersonRecord};
pub use engine::{OrgGraphEngine, ViewState};
pub use index::{Adjacency, GraphIndex, OrgHierarchy, collect_report_subtree};
pub use link::{Link, LinkEndpoint, LinkKind, LinkRecord, LinkSet};
pub use node::{Node, NodeId, NodeKind};

#[cfg(test)]
pub(crate) use dataset::fixtures;
