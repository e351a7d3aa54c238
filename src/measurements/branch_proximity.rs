//! Nodes on short branch-to-leaf paths near division events.
//!
//! A leaf that ends a few frames after a division, and not in the last
//! frame of the movie, is usually a linking artifact. Every node on the path
//! from the division to such a leaf is flagged so it can be pruned.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::graph::LineageGraph;
use crate::record::ObjectKey;
use crate::{Error, Result};

/// End nodes that sit in the latest frame reached by any end node.
pub(crate) fn terminal_frame_nodes(graph: &LineageGraph) -> Result<BTreeSet<ObjectKey>> {
    let end_nodes = graph.end_nodes();
    let max_t = end_nodes
        .iter()
        .filter_map(|k| graph.node(k).map(|n| n.t))
        .max()
        .ok_or_else(|| Error::EmptyGraph("lineage graph has no terminal nodes".to_string()))?;

    Ok(end_nodes
        .into_iter()
        .filter(|k| graph.node(k).is_some_and(|n| n.t == max_t))
        .collect())
}

/// Breadth-first search along outgoing links, at most `cutoff` hops deep.
///
/// # Returns
/// Reached nodes in visiting order, and the predecessor of each reached
/// node except the source.
fn bounded_bfs(
    graph: &LineageGraph,
    source: ObjectKey,
    cutoff: usize,
) -> (Vec<ObjectKey>, HashMap<ObjectKey, ObjectKey>) {
    let mut reached = vec![source];
    let mut predecessor = HashMap::new();
    let mut depth = HashMap::from([(source, 0usize)]);
    let mut queue = VecDeque::from([source]);

    while let Some(key) = queue.pop_front() {
        let d = depth[&key];
        if d == cutoff {
            continue;
        }
        for child in graph.children(&key) {
            if depth.contains_key(&child) {
                continue;
            }
            depth.insert(child, d + 1);
            predecessor.insert(child, key);
            reached.push(child);
            queue.push_back(child);
        }
    }

    (reached, predecessor)
}

/// Flag nodes on branch-to-leaf paths of at most `cutoff` hops.
///
/// Paths that pass through a second branch point are skipped here: the
/// segment after that branch point is attributed to it, the nearer one,
/// when it is processed itself. Branch points are never flagged.
///
/// # Arguments
/// * `graph` - Lineage graph to scan
/// * `terminal` - Leaves in the last frame, from [`terminal_frame_nodes`]; never flagged
/// * `cutoff` - Maximum number of hops from a branch point to the leaf
pub(crate) fn nodes_within_distance_cutoff(
    graph: &LineageGraph,
    terminal: &BTreeSet<ObjectKey>,
    cutoff: usize,
) -> BTreeSet<ObjectKey> {
    let branch_nodes = graph.branch_nodes();
    let mut flagged = BTreeSet::new();

    for &branch in &branch_nodes {
        let (reached, predecessor) = bounded_bfs(graph, branch, cutoff);

        for leaf in reached {
            if leaf == branch || graph.out_degree(&leaf) != 0 || terminal.contains(&leaf) {
                continue;
            }

            let mut path = Vec::new();
            let mut cursor = leaf;
            while cursor != branch {
                path.push(cursor);
                match predecessor.get(&cursor) {
                    Some(&prev) => cursor = prev,
                    None => break,
                }
            }

            if path.iter().all(|k| graph.out_degree(k) <= 1) {
                flagged.extend(path);
            }
        }
    }

    for branch in &branch_nodes {
        flagged.remove(branch);
    }
    flagged
}
