//! Layer assignment and within-layer ordering.
//!
//! Layers are keyed on the node timepoint. The initial order in each layer
//! is the depth-first preorder of the lineage forest, which is already
//! crossing-free for trees whose links all span one frame. Alternating
//! barycenter sweeps then improve the order when gap-closing links or
//! merges introduce crossings; the best order seen is kept.

use std::collections::BTreeMap;

use crate::graph::{DenseIndex, LineageGraph};
use crate::record::ObjectKey;

/// Dense-id view of the lineage graph that the layout works on.
#[derive(Debug, Clone)]
pub(crate) struct LayerGraph {
    pub index: DenseIndex,
    pub t: Vec<i64>,
    pub parents: Vec<Vec<usize>>,
    pub children: Vec<Vec<usize>>,
}

impl LayerGraph {
    pub fn from_lineage(graph: &LineageGraph) -> Self {
        let index = graph.dense_index();
        let n = index.len();
        let mut t = Vec::with_capacity(n);
        let mut parents = Vec::with_capacity(n);
        let mut children = Vec::with_capacity(n);

        let dense = |keys: Vec<ObjectKey>| -> Vec<usize> {
            // Keys come back sorted, so dense ids are sorted too.
            keys.iter().filter_map(|k| index.id(k)).collect()
        };

        for key in index.keys() {
            t.push(graph.node(key).map_or(0, |node| node.t));
            parents.push(dense(graph.parents(key)));
            children.push(dense(graph.children(key)));
        }

        Self { index, t, parents, children }
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }
}

/// Ordered layers plus each node's position within its layer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LayerOrder {
    pub layers: Vec<Vec<usize>>,
    pub layer_of: Vec<usize>,
    pub pos: Vec<usize>,
}

impl LayerOrder {
    fn refresh_positions(&mut self) {
        for layer in &self.layers {
            for (p, &v) in layer.iter().enumerate() {
                self.pos[v] = p;
            }
        }
    }
}

/// Depth-first preorder over the forest, roots and children in key order.
fn preorder(graph: &LayerGraph) -> Vec<usize> {
    let n = graph.len();
    let mut order = vec![usize::MAX; n];
    let mut next = 0;
    let mut stack = Vec::new();

    let roots = (0..n).filter(|&v| graph.parents[v].is_empty());
    // Every node of an acyclic graph is reachable from a root; the trailing
    // range only matters for inputs that bypass the builder.
    for seed in roots.chain(0..n) {
        if order[seed] != usize::MAX {
            continue;
        }
        stack.push(seed);
        while let Some(v) = stack.pop() {
            if order[v] != usize::MAX {
                continue;
            }
            order[v] = next;
            next += 1;
            for &c in graph.children[v].iter().rev() {
                if order[c] == usize::MAX {
                    stack.push(c);
                }
            }
        }
    }
    order
}

pub(crate) fn initial_order(graph: &LayerGraph) -> LayerOrder {
    let n = graph.len();
    let mut by_t: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for v in 0..n {
        by_t.entry(graph.t[v]).or_default().push(v);
    }

    let rank = preorder(graph);
    let mut layers: Vec<Vec<usize>> = by_t.into_values().collect();
    let mut layer_of = vec![0; n];
    for (i, layer) in layers.iter_mut().enumerate() {
        layer.sort_by_key(|&v| (rank[v], v));
        for &v in layer.iter() {
            layer_of[v] = i;
        }
    }

    let mut order = LayerOrder {
        layers,
        layer_of,
        pos: vec![0; n],
    };
    order.refresh_positions();
    order
}

/// Count strict inversions of `values` by merge sort.
fn count_inversions(values: &mut [usize]) -> usize {
    let len = values.len();
    if len < 2 {
        return 0;
    }
    let mid = len / 2;
    let mut count = count_inversions(&mut values[..mid]) + count_inversions(&mut values[mid..]);

    let mut merged = Vec::with_capacity(len);
    let (mut i, mut j) = (0, mid);
    while i < mid && j < len {
        if values[i] <= values[j] {
            merged.push(values[i]);
            i += 1;
        } else {
            count += mid - i;
            merged.push(values[j]);
            j += 1;
        }
    }
    merged.extend_from_slice(&values[i..mid]);
    merged.extend_from_slice(&values[j..]);
    values.copy_from_slice(&merged);
    count
}

/// Number of edge crossings, counted per pair of layers an edge connects.
pub(crate) fn count_crossings(graph: &LayerGraph, order: &LayerOrder) -> usize {
    let mut groups: BTreeMap<(usize, usize), Vec<(usize, usize)>> = BTreeMap::new();
    for (u, children) in graph.children.iter().enumerate() {
        for &v in children {
            groups
                .entry((order.layer_of[u], order.layer_of[v]))
                .or_default()
                .push((order.pos[u], order.pos[v]));
        }
    }

    groups
        .into_values()
        .map(|mut pairs| {
            pairs.sort_unstable();
            let mut targets: Vec<usize> = pairs.into_iter().map(|(_, b)| b).collect();
            count_inversions(&mut targets)
        })
        .sum()
}

fn barycenter_sort(graph: &LayerGraph, order: &mut LayerOrder, layer_idx: usize, forward: bool) {
    let layer = &order.layers[layer_idx];
    let mut bary: Vec<(f64, usize, usize)> = Vec::with_capacity(layer.len());

    for &v in layer {
        let neighbors = if forward { &graph.parents[v] } else { &graph.children[v] };
        let value = if neighbors.is_empty() {
            order.pos[v] as f64
        } else {
            let sum: f64 = neighbors.iter().map(|&u| order.pos[u] as f64).sum();
            sum / neighbors.len() as f64
        };
        bary.push((value, order.pos[v], v));
    }

    // Sort by barycenter, then current position, then dense id
    bary.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    order.layers[layer_idx] = bary.into_iter().map(|(_, _, v)| v).collect();
    for (p, &v) in order.layers[layer_idx].iter().enumerate() {
        order.pos[v] = p;
    }
}

/// Reduce crossings with alternating barycenter sweeps.
///
/// # Returns
/// The best order found and its crossing count.
pub(crate) fn minimize_crossings(graph: &LayerGraph, sweeps: usize) -> (LayerOrder, usize) {
    let mut order = initial_order(graph);
    let mut best_crossings = count_crossings(graph, &order);
    let mut best = order.clone();
    let num_layers = order.layers.len();

    for sweep in 0..sweeps {
        if best_crossings == 0 {
            break;
        }
        if sweep % 2 == 0 {
            for i in 1..num_layers {
                barycenter_sort(graph, &mut order, i, true);
            }
        } else {
            for i in (0..num_layers.saturating_sub(1)).rev() {
                barycenter_sort(graph, &mut order, i, false);
            }
        }

        let crossings = count_crossings(graph, &order);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = order.clone();
        }
    }

    (best, best_crossings)
}
