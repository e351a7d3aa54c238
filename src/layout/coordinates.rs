//! Separation-axis coordinates for an ordered set of layers.

use super::ordering::{LayerGraph, LayerOrder};

/// Assign a separation-axis value to every node.
///
/// Nodes start at their layer position times `min_separation`. Each
/// refinement pass pulls a node halfway toward the median of its linked
/// neighbours, then pushes nodes apart in layer order so neighbours stay at
/// least `min_separation` apart and the crossing-minimized order survives.
pub(crate) fn assign_separation(
    graph: &LayerGraph,
    order: &LayerOrder,
    min_separation: f64,
    passes: usize,
) -> Vec<f64> {
    let mut y: Vec<f64> = order.pos.iter().map(|&p| p as f64 * min_separation).collect();

    for _ in 0..passes {
        for layer in &order.layers {
            for &v in layer {
                let mut neighbors: Vec<f64> = graph.parents[v]
                    .iter()
                    .chain(graph.children[v].iter())
                    .map(|&u| y[u])
                    .collect();
                if neighbors.is_empty() {
                    continue;
                }
                neighbors.sort_by(|a, b| a.total_cmp(b));
                let median = neighbors[neighbors.len() / 2];
                y[v] = (y[v] + median) / 2.0;
            }

            for pair in layer.windows(2) {
                let (prev, curr) = (pair[0], pair[1]);
                if y[curr] - y[prev] < min_separation {
                    y[curr] = y[prev] + min_separation;
                }
            }
        }
    }

    y
}

/// Scale factor that makes the separation span equal the timepoint span.
///
/// Falls back to 1.0 when either span is zero.
pub(crate) fn aspect_scale(t_span: f64, y_span: f64) -> f64 {
    if y_span > 0.0 && t_span > 0.0 {
        t_span / y_span
    } else {
        1.0
    }
}

/// Minimum and maximum of a slice, `None` when empty.
pub(crate) fn span<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
