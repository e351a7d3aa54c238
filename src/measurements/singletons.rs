//! Objects that were never linked to any other frame.

use std::collections::BTreeSet;

use crate::components::ComponentIndex;
use crate::record::ObjectKey;

/// Nodes that are simultaneously a root and a terminal of their trajectory.
pub(crate) fn singleton_nodes(components: &ComponentIndex) -> BTreeSet<ObjectKey> {
    components
        .iter()
        .flat_map(|trajectory| {
            trajectory
                .roots
                .iter()
                .filter(|k| trajectory.terminals.binary_search(*k).is_ok())
                .copied()
                .collect::<Vec<_>>()
        })
        .collect()
}
