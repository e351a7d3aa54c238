//! The active coloring channel.
//!
//! The scalar used to color both plots is kept outside the node records so
//! that switching measurements never touches graph identity.

use super::{DerivedMeasurementKind, DerivedMeasurements};
use crate::graph::LineageGraph;
use crate::record::ObjectKey;

/// Scalar values aligned with sorted node order, with the channel name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColoringChannel {
    name: String,
    keys: Vec<ObjectKey>,
    values: Vec<Option<f64>>,
}

impl ColoringChannel {
    /// Channel from the dataset measurement stored on the nodes.
    pub fn from_dataset(name: impl Into<String>, graph: &LineageGraph) -> Self {
        Self {
            name: name.into(),
            keys: graph.keys().copied().collect(),
            values: graph.nodes().map(|n| n.measurement).collect(),
        }
    }

    /// Channel from a derived measurement.
    pub fn from_derived(kind: DerivedMeasurementKind, derived: &DerivedMeasurements) -> Self {
        Self {
            name: kind.name().to_string(),
            keys: derived.keys().to_vec(),
            values: derived.scalars(kind).into_iter().map(Some).collect(),
        }
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the channel is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw values, `None` where the measurement is missing.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Value of one node.
    pub fn value(&self, key: &ObjectKey) -> Option<f64> {
        let pos = self.keys.binary_search(key).ok()?;
        self.values[pos]
    }

    /// Values as `f64`, NaN where missing.
    pub fn scalar_data(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.unwrap_or(f64::NAN)).collect()
    }

    /// Finite value range, `None` when no value is present.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentIndex;
    use crate::graph::LineageGraphBuilder;
    use crate::measurements::DerivedMeasurementEngine;
    use crate::record::{TrackingRecord, TrackingRecordSet};

    fn graph() -> LineageGraph {
        let set: TrackingRecordSet = vec![
            TrackingRecord::new(ObjectKey::new(2, 1), ObjectKey::new(1, 1), 1, 0.0, 0.0, 1).with_measurement(Some(4.0)),
            TrackingRecord::new(ObjectKey::new(1, 1), ObjectKey::NULL, 1, 0.0, 0.0, 0).with_measurement(Some(2.0)),
            TrackingRecord::new(ObjectKey::new(1, 2), ObjectKey::NULL, 2, 0.0, 0.0, 0),
        ]
        .into_iter()
        .collect();
        LineageGraphBuilder::new().build(&set).unwrap().0
    }

    #[test]
    fn test_dataset_channel_sorted_with_nan() {
        let channel = ColoringChannel::from_dataset("AreaShape_Area", &graph());
        assert_eq!(channel.name(), "AreaShape_Area");
        let data = channel.scalar_data();
        assert_eq!(data.len(), 3);
        assert_eq!(data[0], 2.0);
        assert!(data[1].is_nan());
        assert_eq!(data[2], 4.0);
        assert_eq!(channel.value(&ObjectKey::new(2, 1)), Some(4.0));
        assert_eq!(channel.range(), Some((2.0, 4.0)));
    }

    #[test]
    fn test_derived_channel() {
        let graph = graph();
        let components = ComponentIndex::new(&graph);
        let derived = DerivedMeasurementEngine::default().compute(&graph, &components).unwrap();
        let channel = ColoringChannel::from_derived(DerivedMeasurementKind::Singletons, &derived);

        assert_eq!(channel.name(), "Singletons");
        assert_eq!(channel.scalar_data(), vec![0.0, 1.0, 0.0]);
    }
}
