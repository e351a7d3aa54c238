//! Typed view over raw tracking rows.
//!
//! The data-access layer hands over one row per segmented object. Each row
//! carries the object key, the key of the object it was linked to in an
//! earlier frame, the tracking label, the object centre, the timepoint and
//! the currently selected measurement.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Composite identity of a segmented object: (image number, object number).
///
/// Ordering is lexicographic on `(image, object)`. This is the canonical
/// node ordering used by every per-node array in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectKey {
    /// Image (frame) number the object was segmented in.
    pub image: i64,
    /// Object number within the image.
    pub object: i64,
}

impl ObjectKey {
    /// Sentinel parent key meaning "no parent in a previous frame".
    pub const NULL: ObjectKey = ObjectKey { image: 0, object: 0 };

    /// Create a new key.
    pub const fn new(image: i64, object: i64) -> Self {
        Self { image, object }
    }

    /// Whether this is the no-parent sentinel.
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.image, self.object)
    }
}

impl From<(i64, i64)> for ObjectKey {
    fn from((image, object): (i64, i64)) -> Self {
        Self::new(image, object)
    }
}

/// Number of columns in a raw tracking row.
pub const RAW_COLUMN_COUNT: usize = 10;

/// One tracked object as delivered by the data-access layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingRecord {
    /// Identity of the object.
    pub key: ObjectKey,

    /// Parent object in an earlier frame, or [`ObjectKey::NULL`].
    pub parent: ObjectKey,

    /// Label assigned upstream by the tracker.
    pub label: i64,

    /// Object centre, x.
    pub x: f64,

    /// Object centre, y.
    pub y: f64,

    /// Frame index within the series.
    pub timepoint: i64,

    /// Value of the selected measurement, if one was requested.
    #[serde(default)]
    pub measurement: Option<f64>,

    /// Result of the filter expression (true when no filter is active).
    #[serde(default = "default_passes_filter")]
    pub passes_filter: bool,
}

fn default_passes_filter() -> bool {
    true
}

impl TrackingRecord {
    /// Create a record with no measurement that passes the filter.
    pub fn new(key: ObjectKey, parent: ObjectKey, label: i64, x: f64, y: f64, timepoint: i64) -> Self {
        Self {
            key,
            parent,
            label,
            x,
            y,
            timepoint,
            measurement: None,
            passes_filter: true,
        }
    }

    /// Attach a measurement value.
    pub fn with_measurement(mut self, value: Option<f64>) -> Self {
        self.measurement = value;
        self
    }

    /// Set the filter flag.
    pub fn with_filter(mut self, passes_filter: bool) -> Self {
        self.passes_filter = passes_filter;
        self
    }

    /// Whether the record starts a trajectory (has no parent link).
    pub fn is_root(&self) -> bool {
        self.parent.is_null()
    }

    /// Parse a numeric storage row.
    ///
    /// Column order: image, object, parent image, parent object, label, x, y,
    /// timepoint, measurement, filter. A missing filter value counts as
    /// passing; any non-zero filter value passes.
    pub fn from_raw(row: &[Option<f64>]) -> Result<Self> {
        if row.len() != RAW_COLUMN_COUNT {
            return Err(Error::MalformedRecord {
                key: None,
                reason: format!("expected {} columns, got {}", RAW_COLUMN_COUNT, row.len()),
            });
        }

        let key = ObjectKey::new(
            integral(row[0], "image number", None)?,
            integral(row[1], "object number", None)?,
        );
        let parent = ObjectKey::new(
            integral(row[2], "parent image number", Some(key))?,
            integral(row[3], "parent object number", Some(key))?,
        );
        let label = integral(row[4], "tracking label", Some(key))?;
        let x = finite(row[5], "x location", key)?;
        let y = finite(row[6], "y location", key)?;
        let timepoint = integral(row[7], "timepoint", Some(key))?;
        let measurement = row[8].filter(|v| !v.is_nan());
        let passes_filter = row[9].map_or(true, |v| v != 0.0);

        Ok(Self {
            key,
            parent,
            label,
            x,
            y,
            timepoint,
            measurement,
            passes_filter,
        })
    }
}

fn integral(value: Option<f64>, column: &str, key: Option<ObjectKey>) -> Result<i64> {
    match value {
        Some(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        Some(v) => Err(Error::MalformedRecord {
            key,
            reason: format!("{} is not an integer: {}", column, v),
        }),
        None => Err(Error::MalformedRecord {
            key,
            reason: format!("{} is missing", column),
        }),
    }
}

fn finite(value: Option<f64>, column: &str, key: ObjectKey) -> Result<f64> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(Error::MalformedRecord {
            key: Some(key),
            reason: format!("{} is missing or not finite", column),
        }),
    }
}

/// Ordered set of tracking records for one dataset selection.
///
/// Storage delivers rows sorted by tracking label then timepoint. That order
/// is preserved here but nothing downstream depends on it for correctness.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackingRecordSet {
    records: Vec<TrackingRecord>,
}

impl TrackingRecordSet {
    /// Wrap already-typed records.
    pub fn new(records: Vec<TrackingRecord>) -> Self {
        Self { records }
    }

    /// Parse raw storage rows, failing on the first malformed row.
    pub fn from_raw_rows<R: AsRef<[Option<f64>]>>(rows: &[R]) -> Result<Self> {
        let records = rows
            .iter()
            .map(|row| TrackingRecord::from_raw(row.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { records })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in delivery order.
    pub fn iter(&self) -> std::slice::Iter<'_, TrackingRecord> {
        self.records.iter()
    }

    /// Records as a slice.
    pub fn records(&self) -> &[TrackingRecord] {
        &self.records
    }

    /// Number of records carrying a non-null parent link.
    pub fn parent_link_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_root()).count()
    }
}

impl FromIterator<TrackingRecord> for TrackingRecordSet {
    fn from_iter<I: IntoIterator<Item = TrackingRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TrackingRecordSet {
    type Item = &'a TrackingRecord;
    type IntoIter = std::slice::Iter<'a, TrackingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Selection of one image series, e.g. `"3"` or `"plate1, A01"`.
///
/// Each comma-separated part corresponds to one series-identifying column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetSelector {
    parts: Vec<String>,
}

impl DatasetSelector {
    /// Parse a comma-separated selection, dropping empty parts.
    pub fn parse(selection: &str) -> Self {
        let parts = selection
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { parts }
    }

    /// The selection parts in column order.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }
}

impl fmt::Display for DatasetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join(", "))
    }
}
