//! CSV export of cluster assignments, for inspecting a clustering run.

use std::collections::HashMap;
use std::io::Write;

use crate::catalog::Brand;
use crate::error::Result;
use crate::vector::{Point, DIMENSION};

/// CSV header row.
pub const HEADER: [&str; 3 + DIMENSION] = [
    "id", "name", "cluster", "feat_0", "feat_1", "feat_2", "feat_3", "feat_4", "feat_5",
];

/// Writes one row per point: id, brand name, cluster and the six
/// normalized features.
///
/// Points without a brand get an empty name; points without an
/// assignment get cluster `-1`.
pub fn write_cluster_csv<W: Write>(
    writer: W,
    brands: &[Brand],
    points: &[Point],
    assignments: &[usize],
) -> Result<()> {
    let names: HashMap<&str, &str> = brands
        .iter()
        .map(|b| (b.id.as_str(), b.name.as_str()))
        .collect();

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;

    for (i, point) in points.iter().enumerate() {
        let name = names.get(point.id.as_str()).copied().unwrap_or_default();
        let cluster = assignments
            .get(i)
            .map_or_else(|| "-1".to_string(), ToString::to_string);

        let mut row = Vec::with_capacity(HEADER.len());
        row.push(point.id.clone());
        row.push(name.to_string());
        row.push(cluster);
        row.extend(point.vector.iter().map(ToString::to_string));
        csv.write_record(&row)?;
    }

    csv.flush()?;
    tracing::debug!(rows = points.len(), "wrote cluster csv");
    Ok(())
}
