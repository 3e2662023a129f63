use std::path::Path;

use crate::detect::Centroid;
use crate::error::Result;

const CSV_HEADER: [&str; 4] = ["row", "col", "z", "confidence"];

/// Write centroids as CSV (`row,col,z,confidence`) in detection order.
///
/// The header is written even when there are no centroids.
pub fn write_centroids_csv(centroids: &[Centroid], path: &Path) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(CSV_HEADER)?;
    for c in centroids {
        writer.serialize(c)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a centroid CSV written by [`write_centroids_csv`].
pub fn read_centroids_csv(path: &Path) -> Result<Vec<Centroid>> {
    let mut reader = csv::Reader::from_path(path)?;
    let centroids = reader
        .deserialize()
        .collect::<std::result::Result<Vec<Centroid>, csv::Error>>()?;
    Ok(centroids)
}
