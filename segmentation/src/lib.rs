//! Customer segmentation pipeline: feature records in, labeled segment
//! report out.
//!
//! The pipeline is a single pass with no retained state between calls:
//! feature extraction (CSV here, relational extraction lives with the
//! service that owns the database), k-means clustering, centroid labeling
//! and report assembly. Cluster ids are opaque and unstable across runs;
//! labels are always derived fresh from centroid statistics.

pub mod cluster;
pub mod features;
pub mod label;
pub mod report;

use thiserror::Error;

pub use features::{read_feature_csv, CustomerFeatureRecord, REQUIRED_COLUMNS};
pub use label::SegmentLabel;
pub use report::{SegmentPreviewRow, SegmentationReport, PREVIEW_ROWS};

#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("No valid purchase data available.")]
    NoEligibleCustomers,

    #[error("failed to read feature row: {0}")]
    InvalidRow(#[from] csv::Error),

    #[error("clustering failed: {0}")]
    Clustering(String),
}

/// Run the full pipeline over extracted feature records.
///
/// All-or-nothing: any stage failure aborts the whole computation, nothing
/// is partially applied and nothing is retried.
pub fn segment(
    records: &[CustomerFeatureRecord],
) -> Result<SegmentationReport, SegmentationError> {
    if records.is_empty() {
        return Err(SegmentationError::NoEligibleCustomers);
    }

    let assignments =
        cluster::assign_clusters(records, cluster::N_CLUSTERS, cluster::KMEANS_SEED)?;
    let labels = label::label_clusters(records, &assignments, cluster::N_CLUSTERS);

    tracing::debug!(
        customers = records.len(),
        clusters = cluster::N_CLUSTERS,
        "segmentation pipeline complete"
    );

    Ok(report::build_report(records, &assignments, &labels))
}
