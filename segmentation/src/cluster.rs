use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::features::CustomerFeatureRecord;
use crate::SegmentationError;

/// Fixed hyperparameters of the reference heuristic. One segmentation,
/// not a tunable ML surface.
pub const N_CLUSTERS: usize = 3;
pub const KMEANS_SEED: u64 = 42;

const MAX_ITERATIONS: u64 = 300;
const TOLERANCE: f64 = 1e-4;

/// Build the `(n_customers, 3)` observation matrix: spend, frequency,
/// recency-days per row.
///
/// Features are used in RAW units (currency, count, days). Spend dominates
/// the euclidean distance as a result; that is a known weakness of the
/// reference heuristic, and normalizing here would silently change cluster
/// membership and every downstream label.
pub fn feature_matrix(records: &[CustomerFeatureRecord]) -> Array2<f64> {
    let mut observations = Array2::zeros((records.len(), 3));
    for (i, record) in records.iter().enumerate() {
        observations[[i, 0]] = record.total_spend;
        observations[[i, 1]] = record.purchase_frequency as f64;
        observations[[i, 2]] = record.last_purchase_days as f64;
    }
    observations
}

/// Assign each record to one of `k` clusters.
///
/// Pure function of its inputs: a fresh seeded rng per call, no state
/// retained between calls. Same input order and values give the same
/// assignments across runs. Fewer distinct records than `k` is a
/// precondition failure of k-means itself and is surfaced as the underlying
/// fit error rather than guarded here.
pub fn assign_clusters(
    records: &[CustomerFeatureRecord],
    k: usize,
    seed: u64,
) -> Result<Vec<usize>, SegmentationError> {
    let observations = feature_matrix(records);
    let dataset = Dataset::new(observations, Array1::<usize>::zeros(records.len()));

    let rng = StdRng::seed_from_u64(seed);
    let model = KMeans::params_with(k, rng, L2Dist)
        .max_n_iterations(MAX_ITERATIONS)
        .tolerance(TOLERANCE)
        .fit(&dataset)
        .map_err(|e| SegmentationError::Clustering(e.to_string()))?;

    let assignments: Array1<usize> = model.predict(&dataset);
    Ok(assignments.to_vec())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(id: i64, spend: f64, frequency: u64, recency: i64) -> CustomerFeatureRecord {
        CustomerFeatureRecord {
            customer_id: json!(id),
            total_spend: spend,
            purchase_frequency: frequency,
            last_purchase_days: recency,
        }
    }

    fn three_blobs() -> Vec<CustomerFeatureRecord> {
        vec![
            record(1, 900.0, 9, 3),
            record(2, 920.0, 8, 5),
            record(3, 880.0, 10, 2),
            record(4, 600.0, 5, 20),
            record(5, 610.0, 6, 25),
            record(6, 590.0, 5, 22),
            record(7, 100.0, 1, 60),
            record(8, 110.0, 2, 65),
            record(9, 90.0, 1, 70),
        ]
    }

    #[test]
    fn one_assignment_per_record_within_range() {
        let records = three_blobs();
        let assignments = assign_clusters(&records, N_CLUSTERS, KMEANS_SEED).unwrap();

        assert_eq!(assignments.len(), records.len());
        assert!(assignments.iter().all(|&c| c < N_CLUSTERS));
    }

    #[test]
    fn assignments_are_deterministic() {
        let records = three_blobs();

        let first = assign_clusters(&records, N_CLUSTERS, KMEANS_SEED).unwrap();
        let second = assign_clusters(&records, N_CLUSTERS, KMEANS_SEED).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn well_separated_blobs_land_in_distinct_clusters() {
        let records = three_blobs();
        let assignments = assign_clusters(&records, N_CLUSTERS, KMEANS_SEED).unwrap();

        // Members of the same blob stay together.
        assert_eq!(assignments[0], assignments[1]);
        assert_eq!(assignments[0], assignments[2]);
        assert_eq!(assignments[3], assignments[4]);
        assert_eq!(assignments[6], assignments[8]);
        // And the blobs are far enough apart to separate.
        assert_ne!(assignments[0], assignments[3]);
        assert_ne!(assignments[3], assignments[6]);
    }

    #[test]
    fn feature_matrix_keeps_raw_units() {
        let records = vec![record(1, 920.5, 8, 4)];
        let observations = feature_matrix(&records);

        assert_eq!(observations[[0, 0]], 920.5);
        assert_eq!(observations[[0, 1]], 8.0);
        assert_eq!(observations[[0, 2]], 4.0);
    }
}
