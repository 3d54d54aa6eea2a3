use std::fmt;

use serde::Serialize;

use crate::features::CustomerFeatureRecord;

/// Business-facing name of a segment. Assigned per cluster from its
/// centroid; several clusters may resolve to the same label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SegmentLabel {
    #[serde(rename = "High Value")]
    HighValue,
    #[serde(rename = "Mid-Tier")]
    MidTier,
    #[serde(rename = "At Risk")]
    AtRisk,
}

impl SegmentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentLabel::HighValue => "High Value",
            SegmentLabel::MidTier => "Mid-Tier",
            SegmentLabel::AtRisk => "At Risk",
        }
    }
}

impl fmt::Display for SegmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-cluster mean of its members' feature vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub mean_spend: f64,
    pub mean_frequency: f64,
    pub mean_recency_days: f64,
}

impl Centroid {
    /// Threshold heuristic, evaluated in precedence order.
    pub fn label(&self) -> SegmentLabel {
        if self.mean_spend > 800.0 && self.mean_frequency > 7.0 && self.mean_recency_days < 10.0 {
            SegmentLabel::HighValue
        } else if self.mean_spend > 500.0 && self.mean_frequency > 4.0 {
            SegmentLabel::MidTier
        } else {
            SegmentLabel::AtRisk
        }
    }
}

/// Compute one centroid per cluster id in `[0, k)`. A cluster that ended up
/// with no members gets a zero centroid (and so an At Risk label that no
/// customer carries).
pub fn cluster_centroids(
    records: &[CustomerFeatureRecord],
    assignments: &[usize],
    k: usize,
) -> Vec<Centroid> {
    let mut sums = vec![[0.0f64; 3]; k];
    let mut counts = vec![0usize; k];

    for (record, &cluster) in records.iter().zip(assignments) {
        sums[cluster][0] += record.total_spend;
        sums[cluster][1] += record.purchase_frequency as f64;
        sums[cluster][2] += record.last_purchase_days as f64;
        counts[cluster] += 1;
    }

    sums.iter()
        .zip(&counts)
        .map(|(sum, &count)| {
            if count == 0 {
                return Centroid {
                    mean_spend: 0.0,
                    mean_frequency: 0.0,
                    mean_recency_days: 0.0,
                };
            }
            Centroid {
                mean_spend: sum[0] / count as f64,
                mean_frequency: sum[1] / count as f64,
                mean_recency_days: sum[2] / count as f64,
            }
        })
        .collect()
}

/// Label every cluster from its centroid. Indexed by cluster id; every
/// member of a cluster inherits that cluster's label.
pub fn label_clusters(
    records: &[CustomerFeatureRecord],
    assignments: &[usize],
    k: usize,
) -> Vec<SegmentLabel> {
    cluster_centroids(records, assignments, k)
        .iter()
        .map(Centroid::label)
        .collect()
}
