use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::features::CustomerFeatureRecord;
use crate::label::SegmentLabel;

/// How many labeled rows the preview carries.
pub const PREVIEW_ROWS: usize = 10;

/// One labeled record of the preview, serialized with the upstream column
/// names so callers see the same shape as the raw feature file.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentPreviewRow {
    #[serde(rename = "CustomerID")]
    pub customer_id: Value,
    #[serde(rename = "TotalSpend")]
    pub total_spend: f64,
    #[serde(rename = "PurchaseFrequency")]
    pub purchase_frequency: u64,
    #[serde(rename = "LastPurchaseDays")]
    pub last_purchase_days: i64,
    #[serde(rename = "SegmentLabel")]
    pub segment_label: SegmentLabel,
}

/// Pure transform over the pipeline outputs: label counts plus the first
/// `PREVIEW_ROWS` labeled rows in extractor output order.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentationReport {
    pub segment_summary: BTreeMap<&'static str, usize>,
    pub preview: Vec<SegmentPreviewRow>,
}

pub fn build_report(
    records: &[CustomerFeatureRecord],
    assignments: &[usize],
    cluster_labels: &[SegmentLabel],
) -> SegmentationReport {
    let mut segment_summary: BTreeMap<&'static str, usize> = BTreeMap::new();
    for &cluster in assignments {
        *segment_summary
            .entry(cluster_labels[cluster].as_str())
            .or_insert(0) += 1;
    }

    let preview = records
        .iter()
        .zip(assignments)
        .take(PREVIEW_ROWS)
        .map(|(record, &cluster)| SegmentPreviewRow {
            customer_id: record.customer_id.clone(),
            total_spend: record.total_spend,
            purchase_frequency: record.purchase_frequency,
            last_purchase_days: record.last_purchase_days,
            segment_label: cluster_labels[cluster],
        })
        .collect();

    SegmentationReport {
        segment_summary,
        preview,
    }
}
