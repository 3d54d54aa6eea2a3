use std::io::Read;

use csv::ReaderBuilder;
use serde::Deserialize;
use serde_json::Value;

use crate::SegmentationError;

/// Columns a feature file must carry. Extra columns are allowed and ignored,
/// order does not matter.
pub const REQUIRED_COLUMNS: [&str; 4] = [
    "CustomerID",
    "TotalSpend",
    "PurchaseFrequency",
    "LastPurchaseDays",
];

/// One row of the segmentation input: a customer with at least one purchase.
///
/// Customers with zero purchases are excluded at extraction time, never
/// zero-filled. The id is kept opaque (`Value`) because relational sources
/// produce integer ids while uploaded files may carry arbitrary scalars.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerFeatureRecord {
    #[serde(rename = "CustomerID")]
    pub customer_id: Value,
    #[serde(rename = "TotalSpend")]
    pub total_spend: f64,
    #[serde(rename = "PurchaseFrequency")]
    pub purchase_frequency: u64,
    #[serde(rename = "LastPurchaseDays")]
    pub last_purchase_days: i64,
}

/// Read feature records from delimited text.
///
/// The header is validated once, up front: every absent required column is
/// reported in a single `MissingColumns` error. Rows are not validated
/// beyond what decoding needs, so a malformed numeric cell surfaces as an
/// `InvalidRow` error for the whole file.
pub fn read_feature_csv<R: Read>(
    input: R,
) -> Result<Vec<CustomerFeatureRecord>, SegmentationError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(input);

    let headers = reader.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == **required))
        .map(|required| (*required).to_owned())
        .collect();
    if !missing.is_empty() {
        return Err(SegmentationError::MissingColumns(missing));
    }

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
