use axum::extract::{Multipart, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

use segmentation::SegmentationReport;

use crate::api::ApiError;
use crate::extract;
use crate::router::AppState;

#[derive(Serialize)]
pub struct SegmentationResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub report: SegmentationReport,
}

#[derive(Deserialize)]
pub struct ExternalSegmentationQuery {
    pub file: Option<String>,
}

/// Segmentation over the relational store. Re-reads and recomputes from
/// scratch on every request; nothing is persisted.
#[instrument(skip_all)]
pub async fn segment_customers(
    State(state): State<AppState>,
) -> Result<Json<SegmentationResponse>, ApiError> {
    let records = extract::customer_features(&state.pool, Utc::now().date_naive()).await?;
    let report = segmentation::segment(&records)?;

    Ok(Json(SegmentationResponse {
        message: "Customer segmentation from database successful.",
        report,
    }))
}

/// Segmentation over a previously uploaded feature file. Parameter and
/// existence checks happen before any computation.
#[instrument(skip_all)]
pub async fn segment_customers_external(
    State(state): State<AppState>,
    Query(query): Query<ExternalSegmentationQuery>,
) -> Result<Json<SegmentationResponse>, ApiError> {
    let file_name = query
        .file
        .ok_or_else(|| ApiError::Validation("Missing \"file\" query parameter.".to_owned()))?;

    let path = state.media_dir.join(&file_name);
    if !path.is_file() {
        return Err(ApiError::FileNotFound(file_name));
    }

    let bytes = tokio::fs::read(&path).await?;
    let records = segmentation::read_feature_csv(bytes.as_slice())?;
    let report = segmentation::segment(&records)?;

    Ok(Json(SegmentationResponse {
        message: "Customer segmentation and labeling successful.",
        report,
    }))
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub file_name: String,
}

/// Store an uploaded CSV under a generated unique name in the media
/// directory. All bytes are flushed before the handler returns; this write
/// is the only durable side effect around the pipeline. Name collisions are
/// treated as negligible and not guarded.
#[instrument(skip_all)]
pub async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let field = loop {
        let next = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        match next {
            Some(field) if field.name() == Some("file") => break field,
            Some(_) => continue,
            None => {
                return Err(ApiError::Validation(
                    "Please upload a valid CSV file.".to_owned(),
                ))
            }
        }
    };

    let is_csv = field
        .file_name()
        .is_some_and(|name| name.ends_with(".csv"));
    if !is_csv {
        return Err(ApiError::Validation(
            "Please upload a valid CSV file.".to_owned(),
        ));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    tokio::fs::create_dir_all(&state.media_dir).await?;

    let file_name = format!("{}.csv", Uuid::new_v4().simple());
    let path = state.media_dir.join(&file_name);

    let mut file = tokio::fs::File::create(&path).await?;
    file.write_all(&data).await?;
    file.flush().await?;

    tracing::debug!(file = %file_name, bytes = data.len(), "stored uploaded feature file");

    Ok(Json(UploadResponse {
        message: "File uploaded successfully.",
        file_name,
    }))
}
