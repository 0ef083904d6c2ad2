use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ServerConfig;
use crate::food::analysis::units::is_truthy;
use crate::food::analysis::{compute_health_score, HealthScoreResult, LabelAnalysis, NutritionRecord};
use crate::providers::traits::LabelExtractor;

pub mod error;

pub use error::ApiError;

pub const SERVICE_NAME: &str = "What2Eat Label Analysis API";

/// Room for multipart boundaries and text fields on top of the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    extractor: Arc<dyn LabelExtractor>,
    config: ServerConfig,
}

/// Response envelope shared by the label endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HealthScoreRequest {
    #[serde(default)]
    nutrition: Value,
    #[serde(default, rename = "isBeverage")]
    is_beverage: Value,
}

#[derive(Debug, Serialize)]
pub struct HealthScoreResponse {
    success: bool,
    #[serde(flatten)]
    result: HealthScoreResult,
}

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    status: String,
    service: String,
    version: String,
    timestamp: String,
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Create and configure the API router
pub fn create_api(extractor: Arc<dyn LabelExtractor>, config: ServerConfig) -> Router {
    info!(
        "Using label extractor {} (upload limit {} bytes, {} concurrent analyses)",
        extractor.get_model_info(),
        config.max_upload_bytes,
        config.max_concurrent_analyses
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let body_limit = DefaultBodyLimit::max(config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES);
    let analysis_limit = ConcurrencyLimitLayer::new(config.max_concurrent_analyses);

    let state = AppState { extractor, config };

    Router::new()
        .route(
            "/analyzeLabelImage",
            post(analyze_label_handler).layer(analysis_limit),
        )
        .route("/calculateHealthScore", post(health_score_handler))
        .route("/healthCheck", get(health_check))
        .layer(body_limit)
        .layer(cors)
        .with_state(state)
}

struct LabelImage {
    bytes: Vec<u8>,
    mime_type: String,
    file_name: String,
}

struct LabelUpload {
    image: Option<LabelImage>,
    user_id: Option<String>,
    files_received: usize,
    fields_received: usize,
}

async fn analyze_label_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<LabelAnalysis>> {
    let multipart = multipart.map_err(|_| {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        ApiError::BadRequest(format!(
            "Content-Type must be multipart/form-data. Current: {}",
            content_type
        ))
    })?;

    let upload = read_upload(multipart, state.config.max_upload_bytes).await?;

    let image = upload.image.ok_or_else(|| {
        warn!("No image found in upload");
        ApiError::BadRequest(format!(
            "Image file is required. Received {} files and {} fields. Please upload an image using the 'image' field with multipart/form-data.",
            upload.files_received, upload.fields_received
        ))
    })?;

    info!(
        "Processing label analysis request: user={} file={} size={} mime={}",
        upload.user_id.as_deref().unwrap_or("anonymous"),
        image.file_name,
        image.bytes.len(),
        image.mime_type
    );

    let analysis = state
        .extractor
        .analyze_label(&image.bytes, &image.mime_type)
        .await
        .map_err(|e| {
            error!("Error analyzing image: {:#}", e);
            ApiError::from(e)
        })?;

    if let Some(message) = &analysis.error {
        warn!("Analysis returned an error: {}", message);
        return Err(ApiError::BadRequest(message.clone()));
    }

    if !analysis.has_content() {
        warn!("No meaningful data extracted (empty ingredients and nutrition)");
        return Err(ApiError::BadRequest(
            "Could not detect any ingredients or nutritional information. Please try again with a clearer image."
                .to_string(),
        ));
    }

    info!(
        "Analysis successful: product={} ingredients={} nutrition={}",
        analysis.name.as_deref().unwrap_or("N/A"),
        analysis.ingredients.len(),
        analysis.nutrition.len()
    );

    Ok(Json(ApiResponse::success(analysis)))
}

async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> Result<LabelUpload, ApiError> {
    let mut upload = LabelUpload {
        image: None,
        user_id: None,
        files_received: 0,
        fields_received: 0,
    };

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or_default().to_string();

        let file_name = match field.file_name().map(str::to_string) {
            Some(file_name) => file_name,
            None => {
                upload.fields_received += 1;
                let value = field.text().await.map_err(upload_error)?;
                if name == "userId" {
                    upload.user_id = Some(value);
                }
                continue;
            }
        };

        upload.files_received += 1;
        let mime_type = field.content_type().unwrap_or_default().to_string();

        if name != "image" {
            info!("Ignoring file field '{}' (expected 'image')", name);
            continue;
        }
        if !mime_type.starts_with("image/") {
            info!("Rejecting non-image file: {}", mime_type);
            continue;
        }
        if upload.image.is_some() {
            continue;
        }

        let bytes = read_field(field, max_bytes).await?;
        upload.image = Some(LabelImage {
            bytes,
            mime_type,
            file_name,
        });
    }

    Ok(upload)
}

async fn read_field(mut field: Field<'_>, max_bytes: usize) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(upload_error)? {
        if bytes.len() + chunk.len() > max_bytes {
            return Err(too_large(max_bytes));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn too_large(max_bytes: usize) -> ApiError {
    ApiError::PayloadTooLarge(format!(
        "Image exceeds the upload limit of {} bytes",
        max_bytes
    ))
}

fn upload_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge(err.body_text());
    }
    ApiError::BadRequest(format!("File upload error: {}", err.body_text()))
}

async fn health_score_handler(
    request: Result<Json<HealthScoreRequest>, JsonRejection>,
) -> ApiResult<HealthScoreResponse> {
    let Json(request) = request.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let record = NutritionRecord::from_value(&request.nutrition)
        .ok_or_else(|| ApiError::BadRequest("Nutrition data required".to_string()))?;
    let is_beverage = is_truthy(&request.is_beverage);

    let result = compute_health_score(&record, is_beverage);
    info!(
        "Health score {} (beverage={}, N={}, P={}, FSA={})",
        result.health_score,
        is_beverage,
        result.calculation_details.negative_points,
        result.calculation_details.positive_points,
        result.calculation_details.fsa_score
    );

    Ok(Json(HealthScoreResponse {
        success: true,
        result,
    }))
}

async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
