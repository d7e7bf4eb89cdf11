use crate::config::Config;
use crate::db_storage::{AdStorage, LeadInsert, UpdateOutcome};
use crate::errors::AppError;
use crate::models::*;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequest, FromRequestParts, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storage adapter for ads and leads.
    pub storage: AdStorage,
    /// Application configuration.
    pub config: Config,
}

/// JSON body extractor whose rejections render as `AppError`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Path extractor whose rejections render as `AppError`.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Health check endpoint, unauthenticated for load-balancer probes.
pub async fn health() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// POST /api/webhook/ads/create
///
/// Decodes `metadata` (string or object), projects it into the ad columns and
/// stores the row. Responds with the new id. A body that is not JSON is echoed
/// back as text in the 400 response.
pub async fn create_ad(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    tracing::info!("📨 Received ad creation webhook");

    let body = body?;
    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        AppError::validation(format!("Request body is not valid JSON: {}", e))
            .with_received(Value::String(String::from_utf8_lossy(&body).into_owned()))
    })?;

    let new_ad = NewAd::from_webhook(&payload)?;
    let id = state.storage.insert_ad(&new_ad).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// GET /api/ads/:id
pub async fn get_ad(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Ad>, AppError> {
    tracing::debug!("GET /api/ads/{}", id);

    let ad = state
        .storage
        .get_ad_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ad {} not found", id)))?;

    Ok(Json(ad))
}

/// GET /api/ads/by-campaign/:campaign_id
///
/// When several ads share the campaign, the newest one is returned.
pub async fn get_ad_by_campaign(
    State(state): State<Arc<AppState>>,
    AppPath(campaign_id): AppPath<String>,
) -> Result<Json<Ad>, AppError> {
    tracing::debug!("GET /api/ads/by-campaign/{}", campaign_id);

    let ad = state
        .storage
        .get_ad_by_campaign_id(&campaign_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No ad found for campaign {}", campaign_id))
        })?;

    Ok(Json(ad))
}

/// PATCH /api/ads/:id
///
/// Applies allow-listed keys only; anything else in the body is ignored.
pub async fn update_ad(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<Value>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Value::Object(body) = payload else {
        return Err(AppError::BadRequest(
            "Request body must be a JSON object".to_string(),
        ));
    };

    let update = AdUpdate::from_json(body);
    if update.is_empty() {
        return Err(AppError::BadRequest(
            "No valid fields to update".to_string(),
        ));
    }

    match state.storage.update_ad(id, &update).await? {
        UpdateOutcome::Updated => Ok(Json(SuccessResponse::ok())),
        UpdateOutcome::NotFound => Err(AppError::NotFound(format!("Ad {} not found", id))),
    }
}

/// GET /api/ads
pub async fn list_ads(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Ad>>, AppError> {
    Ok(Json(state.storage.list_ads().await?))
}

/// POST /api/leads
///
/// Duplicate `lead_id`s are ignored; the response is the same either way.
pub async fn create_lead(
    State(state): State<Arc<AppState>>,
    AppJson(lead): AppJson<NewLead>,
) -> Result<Json<SuccessResponse>, AppError> {
    tracing::info!("📨 Received lead: lead_id={:?}", lead.lead_id);

    if state.storage.insert_lead_ignore_duplicate(&lead).await? == LeadInsert::Duplicate {
        tracing::warn!("⚠️  Duplicate lead ignored: {:?}", lead.lead_id);
    }

    Ok(Json(SuccessResponse::ok()))
}

/// GET /api/leads
pub async fn list_leads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Lead>>, AppError> {
    Ok(Json(state.storage.list_leads().await?))
}

/// POST /api/seed
///
/// Inserts one demo ad and one demo lead. Only mounted when seeding is enabled.
pub async fn seed(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let ad = NewAd::from_webhook(&json!({
        "ad_content": { "headline": "Same-day roof repair", "cta": "Call now" },
        "budget": 500,
        "metadata": {
            "service_type": "roofing",
            "location": "Austin, TX",
            "max_daily_spend": 50,
            "image_url": "https://example.com/roofing.png",
            "customer_phone": "+15125550100"
        }
    }))?;
    let ad_id = state.storage.insert_ad(&ad).await?;

    let lead = NewLead {
        lead_id: Some(format!("seed-{}", ad_id)),
        ad_id: Some(ad_id.to_string()),
        name: Some("Sample Lead".to_string()),
        email: Some("sample@example.com".to_string()),
        service_interest: Some("roofing".to_string()),
        created_time: Some(Utc::now().to_rfc3339()),
        ..Default::default()
    };
    state.storage.insert_lead_ignore_duplicate(&lead).await?;

    tracing::info!("🌱 Seeded demo ad {}", ad_id);
    Ok(Json(json!({ "ad_id": ad_id, "lead_id": lead.lead_id })))
}
