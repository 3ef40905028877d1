//! services/api/src/web/billing.rs
//!
//! Pronunciation quota, checkout, and the payment provider's webhook.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use bizchinese_core::billing::{verify_webhook_signature, BillingPeriod, CheckoutPlan, WebhookEvent};
use bizchinese_core::ports::PortError;
use bizchinese_core::subscription::{pronunciation_decision, pronunciation_limit, QuotaDecision};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::HttpError;
use crate::web::state::AppState;

pub const SIGNATURE_HEADER: &str = "creem-signature";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct PronunciationUsageResponse {
    pub success: bool,
    /// Plays used today; absent for unlimited plans.
    pub usage_count: Option<i32>,
    pub limit: Option<i32>,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct CheckoutRequest {
    /// `pro` (default) or `max`.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub plan_type: Option<CheckoutPlan>,
    /// `monthly` (default) or `yearly`.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub billing_period: Option<BillingPeriod>,
}

#[derive(Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub checkout_url: String,
}

#[derive(Serialize, ToSchema)]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /usage/pronunciation - Count one pronunciation play against today's quota
#[utoipa::path(
    post,
    path = "/usage/pronunciation",
    responses(
        (status = 200, description = "Play allowed", body = PronunciationUsageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Daily limit reached")
    )
)]
pub async fn pronunciation_usage_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = state
        .db
        .get_user(user_id)
        .await
        .map_err(|e| HttpError::from_port("Failed to load user", e))?;

    let counted = match pronunciation_limit(user.plan) {
        Some(limit) => state
            .db
            .consume_pronunciation(user_id, Utc::now().date_naive(), limit)
            .await
            .map_err(|e| HttpError::from_port("Failed to record usage", e))?,
        None => None,
    };

    let response = match pronunciation_decision(user.plan, counted) {
        QuotaDecision::Unlimited => PronunciationUsageResponse {
            success: true,
            usage_count: None,
            limit: None,
        },
        QuotaDecision::Allowed { used, limit } => PronunciationUsageResponse {
            success: true,
            usage_count: Some(used),
            limit: Some(limit),
        },
        QuotaDecision::Exceeded { used, limit } => {
            return Err(HttpError::forbidden("Quota exceeded").with_details(json!({
                "message": "Daily pronunciation limit reached. Upgrade to Pro for unlimited audio.",
                "requires_upgrade": true,
                "usage_count": used,
                "limit": limit,
            })));
        }
    };
    Ok(Json(response))
}

/// POST /checkout - Start a hosted checkout for a paid plan
#[utoipa::path(
    post,
    path = "/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Checkout started", body = CheckoutResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Product not configured or provider failure")
    )
)]
pub async fn checkout_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    body: Option<Json<CheckoutRequest>>,
) -> Result<impl IntoResponse, HttpError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let plan = req.plan_type.unwrap_or_default();
    let period = req.billing_period.unwrap_or_default();

    let product_id = state.config.products.product_id(plan, period).ok_or_else(|| {
        error!("Product ID for {:?} {:?} is not configured", plan, period);
        HttpError::new(StatusCode::INTERNAL_SERVER_ERROR, "Product ID not configured")
    })?;

    let checkout_url = state
        .payments
        .create_checkout_session(user_id, product_id, plan.granted_plan())
        .await
        .map_err(|e| HttpError::from_port("Failed to create checkout session", e))?;

    info!("Checkout started for user {} ({:?} {:?})", user_id, plan, period);
    Ok(Json(CheckoutResponse { checkout_url }))
}

/// POST /webhooks/creem - Payment provider events
#[utoipa::path(
    post,
    path = "/webhooks/creem",
    request_body(content = String, description = "Raw event JSON, signed in the `creem-signature` header"),
    responses(
        (status = 200, description = "Event handled or ignored", body = WebhookResponse),
        (status = 400, description = "Malformed payload"),
        (status = 401, description = "Bad or missing signature")
    )
)]
pub async fn creem_webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match (signature, state.config.creem_webhook_secret.as_deref()) {
        (Some(signature), Some(secret)) => {
            if !verify_webhook_signature(&body, signature, secret) {
                error!("Invalid webhook signature");
                return Err(HttpError::new(StatusCode::UNAUTHORIZED, "Invalid signature"));
            }
        }
        _ if state.config.production => {
            error!("Missing webhook signature or secret in production");
            return Err(HttpError::unauthorized());
        }
        _ => warn!("Accepting unsigned webhook outside production"),
    }

    let event = WebhookEvent::parse(&body).map_err(|e| {
        warn!("Malformed webhook payload: {}", e);
        HttpError::bad_request("Invalid JSON payload")
    })?;
    info!("Received payment event: {}", event.event_type);

    let Some(user_id) = event.user_id else {
        warn!("User ID missing in webhook metadata");
        return Ok(Json(WebhookResponse {
            success: true,
            message: Some("Event ignored: No user_id".to_string()),
        }));
    };

    let Some(plan) = event.plan_change().target_plan() else {
        info!("Unhandled payment event type: {}", event.event_type);
        return Ok(Json(WebhookResponse {
            success: true,
            message: None,
        }));
    };

    match state.db.set_user_plan(user_id, plan).await {
        Ok(()) => info!("User {} moved to {} via {}", user_id, plan.as_str(), event.event_type),
        Err(PortError::NotFound(_)) => warn!("Webhook for unknown user {}", user_id),
        Err(e) => return Err(HttpError::from_port("Failed to update plan", e)),
    }

    Ok(Json(WebhookResponse {
        success: true,
        message: None,
    }))
}
