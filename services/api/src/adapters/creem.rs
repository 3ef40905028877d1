//! services/api/src/adapters/creem.rs
//!
//! Implements the `PaymentService` port against Creem's hosted checkout API.

use async_trait::async_trait;
use bizchinese_core::ports::{PaymentService, PortError, PortResult};
use bizchinese_core::subscription::Plan;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct CreemAdapter {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    app_url: String,
}

impl CreemAdapter {
    pub fn new(api_base: String, api_key: Option<String>, app_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            app_url: app_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Serialize)]
struct CheckoutMetadata {
    user_id: String,
    plan: &'static str,
}

#[derive(Serialize)]
struct CheckoutRequest<'a> {
    product_id: &'a str,
    success_url: String,
    cancel_url: String,
    metadata: CheckoutMetadata,
}

#[derive(Deserialize)]
struct CheckoutResponse {
    checkout_url: String,
}

#[derive(Deserialize)]
struct CreemErrorBody {
    message: Option<String>,
}

#[async_trait]
impl PaymentService for CreemAdapter {
    async fn create_checkout_session(
        &self,
        user_id: Uuid,
        product_id: &str,
        plan: Plan,
    ) -> PortResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| PortError::Unexpected("CREEM_API_KEY is not configured".to_string()))?;

        let body = CheckoutRequest {
            product_id,
            success_url: format!("{}/upgrade?status=success", self.app_url),
            cancel_url: format!("{}/upgrade?status=cancel", self.app_url),
            metadata: CheckoutMetadata {
                user_id: user_id.to_string(),
                plan: plan.as_str(),
            },
        };

        info!("Creating checkout session for user {} (product {})", user_id, product_id);
        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .header("X-API-Key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Creem request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!("Creem API error {}: {}", status, text);
            let message = serde_json::from_str::<CreemErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("Creem API failed: {}", status));
            return Err(PortError::Unexpected(message));
        }

        let data: CheckoutResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Invalid Creem response: {}", e)))?;
        Ok(data.checkout_url)
    }
}
