//! crates/bizchinese_core/src/billing.rs
//!
//! Checkout plan selection and the payment provider's webhook payloads.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use uuid::Uuid;

use crate::subscription::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutPlan {
    #[default]
    Pro,
    Max,
}

impl CheckoutPlan {
    /// The stored plan a purchase of this tier grants.
    pub fn granted_plan(&self) -> Plan {
        match self {
            CheckoutPlan::Pro => Plan::Pro,
            CheckoutPlan::Max => Plan::Enterprise,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    #[default]
    Monthly,
    Yearly,
}

/// Product ids configured at the payment provider.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    pub pro_monthly: Option<String>,
    pub pro_yearly: Option<String>,
    pub max_monthly: Option<String>,
    pub max_yearly: Option<String>,
}

impl ProductCatalog {
    pub fn product_id(&self, plan: CheckoutPlan, period: BillingPeriod) -> Option<&str> {
        let id = match (plan, period) {
            (CheckoutPlan::Pro, BillingPeriod::Monthly) => &self.pro_monthly,
            (CheckoutPlan::Pro, BillingPeriod::Yearly) => &self.pro_yearly,
            (CheckoutPlan::Max, BillingPeriod::Monthly) => &self.max_monthly,
            (CheckoutPlan::Max, BillingPeriod::Yearly) => &self.max_yearly,
        };
        id.as_deref().filter(|s| !s.is_empty())
    }
}

/// Checks a hex HMAC-SHA256 signature of the raw webhook body.
pub fn verify_webhook_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

/// Signs a body the way the provider does. Only test code sends webhooks.
#[cfg(any(test, feature = "test-util"))]
pub fn sign_webhook_payload(payload: &[u8], secret: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC takes keys of any length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// What a webhook event means for the user's plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanChange {
    Upgrade(Plan),
    Downgrade,
    Ignore,
}

impl PlanChange {
    pub fn target_plan(&self) -> Option<Plan> {
        match self {
            PlanChange::Upgrade(plan) => Some(*plan),
            PlanChange::Downgrade => Some(Plan::Free),
            PlanChange::Ignore => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    pub event_type: String,
    pub user_id: Option<Uuid>,
    pub plan: Option<Plan>,
}

/// Places where the provider may put the checkout metadata, in lookup order.
const METADATA_PATHS: [&[&str]; 5] = [
    &["metadata"],
    &["data", "metadata"],
    &["object", "metadata"],
    &["object", "order", "metadata"],
    &["checkout", "metadata"],
];

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(key))
}

impl WebhookEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let event: Value = serde_json::from_slice(payload)?;

        let event_type = event
            .get("eventType")
            .or_else(|| event.get("type"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let metadata = METADATA_PATHS
            .iter()
            .filter_map(|path| lookup(&event, path))
            .find(|m| m.get("user_id").and_then(Value::as_str).is_some());

        let user_id = metadata
            .and_then(|m| m.get("user_id"))
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok());
        let plan = metadata
            .and_then(|m| m.get("plan"))
            .and_then(Value::as_str)
            .and_then(Plan::parse);

        Ok(Self { event_type, user_id, plan })
    }

    pub fn plan_change(&self) -> PlanChange {
        match self.event_type.as_str() {
            "checkout.completed" | "subscription.paid" => {
                let plan = self.plan.filter(Plan::is_paid).unwrap_or(Plan::Pro);
                PlanChange::Upgrade(plan)
            }
            "subscription.canceled" | "subscription.expired" => PlanChange::Downgrade,
            _ => PlanChange::Ignore,
        }
    }
}
