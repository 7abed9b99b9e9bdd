//! Fire-and-forget webhook delivery. Failures are logged and never
//! propagated to the caller; the purchase order save has already been
//! committed by the time a webhook fires.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::errors::ServiceError;

/// Webhook payloads, keyed by purchase order name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum WebhookEvent {
    #[serde(rename = "purchase-orders/update")]
    PurchaseOrderUpdated { name: String },

    #[serde(rename = "receipts/update")]
    ReceiptUpdated {
        purchase_order_name: String,
        name: String,
    },
}

/// HMAC signature generator for webhook authentication
pub struct SignatureGenerator {
    secret: String,
}

impl SignatureGenerator {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Generate HMAC signature for webhook payload
    pub fn sign_payload(&self, timestamp: &str, body: &str) -> String {
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        type HmacSha256 = Hmac<Sha256>;

        let signed_payload = format!("{}.{}", timestamp, body);
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signed_payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

#[derive(Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
    webhook_url: Option<String>,
    signature_generator: Option<Arc<SignatureGenerator>>,
    max_retries: u32,
}

impl WebhookDispatcher {
    pub fn new(webhook_url: Option<String>, webhook_secret: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            webhook_url,
            signature_generator: webhook_secret.map(|s| Arc::new(SignatureGenerator::new(s))),
            max_retries: 3,
        }
    }

    /// Disabled dispatcher for deployments without a webhook endpoint.
    pub fn disabled() -> Self {
        Self::new(None, None)
    }

    /// Fire-and-forget delivery: spawns the send and logs its outcome.
    pub fn send_async(&self, event: WebhookEvent) {
        let Some(url) = self.webhook_url.clone() else {
            return;
        };
        let dispatcher = self.clone();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.send_webhook(&url, event).await {
                error!("Async webhook delivery failed: {}", e);
            }
        });
    }

    #[instrument(skip(self, event))]
    async fn send_webhook(&self, webhook_url: &str, event: WebhookEvent) -> Result<(), ServiceError> {
        let body = serde_json::to_string(&event)
            .map_err(|e| ServiceError::SerializationError(e.to_string()))?;
        let timestamp = chrono::Utc::now().to_rfc3339();
        let signature = self
            .signature_generator
            .as_ref()
            .map(|gen| gen.sign_payload(&timestamp, &body));

        for attempt in 1..=self.max_retries {
            let mut request = self
                .client
                .post(webhook_url)
                .header("Content-Type", "application/json")
                .header("Timestamp", &timestamp)
                .body(body.clone());
            if let Some(ref sig) = signature {
                request = request.header("Merchant-Signature", sig);
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    info!("Webhook delivered successfully to {}", webhook_url);
                    return Ok(());
                }
                Ok(response) => {
                    warn!(
                        "Webhook delivery failed with status: {} (attempt {}/{})",
                        response.status(),
                        attempt,
                        self.max_retries
                    );
                }
                Err(e) => {
                    warn!(
                        "Webhook delivery error: {} (attempt {}/{})",
                        e, attempt, self.max_retries
                    );
                }
            }

            if attempt < self.max_retries {
                let backoff = Duration::from_secs(2_u64.pow(attempt - 1));
                tokio::time::sleep(backoff).await;
            }
        }

        Err(ServiceError::ExternalServiceError(format!(
            "Failed to deliver webhook after {} retries",
            self.max_retries
        )))
    }
}
