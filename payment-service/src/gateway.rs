//! Payment gateway contract and webhook event types
//!
//! The external gateway is consumed through the `PaymentGateway` trait;
//! clients are constructed once at process start and injected by reference.
//! Webhook payloads are authenticated with an HMAC-SHA256 signature over the
//! raw body before any field is trusted.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use common::decimal::Amount;
use common::error::{Error, Result};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

/// Intent statuses reported by the gateway
pub const INTENT_REQUIRES_CONFIRMATION: &str = "requires_confirmation";
/// Terminal success status for an intent or refund
pub const INTENT_SUCCEEDED: &str = "succeeded";

/// A charge intent created at the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayIntent {
    /// Gateway-side intent ID
    pub id: String,
    /// Secret handed to the client for confirmation
    pub client_secret: String,
    /// Current intent status
    pub status: String,
}

/// A refund issued at the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRefund {
    /// Gateway-side refund ID
    pub id: String,
    /// Refund status
    pub status: String,
    /// Refunded amount
    pub amount: Amount,
}

/// External payment processor handling real-money transactions
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a charge intent
    async fn create_intent(
        &self,
        amount: Amount,
        currency: &str,
        customer_ref: &str,
        metadata: serde_json::Value,
    ) -> Result<GatewayIntent>;

    /// Confirm an intent, returning its resulting status
    async fn confirm(&self, intent_id: &str) -> Result<String>;

    /// Refund an intent, fully or partially
    async fn refund(&self, intent_id: &str, amount: Option<Amount>) -> Result<GatewayRefund>;
}

/// Asynchronous webhook event types delivered by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayEventType {
    /// A charge settled successfully
    PaymentSucceeded,
    /// A charge was declined
    PaymentFailed,
    /// A charge was cancelled before settling
    PaymentCanceled,
    /// A settled charge was refunded
    ChargeRefunded,
}

/// A webhook event after signature verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    /// Event type
    #[serde(rename = "type")]
    pub event_type: GatewayEventType,
    /// Gateway-side object (intent) the event refers to
    pub object_id: String,
    /// Opaque payload, stored verbatim on the payment
    #[serde(default)]
    pub raw_payload: serde_json::Value,
}

/// HMAC-SHA256 of the payload in hex, keyed with the webhook secret
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify the signature over the raw body, then parse the event
///
/// The signature must be checked before any field of the payload is
/// trusted; delivery is at-least-once, so the same event may arrive more
/// than once.
pub fn verify_event(secret: &str, payload: &[u8], signature: &str) -> Result<GatewayEvent> {
    let expected = sign_payload(secret, payload);
    if expected != signature {
        return Err(Error::ValidationError("Webhook signature mismatch".to_string()));
    }

    Ok(serde_json::from_slice(payload)?)
}

/// In-process gateway used by tests and the demo server
///
/// Intents live in memory; `fail_requests(true)` makes every call return a
/// GatewayError to exercise the orchestrator's failure paths.
pub struct MockGateway {
    /// Intents by ID
    intents: DashMap<String, GatewayIntent>,
    /// When set, every call fails
    failing: AtomicBool,
    /// Monotonic ID counter
    counter: AtomicU64,
}

impl MockGateway {
    /// Create a new mock gateway
    pub fn new() -> Self {
        Self {
            intents: DashMap::new(),
            failing: AtomicBool::new(false),
            counter: AtomicU64::new(1),
        }
    }

    /// Toggle scripted failure
    pub fn fail_requests(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::GatewayError("Gateway unavailable".to_string()));
        }
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}_{:08}", prefix, self.counter.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(
        &self,
        amount: Amount,
        currency: &str,
        customer_ref: &str,
        _metadata: serde_json::Value,
    ) -> Result<GatewayIntent> {
        self.check_available()?;

        let id = self.next_id("pi_mock");
        let intent = GatewayIntent {
            client_secret: format!("{}_secret", id),
            id: id.clone(),
            status: INTENT_REQUIRES_CONFIRMATION.to_string(),
        };

        debug!("Mock intent {} created for {} {} ({})", id, amount, currency, customer_ref);

        self.intents.insert(id, intent.clone());
        Ok(intent)
    }

    async fn confirm(&self, intent_id: &str) -> Result<String> {
        self.check_available()?;

        let mut intent = self
            .intents
            .get_mut(intent_id)
            .ok_or_else(|| Error::GatewayError(format!("No such intent: {}", intent_id)))?;

        intent.status = INTENT_SUCCEEDED.to_string();
        Ok(intent.status.clone())
    }

    async fn refund(&self, intent_id: &str, amount: Option<Amount>) -> Result<GatewayRefund> {
        self.check_available()?;

        if !self.intents.contains_key(intent_id) {
            return Err(Error::GatewayError(format!("No such intent: {}", intent_id)));
        }

        Ok(GatewayRefund {
            id: self.next_id("re_mock"),
            status: INTENT_SUCCEEDED.to_string(),
            amount: amount.unwrap_or(Amount::ZERO),
        })
    }
}
