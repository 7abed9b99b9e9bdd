//! Client for the external inventory platform. Quantity adjustments are
//! applied as named, initiator-tagged batches; the platform either applies
//! a batch atomically or rejects it with a user-error collection. The
//! in-memory implementation backs tests and records everything it is
//! asked to do.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::{errors::ServiceError, services::purchase_orders::deltas::InventoryDelta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryCounter {
    Incoming,
    Available,
}

impl InventoryCounter {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryCounter::Incoming => "incoming",
            InventoryCounter::Available => "available",
        }
    }
}

/// One atomic upstream mutation: a set of per-(location, inventory item)
/// deltas for a single counter, tagged for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryAdjustmentBatch {
    pub counter: InventoryCounter,
    /// Initiator kind, e.g. "purchase-order".
    pub initiator_type: String,
    /// Initiator identity, e.g. the purchase order name.
    pub initiator_name: String,
    /// Audit reason, e.g. "restock".
    pub reason: String,
    pub changes: Vec<InventoryDelta>,
}

#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Applies a delta batch atomically upstream.
    async fn adjust_quantities(&self, batch: &InventoryAdjustmentBatch)
        -> Result<(), ServiceError>;

    /// Pushes a recomputed average unit cost for one inventory item.
    async fn set_unit_cost(
        &self,
        inventory_item_id: i64,
        unit_cost: Decimal,
    ) -> Result<(), ServiceError>;

    /// Pulls authoritative quantities for the given inventory items,
    /// compensating for counters the platform does not emit events for.
    async fn resync_quantities(&self, inventory_item_ids: &[i64]) -> Result<(), ServiceError>;
}

/// Error payload shape returned by the platform on partial rejection.
#[derive(Debug, Deserialize)]
struct PlatformUserErrors {
    #[serde(default)]
    errors: Vec<String>,
}

/// HTTP implementation against the platform's inventory API.
#[derive(Clone)]
pub struct HttpInventoryClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpInventoryClient {
    pub fn new(base_url: String, token: Option<String>) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .post(format!("{}{}", self.base_url.trim_end_matches('/'), path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<(), ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let detail = response
            .json::<PlatformUserErrors>()
            .await
            .map(|e| e.errors.join("; "))
            .unwrap_or_default();
        Err(ServiceError::ExternalServiceError(format!(
            "{} rejected with status {}: {}",
            what, status, detail
        )))
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    #[instrument(skip(self, batch), fields(counter = batch.counter.as_str(), entries = batch.changes.len()))]
    async fn adjust_quantities(
        &self,
        batch: &InventoryAdjustmentBatch,
    ) -> Result<(), ServiceError> {
        if batch.changes.is_empty() {
            return Ok(());
        }
        let response = self
            .request("/inventory/adjust")
            .json(batch)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?;
        Self::check(response, "inventory adjustment").await
    }

    #[instrument(skip(self))]
    async fn set_unit_cost(
        &self,
        inventory_item_id: i64,
        unit_cost: Decimal,
    ) -> Result<(), ServiceError> {
        let response = self
            .request(&format!("/inventory/items/{}/cost", inventory_item_id))
            .json(&serde_json::json!({ "unit_cost": unit_cost }))
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?;
        Self::check(response, "unit cost update").await
    }

    #[instrument(skip(self))]
    async fn resync_quantities(&self, inventory_item_ids: &[i64]) -> Result<(), ServiceError> {
        if inventory_item_ids.is_empty() {
            return Ok(());
        }
        let response = self
            .request("/inventory/resync")
            .json(&serde_json::json!({ "inventory_item_ids": inventory_item_ids }))
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(e.to_string()))?;
        Self::check(response, "inventory resync").await
    }
}

#[derive(Default)]
struct InMemoryState {
    batches: Vec<InventoryAdjustmentBatch>,
    quantities: HashMap<(InventoryCounter, i64, i64), i64>,
    unit_costs: HashMap<i64, Decimal>,
    resyncs: Vec<Vec<i64>>,
    fail_adjustments: bool,
    fail_costs: bool,
}

/// In-memory inventory client used by tests. Applies batches to local
/// counters and records every call for assertions.
#[derive(Default)]
pub struct InMemoryInventoryClient {
    state: Mutex<InMemoryState>,
}

impl InMemoryInventoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent adjustment batches fail, simulating upstream
    /// rejection after the local transaction has committed.
    pub fn fail_adjustments(&self, fail: bool) {
        self.state.lock().unwrap().fail_adjustments = fail;
    }

    pub fn fail_costs(&self, fail: bool) {
        self.state.lock().unwrap().fail_costs = fail;
    }

    pub fn recorded_batches(&self) -> Vec<InventoryAdjustmentBatch> {
        self.state.lock().unwrap().batches.clone()
    }

    pub fn recorded_resyncs(&self) -> Vec<Vec<i64>> {
        self.state.lock().unwrap().resyncs.clone()
    }

    pub fn quantity(&self, counter: InventoryCounter, location_id: i64, inventory_item_id: i64) -> i64 {
        self.state
            .lock()
            .unwrap()
            .quantities
            .get(&(counter, location_id, inventory_item_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn unit_cost(&self, inventory_item_id: i64) -> Option<Decimal> {
        self.state
            .lock()
            .unwrap()
            .unit_costs
            .get(&inventory_item_id)
            .copied()
    }
}

#[async_trait]
impl InventoryClient for InMemoryInventoryClient {
    async fn adjust_quantities(
        &self,
        batch: &InventoryAdjustmentBatch,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_adjustments {
            return Err(ServiceError::ExternalServiceError(
                "inventory adjustment rejected".to_string(),
            ));
        }
        for change in &batch.changes {
            *state
                .quantities
                .entry((batch.counter, change.location_id, change.inventory_item_id))
                .or_insert(0) += change.delta;
        }
        debug!(
            counter = batch.counter.as_str(),
            entries = batch.changes.len(),
            "recorded inventory adjustment batch"
        );
        state.batches.push(batch.clone());
        Ok(())
    }

    async fn set_unit_cost(
        &self,
        inventory_item_id: i64,
        unit_cost: Decimal,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_costs {
            return Err(ServiceError::ExternalServiceError(
                "unit cost update rejected".to_string(),
            ));
        }
        state.unit_costs.insert(inventory_item_id, unit_cost);
        Ok(())
    }

    async fn resync_quantities(&self, inventory_item_ids: &[i64]) -> Result<(), ServiceError> {
        self.state
            .lock()
            .unwrap()
            .resyncs
            .push(inventory_item_ids.to_vec());
        Ok(())
    }
}
