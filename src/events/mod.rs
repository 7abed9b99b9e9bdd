use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Events emitted after successful state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    PurchaseOrderCreated {
        name: String,
    },
    PurchaseOrderUpdated {
        name: String,
    },
    ReceiptUpserted {
        purchase_order: String,
        receipt: String,
        completed: bool,
    },
    InventoryAdjustmentApplied {
        counter: String,
        initiator: String,
        entries: usize,
    },
    InventoryResyncRequested {
        inventory_item_ids: Vec<i64>,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, propagating the failure to the caller.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging delivery failure instead of propagating it.
    /// Used on post-commit paths where the save must not be reported failed.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            error!(?event, "Event delivery failed: {}", e);
        }
    }
}

/// Creates the event channel used by services and the background processor.
pub fn event_channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Runs until all senders drop.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "Processing event");
    }
}
