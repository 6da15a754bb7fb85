// ishop/src/services/notifier.rs

//! In-process notification fan-out.
//!
//! Listeners subscribe to a `Topic` and receive pre-serialized JSON frames on
//! an unbounded channel. Delivery is best-effort and at-most-once: a listener
//! that is not connected when an event is published never sees it.

use crate::models::Order;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
  Admin,
  User(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
  OrderCreated,
  OrderUpdated,
  OrderCancelled,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  #[serde(rename = "type")]
  pub kind: NotificationKind,
  pub message: String,
  pub order: Option<Order>,
  pub order_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReload {
  pub order_id: String,
  pub status: String,
}

/// Wire shape: `{"event": "...", "data": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum HubEvent {
  Notification(Notification),
  OrderReload(OrderReload),
}

impl HubEvent {
  pub fn notification(kind: NotificationKind, message: impl Into<String>, order: Option<&Order>) -> Self {
    HubEvent::Notification(Notification {
      kind,
      message: message.into(),
      order_id: order.map(|o| o.code.clone()),
      order: order.cloned(),
    })
  }

  /// For orders that no longer exist: only the code travels, never the document.
  pub fn order_removed(kind: NotificationKind, message: impl Into<String>, order_code: &str) -> Self {
    HubEvent::Notification(Notification {
      kind,
      message: message.into(),
      order: None,
      order_id: Some(order_code.to_string()),
    })
  }

  pub fn order_reload(order: &Order) -> Self {
    HubEvent::OrderReload(OrderReload {
      order_id: order.code.clone(),
      status: order.status.to_string(),
    })
  }
}

type Listeners = HashMap<Topic, Vec<(u64, UnboundedSender<String>)>>;

#[derive(Default)]
struct HubInner {
  listeners: Mutex<Listeners>,
  next_id: AtomicU64,
}

/// Cheap to clone; all clones share one listener table.
#[derive(Clone, Default)]
pub struct NotificationHub {
  inner: Arc<HubInner>,
}

impl NotificationHub {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn subscribe(&self, topic: Topic) -> Subscription {
    let (tx, rx) = unbounded_channel();
    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
    self.inner.listeners.lock().entry(topic).or_default().push((id, tx));
    debug!(?topic, listener = id, "Listener subscribed.");
    Subscription {
      id,
      topic,
      rx,
      hub: Arc::downgrade(&self.inner),
    }
  }

  /// Sends `event` to every live listener of `topic` and returns how many
  /// received it. Listeners whose receiver is gone are dropped.
  pub fn publish(&self, topic: Topic, event: &HubEvent) -> usize {
    let frame = match serde_json::to_string(event) {
      Ok(frame) => frame,
      Err(e) => {
        warn!(error = %e, "Failed to serialize hub event.");
        return 0;
      }
    };

    let mut listeners = self.inner.listeners.lock();
    let Some(targets) = listeners.get_mut(&topic) else {
      return 0;
    };
    targets.retain(|(_, tx)| tx.send(frame.clone()).is_ok());
    let delivered = targets.len();
    if targets.is_empty() {
      listeners.remove(&topic);
    }
    debug!(?topic, delivered, "Published hub event.");
    delivered
  }

  pub fn listener_count(&self, topic: Topic) -> usize {
    self.inner.listeners.lock().get(&topic).map_or(0, Vec::len)
  }
}

/// A live subscription. Dropping it removes the listener from the hub.
pub struct Subscription {
  id: u64,
  topic: Topic,
  rx: UnboundedReceiver<String>,
  hub: Weak<HubInner>,
}

impl Subscription {
  pub async fn recv(&mut self) -> Option<String> {
    self.rx.recv().await
  }

  pub fn try_recv(&mut self) -> Option<String> {
    self.rx.try_recv().ok()
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    let Some(hub) = self.hub.upgrade() else {
      return;
    };
    let mut listeners = hub.listeners.lock();
    if let Some(targets) = listeners.get_mut(&self.topic) {
      targets.retain(|(id, _)| *id != self.id);
      if targets.is_empty() {
        listeners.remove(&self.topic);
      }
    }
  }
}
