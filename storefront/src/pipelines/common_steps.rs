// ishop/src/pipelines/common_steps.rs

//! Notification fan-out shared by the order pipelines. Publishing never
//! fails a request; a missing listener is simply a zero delivery count.

use crate::models::Order;
use crate::services::{HubEvent, NotificationHub, NotificationKind, Topic};
use tracing::{info, instrument};

/// Sends one `notification` event to the admin room and one to the order's owner.
#[instrument(
  name = "common_step::notify_order",
  skip(hub, order, admin_message, user_message),
  fields(order_code = %order.code, kind = ?kind)
)]
pub fn notify_order(
  hub: &NotificationHub,
  kind: NotificationKind,
  order: &Order,
  admin_message: String,
  user_message: String,
) -> usize {
  let admin_delivered = hub.publish(Topic::Admin, &HubEvent::notification(kind, admin_message, Some(order)));
  let user_delivered = hub.publish(
    Topic::User(order.user_id),
    &HubEvent::notification(kind, user_message, Some(order)),
  );
  info!(admin_delivered, user_delivered, "Order notification published.");
  admin_delivered + user_delivered
}

/// Like `notify_order`, but the frames carry only the order code.
#[instrument(
  name = "common_step::notify_order_removed",
  skip(hub, order, admin_message, user_message),
  fields(order_code = %order.code, kind = ?kind)
)]
pub fn notify_order_removed(
  hub: &NotificationHub,
  kind: NotificationKind,
  order: &Order,
  admin_message: String,
  user_message: String,
) -> usize {
  let admin_delivered = hub.publish(Topic::Admin, &HubEvent::order_removed(kind, admin_message, &order.code));
  let user_delivered = hub.publish(
    Topic::User(order.user_id),
    &HubEvent::order_removed(kind, user_message, &order.code),
  );
  info!(admin_delivered, user_delivered, "Order removal notification published.");
  admin_delivered + user_delivered
}

/// Tells open order views (admin and owner) to refetch this order.
#[instrument(name = "common_step::emit_order_reload", skip(hub, order), fields(order_code = %order.code))]
pub fn emit_order_reload(hub: &NotificationHub, order: &Order) -> usize {
  let event = HubEvent::order_reload(order);
  hub.publish(Topic::Admin, &event) + hub.publish(Topic::User(order.user_id), &event)
}
