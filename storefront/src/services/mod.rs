// ishop/src/services/mod.rs

pub mod auth_service;
pub mod ids;
pub mod image_store;
pub mod notifier;
pub mod pricing;
pub mod seed;

pub use image_store::{ImageStore, LocalImageStore};
pub use notifier::{HubEvent, NotificationHub, NotificationKind, Subscription, Topic};
