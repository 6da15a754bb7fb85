// ishop/src/web/handlers/mod.rs

pub mod admin_handlers;
pub mod auth_handlers;
pub mod carousel_handlers;
pub mod category_handlers;
pub mod deal_handlers;
pub mod order_handlers;
pub mod product_handlers;
pub mod upload_handlers;
pub mod user_handlers;
