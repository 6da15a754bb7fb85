// ishop/src/models/mod.rs

//! Persisted entities. JSON field names follow the storefront's camelCase API.

pub mod carousel;
pub mod category;
pub mod deal;
pub mod order;
pub mod product;
pub mod user;

pub use carousel::Carousel;
pub use category::Category;
pub use deal::{Deal, DealStatus, DealView};
pub use order::{CancelledBy, Order, OrderLine, OrderStatus, ShippingAddress};
pub use product::{Product, Specification};
pub use user::{Address, Role, User};
