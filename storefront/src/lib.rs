// ishop/src/lib.rs

//! iShop storefront backend: catalog, deals, orders and live order notifications
//! behind an actix-web JSON API.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;
