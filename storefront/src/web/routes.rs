// ishop/src/web/routes.rs

use crate::errors::AppError;
use crate::web::handlers::{
  admin_handlers, auth_handlers, carousel_handlers, category_handlers, deal_handlers, order_handlers,
  product_handlers, upload_handlers, user_handlers,
};
use crate::web::ws;
use actix_web::{error, web};

/// Body, path and query rejections answer with the same `{"message"}` shape as every other error.
fn extractor_configs(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(
      web::JsonConfig::default()
        .error_handler(|err, _req| error::Error::from(AppError::Validation(format!("Invalid request body: {}", err)))),
    )
    .app_data(
      web::PathConfig::default()
        .error_handler(|_err, _req| error::Error::from(AppError::NotFound("Resource not found".to_string()))),
    )
    .app_data(
      web::QueryConfig::default()
        .error_handler(|err, _req| error::Error::from(AppError::Validation(format!("Invalid query: {}", err)))),
    );
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  extractor_configs(cfg);

  cfg.route("/ws", web::get().to(ws::notifications_ws)).service(
    web::scope("/api")
      .route("", web::get().to(admin_handlers::health_handler))
      .service(
        web::scope("/auth")
          .route("/register", web::post().to(auth_handlers::register_handler))
          .route("/login", web::post().to(auth_handlers::login_handler))
          .route("/reset-password", web::post().to(auth_handlers::reset_password_handler)),
      )
      .route("/upload", web::post().to(upload_handlers::upload_image_handler))
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("", web::post().to(product_handlers::create_product_handler))
          .route("/upload", web::post().to(upload_handlers::upload_image_handler))
          .route("/category/{name}", web::get().to(product_handlers::products_by_category_handler))
          .route("/{id}", web::get().to(product_handlers::get_product_handler))
          .route("/{id}", web::put().to(product_handlers::update_product_handler))
          .route("/{id}", web::delete().to(product_handlers::delete_product_handler)),
      )
      .service(
        web::scope("/categories")
          .route("", web::get().to(category_handlers::list_categories_handler))
          .route("", web::post().to(category_handlers::create_category_handler))
          .route("/{id}", web::put().to(category_handlers::update_category_handler))
          .route("/{id}", web::delete().to(category_handlers::delete_category_handler)),
      )
      .service(
        web::scope("/carousels")
          .route("", web::get().to(carousel_handlers::list_carousels_handler))
          .route("", web::post().to(carousel_handlers::create_carousel_handler))
          .route("/{id}", web::put().to(carousel_handlers::update_carousel_handler))
          .route("/{id}", web::delete().to(carousel_handlers::delete_carousel_handler)),
      )
      .service(
        web::scope("/todaysDeals")
          .route("", web::get().to(deal_handlers::list_deals_handler))
          .route("", web::post().to(deal_handlers::create_deal_handler))
          .route("/{id}/recompute", web::post().to(deal_handlers::recompute_deal_handler))
          .route("/{deal_id}", web::get().to(deal_handlers::get_deal_handler))
          .route("/{id}", web::put().to(deal_handlers::update_deal_handler))
          .route("/{id}", web::delete().to(deal_handlers::delete_deal_handler)),
      )
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::place_order_handler))
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/user/{email}", web::get().to(order_handlers::orders_for_user_handler))
          .route("/{id}/status", web::put().to(order_handlers::update_order_status_handler))
          .route("/{order_id}/cancel", web::put().to(order_handlers::cancel_order_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{id}", web::delete().to(order_handlers::delete_order_handler)),
      )
      .service(
        web::scope("/users")
          .route("", web::get().to(user_handlers::list_users_handler))
          // Registered ahead of `/{id}` routes so `account` is never read as an id.
          .route("/account/{id}", web::put().to(user_handlers::update_account_handler))
          .route("/{id}/reset-password", web::post().to(user_handlers::admin_reset_password_handler))
          .route("/{id}/addresses", web::post().to(user_handlers::add_address_handler))
          .route("/{id}/addresses/{address_id}", web::put().to(user_handlers::update_address_handler))
          .route("/{id}/addresses/{address_id}", web::delete().to(user_handlers::delete_address_handler))
          .route("/{id}", web::get().to(user_handlers::get_user_handler))
          .route("/{id}", web::put().to(user_handlers::admin_update_user_handler))
          .route("/{id}", web::delete().to(user_handlers::delete_user_handler)),
      )
      .service(web::scope("/admin").route("/stats", web::get().to(admin_handlers::stats_handler))),
  );
}
