// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, storage engine, adapters, and start HTTP server

mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use config::Config;
use db::PlaceStore;
use dotenv::dotenv;
use models::Coordinates;
use services::{AuthGuard, FixedGeocoder, Geocoder, GoogleGeocoder, ImageStore, LocalImageStore};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
    }

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    log::info!("Starting share-places service...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize storage engine and auth guard
    let store = Arc::new(PlaceStore::new());
    let guard = Arc::new(AuthGuard::new());

    // 5. Initialize external adapters
    let geocoder: Arc<dyn Geocoder> = if config.geocoding_api_key.is_empty() {
        log::warn!("Using the offline geocoding resolver; only known demo addresses will resolve");
        Arc::new(FixedGeocoder::new([(
            "20 W 34th St, New York, NY 10001".to_string(),
            Coordinates { lat: 40.7484405, lng: -73.9878584 },
        )]))
    } else {
        Arc::new(GoogleGeocoder::new(config.geocoding_api_key.clone()))
    };
    let images: Arc<dyn ImageStore> = Arc::new(LocalImageStore::new(config.uploads_dir.clone()));
    log::info!("Image uploads root: {}", config.uploads_dir);

    // 6. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_clone = config.clone();

    HttpServer::new(move || {
        App::new()
            // Application state (storage, auth guard, adapters, config)
            .app_data(web::Data::from(store.clone()))
            .app_data(web::Data::from(guard.clone()))
            .app_data(web::Data::from(geocoder.clone()))
            .app_data(web::Data::from(images.clone()))
            .app_data(web::Data::new(config_clone.clone()))
            // Middleware
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::places_config)
            .configure(handlers::users_config)
            .configure(handlers::admin_config)
    })
    .bind(&server_addr)
    .with_context(|| format!("could not bind {}", server_addr))?
    .run()
    .await
    .context("server terminated abnormally")
}
