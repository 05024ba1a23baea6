use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod handlers;

use handlers::{health, recommend};
use railbird::core::ticket::DEFAULT_MIN_OVERLAY_PCT;

/// Application state shared across handlers
pub struct AppState {
    /// Overlay threshold used when a request does not supply one
    pub default_min_overlay: f64,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("{}:{}", host, port);

    let default_min_overlay = std::env::var("MIN_OVERLAY_PCT")
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(DEFAULT_MIN_OVERLAY_PCT);

    let app_state = Arc::new(AppState { default_min_overlay });

    info!(
        "Starting Railbird API server at http://{} (min overlay {}%)",
        addr, default_min_overlay
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(health::health_check))
            .route("/recommend", web::post().to(recommend::recommend))
            .route(
                "/recommend/overlays",
                web::post().to(recommend::recommend_overlays),
            )
    })
    .bind(&addr)?
    .run()
    .await
}
