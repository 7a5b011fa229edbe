//! fieldops HTTP server: site-visit creation with auto-assignment, collector
//! directory, and in-app notifications.

mod error;
mod routes;
mod state;

use axum::Router;
use db::DBService;
use services::services::{
    assignment::AssignmentService, config::Config, notification::NotificationService,
    visit_confirmation::VisitConfirmationService,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    utils::logging::init();

    let config = Config::from_env();
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://fieldops.db".to_string());
    let db = DBService::new(&database_url).await?;
    let notifications = NotificationService::new(db.clone());

    if config.auto_assign_enabled {
        let _sweep = AssignmentService::spawn(db.clone(), notifications.clone(), &config).await;
    }
    let _confirmation =
        VisitConfirmationService::spawn(db.clone(), notifications.clone(), &config).await;

    let state = AppState::new(db, config, notifications);
    let app = Router::new()
        .nest("/api", routes::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3001);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("fieldops server listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
