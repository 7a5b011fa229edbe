pub mod collectors;
pub mod notifications;
pub mod site_visits;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(site_visits::router())
        .merge(collectors::router())
        .merge(notifications::router())
}
