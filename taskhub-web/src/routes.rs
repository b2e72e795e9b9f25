/// TaskHub Web - Router.
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::AppState;
use crate::handlers::{self, api};
use crate::middleware;

/// Build the application router with its middleware stack.
pub fn create_app(state: AppState) -> Router {
    let notification_routes = Router::new()
        .route(
            "/api/notifications",
            get(api::list_notifications).delete(api::clear_notifications),
        )
        .route("/api/notifications/count", get(api::unread_count))
        .route("/api/notifications/mark-all-read", post(api::mark_all_read))
        .route("/api/notifications/{id}/mark-read", post(api::mark_read))
        .route(
            "/api/notifications/{id}",
            axum::routing::delete(api::delete_notification),
        );

    let task_routes = Router::new()
        .route("/api/tasks", get(api::list_tasks).post(api::create_task))
        .route(
            "/api/tasks/{id}",
            get(api::get_task)
                .put(api::update_task)
                .delete(api::delete_task),
        )
        .route("/api/tasks/{id}/complete", post(api::complete_task))
        .route("/api/dashboard", get(api::dashboard))
        .route(
            "/api/categories",
            get(api::list_categories).post(api::create_category),
        )
        .route(
            "/api/categories/{id}",
            axum::routing::put(api::update_category).delete(api::delete_category),
        );

    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    // The timeout wraps plain HTTP only; upgraded sockets outlive the request.
    let api_routes = notification_routes
        .merge(task_routes)
        .route("/health", get(health_check))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ));

    Router::new()
        .route("/ws/notifications", get(handlers::notifications_ws))
        .merge(api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::auth::auth_middleware,
                )),
        )
        .with_state(state)
}

/// Health check endpoint that verifies store connectivity.
///
/// Returns:
/// - 200 OK with "OK" if the store answers
/// - 503 Service Unavailable otherwise
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(e) = state.store.health_check().await {
        tracing::warn!(error = %e, "Health check failed: store unavailable");
        return (StatusCode::SERVICE_UNAVAILABLE, "Store unavailable");
    }
    (StatusCode::OK, "OK")
}
