//! HTTP router shared by the binary and the integration tests.

use axum::{
    http::Method,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, middleware, repositories::Store, state::AppState};

pub fn router<S: Store>(state: AppState<S>) -> Router {
    let api = Router::new()
        .route(
            "/api/requests",
            post(handlers::create_request::<S>).get(handlers::list_requests::<S>),
        )
        .route(
            "/api/requests/bulk-status",
            post(handlers::bulk_update_status::<S>),
        )
        .route(
            "/api/requests/force-approve",
            post(handlers::force_approve::<S>),
        )
        .route(
            "/api/requests/{id}",
            get(handlers::get_request::<S>).delete(handlers::delete_request::<S>),
        )
        .route(
            "/api/requests/{id}/status",
            put(handlers::update_status::<S>),
        )
        .route(
            "/api/leave-banks/{employee_id}",
            get(handlers::get_leave_bank::<S>),
        )
        .route(
            "/api/leave-banks/{employee_id}/credits",
            post(handlers::credit_leave_bank::<S>),
        )
        .route("/api/me/authority", get(handlers::my_authority))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_actor::<S>,
        ));

    Router::new()
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(middleware::log_error_responses))
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::DELETE,
                            Method::OPTIONS,
                        ])
                        .allow_headers(Any)
                        .max_age(Duration::from_secs(24 * 60 * 60)),
                ),
        )
        .with_state(state)
}
