//! Axum router wiring.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{api, app_state::AppState, recover};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(api::register))
        .route("/increment", post(api::increment))
        .route("/decrement", post(api::decrement))
        .route("/add", post(api::add))
        .route("/set", post(api::set))
        .route("/push", post(api::push))
        .route("/list", get(api::list))
        .route("/debug", get(api::debug))
        .layer(middleware::from_fn(recover::recover))
        .with_state(state)
}
