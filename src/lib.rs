use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::integration::Env;
use crate::state::AppState;

pub mod announcement;
pub mod auth;
pub mod chat;
pub mod error;
pub mod event;
pub mod extract;
pub mod integration;
pub mod message;
pub mod notification;
pub mod page;
pub mod read;
pub mod schema;
pub mod state;
pub mod user;

pub type Result<T> = std::result::Result<T, error::Error>;

/// Successful API response: `{"success": true, "data": ...}`.
pub struct Success<T>(pub T);

#[derive(Serialize)]
struct SuccessBody<T> {
    success: bool,
    data: T,
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        Json(SuccessBody {
            success: true,
            data: self.0,
        })
        .into_response()
    }
}

pub fn app(env: &Env, state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .merge(chat::api(state.clone()))
        .merge(message::api(state.clone()))
        .merge(read::api(state.clone()))
        .merge(notification::api(state.clone()))
        .merge(announcement::api(state.clone()));

    Router::new()
        .nest("/api", api)
        .merge(event::endpoints(state))
        .layer(
            CorsLayer::new()
                .allow_origin(env.allow_origin())
                .allow_methods(env.allow_methods())
                .allow_headers(env.allow_headers()),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "message": "Server is working!" }))
}
