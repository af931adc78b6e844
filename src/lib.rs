pub mod codes;
pub mod db;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod randomize;
pub mod reconcile;
pub mod rejections;
pub mod services;

use axum::Router;

use crate::rejections::AppError;
use crate::services::session::SessionService;

#[derive(Clone)]
pub struct AppState {
    pub db: db::Db,
    pub sessions: SessionService,
}

impl AppState {
    pub fn new(db: db::Db) -> Self {
        Self {
            sessions: SessionService::new(db.clone()),
            db,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::participant::routes())
        .merge(handlers::authoring::routes())
        .fallback(|| async { AppError::NotFound("route not found") })
        .with_state(state)
}
