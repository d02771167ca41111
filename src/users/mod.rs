use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod services;

pub fn router(state: AppState) -> Router<AppState> {
    handlers::profile_routes(state)
}
