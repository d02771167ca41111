use crate::state::AppState;
use axum::Router;

mod claims;
pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod repo;
mod repo_types;
pub mod services;

pub use extractors::AuthUser;

/// Routes mounted under `/api/auth`. The profile aliases are gated.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(crate::users::handlers::profile_alias_routes(state))
}
