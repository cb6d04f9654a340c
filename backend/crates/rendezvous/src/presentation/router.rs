//! Rendezvous Router

use crate::application::config::RendezvousConfig;
use crate::domain::repository::{CodeRegistry, IdentityRepository};
use crate::presentation::handlers::{self, RendezvousAppState};
use axum::{
    Router,
    routing::{delete, get, post},
};
use platform::clock::SharedClock;
use std::sync::Arc;

/// Create the rendezvous router for any repository implementation
pub fn rendezvous_router<R>(repo: R, config: RendezvousConfig, clock: SharedClock) -> Router
where
    R: CodeRegistry + IdentityRepository + Clone + Send + Sync + 'static,
{
    let state = RendezvousAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
        clock,
    };

    Router::new()
        .route("/slots", post(handlers::request_slot::<R>))
        .route("/slots/{code}", delete(handlers::release_slot::<R>))
        .route("/codes/{code}", get(handlers::lookup_code::<R>))
        .route("/identities", post(handlers::register_identity::<R>))
        .route("/requests", post(handlers::send_request::<R>))
        .route("/requests/accept", post(handlers::accept_request::<R>))
        .route("/requests/cancel", post(handlers::cancel_request::<R>))
        .route("/getPayload", get(handlers::generate_payload))
        .route("/payload", get(handlers::generate_payload))
        .with_state(state)
}
