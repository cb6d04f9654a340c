//! HTTP Handlers

use crate::application::PairInput;
use crate::application::accept_request::AcceptRequestUseCase;
use crate::application::cancel_request::CancelRequestUseCase;
use crate::application::config::RendezvousConfig;
use crate::application::generate_payload::GeneratePayloadUseCase;
use crate::application::lookup_code::LookupCodeUseCase;
use crate::application::register_identity::RegisterIdentityUseCase;
use crate::application::release_slot::ReleaseSlotUseCase;
use crate::application::request_slot::RequestSlotUseCase;
use crate::application::send_request::SendRequestUseCase;
use crate::domain::repository::{CodeRegistry, IdentityRepository};
use crate::error::RendezvousResult;
use crate::presentation::dto::{
    DirectedCodeResponse, EmptyResponse, LookupResponse, PairRequest, PayloadResponse,
    RegisterIdentityRequest, SlotResponse,
};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use platform::clock::SharedClock;
use std::sync::Arc;

/// Shared state for rendezvous handlers
#[derive(Clone)]
pub struct RendezvousAppState<R>
where
    R: CodeRegistry + IdentityRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<RendezvousConfig>,
    pub clock: SharedClock,
}

impl From<PairRequest> for PairInput {
    fn from(req: PairRequest) -> Self {
        PairInput::new(req.sender, req.receiver)
    }
}

/// POST /slots
pub async fn request_slot<R>(
    State(state): State<RendezvousAppState<R>>,
) -> RendezvousResult<Json<SlotResponse>>
where
    R: CodeRegistry + IdentityRepository + Clone + Send + Sync + 'static,
{
    let use_case = RequestSlotUseCase::new(
        state.repo.clone(),
        state.config.clone(),
        state.clock.clone(),
    );

    let output = use_case.execute().await?;

    Ok(Json(SlotResponse {
        code: output.code,
        status: output.status,
        expires_at_ms: output.expires_at_ms,
    }))
}

/// DELETE /slots/{code}
pub async fn release_slot<R>(
    State(state): State<RendezvousAppState<R>>,
    Path(code): Path<String>,
) -> RendezvousResult<StatusCode>
where
    R: CodeRegistry + IdentityRepository + Clone + Send + Sync + 'static,
{
    let use_case = ReleaseSlotUseCase::new(state.repo.clone(), state.clock.clone());
    use_case.execute(&code).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /codes/{code}
pub async fn lookup_code<R>(
    State(state): State<RendezvousAppState<R>>,
    Path(code): Path<String>,
) -> RendezvousResult<Json<LookupResponse>>
where
    R: CodeRegistry + IdentityRepository + Clone + Send + Sync + 'static,
{
    let use_case = LookupCodeUseCase::new(state.repo.clone(), state.clock.clone());
    let entry = use_case.execute(&code).await?;

    Ok(Json(LookupResponse::from(entry)))
}

/// POST /identities
pub async fn register_identity<R>(
    State(state): State<RendezvousAppState<R>>,
    Json(req): Json<RegisterIdentityRequest>,
) -> RendezvousResult<impl IntoResponse>
where
    R: CodeRegistry + IdentityRepository + Clone + Send + Sync + 'static,
{
    let use_case = RegisterIdentityUseCase::new(state.repo.clone(), state.clock.clone());
    use_case.execute(&req.name).await?;

    Ok((StatusCode::CREATED, Json(EmptyResponse::default())))
}

/// POST /requests
pub async fn send_request<R>(
    State(state): State<RendezvousAppState<R>>,
    Json(req): Json<PairRequest>,
) -> RendezvousResult<Json<DirectedCodeResponse>>
where
    R: CodeRegistry + IdentityRepository + Clone + Send + Sync + 'static,
{
    let use_case = SendRequestUseCase::new(
        state.repo.clone(),
        state.config.clone(),
        state.clock.clone(),
    );

    let output = use_case.execute(req.into()).await?;

    Ok(Json(DirectedCodeResponse {
        code: output.code,
        expires_at_ms: output.expires_at_ms,
    }))
}

/// POST /requests/accept
pub async fn accept_request<R>(
    State(state): State<RendezvousAppState<R>>,
    Json(req): Json<PairRequest>,
) -> RendezvousResult<Json<DirectedCodeResponse>>
where
    R: CodeRegistry + IdentityRepository + Clone + Send + Sync + 'static,
{
    let use_case = AcceptRequestUseCase::new(state.repo.clone(), state.clock.clone());
    let output = use_case.execute(req.into()).await?;

    Ok(Json(DirectedCodeResponse {
        code: output.code,
        expires_at_ms: output.expires_at_ms,
    }))
}

/// POST /requests/cancel
pub async fn cancel_request<R>(
    State(state): State<RendezvousAppState<R>>,
    Json(req): Json<PairRequest>,
) -> RendezvousResult<Json<EmptyResponse>>
where
    R: CodeRegistry + IdentityRepository + Clone + Send + Sync + 'static,
{
    let use_case = CancelRequestUseCase::new(state.repo.clone(), state.clock.clone());
    use_case.execute(req.into()).await?;

    Ok(Json(EmptyResponse::default()))
}

/// GET /getPayload (also served at /payload)
pub async fn generate_payload() -> Json<PayloadResponse> {
    Json(PayloadResponse {
        payload: GeneratePayloadUseCase::new().execute(),
    })
}
