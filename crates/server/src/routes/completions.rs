use axum::extract::State;
use axum::Json;
use llmguardian::{CancellationToken, CompletionRequestDto, CompletionResponseDto};

use crate::state::ServerState;

/// `POST /api/v1/completions` — the gateway's one domain endpoint. Runs the
/// full pipeline and returns its result regardless of success/failure; HTTP
/// status stays 200 so clients read `success`/`error` in the body rather
/// than branching on transport status for a pipeline-level failure.
pub async fn complete(State(state): State<ServerState>, Json(request): Json<CompletionRequestDto>) -> Json<CompletionResponseDto> {
    let response = state.orchestrator.process(request, CancellationToken::new()).await;
    Json(response)
}
