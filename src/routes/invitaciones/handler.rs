use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    AppState, invites,
    error::{ApiResponse, AppResult, success_to_api_response},
    invites::{InvitacionCreada, NuevaInvitacion},
    models::Invitacion,
};

use super::model::ResolverParams;

#[axum::debug_handler]
pub async fn crear(
    State(state): State<AppState>,
    Json(req): Json<NuevaInvitacion>,
) -> AppResult<Json<ApiResponse<InvitacionCreada>>> {
    let store = state.stores.elevated();
    let creada =
        invites::crear_invitacion(&store, &state.notifier, &state.cipher, req).await?;
    Ok(success_to_api_response(creada))
}

#[axum::debug_handler]
pub async fn resolver(
    State(state): State<AppState>,
    Query(params): Query<ResolverParams>,
) -> AppResult<Json<ApiResponse<Invitacion>>> {
    let store = state.stores.elevated();
    let invitacion = invites::resolver_invitacion(&store, &state.cipher, &params.token).await?;
    Ok(success_to_api_response(invitacion))
}
