use axum::{
    Json,
    extract::{Extension, State},
};

use crate::{
    AppState, account,
    error::{ApiResponse, AppResult, success_to_api_response},
    middleware::BearerToken,
    models::Perfil,
    relations,
    relations::SinRelacion,
};

use super::model::{
    AsignarCuidadorRequest, AsignarMedicoRequest, MiPacienteResponse, QuitarCuidadorRequest,
    VinculoOk,
};

#[axum::debug_handler]
pub async fn asignar_medico(
    State(state): State<AppState>,
    Json(req): Json<AsignarMedicoRequest>,
) -> AppResult<Json<ApiResponse<VinculoOk>>> {
    let store = state.stores.elevated();
    relations::asignar_medico_paciente(&store, &req.medico_id, &req.paciente_id).await?;
    Ok(success_to_api_response(VinculoOk {}))
}

#[axum::debug_handler]
pub async fn asignar_cuidador(
    State(state): State<AppState>,
    Json(req): Json<AsignarCuidadorRequest>,
) -> AppResult<Json<ApiResponse<VinculoOk>>> {
    let store = state.stores.elevated();
    relations::asignar_cuidador_paciente(&store, &req.cuidador_id, &req.paciente_id).await?;
    Ok(success_to_api_response(VinculoOk {}))
}

#[axum::debug_handler]
pub async fn quitar_cuidador(
    State(state): State<AppState>,
    Json(req): Json<QuitarCuidadorRequest>,
) -> AppResult<Json<ApiResponse<VinculoOk>>> {
    let store = state.stores.elevated();
    relations::quitar_cuidador_paciente(&store, &req.cuidador_id, &req.paciente_id).await?;
    Ok(success_to_api_response(VinculoOk {}))
}

#[axum::debug_handler]
pub async fn sin_relacion(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<SinRelacion>>> {
    let store = state.stores.elevated();
    let resultado = relations::usuarios_sin_relacion(&store).await?;
    Ok(success_to_api_response(resultado))
}

/// Pacientes del médico autenticado; la consulta corre con su autoridad.
#[axum::debug_handler]
pub async fn mis_pacientes(
    Extension(token): Extension<BearerToken>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Perfil>>>> {
    let user_id = account::id_del_principal(&state.identity, &token.0).await?;
    let scoped = state.stores.scoped(&token.0)?;
    let pacientes = relations::pacientes_de_medico(&scoped, &user_id).await?;
    Ok(success_to_api_response(pacientes))
}

/// Médicos del paciente autenticado.
#[axum::debug_handler]
pub async fn mis_medicos(
    Extension(token): Extension<BearerToken>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Perfil>>>> {
    let user_id = account::id_del_principal(&state.identity, &token.0).await?;
    let scoped = state.stores.scoped(&token.0)?;
    let medicos = relations::medicos_de_paciente(&scoped, &user_id).await?;
    Ok(success_to_api_response(medicos))
}

/// Paciente a cargo del cuidador autenticado (a lo sumo uno).
#[axum::debug_handler]
pub async fn mi_paciente(
    Extension(token): Extension<BearerToken>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<MiPacienteResponse>>> {
    let user_id = account::id_del_principal(&state.identity, &token.0).await?;
    let scoped = state.stores.scoped(&token.0)?;
    let paciente_ids = relations::pacientes_de_cuidador(&scoped, &user_id).await?;
    Ok(success_to_api_response(MiPacienteResponse { paciente_ids }))
}
