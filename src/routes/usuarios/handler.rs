use axum::{
    Json,
    extract::{Extension, Query, State},
};

use crate::{
    AppState, account,
    account::{CuentaCreada, NuevaCuenta, SesionIniciada},
    error::{ApiResponse, AppResult, success_to_api_response},
    middleware::BearerToken,
    models::Perfil,
};

use super::model::{
    CambiarContraseniaRequest, CambiarCorreoRequest, CodigoUnicoRequest, ContarPorRolParams,
    ContarPorRolResponse, LoginRequest, OperacionOk, PorIdParams, SubirAvatarRequest,
};

#[axum::debug_handler]
pub async fn crear(
    State(state): State<AppState>,
    Json(req): Json<NuevaCuenta>,
) -> AppResult<Json<ApiResponse<CuentaCreada>>> {
    let store = state.stores.elevated();
    let creada = account::crear_cuenta(&store, &state.identity, req).await?;
    Ok(success_to_api_response(creada))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<SesionIniciada>>> {
    let store = state.stores.elevated();
    let sesion = account::login(&store, &state.identity, &req.correo, &req.contrasenia).await?;
    Ok(success_to_api_response(sesion))
}

#[axum::debug_handler]
pub async fn listar(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Perfil>>>> {
    let store = state.stores.elevated();
    let perfiles = account::listar_usuarios(&store).await?;
    Ok(success_to_api_response(perfiles))
}

#[axum::debug_handler]
pub async fn por_id(
    State(state): State<AppState>,
    Query(params): Query<PorIdParams>,
) -> AppResult<Json<ApiResponse<Perfil>>> {
    let store = state.stores.elevated();
    let perfil = account::buscar_usuario_por_id(&store, &params.id).await?;
    Ok(success_to_api_response(perfil))
}

#[axum::debug_handler]
pub async fn contar_por_rol(
    State(state): State<AppState>,
    Query(params): Query<ContarPorRolParams>,
) -> AppResult<Json<ApiResponse<ContarPorRolResponse>>> {
    let store = state.stores.elevated();
    let total = account::contar_por_rol(&store, params.rol).await?;
    Ok(success_to_api_response(ContarPorRolResponse {
        rol: params.rol,
        total,
    }))
}

#[axum::debug_handler]
pub async fn codigo_unico(
    State(state): State<AppState>,
    Json(req): Json<CodigoUnicoRequest>,
) -> AppResult<Json<ApiResponse<OperacionOk>>> {
    account::solicitar_codigo_unico(&state.identity, &req.correo).await?;
    Ok(success_to_api_response(OperacionOk {}))
}

#[axum::debug_handler]
pub async fn perfil(
    Extension(token): Extension<BearerToken>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Perfil>>> {
    let scoped = state.stores.scoped(&token.0)?;
    let perfil = account::perfil_propio(&scoped, &state.identity, &token.0).await?;
    Ok(success_to_api_response(perfil))
}

#[axum::debug_handler]
pub async fn desactivar(
    Extension(token): Extension<BearerToken>,
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<OperacionOk>>> {
    let scoped = state.stores.scoped(&token.0)?;
    account::desactivar(&scoped, &state.identity, &token.0).await?;
    Ok(success_to_api_response(OperacionOk {}))
}

#[axum::debug_handler]
pub async fn cambiar_contrasenia(
    Extension(token): Extension<BearerToken>,
    State(state): State<AppState>,
    Json(req): Json<CambiarContraseniaRequest>,
) -> AppResult<Json<ApiResponse<OperacionOk>>> {
    // El cambio viaja con el token del propio usuario; no requiere almacén.
    state.stores.scoped(&token.0)?;
    account::cambiar_contrasenia(&state.identity, &token.0, &req.contrasenia).await?;
    Ok(success_to_api_response(OperacionOk {}))
}

#[axum::debug_handler]
pub async fn cambiar_correo(
    Extension(token): Extension<BearerToken>,
    State(state): State<AppState>,
    Json(req): Json<CambiarCorreoRequest>,
) -> AppResult<Json<ApiResponse<OperacionOk>>> {
    let scoped = state.stores.scoped(&token.0)?;
    account::cambiar_correo(&scoped, &state.identity, &token.0, &req.correo).await?;
    Ok(success_to_api_response(OperacionOk {}))
}

#[axum::debug_handler]
pub async fn subir_avatar(
    Extension(token): Extension<BearerToken>,
    State(state): State<AppState>,
    Json(req): Json<SubirAvatarRequest>,
) -> AppResult<Json<ApiResponse<OperacionOk>>> {
    let scoped = state.stores.scoped(&token.0)?;
    account::subir_avatar(&scoped, &state.identity, &token.0, &req.avatar_url).await?;
    Ok(success_to_api_response(OperacionOk {}))
}
