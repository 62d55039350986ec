use serde::{Deserialize, Serialize};

use crate::models::Rol;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub correo: String,
    pub contrasenia: String,
}

#[derive(Debug, Deserialize)]
pub struct PorIdParams {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ContarPorRolParams {
    pub rol: Rol,
}

#[derive(Debug, Serialize)]
pub struct ContarPorRolResponse {
    pub rol: Rol,
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct CodigoUnicoRequest {
    pub correo: String,
}

#[derive(Debug, Deserialize)]
pub struct CambiarContraseniaRequest {
    pub contrasenia: String,
}

#[derive(Debug, Deserialize)]
pub struct CambiarCorreoRequest {
    pub correo: String,
}

#[derive(Debug, Deserialize)]
pub struct SubirAvatarRequest {
    pub avatar_url: String,
}

#[derive(Debug, Serialize)]
pub struct OperacionOk {}
