use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod gotrue;

#[cfg(test)]
pub mod memory;

pub use gotrue::GoTrueProvider;

/// Falla del proveedor de identidad. `Rechazado` cubre credenciales o
/// sesiones inválidas; `Proveedor` cubre fallas de transporte o del servicio.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{0}")]
    Rechazado(String),
    #[error("{0}")]
    Proveedor(String),
}

/// Sesión emitida por el proveedor al autenticar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub expires_in: i64,
    pub user_id: String,
}

/// Cambios de autoservicio sobre la cuenta del portador del token.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelfUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Contrato del colaborador de identidad. `delete_by_id` es la única
/// operación que exige credencial elevada.
pub trait IdentityProvider: Send + Sync {
    /// Crea el registro de autenticación y devuelve el id asignado.
    fn sign_up(
        &self,
        correo: &str,
        contrasenia: &str,
    ) -> impl Future<Output = Result<String, IdentityError>> + Send;

    fn sign_in(
        &self,
        correo: &str,
        contrasenia: &str,
    ) -> impl Future<Output = Result<Session, IdentityError>> + Send;

    /// Resuelve el id del principal dueño del token.
    fn verify_session(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<String, IdentityError>> + Send;

    /// Autoactualización del portador del token; devuelve su id.
    fn update_self(
        &self,
        token: &str,
        cambios: SelfUpdate,
    ) -> impl Future<Output = Result<String, IdentityError>> + Send;

    fn delete_by_id(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send;

    /// Envía un código de un solo uso al correo dado.
    fn issue_one_time_code(
        &self,
        correo: &str,
    ) -> impl Future<Output = Result<(), IdentityError>> + Send;
}
