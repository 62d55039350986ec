use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// Nombres de tabla del almacén de filas.
pub mod tablas {
    pub const USUARIOS: &str = "usuarios";
    pub const INVITACIONES: &str = "invitaciones";
    pub const MEDICO_PACIENTE: &str = "medico_paciente";
    pub const CUIDADOR_PACIENTE: &str = "cuidador_paciente";
    pub const INICIOS_SESION: &str = "inicios_sesion";
    pub const NOTIFICACIONES_USO: &str = "notificaciones_uso";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Medico,
    Paciente,
    Cuidador,
    Administrador,
}

impl Rol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Medico => "medico",
            Rol::Paciente => "paciente",
            Rol::Cuidador => "cuidador",
            Rol::Administrador => "administrador",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Estado {
    Activo,
    Inactivo,
}

impl Estado {
    pub fn as_str(&self) -> &'static str {
        match self {
            Estado::Activo => "activo",
            Estado::Inactivo => "inactivo",
        }
    }
}

/// Registro de dominio de un usuario; el registro de autenticación vive en el
/// proveedor de identidad y se referencia por `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Perfil {
    pub id: String,
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_nacimiento: Option<NaiveDate>,
    pub status: Estado,
    pub correo: String,
    pub rol: Rol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Invitación pendiente, clave natural `correo`; se elimina al completarse el
/// registro del correo invitado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitacion {
    pub id: i64,
    pub correo: String,
    pub nombre_completo: String,
    pub rol: Rol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medico_referente: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicoPaciente {
    pub medico_id: String,
    pub paciente_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuidadorPaciente {
    pub cuidador_id: String,
    pub paciente_id: String,
}

/// Bitácora de inicios de sesión de pacientes; escritura best-effort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InicioSesion {
    pub paciente_id: String,
    pub fecha: DateTime<Utc>,
}

/// Alerta de inactividad emitida; evita duplicados el mismo día.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificacionUso {
    pub usuario_id: String,
    pub mensaje: String,
    pub fecha: DateTime<Utc>,
}

/// Deserializa una fila cruda del almacén al tipo de dominio.
pub fn from_row<T: serde::de::DeserializeOwned>(valor: Value) -> Result<T, AppError> {
    serde_json::from_value(valor)
        .map_err(|e| AppError::Internal(format!("fila con formato inesperado: {e}")))
}

/// Serializa un tipo de dominio como fila para el almacén.
pub fn a_fila<T: Serialize>(valor: &T) -> Result<Value, AppError> {
    serde_json::to_value(valor)
        .map_err(|e| AppError::Internal(format!("no se pudo serializar la fila: {e}")))
}
