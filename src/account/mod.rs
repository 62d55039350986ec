use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::identity::{IdentityError, IdentityProvider, SelfUpdate};
use crate::invites;
use crate::models::{Estado, InicioSesion, NotificacionUso, Perfil, Rol, a_fila, from_row, tablas};
use crate::relations;
use crate::store::{Query, RowStore, select_one};

#[derive(Debug, Clone, Deserialize)]
pub struct NuevaCuenta {
    pub nombre: String,
    pub correo: String,
    pub contrasenia: String,
    pub rol: Rol,
    #[serde(default)]
    pub fecha_nacimiento: Option<NaiveDate>,
    #[serde(default)]
    pub medico_referente: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CuentaCreada {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct SesionIniciada {
    pub access_token: String,
    pub expires_in: i64,
    pub user_id: String,
}

fn como_credencial(e: IdentityError) -> AppError {
    match e {
        IdentityError::Rechazado(mensaje) => AppError::InvalidCredential(mensaje),
        IdentityError::Proveedor(mensaje) => AppError::Internal(mensaje),
    }
}

/// Alta de cuenta: identidad, perfil, vínculo con el médico referente cuando
/// el alta es de un paciente, y consumo de la invitación pendiente.
///
/// La secuencia no es atómica: si la asignación del médico falla, la
/// identidad y el perfil ya creados quedan en pie y el error se propaga sin
/// compensación (brecha conocida, ver DESIGN.md).
pub async fn crear_cuenta<S: RowStore, I: IdentityProvider>(
    store: &S,
    identity: &I,
    datos: NuevaCuenta,
) -> AppResult<CuentaCreada> {
    let user_id = identity
        .sign_up(&datos.correo, &datos.contrasenia)
        .await
        .map_err(|e| {
            AppError::IdentityCreationFailed(format!("Error al crear la identidad: {e}"))
        })?;

    let perfil = Perfil {
        id: user_id.clone(),
        nombre: datos.nombre,
        fecha_nacimiento: datos.fecha_nacimiento,
        status: Estado::Activo,
        correo: datos.correo.clone(),
        rol: datos.rol,
        avatar_url: None,
    };
    store.insert(tablas::USUARIOS, vec![a_fila(&perfil)?]).await?;

    if datos.rol == Rol::Paciente {
        if let Some(medico_id) = &datos.medico_referente {
            relations::asignar_medico_paciente(store, medico_id, &user_id).await?;
        }
    }

    invites::consumir_invitacion_por_correo(store, &datos.correo).await?;

    Ok(CuentaCreada { user_id })
}

/// Autentica contra el proveedor y registra el inicio de sesión del paciente
/// en la bitácora. La bitácora es best-effort: su falla se registra en el log
/// y no aborta el login.
pub async fn login<S: RowStore, I: IdentityProvider>(
    store: &S,
    identity: &I,
    correo: &str,
    contrasenia: &str,
) -> AppResult<SesionIniciada> {
    let sesion = identity
        .sign_in(correo, contrasenia)
        .await
        .map_err(como_credencial)?;

    registrar_inicio_de_sesion(store, &sesion.user_id).await;

    Ok(SesionIniciada {
        access_token: sesion.access_token,
        expires_in: sesion.expires_in,
        user_id: sesion.user_id,
    })
}

async fn registrar_inicio_de_sesion<S: RowStore>(store: &S, user_id: &str) {
    let perfil = match select_one(store, tablas::USUARIOS, Query::new().eq("id", user_id)).await {
        Ok(Some(fila)) => match from_row::<Perfil>(fila) {
            Ok(perfil) => perfil,
            Err(e) => {
                warn!("bitácora de sesión omitida, perfil ilegible: {e}");
                return;
            }
        },
        Ok(None) => return,
        Err(e) => {
            warn!("bitácora de sesión omitida: {e}");
            return;
        }
    };

    if perfil.rol != Rol::Paciente {
        return;
    }

    let evento = InicioSesion {
        paciente_id: user_id.to_string(),
        fecha: Utc::now(),
    };
    let fila = match a_fila(&evento) {
        Ok(fila) => fila,
        Err(e) => {
            warn!("bitácora de sesión omitida: {e}");
            return;
        }
    };
    if let Err(e) = store.insert(tablas::INICIOS_SESION, vec![fila]).await {
        warn!("no se pudo registrar el inicio de sesión de {user_id}: {e}");
    }
}

/// Cambio de contraseña del propio usuario, bajo su token.
pub async fn cambiar_contrasenia<I: IdentityProvider>(
    identity: &I,
    token: &str,
    nueva: &str,
) -> AppResult<()> {
    identity
        .update_self(
            token,
            SelfUpdate {
                password: Some(nueva.to_string()),
                ..SelfUpdate::default()
            },
        )
        .await
        .map_err(como_credencial)?;
    Ok(())
}

/// Cambio de correo: actualiza la identidad y propaga el nuevo valor al
/// perfil mediante el manejador con la autoridad del usuario.
pub async fn cambiar_correo<S: RowStore, I: IdentityProvider>(
    scoped: &S,
    identity: &I,
    token: &str,
    nuevo: &str,
) -> AppResult<()> {
    let user_id = identity
        .update_self(
            token,
            SelfUpdate {
                email: Some(nuevo.to_string()),
                ..SelfUpdate::default()
            },
        )
        .await
        .map_err(como_credencial)?;

    scoped
        .update(
            tablas::USUARIOS,
            json!({ "correo": nuevo }),
            Query::new().eq("id", user_id),
        )
        .await?;
    Ok(())
}

/// Resuelve el id del principal dueño del token.
pub async fn id_del_principal<I: IdentityProvider>(identity: &I, token: &str) -> AppResult<String> {
    identity.verify_session(token).await.map_err(como_credencial)
}

/// Baja lógica: el perfil pasa a `inactivo`. Idempotente; nunca elimina la
/// fila.
pub async fn desactivar<S: RowStore, I: IdentityProvider>(
    scoped: &S,
    identity: &I,
    token: &str,
) -> AppResult<()> {
    let user_id = identity.verify_session(token).await.map_err(como_credencial)?;
    scoped
        .update(
            tablas::USUARIOS,
            json!({ "status": Estado::Inactivo.as_str() }),
            Query::new().eq("id", user_id),
        )
        .await?;
    Ok(())
}

/// Actualiza el avatar del propio perfil, bajo la autoridad del token.
pub async fn subir_avatar<S: RowStore, I: IdentityProvider>(
    scoped: &S,
    identity: &I,
    token: &str,
    url: &str,
) -> AppResult<()> {
    let user_id = identity.verify_session(token).await.map_err(como_credencial)?;
    scoped
        .update(
            tablas::USUARIOS,
            json!({ "avatar_url": url }),
            Query::new().eq("id", user_id),
        )
        .await?;
    Ok(())
}

pub async fn perfil_propio<S: RowStore, I: IdentityProvider>(
    scoped: &S,
    identity: &I,
    token: &str,
) -> AppResult<Perfil> {
    let user_id = identity.verify_session(token).await.map_err(como_credencial)?;
    let fila = select_one(scoped, tablas::USUARIOS, Query::new().eq("id", user_id.clone())).await?;
    match fila {
        Some(fila) => from_row(fila),
        None => Err(AppError::NotFound(format!(
            "No existe el perfil del usuario {user_id}"
        ))),
    }
}

pub async fn listar_usuarios<S: RowStore>(store: &S) -> AppResult<Vec<Perfil>> {
    let filas = store.select(tablas::USUARIOS, Query::new()).await?;
    filas.into_iter().map(from_row).collect()
}

pub async fn buscar_usuario_por_id<S: RowStore>(store: &S, id: &str) -> AppResult<Perfil> {
    let fila = select_one(store, tablas::USUARIOS, Query::new().eq("id", id)).await?;
    match fila {
        Some(fila) => from_row(fila),
        None => Err(AppError::NotFound(format!("No existe el usuario {id}"))),
    }
}

pub async fn contar_por_rol<S: RowStore>(store: &S, rol: Rol) -> AppResult<u64> {
    let total = store
        .count(tablas::USUARIOS, Query::new().eq("rol", rol.as_str()))
        .await?;
    Ok(total)
}

pub async fn solicitar_codigo_unico<I: IdentityProvider>(
    identity: &I,
    correo: &str,
) -> AppResult<()> {
    identity
        .issue_one_time_code(correo)
        .await
        .map_err(como_credencial)
}

/// Registra una alerta de uso para el usuario salvo que ya exista una del
/// mismo día calendario. Devuelve `true` si se insertó.
pub async fn registrar_notificacion_uso<S: RowStore>(
    store: &S,
    usuario_id: &str,
    mensaje: &str,
) -> AppResult<bool> {
    let hoy = Utc::now().date_naive();
    let previas = store
        .select(tablas::NOTIFICACIONES_USO, Query::new().eq("usuario_id", usuario_id))
        .await?;
    let ya_avisado = previas
        .into_iter()
        .filter_map(|fila| from_row::<NotificacionUso>(fila).ok())
        .any(|aviso| aviso.fecha.date_naive() == hoy);
    if ya_avisado {
        return Ok(false);
    }

    let aviso = NotificacionUso {
        usuario_id: usuario_id.to_string(),
        mensaje: mensaje.to_string(),
        fecha: Utc::now(),
    };
    store
        .insert(tablas::NOTIFICACIONES_USO, vec![a_fila(&aviso)?])
        .await?;
    Ok(true)
}
