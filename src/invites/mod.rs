use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::error::{AppError, AppResult};
use crate::models::{Invitacion, Rol, from_row, tablas};
use crate::notify::Notifier;
use crate::store::{Query, RowStore, select_one};

pub mod cipher;

pub use cipher::TokenCipher;

#[derive(Debug, Clone, Deserialize)]
pub struct NuevaInvitacion {
    pub nombre_completo: String,
    pub correo: String,
    pub rol: Rol,
    #[serde(default)]
    pub medico_referente: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvitacionCreada {
    pub invitacion: Invitacion,
    pub token: String,
}

/// Crea y persiste una invitación y emite el aviso al canal de alertas.
///
/// Si la emisión falla, la fila ya insertada se conserva y el llamador
/// recibe un error interno; el reenvío queda en manos del operador.
pub async fn crear_invitacion<S: RowStore, N: Notifier>(
    store: &S,
    notifier: &N,
    cipher: &TokenCipher,
    datos: NuevaInvitacion,
) -> AppResult<InvitacionCreada> {
    let existente = select_one(store, tablas::USUARIOS, Query::new().eq("correo", datos.correo.clone())).await?;
    if existente.is_some() {
        return Err(AppError::DuplicateEmail(format!(
            "Ya existe un usuario con el correo {}",
            datos.correo
        )));
    }

    let fila = json!({
        "correo": datos.correo,
        "nombre_completo": datos.nombre_completo,
        "rol": datos.rol,
        "medico_referente": datos.medico_referente,
    });
    let insertadas = store.insert(tablas::INVITACIONES, vec![fila]).await?;
    let invitacion: Invitacion = insertadas
        .into_iter()
        .next()
        .map(from_row)
        .transpose()?
        .ok_or_else(|| AppError::Persistence("el almacén no devolvió la invitación".to_string()))?;

    let token = cipher.encode(&invitacion.id.to_string());

    let aviso = json!({
        "correo": invitacion.correo,
        "nombre_completo": invitacion.nombre_completo,
        "token": token,
        "rol": invitacion.rol,
    });
    if let Err(e) = notifier.emit("invitacion_creada", aviso).await {
        error!("no se pudo emitir el aviso de invitación: {e}");
        return Err(AppError::Internal(
            "La invitación fue creada pero el aviso no pudo emitirse".to_string(),
        ));
    }

    Ok(InvitacionCreada { invitacion, token })
}

/// Descifra el token y devuelve la invitación; solo lectura.
pub async fn resolver_invitacion<S: RowStore>(
    store: &S,
    cipher: &TokenCipher,
    token: &str,
) -> AppResult<Invitacion> {
    let id: i64 = cipher
        .decode(token)?
        .parse()
        .map_err(|_| AppError::InvalidToken("Token de invitación inválido".to_string()))?;

    let fila = select_one(store, tablas::INVITACIONES, Query::new().eq("id", id)).await?;
    match fila {
        Some(fila) => from_row(fila),
        None => Err(AppError::NotFound(format!(
            "No existe una invitación con id {id}"
        ))),
    }
}

/// Elimina la invitación pendiente del correo; se invoca al completar el
/// registro, no como canje directo por token.
pub async fn consumir_invitacion_por_correo<S: RowStore>(
    store: &S,
    correo: &str,
) -> AppResult<u64> {
    let eliminadas = store
        .delete(tablas::INVITACIONES, Query::new().eq("correo", correo))
        .await?;
    Ok(eliminadas)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{Estado, Rol};
    use crate::notify::memory::MemNotifier;
    use crate::store::memory::MemStore;

    fn cipher() -> TokenCipher {
        TokenCipher::new("secreto-de-prueba")
    }

    fn perfil(id: &str, correo: &str, rol: Rol) -> serde_json::Value {
        json!({
            "id": id,
            "nombre": "Alguien",
            "status": Estado::Activo,
            "correo": correo,
            "rol": rol,
        })
    }

    fn nueva(correo: &str) -> NuevaInvitacion {
        NuevaInvitacion {
            nombre_completo: "Berta Paz".to_string(),
            correo: correo.to_string(),
            rol: Rol::Paciente,
            medico_referente: None,
        }
    }

    #[tokio::test]
    async fn rechaza_correo_con_perfil_existente() {
        let store = MemStore::new();
        store.sembrar(tablas::USUARIOS, vec![perfil("u1", "b@x.com", Rol::Paciente)]);
        let notifier = MemNotifier::new();

        let err = crear_invitacion(&store, &notifier, &cipher(), nueva("b@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail(_)));
        assert!(store.filas(tablas::INVITACIONES).is_empty());
    }

    #[tokio::test]
    async fn ciclo_de_vida_completo() {
        let store = MemStore::new();
        let notifier = MemNotifier::new();
        let cipher = cipher();

        let creada = crear_invitacion(&store, &notifier, &cipher, nueva("b@x.com"))
            .await
            .unwrap();
        assert_eq!(creada.invitacion.correo, "b@x.com");

        let resuelta = resolver_invitacion(&store, &cipher, &creada.token)
            .await
            .unwrap();
        assert_eq!(resuelta.id, creada.invitacion.id);
        assert_eq!(resuelta.correo, "b@x.com");
        // Resolver no elimina.
        assert_eq!(store.filas(tablas::INVITACIONES).len(), 1);

        let eliminadas = consumir_invitacion_por_correo(&store, "b@x.com").await.unwrap();
        assert_eq!(eliminadas, 1);
        assert!(store.filas(tablas::INVITACIONES).is_empty());
    }

    #[tokio::test]
    async fn emite_aviso_con_token_y_datos() {
        let store = MemStore::new();
        let notifier = MemNotifier::new();

        let creada = crear_invitacion(&store, &notifier, &cipher(), nueva("c@x.com"))
            .await
            .unwrap();

        let emitidos = notifier.emitidos();
        assert_eq!(emitidos.len(), 1);
        let (evento, payload) = &emitidos[0];
        assert_eq!(evento, "invitacion_creada");
        assert_eq!(payload["correo"], "c@x.com");
        assert_eq!(payload["token"], creada.token.as_str());
    }

    #[tokio::test]
    async fn aviso_fallido_conserva_la_fila() {
        let store = MemStore::new();
        let notifier = MemNotifier::new();
        notifier.fallar();

        let err = crear_invitacion(&store, &notifier, &cipher(), nueva("d@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        // La fila no se revierte.
        assert_eq!(store.filas(tablas::INVITACIONES).len(), 1);
    }

    #[tokio::test]
    async fn token_estructuralmente_invalido() {
        let store = MemStore::new();
        let err = resolver_invitacion(&store, &cipher(), "???")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn token_valido_sin_invitacion_es_not_found() {
        let store = MemStore::new();
        let cipher = cipher();
        let token = cipher.encode("12345");
        let err = resolver_invitacion(&store, &cipher, &token).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
