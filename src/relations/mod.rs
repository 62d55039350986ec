use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{CuidadorPaciente, MedicoPaciente, Perfil, Rol, a_fila, from_row, tablas};
use crate::store::{Query, RowStore, select_one};

/// Topes de cardinalidad por lado de la relación.
pub const MAX_MEDICOS_POR_PACIENTE: u64 = 3;
pub const MAX_CUIDADORES_POR_PACIENTE: u64 = 3;
pub const MAX_PACIENTES_POR_CUIDADOR: u64 = 1;

async fn perfil_de<S: RowStore>(store: &S, usuario_id: &str) -> AppResult<Perfil> {
    let fila = select_one(store, tablas::USUARIOS, Query::new().eq("id", usuario_id)).await?;
    match fila {
        Some(fila) => from_row(fila),
        None => Err(AppError::NotFound(format!(
            "No existe el usuario {usuario_id}"
        ))),
    }
}

async fn exigir_rol<S: RowStore>(store: &S, usuario_id: &str, esperado: Rol) -> AppResult<()> {
    let perfil = perfil_de(store, usuario_id).await?;
    if perfil.rol != esperado {
        return Err(AppError::RoleMismatch(format!(
            "El usuario {usuario_id} no tiene rol de {}",
            esperado.as_str()
        )));
    }
    Ok(())
}

/// Vincula un médico con un paciente. Valida ambos roles y el tope de
/// médicos del paciente antes de insertar; los chequeos son lectura y luego
/// escritura, sin transacción (ver DESIGN.md).
pub async fn asignar_medico_paciente<S: RowStore>(
    store: &S,
    medico_id: &str,
    paciente_id: &str,
) -> AppResult<()> {
    exigir_rol(store, medico_id, Rol::Medico).await?;
    exigir_rol(store, paciente_id, Rol::Paciente).await?;

    let actuales = store
        .count(tablas::MEDICO_PACIENTE, Query::new().eq("paciente_id", paciente_id))
        .await?;
    if actuales >= MAX_MEDICOS_POR_PACIENTE {
        return Err(AppError::CapacityExceeded(format!(
            "El paciente {paciente_id} ya tiene {MAX_MEDICOS_POR_PACIENTE} médicos asignados"
        )));
    }

    let enlace = MedicoPaciente {
        medico_id: medico_id.to_string(),
        paciente_id: paciente_id.to_string(),
    };
    store
        .insert(tablas::MEDICO_PACIENTE, vec![a_fila(&enlace)?])
        .await?;
    Ok(())
}

/// Vincula un cuidador con un paciente. Tope de 3 cuidadores por paciente y
/// de 1 paciente por cuidador.
pub async fn asignar_cuidador_paciente<S: RowStore>(
    store: &S,
    cuidador_id: &str,
    paciente_id: &str,
) -> AppResult<()> {
    exigir_rol(store, cuidador_id, Rol::Cuidador).await?;
    exigir_rol(store, paciente_id, Rol::Paciente).await?;

    let del_paciente = store
        .count(tablas::CUIDADOR_PACIENTE, Query::new().eq("paciente_id", paciente_id))
        .await?;
    if del_paciente >= MAX_CUIDADORES_POR_PACIENTE {
        return Err(AppError::CapacityExceeded(format!(
            "El paciente {paciente_id} ya tiene {MAX_CUIDADORES_POR_PACIENTE} cuidadores asignados"
        )));
    }

    let del_cuidador = store
        .count(tablas::CUIDADOR_PACIENTE, Query::new().eq("cuidador_id", cuidador_id))
        .await?;
    if del_cuidador >= MAX_PACIENTES_POR_CUIDADOR {
        return Err(AppError::CapacityExceeded(format!(
            "El cuidador {cuidador_id} ya tiene un paciente asignado"
        )));
    }

    let enlace = CuidadorPaciente {
        cuidador_id: cuidador_id.to_string(),
        paciente_id: paciente_id.to_string(),
    };
    store
        .insert(tablas::CUIDADOR_PACIENTE, vec![a_fila(&enlace)?])
        .await?;
    Ok(())
}

/// Elimina el vínculo cuidador-paciente sin verificar su existencia.
pub async fn quitar_cuidador_paciente<S: RowStore>(
    store: &S,
    cuidador_id: &str,
    paciente_id: &str,
) -> AppResult<()> {
    store
        .delete(
            tablas::CUIDADOR_PACIENTE,
            Query::new()
                .eq("cuidador_id", cuidador_id)
                .eq("paciente_id", paciente_id),
        )
        .await?;
    Ok(())
}

async fn perfiles_vinculados<S: RowStore>(
    store: &S,
    tabla: &str,
    columna_filtro: &str,
    valor: &str,
    columna_resultado: &str,
) -> AppResult<Vec<Perfil>> {
    let enlaces = store
        .select(tabla, Query::new().eq(columna_filtro, valor))
        .await?;

    let mut perfiles = Vec::with_capacity(enlaces.len());
    for enlace in enlaces {
        let Some(id) = enlace.get(columna_resultado).and_then(|v| v.as_str()) else {
            continue;
        };
        // Un enlace huérfano no invalida el listado.
        if let Some(fila) =
            select_one(store, tablas::USUARIOS, Query::new().eq("id", id)).await?
        {
            perfiles.push(from_row(fila)?);
        }
    }
    Ok(perfiles)
}

pub async fn pacientes_de_medico<S: RowStore>(
    store: &S,
    medico_id: &str,
) -> AppResult<Vec<Perfil>> {
    perfiles_vinculados(store, tablas::MEDICO_PACIENTE, "medico_id", medico_id, "paciente_id")
        .await
}

pub async fn medicos_de_paciente<S: RowStore>(
    store: &S,
    paciente_id: &str,
) -> AppResult<Vec<Perfil>> {
    perfiles_vinculados(store, tablas::MEDICO_PACIENTE, "paciente_id", paciente_id, "medico_id")
        .await
}

/// Ids de paciente vinculados al cuidador (a lo sumo uno bajo el tope
/// vigente).
pub async fn pacientes_de_cuidador<S: RowStore>(
    store: &S,
    cuidador_id: &str,
) -> AppResult<Vec<String>> {
    let enlaces = store
        .select(tablas::CUIDADOR_PACIENTE, Query::new().eq("cuidador_id", cuidador_id))
        .await?;
    enlaces
        .into_iter()
        .map(|fila| from_row::<CuidadorPaciente>(fila).map(|enlace| enlace.paciente_id))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct SinRelacion {
    pub pacientes: Vec<Perfil>,
    pub cuidadores: Vec<Perfil>,
}

/// Pacientes sin cuidador y cuidadores sin paciente. Si ambas listas quedan
/// vacías la operación responde `NotFound`, no un éxito vacío (comportamiento
/// heredado; ver DESIGN.md).
pub async fn usuarios_sin_relacion<S: RowStore>(store: &S) -> AppResult<SinRelacion> {
    let mut pacientes = Vec::new();
    for fila in store
        .select(tablas::USUARIOS, Query::new().eq("rol", Rol::Paciente.as_str()))
        .await?
    {
        let perfil: Perfil = from_row(fila)?;
        let enlaces = store
            .count(tablas::CUIDADOR_PACIENTE, Query::new().eq("paciente_id", perfil.id.clone()))
            .await?;
        if enlaces == 0 {
            pacientes.push(perfil);
        }
    }

    let mut cuidadores = Vec::new();
    for fila in store
        .select(tablas::USUARIOS, Query::new().eq("rol", Rol::Cuidador.as_str()))
        .await?
    {
        let perfil: Perfil = from_row(fila)?;
        let enlaces = store
            .count(tablas::CUIDADOR_PACIENTE, Query::new().eq("cuidador_id", perfil.id.clone()))
            .await?;
        if enlaces == 0 {
            cuidadores.push(perfil);
        }
    }

    if pacientes.is_empty() && cuidadores.is_empty() {
        return Err(AppError::NotFound(
            "No hay usuarios sin relación".to_string(),
        ));
    }

    Ok(SinRelacion {
        pacientes,
        cuidadores,
    })
}
