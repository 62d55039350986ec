use std::future::Future;

use serde_json::Value;
use thiserror::Error;

pub mod postgrest;

#[cfg(test)]
pub mod memory;

pub use postgrest::{PostgrestStore, Stores};

/// Falla reportada por el almacén; cualquier error no nulo se trata como
/// falla sin interpretar el mensaje.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orden {
    Asc,
    Desc,
}

/// Consulta por igualdad sobre una tabla, con orden y límite opcionales.
#[derive(Debug, Clone, Default)]
pub struct Query {
    filtros: Vec<(String, Value)>,
    orden: Option<(String, Orden)>,
    limite: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, columna: &str, valor: impl Into<Value>) -> Self {
        self.filtros.push((columna.to_string(), valor.into()));
        self
    }

    pub fn order(mut self, columna: &str, orden: Orden) -> Self {
        self.orden = Some((columna.to_string(), orden));
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limite = Some(n);
        self
    }

    pub fn filtros(&self) -> &[(String, Value)] {
        &self.filtros
    }

    pub fn orden(&self) -> Option<(&str, Orden)> {
        self.orden.as_ref().map(|(c, o)| (c.as_str(), *o))
    }

    pub fn limite(&self) -> Option<u32> {
        self.limite
    }
}

/// Capacidad uniforme de consulta sobre el almacén de filas. Las
/// implementaciones deciden bajo qué credencial se ejecuta cada llamada
/// (elevada o con el token del usuario final).
pub trait RowStore: Send + Sync {
    fn select(
        &self,
        tabla: &str,
        query: Query,
    ) -> impl Future<Output = Result<Vec<Value>, StoreError>> + Send;

    fn insert(
        &self,
        tabla: &str,
        filas: Vec<Value>,
    ) -> impl Future<Output = Result<Vec<Value>, StoreError>> + Send;

    fn update(
        &self,
        tabla: &str,
        cambios: Value,
        query: Query,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn delete(
        &self,
        tabla: &str,
        query: Query,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn count(
        &self,
        tabla: &str,
        query: Query,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

/// Primera fila que satisface la consulta, si existe.
pub async fn select_one<S: RowStore>(
    store: &S,
    tabla: &str,
    query: Query,
) -> Result<Option<Value>, StoreError> {
    let filas = store.select(tabla, query.limit(1)).await?;
    Ok(filas.into_iter().next())
}
