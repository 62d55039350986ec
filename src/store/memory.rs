//! Doble en memoria del almacén de filas, solo para pruebas.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::store::{Orden, Query, RowStore, StoreError};

#[derive(Default)]
struct Interior {
    tablas: HashMap<String, Vec<Value>>,
    proximo_id: i64,
    vetadas: HashSet<String>,
}

/// Implementación de `RowStore` respaldada por memoria compartida. Asigna un
/// `id` numérico incremental a las filas insertadas sin uno, imitando la
/// clave sustituta del almacén real.
#[derive(Clone, Default)]
pub struct MemStore {
    interior: Arc<Mutex<Interior>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hace fallar toda operación futura sobre la tabla dada.
    pub fn vetar(&self, tabla: &str) {
        self.interior
            .lock()
            .unwrap()
            .vetadas
            .insert(tabla.to_string());
    }

    pub fn filas(&self, tabla: &str) -> Vec<Value> {
        self.interior
            .lock()
            .unwrap()
            .tablas
            .get(tabla)
            .cloned()
            .unwrap_or_default()
    }

    pub fn sembrar(&self, tabla: &str, filas: Vec<Value>) {
        self.interior
            .lock()
            .unwrap()
            .tablas
            .entry(tabla.to_string())
            .or_default()
            .extend(filas);
    }

    fn verificar(&self, tabla: &str) -> Result<(), StoreError> {
        if self.interior.lock().unwrap().vetadas.contains(tabla) {
            Err(StoreError::new(format!("fallo inyectado en {tabla}")))
        } else {
            Ok(())
        }
    }
}

fn coincide(fila: &Value, query: &Query) -> bool {
    query.filtros().iter().all(|(columna, valor)| {
        fila.get(columna).map(|v| v == valor).unwrap_or(false)
    })
}

fn aplicar_orden_y_limite(mut filas: Vec<Value>, query: &Query) -> Vec<Value> {
    if let Some((columna, orden)) = query.orden() {
        filas.sort_by(|a, b| {
            let izq = a.get(columna).map(Value::to_string).unwrap_or_default();
            let der = b.get(columna).map(Value::to_string).unwrap_or_default();
            match orden {
                Orden::Asc => izq.cmp(&der),
                Orden::Desc => der.cmp(&izq),
            }
        });
    }
    if let Some(limite) = query.limite() {
        filas.truncate(limite as usize);
    }
    filas
}

impl RowStore for MemStore {
    async fn select(&self, tabla: &str, query: Query) -> Result<Vec<Value>, StoreError> {
        self.verificar(tabla)?;
        let interior = self.interior.lock().unwrap();
        let filas = interior
            .tablas
            .get(tabla)
            .map(|filas| filas.iter().filter(|f| coincide(f, &query)).cloned().collect())
            .unwrap_or_default();
        Ok(aplicar_orden_y_limite(filas, &query))
    }

    async fn insert(&self, tabla: &str, filas: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        self.verificar(tabla)?;
        let mut interior = self.interior.lock().unwrap();
        let mut insertadas = Vec::with_capacity(filas.len());
        for mut fila in filas {
            if fila.get("id").is_none() {
                interior.proximo_id += 1;
                let id = interior.proximo_id;
                if let Some(objeto) = fila.as_object_mut() {
                    objeto.insert("id".to_string(), Value::from(id));
                }
            }
            interior
                .tablas
                .entry(tabla.to_string())
                .or_default()
                .push(fila.clone());
            insertadas.push(fila);
        }
        Ok(insertadas)
    }

    async fn update(&self, tabla: &str, cambios: Value, query: Query) -> Result<u64, StoreError> {
        self.verificar(tabla)?;
        let mut interior = self.interior.lock().unwrap();
        let Some(filas) = interior.tablas.get_mut(tabla) else {
            return Ok(0);
        };
        let mut afectadas = 0;
        for fila in filas.iter_mut().filter(|f| coincide(f, &query)) {
            if let (Some(objeto), Some(parche)) = (fila.as_object_mut(), cambios.as_object()) {
                for (clave, valor) in parche {
                    objeto.insert(clave.clone(), valor.clone());
                }
            }
            afectadas += 1;
        }
        Ok(afectadas)
    }

    async fn delete(&self, tabla: &str, query: Query) -> Result<u64, StoreError> {
        self.verificar(tabla)?;
        let mut interior = self.interior.lock().unwrap();
        let Some(filas) = interior.tablas.get_mut(tabla) else {
            return Ok(0);
        };
        let antes = filas.len();
        filas.retain(|f| !coincide(f, &query));
        Ok((antes - filas.len()) as u64)
    }

    async fn count(&self, tabla: &str, query: Query) -> Result<u64, StoreError> {
        self.verificar(tabla)?;
        let interior = self.interior.lock().unwrap();
        Ok(interior
            .tablas
            .get(tabla)
            .map(|filas| filas.iter().filter(|f| coincide(f, &query)).count() as u64)
            .unwrap_or(0))
    }
}
