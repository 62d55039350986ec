use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::config::Config;
use crate::error::AppError;
use crate::store::{Orden, Query, RowStore, StoreError};

/// Fábrica de manejadores del almacén PostgREST. Cada operación decide
/// explícitamente si corre con la credencial de servicio o con el token del
/// usuario final; la visibilidad por fila (RLS) depende de cuál credencial
/// ejecuta la consulta.
#[derive(Clone)]
pub struct Stores {
    base_url: String,
    anon_key: String,
    service_key: String,
    client: Client,
}

impl Stores {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            service_key: config.supabase_service_key.clone(),
            client: Client::new(),
        }
    }

    /// Manejador con credencial de servicio. Solo para operaciones que lo
    /// documentan: invitaciones, filas de relación y altas de perfil.
    pub fn elevated(&self) -> PostgrestStore {
        PostgrestStore {
            client: self.client.clone(),
            base: format!("{}/rest/v1", self.base_url),
            api_key: self.service_key.clone(),
            bearer: self.service_key.clone(),
        }
    }

    /// Manejador restringido a la autoridad del usuario dueño del token.
    pub fn scoped(&self, token: &str) -> Result<PostgrestStore, AppError> {
        if token.trim().is_empty() {
            return Err(AppError::InvalidCredential(
                "Token no proporcionado".to_string(),
            ));
        }

        Ok(PostgrestStore {
            client: self.client.clone(),
            base: format!("{}/rest/v1", self.base_url),
            api_key: self.anon_key.clone(),
            bearer: token.to_string(),
        })
    }
}

/// Manejador concreto contra PostgREST; la credencial quedó fijada al
/// construirse y no se muta durante su vida.
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    base: String,
    api_key: String,
    bearer: String,
}

impl PostgrestStore {
    fn url(&self, tabla: &str) -> String {
        format!("{}/{}", self.base, tabla)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.bearer))
    }

    fn aplicar_query(mut builder: RequestBuilder, query: &Query) -> RequestBuilder {
        for (columna, valor) in query.filtros() {
            builder = builder.query(&[(columna.as_str(), format!("eq.{}", valor_plano(valor)))]);
        }
        if let Some((columna, orden)) = query.orden() {
            let dir = match orden {
                Orden::Asc => "asc",
                Orden::Desc => "desc",
            };
            builder = builder.query(&[("order", format!("{columna}.{dir}"))]);
        }
        if let Some(limite) = query.limite() {
            builder = builder.query(&[("limit", limite.to_string())]);
        }
        builder
    }

    async fn filas(builder: RequestBuilder) -> Result<Vec<Value>, StoreError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| StoreError::new(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(error_de_respuesta(status, resp).await);
        }
        resp.json::<Vec<Value>>()
            .await
            .map_err(|e| StoreError::new(format!("respuesta ilegible del almacén: {e}")))
    }
}

fn valor_plano(valor: &Value) -> String {
    match valor {
        Value::String(s) => s.clone(),
        otro => otro.to_string(),
    }
}

async fn error_de_respuesta(status: StatusCode, resp: reqwest::Response) -> StoreError {
    let cuerpo: Value = resp.json().await.unwrap_or(Value::Null);
    let mensaje = cuerpo
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("el almacén respondió {status}"));
    StoreError::new(mensaje)
}

impl RowStore for PostgrestStore {
    async fn select(&self, tabla: &str, query: Query) -> Result<Vec<Value>, StoreError> {
        let builder = self.authed(self.client.get(self.url(tabla))).query(&[("select", "*")]);
        Self::filas(Self::aplicar_query(builder, &query)).await
    }

    async fn insert(&self, tabla: &str, filas: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        let builder = self
            .authed(self.client.post(self.url(tabla)))
            .header("Prefer", "return=representation")
            .json(&filas);
        Self::filas(builder).await
    }

    async fn update(&self, tabla: &str, cambios: Value, query: Query) -> Result<u64, StoreError> {
        let builder = self
            .authed(self.client.patch(self.url(tabla)))
            .header("Prefer", "return=representation")
            .json(&cambios);
        let filas = Self::filas(Self::aplicar_query(builder, &query)).await?;
        Ok(filas.len() as u64)
    }

    async fn delete(&self, tabla: &str, query: Query) -> Result<u64, StoreError> {
        let builder = self
            .authed(self.client.delete(self.url(tabla)))
            .header("Prefer", "return=representation");
        let filas = Self::filas(Self::aplicar_query(builder, &query)).await?;
        Ok(filas.len() as u64)
    }

    async fn count(&self, tabla: &str, query: Query) -> Result<u64, StoreError> {
        let builder = self
            .authed(self.client.head(self.url(tabla)))
            .header("Prefer", "count=exact");
        let resp = Self::aplicar_query(builder, &query)
            .send()
            .await
            .map_err(|e| StoreError::new(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(error_de_respuesta(status, resp).await);
        }

        // Content-Range llega como "0-24/57" o "*/57"; el total va tras la barra.
        resp.headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|total| total.parse::<u64>().ok())
            .ok_or_else(|| StoreError::new("el almacén no reportó el conteo"))
    }
}
