use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};

use crate::config::Config;
use crate::identity::{IdentityError, IdentityProvider, SelfUpdate, Session};

/// Cliente del proveedor de identidad (GoTrue). Las operaciones de
/// autoservicio viajan con el token del usuario; `delete_by_id` usa la
/// credencial de servicio.
#[derive(Clone)]
pub struct GoTrueProvider {
    client: Client,
    base: String,
    anon_key: String,
    service_key: String,
}

impl GoTrueProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base: format!("{}/auth/v1", config.supabase_url.trim_end_matches('/')),
            anon_key: config.supabase_anon_key.clone(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    fn con_clave(&self, builder: RequestBuilder, bearer: &str) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {bearer}"))
    }

    async fn cuerpo(resp: reqwest::Response) -> Result<Value, IdentityError> {
        let status = resp.status();
        let cuerpo: Value = resp.json().await.unwrap_or(Value::Null);
        if status.is_success() {
            return Ok(cuerpo);
        }

        let mensaje = mensaje_de_error(&cuerpo)
            .unwrap_or_else(|| format!("el proveedor de identidad respondió {status}"));
        if status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || status == StatusCode::BAD_REQUEST
        {
            Err(IdentityError::Rechazado(mensaje))
        } else {
            Err(IdentityError::Proveedor(mensaje))
        }
    }
}

fn mensaje_de_error(cuerpo: &Value) -> Option<String> {
    for clave in ["msg", "message", "error_description", "error"] {
        if let Some(mensaje) = cuerpo.get(clave).and_then(Value::as_str) {
            return Some(mensaje.to_string());
        }
    }
    None
}

fn transporte(e: reqwest::Error) -> IdentityError {
    IdentityError::Proveedor(e.to_string())
}

impl IdentityProvider for GoTrueProvider {
    async fn sign_up(&self, correo: &str, contrasenia: &str) -> Result<String, IdentityError> {
        let resp = self
            .con_clave(self.client.post(format!("{}/signup", self.base)), &self.anon_key)
            .json(&json!({ "email": correo, "password": contrasenia }))
            .send()
            .await
            .map_err(transporte)?;
        let cuerpo = Self::cuerpo(resp).await?;

        // Según la configuración del proveedor, el id llega plano o anidado
        // bajo "user".
        cuerpo
            .get("id")
            .or_else(|| cuerpo.pointer("/user/id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                IdentityError::Proveedor("el proveedor no devolvió un id".to_string())
            })
    }

    async fn sign_in(&self, correo: &str, contrasenia: &str) -> Result<Session, IdentityError> {
        let resp = self
            .con_clave(
                self.client
                    .post(format!("{}/token", self.base))
                    .query(&[("grant_type", "password")]),
                &self.anon_key,
            )
            .json(&json!({ "email": correo, "password": contrasenia }))
            .send()
            .await
            .map_err(transporte)?;
        let cuerpo = Self::cuerpo(resp).await?;

        let access_token = cuerpo
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| IdentityError::Proveedor("sesión sin access_token".to_string()))?;
        let user_id = cuerpo
            .pointer("/user/id")
            .and_then(Value::as_str)
            .ok_or_else(|| IdentityError::Proveedor("sesión sin id de usuario".to_string()))?;

        Ok(Session {
            access_token: access_token.to_string(),
            expires_in: cuerpo.get("expires_in").and_then(Value::as_i64).unwrap_or(3600),
            user_id: user_id.to_string(),
        })
    }

    async fn verify_session(&self, token: &str) -> Result<String, IdentityError> {
        if token.trim().is_empty() {
            return Err(IdentityError::Rechazado("Token no proporcionado".to_string()));
        }

        let resp = self
            .con_clave(self.client.get(format!("{}/user", self.base)), token)
            .send()
            .await
            .map_err(transporte)?;
        let cuerpo = Self::cuerpo(resp).await?;

        cuerpo
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| IdentityError::Rechazado("sesión sin id de usuario".to_string()))
    }

    async fn update_self(&self, token: &str, cambios: SelfUpdate) -> Result<String, IdentityError> {
        let resp = self
            .con_clave(self.client.put(format!("{}/user", self.base)), token)
            .json(&cambios)
            .send()
            .await
            .map_err(transporte)?;
        let cuerpo = Self::cuerpo(resp).await?;

        cuerpo
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| IdentityError::Proveedor("actualización sin id".to_string()))
    }

    async fn delete_by_id(&self, user_id: &str) -> Result<(), IdentityError> {
        let resp = self
            .client
            .delete(format!("{}/admin/users/{user_id}", self.base))
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .send()
            .await
            .map_err(transporte)?;
        Self::cuerpo(resp).await.map(|_| ())
    }

    async fn issue_one_time_code(&self, correo: &str) -> Result<(), IdentityError> {
        let resp = self
            .con_clave(self.client.post(format!("{}/otp", self.base)), &self.anon_key)
            .json(&json!({ "email": correo }))
            .send()
            .await
            .map_err(transporte)?;
        Self::cuerpo(resp).await.map(|_| ())
    }
}
